//! Membership and ownership checks shared by the services.

use forkful_core::error::CoreError;
use forkful_core::membership::MemberRole;
use forkful_core::types::DbId;
use forkful_db::models::community::Community;
use forkful_db::models::recipe::Recipe;
use forkful_db::StoreTx;

use crate::error::{ServiceError, ServiceResult};

pub async fn load_community(tx: &mut dyn StoreTx, community_id: DbId) -> ServiceResult<Community> {
    tx.find_community(community_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Community", community_id))
}

/// The actor's role in the community, or `Forbidden` if they are not a member.
pub async fn require_member(
    tx: &mut dyn StoreTx,
    community_id: DbId,
    user_id: DbId,
) -> ServiceResult<MemberRole> {
    tx.member_role(community_id, user_id).await?.ok_or_else(|| {
        CoreError::Forbidden(format!("You are not a member of community {community_id}")).into()
    })
}

pub async fn require_moderator(
    tx: &mut dyn StoreTx,
    community_id: DbId,
    user_id: DbId,
) -> ServiceResult<()> {
    let role = require_member(tx, community_id, user_id).await?;
    if !role.is_moderator() {
        return Err(CoreError::Forbidden(
            "Only community moderators can moderate tags".to_string(),
        )
        .into());
    }
    Ok(())
}

pub fn require_creator(recipe: &Recipe, user_id: DbId, action: &str) -> ServiceResult<()> {
    if recipe.creator_id != user_id {
        return Err(CoreError::Forbidden(format!("Only the recipe creator can {action}")).into());
    }
    Ok(())
}
