//! Moderator decisions on pending community tags.

use forkful_core::activity::{ActivityKind, DomainEvent};
use forkful_core::error::CoreError;
use forkful_core::tag_suggestion::TagSuggestionStatus;
use forkful_core::tags::{TagScope, TagStatus};
use forkful_core::types::DbId;
use forkful_db::models::tag::Tag;
use forkful_db::StoreTx;
use serde_json::json;

use crate::access::require_moderator;
use crate::error::{ServiceError, ServiceResult};
use crate::events::EventQueue;

pub struct TagModeration;

impl TagModeration {
    /// Approve a pending community tag. Suggestions waiting on this decision
    /// in the same community become APPROVED.
    pub async fn approve(
        tx: &mut dyn StoreTx,
        events: &mut EventQueue,
        actor_id: DbId,
        tag_id: DbId,
    ) -> ServiceResult<Tag> {
        let (tag, community_id) = Self::load_pending(tx, actor_id, tag_id).await?;

        let approved = tx
            .set_tag_status(tag.id, TagStatus::Approved)
            .await?
            .ok_or_else(|| ServiceError::not_found("Tag", tag_id))?;
        let suggestions = tx
            .transition_tag_suggestions(
                community_id,
                &tag.name,
                TagSuggestionStatus::PendingModerator,
                TagSuggestionStatus::Approved,
            )
            .await?;

        events.stage(
            DomainEvent::new(ActivityKind::TagApproved, actor_id)
                .in_community(Some(community_id))
                .with_recipients(tag.created_by.into_iter().collect())
                .with_metadata(json!({
                    "tagId": tag.id,
                    "tagName": tag.name,
                    "suggestionsApproved": suggestions,
                })),
        );
        tracing::info!(tag_id, community_id, user_id = actor_id, suggestions, "Approved community tag");
        Ok(approved)
    }

    /// Reject a pending community tag. The tag and its recipe links are
    /// removed and suggestions waiting on it become REJECTED.
    pub async fn reject(
        tx: &mut dyn StoreTx,
        events: &mut EventQueue,
        actor_id: DbId,
        tag_id: DbId,
    ) -> ServiceResult<Tag> {
        let (tag, community_id) = Self::load_pending(tx, actor_id, tag_id).await?;

        let suggestions = tx
            .transition_tag_suggestions(
                community_id,
                &tag.name,
                TagSuggestionStatus::PendingModerator,
                TagSuggestionStatus::Rejected,
            )
            .await?;
        tx.delete_tag(tag.id).await?;

        events.stage(
            DomainEvent::new(ActivityKind::TagRejected, actor_id)
                .in_community(Some(community_id))
                .with_recipients(tag.created_by.into_iter().collect())
                .with_metadata(json!({
                    "tagId": tag.id,
                    "tagName": tag.name,
                    "suggestionsRejected": suggestions,
                })),
        );
        tracing::info!(tag_id, community_id, user_id = actor_id, suggestions, "Rejected community tag");
        Ok(tag)
    }

    async fn load_pending(
        tx: &mut dyn StoreTx,
        actor_id: DbId,
        tag_id: DbId,
    ) -> ServiceResult<(Tag, DbId)> {
        let tag = tx
            .find_tag(tag_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Tag", tag_id))?;
        let (TagScope::Community, Some(community_id)) = (tag.scope, tag.community_id) else {
            return Err(
                CoreError::Validation("Only community tags go through moderation".to_string()).into(),
            );
        };
        require_moderator(tx, community_id, actor_id).await?;
        if !tag.is_pending() {
            return Err(CoreError::AlreadyDecided {
                entity: "Tag",
                status: tag.status.as_str(),
            }
            .into());
        }
        Ok((tag, community_id))
    }
}
