//! Tag name resolution under scope and moderation rules.
//!
//! Per name, the first match wins:
//! 1. an APPROVED GLOBAL tag;
//! 2. in a community context, that community's tag (any status);
//! 3. in a community context, a new COMMUNITY/PENDING tag, capacity permitting;
//! 4. without a community, a new GLOBAL/APPROVED tag.

use forkful_core::error::CoreError;
use forkful_core::tags::{
    normalize_tag_names, validate_community_tag_capacity, TagScope, TagStatus,
};
use forkful_core::types::DbId;
use forkful_db::models::tag::{NewTag, Tag};
use forkful_db::StoreTx;
use serde::Serialize;

use crate::error::ServiceResult;

/// Outcome of [`TagResolver::resolve`]. `pending_tag_ids` is the subset of
/// `tag_ids` still awaiting moderation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolvedTags {
    pub tag_ids: Vec<DbId>,
    pub pending_tag_ids: Vec<DbId>,
}

pub struct TagResolver;

impl TagResolver {
    /// Resolve user-supplied names to tag ids, creating tags where needed.
    ///
    /// Names are normalized and deduplicated; more than ten distinct names
    /// is `LimitExceeded`.
    pub async fn resolve<S: AsRef<str> + Sync>(
        tx: &mut dyn StoreTx,
        names: &[S],
        acting_user_id: DbId,
        community_id: Option<DbId>,
    ) -> ServiceResult<ResolvedTags> {
        let names = normalize_tag_names(names)?;
        let mut resolved = ResolvedTags::default();

        for name in &names {
            let tag = Self::resolve_name(tx, name, acting_user_id, community_id).await?;
            if tag.is_pending() {
                resolved.pending_tag_ids.push(tag.id);
            }
            resolved.tag_ids.push(tag.id);
        }

        tracing::debug!(
            community_id = ?community_id,
            resolved = resolved.tag_ids.len(),
            pending = resolved.pending_tag_ids.len(),
            "Resolved tags"
        );
        Ok(resolved)
    }

    async fn resolve_name(
        tx: &mut dyn StoreTx,
        name: &str,
        acting_user_id: DbId,
        community_id: Option<DbId>,
    ) -> ServiceResult<Tag> {
        if let Some(tag) = tx.find_global_tag(name, TagStatus::Approved).await? {
            return Ok(tag);
        }

        let Some(community_id) = community_id else {
            let tag = tx
                .insert_tag(&NewTag::approved_global(name, Some(acting_user_id)))
                .await?;
            tracing::info!(tag_id = tag.id, name, "Created global tag");
            return Ok(tag);
        };

        if let Some(tag) = tx.find_community_tag(community_id, name, None).await? {
            return Ok(tag);
        }

        Self::create_pending(tx, name, community_id, acting_user_id).await
    }

    /// Create a COMMUNITY/PENDING tag after checking the community's cap.
    async fn create_pending(
        tx: &mut dyn StoreTx,
        name: &str,
        community_id: DbId,
        acting_user_id: DbId,
    ) -> ServiceResult<Tag> {
        let count = tx.count_community_tags(community_id).await?;
        validate_community_tag_capacity(count)?;

        let tag = tx
            .insert_tag(&NewTag::pending_community(name, community_id, acting_user_id))
            .await?;
        tracing::info!(
            tag_id = tag.id,
            community_id,
            user_id = acting_user_id,
            name,
            "Created pending community tag"
        );
        Ok(tag)
    }

    /// Map a source recipe's tags into the target community of a fork.
    ///
    /// GLOBAL tags keep their identity. COMMUNITY tags are matched by name
    /// against the target's APPROVED tag, then its PENDING tag, and are
    /// otherwise recreated there as PENDING, so a fork never bypasses the
    /// target's moderation.
    pub async fn resolve_for_fork(
        tx: &mut dyn StoreTx,
        source_tags: &[Tag],
        target_community_id: DbId,
        acting_user_id: DbId,
    ) -> ServiceResult<Vec<DbId>> {
        let mut tag_ids = Vec::with_capacity(source_tags.len());

        for source in source_tags {
            let id = match source.scope {
                TagScope::Global => source.id,
                TagScope::Community => {
                    let existing = match tx
                        .find_community_tag(target_community_id, &source.name, Some(TagStatus::Approved))
                        .await?
                    {
                        Some(tag) => Some(tag),
                        None => {
                            tx.find_community_tag(
                                target_community_id,
                                &source.name,
                                Some(TagStatus::Pending),
                            )
                            .await?
                        }
                    };
                    match existing {
                        Some(tag) => tag.id,
                        None => {
                            Self::create_pending(tx, &source.name, target_community_id, acting_user_id)
                                .await?
                                .id
                        }
                    }
                }
            };
            if !tag_ids.contains(&id) {
                tag_ids.push(id);
            }
        }
        Ok(tag_ids)
    }

    /// An APPROVED tag usable in `community_id`: GLOBAL first, then the
    /// community's own. `name` must already be normalized.
    pub async fn find_approved(
        tx: &mut dyn StoreTx,
        name: &str,
        community_id: Option<DbId>,
    ) -> ServiceResult<Option<Tag>> {
        if let Some(tag) = tx.find_global_tag(name, TagStatus::Approved).await? {
            return Ok(Some(tag));
        }
        match community_id {
            Some(community_id) => Ok(tx
                .find_community_tag(community_id, name, Some(TagStatus::Approved))
                .await?),
            None => Ok(None),
        }
    }

    /// Link `tag_ids` to a recipe, failing before any write if the recipe
    /// would exceed its tag cap.
    pub async fn link_all(
        tx: &mut dyn StoreTx,
        recipe_id: DbId,
        tag_ids: &[DbId],
    ) -> ServiceResult<()> {
        let existing = tx.list_recipe_tags(recipe_id).await?;
        let added = tag_ids
            .iter()
            .filter(|id| !existing.iter().any(|t| t.id == **id))
            .count();
        forkful_core::tags::validate_recipe_tag_count(existing.len() + added)?;

        for tag_id in tag_ids {
            tx.link_tag(recipe_id, *tag_id).await?;
        }
        Ok(())
    }
}

/// Reject a name already present among a recipe's tags.
pub fn ensure_not_linked(existing: &[Tag], name: &str) -> Result<(), CoreError> {
    if existing.iter().any(|t| t.name == name) {
        return Err(CoreError::Conflict(format!(
            "Recipe already carries the tag '{name}'"
        )));
    }
    Ok(())
}
