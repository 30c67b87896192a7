//! Tag suggestions made by members on recipes they do not own.
//!
//! The owner decides whether the suggestion belongs on the recipe. Whether
//! a brand new community tag enters the vocabulary is a separate moderator
//! decision, see [`crate::moderation`].

use forkful_core::activity::{ActivityKind, DomainEvent};
use forkful_core::error::CoreError;
use forkful_core::tag_suggestion::{accepted_status, ensure_pending_owner, TagSuggestionStatus};
use forkful_core::tags::{normalize_tag_name, validate_recipe_tag_count, validate_tag_name};
use forkful_core::types::DbId;
use forkful_db::models::recipe::Recipe;
use forkful_db::models::tag_suggestion::{NewTagSuggestion, TagSuggestion};
use forkful_db::StoreTx;
use serde_json::json;

use crate::access::{require_creator, require_member};
use crate::error::{ServiceError, ServiceResult};
use crate::events::EventQueue;
use crate::graph::RecipeGraph;
use crate::tag_resolver::{ensure_not_linked, TagResolver};

/// Result of an owner decision.
#[derive(Debug, Clone, PartialEq)]
pub enum SuggestionDecision {
    Decided(TagSuggestion),
    /// The recipe disappeared; the suggestion was auto-rejected instead.
    Orphaned(TagSuggestion),
}

pub struct TagSuggestionLifecycle;

impl TagSuggestionLifecycle {
    pub async fn create(
        tx: &mut dyn StoreTx,
        events: &mut EventQueue,
        actor_id: DbId,
        recipe_id: DbId,
        tag_name: &str,
    ) -> ServiceResult<TagSuggestion> {
        let tag_name = normalize_tag_name(tag_name);
        validate_tag_name(&tag_name)?;

        let recipe = RecipeGraph::load(tx, recipe_id).await?;
        let Some(community_id) = recipe.community_id else {
            return Err(CoreError::Validation(
                "Tags can only be suggested on community recipes".to_string(),
            )
            .into());
        };
        if recipe.creator_id == actor_id {
            return Err(CoreError::Forbidden(
                "Add tags to your own recipe directly instead of suggesting them".to_string(),
            )
            .into());
        }
        require_member(tx, community_id, actor_id).await?;

        let existing = tx.list_recipe_tags(recipe_id).await?;
        ensure_not_linked(&existing, &tag_name)?;
        validate_recipe_tag_count(existing.len() + 1)?;

        if tx
            .find_tag_suggestion_by_key(recipe_id, &tag_name, actor_id)
            .await?
            .is_some()
        {
            return Err(CoreError::Conflict(format!(
                "You already suggested '{tag_name}' for this recipe"
            ))
            .into());
        }

        let suggestion = tx
            .insert_tag_suggestion(&NewTagSuggestion {
                recipe_id,
                tag_name,
                suggested_by: actor_id,
            })
            .await?;

        events.stage(
            DomainEvent::new(ActivityKind::TagSuggestionCreated, actor_id)
                .for_recipe(recipe_id)
                .in_community(Some(community_id))
                .with_recipients(vec![recipe.creator_id])
                .with_metadata(json!({
                    "suggestionId": suggestion.id,
                    "tagName": suggestion.tag_name,
                })),
        );
        tracing::info!(
            suggestion_id = suggestion.id,
            recipe_id,
            user_id = actor_id,
            tag = %suggestion.tag_name,
            "Created tag suggestion"
        );
        Ok(suggestion)
    }

    /// Link the suggested tag. An existing approved tag settles the
    /// suggestion as APPROVED; otherwise a pending community tag is resolved
    /// and the suggestion waits on a moderator.
    pub async fn accept(
        tx: &mut dyn StoreTx,
        events: &mut EventQueue,
        actor_id: DbId,
        suggestion_id: DbId,
    ) -> ServiceResult<SuggestionDecision> {
        let (suggestion, recipe) = match Self::load_decidable(tx, actor_id, suggestion_id).await? {
            Ok(pair) => pair,
            Err(orphaned) => return Ok(SuggestionDecision::Orphaned(orphaned)),
        };

        let approved = TagResolver::find_approved(tx, &suggestion.tag_name, recipe.community_id).await?;
        let status = accepted_status(approved.is_some());
        let tag_ids = match approved {
            Some(tag) => vec![tag.id],
            None => {
                TagResolver::resolve(tx, &[suggestion.tag_name.as_str()], actor_id, recipe.community_id)
                    .await?
                    .tag_ids
            }
        };
        TagResolver::link_all(tx, recipe.id, &tag_ids).await?;

        let decided = Self::set_status(tx, suggestion_id, status).await?;
        let kind = match status {
            TagSuggestionStatus::Approved => ActivityKind::TagSuggestionApproved,
            _ => ActivityKind::TagSuggestionPendingModerator,
        };
        events.stage(
            DomainEvent::new(kind, actor_id)
                .for_recipe(recipe.id)
                .in_community(recipe.community_id)
                .with_recipients(vec![decided.suggested_by])
                .with_metadata(json!({
                    "suggestionId": decided.id,
                    "tagName": decided.tag_name,
                    "tagId": tag_ids.first(),
                })),
        );

        tracing::info!(
            suggestion_id,
            recipe_id = recipe.id,
            user_id = actor_id,
            status = status.as_str(),
            "Accepted tag suggestion"
        );
        Ok(SuggestionDecision::Decided(decided))
    }

    pub async fn reject(
        tx: &mut dyn StoreTx,
        events: &mut EventQueue,
        actor_id: DbId,
        suggestion_id: DbId,
    ) -> ServiceResult<SuggestionDecision> {
        let (suggestion, recipe) = match Self::load_decidable(tx, actor_id, suggestion_id).await? {
            Ok(pair) => pair,
            Err(orphaned) => return Ok(SuggestionDecision::Orphaned(orphaned)),
        };

        let decided = Self::set_status(tx, suggestion.id, TagSuggestionStatus::Rejected).await?;
        events.stage(
            DomainEvent::new(ActivityKind::TagSuggestionRejected, actor_id)
                .for_recipe(recipe.id)
                .in_community(recipe.community_id)
                .with_recipients(vec![decided.suggested_by])
                .with_metadata(json!({
                    "suggestionId": decided.id,
                    "tagName": decided.tag_name,
                })),
        );
        tracing::info!(suggestion_id, recipe_id = recipe.id, user_id = actor_id, "Rejected tag suggestion");
        Ok(SuggestionDecision::Decided(decided))
    }

    /// Load a pending suggestion with its recipe and check that `actor_id`
    /// owns the recipe. If the recipe is gone, the suggestion is marked
    /// REJECTED and returned as the inner `Err`.
    async fn load_decidable(
        tx: &mut dyn StoreTx,
        actor_id: DbId,
        suggestion_id: DbId,
    ) -> ServiceResult<Result<(TagSuggestion, Recipe), TagSuggestion>> {
        let suggestion = tx
            .find_tag_suggestion(suggestion_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("TagSuggestion", suggestion_id))?;
        ensure_pending_owner(suggestion.status)?;

        let Some(recipe) = tx.find_recipe(suggestion.recipe_id).await? else {
            tracing::warn!(
                suggestion_id,
                recipe_id = suggestion.recipe_id,
                "Recipe gone, auto-rejecting tag suggestion"
            );
            let orphaned =
                Self::set_status(tx, suggestion_id, TagSuggestionStatus::Rejected).await?;
            return Ok(Err(orphaned));
        };
        require_creator(&recipe, actor_id, "decide tag suggestions")?;
        Ok(Ok((suggestion, recipe)))
    }

    async fn set_status(
        tx: &mut dyn StoreTx,
        suggestion_id: DbId,
        status: TagSuggestionStatus,
    ) -> ServiceResult<TagSuggestion> {
        tx.set_tag_suggestion_status(suggestion_id, status)
            .await?
            .ok_or_else(|| ServiceError::not_found("TagSuggestion", suggestion_id))
    }
}
