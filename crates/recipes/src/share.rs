//! Forking community recipes across communities and publishing personal
//! recipes into communities.
//!
//! A fork is isolated: it records the source community in
//! `shared_from_community_id` and never synchronizes. A publication is a
//! community-linked copy that stays in sync with its personal origin.

use forkful_core::activity::{ActivityKind, DomainEvent};
use forkful_core::recipe::RecipeKind;
use forkful_core::types::DbId;
use forkful_db::models::recipe::{IngredientLine, NewRecipe, Recipe};
use forkful_db::StoreTx;
use serde::Serialize;
use serde_json::json;

use crate::error::ServiceResult;
use crate::events::EventQueue;
use crate::graph::RecipeGraph;
use crate::tag_resolver::TagResolver;

#[derive(Debug, Clone, Serialize)]
pub struct ForkedRecipe {
    pub recipe: Recipe,
    pub tag_ids: Vec<DbId>,
    /// Number of share counters incremented along the origin chain.
    pub ancestors_updated: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeSummary {
    pub id: DbId,
    pub title: String,
    pub community_id: Option<DbId>,
}

impl From<&Recipe> for RecipeSummary {
    fn from(recipe: &Recipe) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title.clone(),
            community_id: recipe.community_id,
        }
    }
}

pub struct ShareForkEngine;

impl ShareForkEngine {
    /// Fork a community recipe into another community.
    ///
    /// The caller has already checked that `source` is community-owned, not
    /// yet forked into the target, and that the actor may share it.
    pub async fn fork_recipe(
        tx: &mut dyn StoreTx,
        events: &mut EventQueue,
        actor_id: DbId,
        source: &Recipe,
        target_community_id: DbId,
        target_community_name: &str,
    ) -> ServiceResult<ForkedRecipe> {
        let mut input = NewRecipe::copy_of(source, actor_id, Some(target_community_id));
        input.shared_from_community_id = source.community_id;
        let fork = tx.insert_recipe(&input).await?;

        Self::copy_steps_and_ingredients(tx, source.id, fork.id).await?;

        let source_tags = tx.list_recipe_tags(source.id).await?;
        let tag_ids =
            TagResolver::resolve_for_fork(tx, &source_tags, target_community_id, actor_id).await?;
        TagResolver::link_all(tx, fork.id, &tag_ids).await?;

        let ancestors_updated = RecipeGraph::update_ancestor_analytics(tx, source.id).await?;

        events.stage(
            DomainEvent::new(ActivityKind::RecipeShared, actor_id)
                .for_recipe(source.id)
                .in_community(source.community_id)
                .with_metadata(json!({
                    "forkedRecipeId": fork.id,
                    "targetCommunityId": target_community_id,
                    "targetCommunityName": target_community_name,
                })),
        );
        events.stage(
            DomainEvent::new(ActivityKind::RecipeShared, actor_id)
                .for_recipe(fork.id)
                .in_community(Some(target_community_id))
                .with_metadata(json!({
                    "sourceRecipeId": source.id,
                    "sourceCommunityId": source.community_id,
                })),
        );

        tracing::info!(
            recipe_id = fork.id,
            source_recipe_id = source.id,
            community_id = target_community_id,
            user_id = actor_id,
            "Forked recipe"
        );
        Ok(ForkedRecipe {
            recipe: fork,
            tag_ids,
            ancestors_updated,
        })
    }

    /// Publish a personal recipe into each community that does not yet hold
    /// a linked copy of it. Returns the copies created.
    pub async fn publish_recipe(
        tx: &mut dyn StoreTx,
        events: &mut EventQueue,
        actor_id: DbId,
        source: &Recipe,
        community_ids: &[DbId],
    ) -> ServiceResult<Vec<RecipeSummary>> {
        let existing: Vec<DbId> = tx
            .list_recipes_by_origin(source.id)
            .await?
            .into_iter()
            .filter(|r| r.kind() == RecipeKind::CommunityLinked)
            .filter_map(|r| r.community_id)
            .collect();
        let source_tags = tx.list_recipe_tags(source.id).await?;

        let mut published = Vec::new();
        let mut seen = Vec::new();
        for &community_id in community_ids {
            if existing.contains(&community_id) || seen.contains(&community_id) {
                continue;
            }
            seen.push(community_id);

            let copy = tx
                .insert_recipe(&NewRecipe::copy_of(source, source.creator_id, Some(community_id)))
                .await?;
            Self::copy_steps_and_ingredients(tx, source.id, copy.id).await?;
            let tag_ids =
                TagResolver::resolve_for_fork(tx, &source_tags, community_id, actor_id).await?;
            TagResolver::link_all(tx, copy.id, &tag_ids).await?;

            events.stage(
                DomainEvent::new(ActivityKind::RecipePublished, actor_id)
                    .for_recipe(copy.id)
                    .in_community(Some(community_id))
                    .with_metadata(json!({ "originRecipeId": source.id })),
            );
            published.push(RecipeSummary::from(&copy));
        }

        tracing::info!(
            recipe_id = source.id,
            user_id = actor_id,
            published = published.len(),
            "Published recipe"
        );
        Ok(published)
    }

    async fn copy_steps_and_ingredients(
        tx: &mut dyn StoreTx,
        source_id: DbId,
        target_id: DbId,
    ) -> ServiceResult<()> {
        let steps: Vec<String> = tx
            .list_steps(source_id)
            .await?
            .into_iter()
            .map(|s| s.instruction)
            .collect();
        tx.replace_steps(target_id, &steps).await?;

        let lines: Vec<IngredientLine> = tx
            .list_ingredient_lines(source_id)
            .await?
            .iter()
            .map(IngredientLine::from)
            .collect();
        tx.replace_ingredient_lines(target_id, &lines).await?;
        Ok(())
    }
}
