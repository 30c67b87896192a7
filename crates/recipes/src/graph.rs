//! Queries over the recipe family graph.
//!
//! Edges are the nullable `origin_recipe_id` self-reference. Every walk is a
//! loop of indexed lookups by id; no object graph is cached between steps.

use std::collections::{BTreeSet, HashSet, VecDeque};

use forkful_core::recipe::RecipeKind;
use forkful_core::types::DbId;
use forkful_db::models::community::Community;
use forkful_db::models::recipe::{Recipe, RecipeIngredient};
use forkful_db::models::tag::Tag;
use forkful_db::StoreTx;
use serde::Serialize;

use crate::error::{ServiceError, ServiceResult};

/// A recipe with its ordered children.
#[derive(Debug, Clone, Serialize)]
pub struct RecipeDetail {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub kind: RecipeKind,
    pub steps: Vec<String>,
    pub tags: Vec<Tag>,
    pub ingredients: Vec<RecipeIngredient>,
}

pub struct RecipeGraph;

impl RecipeGraph {
    /// Load a non-deleted recipe or fail with `NotFound`.
    pub async fn load(tx: &mut dyn StoreTx, recipe_id: DbId) -> ServiceResult<Recipe> {
        tx.find_recipe(recipe_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Recipe", recipe_id))
    }

    pub async fn detail(tx: &mut dyn StoreTx, recipe_id: DbId) -> ServiceResult<RecipeDetail> {
        let recipe = Self::load(tx, recipe_id).await?;
        Self::detail_of(tx, recipe).await
    }

    pub async fn detail_of(tx: &mut dyn StoreTx, recipe: Recipe) -> ServiceResult<RecipeDetail> {
        let steps = tx
            .list_steps(recipe.id)
            .await?
            .into_iter()
            .map(|s| s.instruction)
            .collect();
        let tags = tx.list_recipe_tags(recipe.id).await?;
        let ingredients = tx.list_ingredient_lines(recipe.id).await?;
        Ok(RecipeDetail {
            kind: recipe.kind(),
            recipe,
            steps,
            tags,
            ingredients,
        })
    }

    /// The recipe followed by each ancestor up the origin chain.
    ///
    /// The walk stops at the first missing or deleted parent. Origin edges
    /// are assigned once at creation, so the chain cannot loop.
    pub async fn origin_chain(tx: &mut dyn StoreTx, recipe: Recipe) -> ServiceResult<Vec<Recipe>> {
        let mut chain = vec![recipe];
        while let Some(parent_id) = chain.last().and_then(|r| r.origin_recipe_id) {
            match tx.find_recipe(parent_id).await? {
                Some(parent) => chain.push(parent),
                None => {
                    tracing::debug!(recipe_id = parent_id, "Origin chain ends at broken link");
                    break;
                }
            }
        }
        Ok(chain)
    }

    /// Every non-deleted descendant of `root_id`, breadth first, excluding the root.
    pub async fn descendants(tx: &mut dyn StoreTx, root_id: DbId) -> ServiceResult<Vec<Recipe>> {
        let mut found = Vec::new();
        let mut visited = HashSet::from([root_id]);
        let mut queue = VecDeque::from([root_id]);

        while let Some(id) = queue.pop_front() {
            for child in tx.list_recipes_by_origin(id).await? {
                if visited.insert(child.id) {
                    queue.push_back(child.id);
                    found.push(child);
                }
            }
        }
        Ok(found)
    }

    /// Distinct communities holding any member of the recipe's family.
    ///
    /// `None` when the recipe is missing or deleted.
    pub async fn family_communities(
        tx: &mut dyn StoreTx,
        recipe_id: DbId,
    ) -> ServiceResult<Option<Vec<Community>>> {
        let Some(recipe) = tx.find_recipe(recipe_id).await? else {
            return Ok(None);
        };

        let chain = Self::origin_chain(tx, recipe).await?;
        let Some(root) = chain.last().cloned() else {
            return Ok(Some(Vec::new()));
        };

        let mut community_ids = BTreeSet::new();
        community_ids.extend(root.community_id);
        for member in Self::descendants(tx, root.id).await? {
            community_ids.extend(member.community_id);
        }

        let ids: Vec<DbId> = community_ids.into_iter().collect();
        Ok(Some(tx.find_communities(&ids).await?))
    }

    /// Increment the share counter of the recipe and of every ancestor.
    ///
    /// Returns how many counters moved. Concurrent forks of the same
    /// ancestor may race; the counters are an approximation.
    pub async fn update_ancestor_analytics(
        tx: &mut dyn StoreTx,
        recipe_id: DbId,
    ) -> ServiceResult<usize> {
        let mut touched = 0;
        let mut next = Some(recipe_id);
        while let Some(id) = next {
            let Some(recipe) = tx.find_recipe(id).await? else {
                break;
            };
            tx.increment_share_count(recipe.id).await?;
            touched += 1;
            next = recipe.origin_recipe_id;
        }
        Ok(touched)
    }

    /// Non-deleted variants branched from `recipe_id`.
    pub async fn variants(tx: &mut dyn StoreTx, recipe_id: DbId) -> ServiceResult<Vec<Recipe>> {
        Ok(tx
            .list_recipes_by_origin(recipe_id)
            .await?
            .into_iter()
            .filter(|r| r.kind() == RecipeKind::Variant)
            .collect())
    }

    /// The existing fork of `source_id` into `community_id`, if any.
    pub async fn fork_into(
        tx: &mut dyn StoreTx,
        source_id: DbId,
        community_id: DbId,
    ) -> ServiceResult<Option<Recipe>> {
        Ok(tx
            .list_recipes_by_origin(source_id)
            .await?
            .into_iter()
            .find(|r| r.kind() == RecipeKind::Fork && r.community_id == Some(community_id)))
    }
}
