//! Bidirectional field synchronization across a recipe's linked copies.
//!
//! A personal recipe and the community-linked copies published from it
//! share title, servings, times, image, steps, and ingredient lines. Forks
//! and variants never take part, and tags are always local to each copy.

use forkful_core::recipe::{FieldPatch, RecipeKind};
use forkful_core::types::DbId;
use forkful_db::models::recipe::{IngredientLine, Recipe};
use forkful_db::StoreTx;

use crate::error::{ServiceError, ServiceResult};

/// An edit with ingredient names already resolved, so it can be replayed
/// verbatim onto any recipe.
#[derive(Debug, Clone, Default)]
pub struct ResolvedEdit {
    pub fields: FieldPatch,
    /// Full replacement of the step list, if supplied.
    pub steps: Option<Vec<String>>,
    /// Full replacement of the ingredient lines, if supplied.
    pub ingredients: Option<Vec<IngredientLine>>,
}

impl ResolvedEdit {
    /// Names of everything this edit changes, for logging and event metadata.
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = self.fields.changed_fields();
        if self.steps.is_some() {
            fields.push("steps");
        }
        if self.ingredients.is_some() {
            fields.push("ingredients");
        }
        fields
    }
}

pub struct SyncPropagator;

impl SyncPropagator {
    /// Recipes that must mirror an edit made to `recipe`, excluding `recipe`.
    ///
    /// - personal: its community-linked copies;
    /// - community-linked: its origin (if still present and synchronized)
    ///   plus every other community-linked copy of that origin;
    /// - fork or variant: nothing.
    pub async fn linked_set(tx: &mut dyn StoreTx, recipe: &Recipe) -> ServiceResult<Vec<Recipe>> {
        match recipe.kind() {
            RecipeKind::Personal => Self::linked_copies(tx, recipe.id, recipe.id).await,
            RecipeKind::CommunityLinked => {
                let Some(origin_id) = recipe.origin_recipe_id else {
                    return Ok(Vec::new());
                };
                let mut linked = Vec::new();
                match tx.find_recipe(origin_id).await? {
                    Some(origin) if origin.kind().is_synchronized() => linked.push(origin),
                    Some(_) => {}
                    None => tracing::warn!(
                        recipe_id = recipe.id,
                        origin_recipe_id = origin_id,
                        "Origin recipe missing, propagating to siblings only"
                    ),
                }
                linked.extend(Self::linked_copies(tx, origin_id, recipe.id).await?);
                Ok(linked)
            }
            RecipeKind::Fork | RecipeKind::Variant => Ok(Vec::new()),
        }
    }

    async fn linked_copies(
        tx: &mut dyn StoreTx,
        origin_id: DbId,
        exclude_id: DbId,
    ) -> ServiceResult<Vec<Recipe>> {
        Ok(tx
            .list_recipes_by_origin(origin_id)
            .await?
            .into_iter()
            .filter(|r| r.id != exclude_id && r.kind() == RecipeKind::CommunityLinked)
            .collect())
    }

    /// Apply `edit` to one recipe. Scalars follow partial-update rules;
    /// steps and ingredient lines are replaced wholesale when supplied.
    pub async fn apply(
        tx: &mut dyn StoreTx,
        recipe_id: DbId,
        edit: &ResolvedEdit,
    ) -> ServiceResult<Recipe> {
        let updated = tx
            .update_recipe_fields(recipe_id, &edit.fields)
            .await?
            .ok_or_else(|| ServiceError::not_found("Recipe", recipe_id))?;
        if let Some(steps) = &edit.steps {
            tx.replace_steps(recipe_id, steps).await?;
        }
        if let Some(lines) = &edit.ingredients {
            tx.replace_ingredient_lines(recipe_id, lines).await?;
        }
        Ok(updated)
    }

    /// Replay `edit`, already applied to `source`, onto its linked set.
    ///
    /// Returns the updated linked recipes. Edits to forks and variants
    /// return an empty list.
    pub async fn propagate(
        tx: &mut dyn StoreTx,
        source: &Recipe,
        edit: &ResolvedEdit,
    ) -> ServiceResult<Vec<Recipe>> {
        let linked = Self::linked_set(tx, source).await?;
        let mut updated = Vec::with_capacity(linked.len());
        for target in linked {
            updated.push(Self::apply(tx, target.id, edit).await?);
        }

        if !updated.is_empty() {
            tracing::info!(
                recipe_id = source.id,
                propagated = updated.len(),
                fields = ?edit.changed_fields(),
                "Propagated recipe edit to linked copies"
            );
        }
        Ok(updated)
    }
}
