//! Recipe rows and their ordered children (steps, ingredient lines).

use forkful_core::recipe::RecipeKind;
use forkful_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A row from the `recipes` table.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Recipe {
    pub id: DbId,
    pub title: String,
    pub servings: i32,
    pub prep_time: Option<i32>,
    pub cook_time: Option<i32>,
    pub rest_time: Option<i32>,
    pub image_url: Option<String>,
    pub creator_id: DbId,
    pub community_id: Option<DbId>,
    pub origin_recipe_id: Option<DbId>,
    pub shared_from_community_id: Option<DbId>,
    pub is_variant: bool,
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Recipe {
    /// Derived position of this recipe in its family.
    pub fn kind(&self) -> RecipeKind {
        RecipeKind::classify(
            self.community_id,
            self.shared_from_community_id,
            self.is_variant,
        )
    }
}

/// Input for inserting a recipe row. Children are written separately.
#[derive(Debug, Clone)]
pub struct NewRecipe {
    pub title: String,
    pub servings: i32,
    pub prep_time: Option<i32>,
    pub cook_time: Option<i32>,
    pub rest_time: Option<i32>,
    pub image_url: Option<String>,
    pub creator_id: DbId,
    pub community_id: Option<DbId>,
    pub origin_recipe_id: Option<DbId>,
    pub shared_from_community_id: Option<DbId>,
    pub is_variant: bool,
}

impl NewRecipe {
    /// Copy the scalar values of `source` into a new row owned by `creator_id`
    /// in `community_id`, linked back to `source`.
    pub fn copy_of(source: &Recipe, creator_id: DbId, community_id: Option<DbId>) -> Self {
        Self {
            title: source.title.clone(),
            servings: source.servings,
            prep_time: source.prep_time,
            cook_time: source.cook_time,
            rest_time: source.rest_time,
            image_url: source.image_url.clone(),
            creator_id,
            community_id,
            origin_recipe_id: Some(source.id),
            shared_from_community_id: None,
            is_variant: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Children
// ---------------------------------------------------------------------------

/// A row from `recipe_steps`. `position` is 0-based.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct RecipeStep {
    pub recipe_id: DbId,
    pub position: i32,
    pub instruction: String,
}

/// A row from `recipe_ingredients`, joined with the ingredient name.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct RecipeIngredient {
    pub recipe_id: DbId,
    pub ingredient_id: DbId,
    pub ingredient_name: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub position: i32,
}

/// A resolved ingredient line ready to be written, for a recipe or a proposal.
#[derive(Debug, Clone, PartialEq)]
pub struct IngredientLine {
    pub ingredient_id: DbId,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub position: i32,
}

impl From<&RecipeIngredient> for IngredientLine {
    fn from(row: &RecipeIngredient) -> Self {
        Self {
            ingredient_id: row.ingredient_id,
            quantity: row.quantity,
            unit: row.unit.clone(),
            position: row.position,
        }
    }
}
