use forkful_core::ingredients::IngredientStatus;
use forkful_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `ingredients` table. `name` is normalized and globally unique.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Ingredient {
    pub id: DbId,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub status: IngredientStatus,
    pub default_unit: Option<String>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct NewIngredient {
    pub name: String,
    pub status: IngredientStatus,
    pub default_unit: Option<String>,
    pub created_by: Option<DbId>,
}
