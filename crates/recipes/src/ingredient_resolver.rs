//! Ingredient lookup-or-create.
//!
//! Names are globally unique after normalization. A missing ingredient is
//! created PENDING when a user is acting and APPROVED on the seed path.

use forkful_core::ingredients::{normalize_ingredient_name, IngredientInput, IngredientStatus};
use forkful_core::types::DbId;
use forkful_db::models::ingredient::{Ingredient, NewIngredient};
use forkful_db::models::recipe::IngredientLine;
use forkful_db::StoreTx;

use crate::error::ServiceResult;

pub struct IngredientResolver;

impl IngredientResolver {
    /// Resolve every input line to an [`IngredientLine`] whose `position`
    /// is its index in `items`.
    pub async fn resolve(
        tx: &mut dyn StoreTx,
        items: &[IngredientInput],
        acting_user_id: Option<DbId>,
    ) -> ServiceResult<Vec<IngredientLine>> {
        let mut lines = Vec::with_capacity(items.len());
        for (position, item) in items.iter().enumerate() {
            let ingredient = Self::find_or_create(tx, &item.name, acting_user_id, None).await?;
            lines.push(IngredientLine {
                ingredient_id: ingredient.id,
                quantity: item.quantity,
                unit: item.unit.clone(),
                position: position as i32,
            });
        }
        Ok(lines)
    }

    /// Resolve `items` and replace the recipe's ingredient lines with them.
    pub async fn replace_lines(
        tx: &mut dyn StoreTx,
        recipe_id: DbId,
        items: &[IngredientInput],
        acting_user_id: Option<DbId>,
    ) -> ServiceResult<Vec<IngredientLine>> {
        let lines = Self::resolve(tx, items, acting_user_id).await?;
        tx.replace_ingredient_lines(recipe_id, &lines).await?;
        Ok(lines)
    }

    pub async fn find_or_create(
        tx: &mut dyn StoreTx,
        name: &str,
        acting_user_id: Option<DbId>,
        default_unit: Option<&str>,
    ) -> ServiceResult<Ingredient> {
        let name = normalize_ingredient_name(name);
        if let Some(existing) = tx.find_ingredient_by_name(&name).await? {
            return Ok(existing);
        }

        let ingredient = tx
            .insert_ingredient(&NewIngredient {
                status: IngredientStatus::for_creator(acting_user_id),
                name,
                default_unit: default_unit.map(str::to_string),
                created_by: acting_user_id,
            })
            .await?;
        tracing::debug!(
            ingredient_id = ingredient.id,
            name = %ingredient.name,
            status = ingredient.status.as_str(),
            "Created ingredient"
        );
        Ok(ingredient)
    }
}
