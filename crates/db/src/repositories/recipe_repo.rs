//! Repository for `recipes` and its child tables (`recipe_steps`,
//! `recipe_ingredients`, `recipe_tags`, `recipe_analytics`).

use forkful_core::recipe::FieldPatch;
use forkful_core::types::DbId;
use sqlx::PgConnection;

use crate::models::recipe::{IngredientLine, NewRecipe, Recipe, RecipeIngredient, RecipeStep};
use crate::models::tag::Tag;

/// Column list for recipes queries.
const COLUMNS: &str = "id, title, servings, prep_time, cook_time, rest_time, image_url, \
    creator_id, community_id, origin_recipe_id, shared_from_community_id, is_variant, \
    deleted_at, created_at, updated_at";

pub struct RecipeRepo;

impl RecipeRepo {
    pub async fn create(conn: &mut PgConnection, input: &NewRecipe) -> Result<Recipe, sqlx::Error> {
        let query = format!(
            "INSERT INTO recipes
                (title, servings, prep_time, cook_time, rest_time, image_url, creator_id,
                 community_id, origin_recipe_id, shared_from_community_id, is_variant)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Recipe>(&query)
            .bind(&input.title)
            .bind(input.servings)
            .bind(input.prep_time)
            .bind(input.cook_time)
            .bind(input.rest_time)
            .bind(&input.image_url)
            .bind(input.creator_id)
            .bind(input.community_id)
            .bind(input.origin_recipe_id)
            .bind(input.shared_from_community_id)
            .bind(input.is_variant)
            .fetch_one(conn)
            .await
    }

    /// Find a non-deleted recipe by id.
    pub async fn find_by_id(conn: &mut PgConnection, id: DbId) -> Result<Option<Recipe>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM recipes WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Recipe>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Non-deleted recipes whose `origin_recipe_id` is `origin_id`, oldest first.
    pub async fn list_by_origin(
        conn: &mut PgConnection,
        origin_id: DbId,
    ) -> Result<Vec<Recipe>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM recipes
             WHERE origin_recipe_id = $1 AND deleted_at IS NULL
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, Recipe>(&query)
            .bind(origin_id)
            .fetch_all(conn)
            .await
    }

    /// Apply the supplied fields and bump `updated_at`.
    ///
    /// Nullable columns use a presence flag so that "not supplied" and
    /// "explicitly cleared" stay distinct. An empty patch only bumps
    /// `updated_at`.
    pub async fn update_fields(
        conn: &mut PgConnection,
        id: DbId,
        patch: &FieldPatch,
    ) -> Result<Option<Recipe>, sqlx::Error> {
        let query = format!(
            "UPDATE recipes SET
                title = COALESCE($2, title),
                servings = COALESCE($3, servings),
                prep_time = CASE WHEN $4 THEN $5 ELSE prep_time END,
                cook_time = CASE WHEN $6 THEN $7 ELSE cook_time END,
                rest_time = CASE WHEN $8 THEN $9 ELSE rest_time END,
                image_url = CASE WHEN $10 THEN $11 ELSE image_url END,
                updated_at = NOW()
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Recipe>(&query)
            .bind(id)
            .bind(&patch.title)
            .bind(patch.servings)
            .bind(patch.prep_time.is_some())
            .bind(patch.prep_time.flatten())
            .bind(patch.cook_time.is_some())
            .bind(patch.cook_time.flatten())
            .bind(patch.rest_time.is_some())
            .bind(patch.rest_time.flatten())
            .bind(patch.image_url.is_some())
            .bind(patch.image_url.clone().flatten())
            .fetch_optional(conn)
            .await
    }

    /// Soft-delete a recipe. Returns `false` if it was missing or already deleted.
    pub async fn soft_delete(conn: &mut PgConnection, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE recipes SET deleted_at = NOW()
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Steps
    // -----------------------------------------------------------------------

    /// Delete every step and insert `steps` in order.
    pub async fn replace_steps(
        conn: &mut PgConnection,
        recipe_id: DbId,
        steps: &[String],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM recipe_steps WHERE recipe_id = $1")
            .bind(recipe_id)
            .execute(&mut *conn)
            .await?;

        for (position, instruction) in steps.iter().enumerate() {
            sqlx::query(
                "INSERT INTO recipe_steps (recipe_id, position, instruction) VALUES ($1, $2, $3)",
            )
            .bind(recipe_id)
            .bind(position as i32)
            .bind(instruction)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    pub async fn list_steps(
        conn: &mut PgConnection,
        recipe_id: DbId,
    ) -> Result<Vec<RecipeStep>, sqlx::Error> {
        sqlx::query_as::<_, RecipeStep>(
            "SELECT recipe_id, position, instruction FROM recipe_steps
             WHERE recipe_id = $1 ORDER BY position ASC",
        )
        .bind(recipe_id)
        .fetch_all(conn)
        .await
    }

    // -----------------------------------------------------------------------
    // Ingredient lines
    // -----------------------------------------------------------------------

    pub async fn replace_ingredients(
        conn: &mut PgConnection,
        recipe_id: DbId,
        lines: &[IngredientLine],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
            .bind(recipe_id)
            .execute(&mut *conn)
            .await?;

        for line in lines {
            sqlx::query(
                "INSERT INTO recipe_ingredients
                    (recipe_id, ingredient_id, quantity, unit, position)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(recipe_id)
            .bind(line.ingredient_id)
            .bind(line.quantity)
            .bind(&line.unit)
            .bind(line.position)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    pub async fn list_ingredients(
        conn: &mut PgConnection,
        recipe_id: DbId,
    ) -> Result<Vec<RecipeIngredient>, sqlx::Error> {
        sqlx::query_as::<_, RecipeIngredient>(
            "SELECT ri.recipe_id, ri.ingredient_id, i.name AS ingredient_name,
                    ri.quantity, ri.unit, ri.position
             FROM recipe_ingredients ri
             JOIN ingredients i ON i.id = ri.ingredient_id
             WHERE ri.recipe_id = $1
             ORDER BY ri.position ASC",
        )
        .bind(recipe_id)
        .fetch_all(conn)
        .await
    }

    // -----------------------------------------------------------------------
    // Tags
    // -----------------------------------------------------------------------

    /// Link a tag to a recipe. Linking an already-linked tag is a no-op.
    pub async fn link_tag(
        conn: &mut PgConnection,
        recipe_id: DbId,
        tag_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO recipe_tags (recipe_id, tag_id) VALUES ($1, $2)
             ON CONFLICT (recipe_id, tag_id) DO NOTHING",
        )
        .bind(recipe_id)
        .bind(tag_id)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Tags linked to a recipe, in link order.
    pub async fn list_tags(conn: &mut PgConnection, recipe_id: DbId) -> Result<Vec<Tag>, sqlx::Error> {
        sqlx::query_as::<_, Tag>(
            "SELECT t.id, t.name, t.scope, t.status, t.community_id, t.created_by, t.created_at
             FROM recipe_tags rt
             JOIN tags t ON t.id = rt.tag_id
             WHERE rt.recipe_id = $1
             ORDER BY rt.linked_at ASC, t.id ASC",
        )
        .bind(recipe_id)
        .fetch_all(conn)
        .await
    }

    // -----------------------------------------------------------------------
    // Analytics
    // -----------------------------------------------------------------------

    /// Increment the share counter, creating the row on first use.
    pub async fn increment_shares(conn: &mut PgConnection, recipe_id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO recipe_analytics (recipe_id, shares) VALUES ($1, 1)
             ON CONFLICT (recipe_id) DO UPDATE SET shares = recipe_analytics.shares + 1",
        )
        .bind(recipe_id)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn share_count(conn: &mut PgConnection, recipe_id: DbId) -> Result<i64, sqlx::Error> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT shares FROM recipe_analytics WHERE recipe_id = $1")
                .bind(recipe_id)
                .fetch_optional(conn)
                .await?;
        Ok(row.map(|r| r.0).unwrap_or(0))
    }
}
