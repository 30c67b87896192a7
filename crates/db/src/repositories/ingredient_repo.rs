//! Repository for the `ingredients` table.

use sqlx::PgConnection;

use crate::models::ingredient::{Ingredient, NewIngredient};

const COLUMNS: &str = "id, name, status, default_unit, created_by, created_at";

pub struct IngredientRepo;

impl IngredientRepo {
    /// Look up by already-normalized name.
    pub async fn find_by_name(
        conn: &mut PgConnection,
        name: &str,
    ) -> Result<Option<Ingredient>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM ingredients WHERE name = $1");
        sqlx::query_as::<_, Ingredient>(&query)
            .bind(name)
            .fetch_optional(conn)
            .await
    }

    pub async fn create(
        conn: &mut PgConnection,
        input: &NewIngredient,
    ) -> Result<Ingredient, sqlx::Error> {
        let query = format!(
            "INSERT INTO ingredients (name, status, default_unit, created_by)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Ingredient>(&query)
            .bind(&input.name)
            .bind(input.status.as_str())
            .bind(&input.default_unit)
            .bind(input.created_by)
            .fetch_one(conn)
            .await
    }
}
