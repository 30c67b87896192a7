//! Repository for the `tag_suggestions` table.

use forkful_core::tag_suggestion::TagSuggestionStatus;
use forkful_core::types::DbId;
use sqlx::PgConnection;

use crate::models::tag_suggestion::{NewTagSuggestion, TagSuggestion};

const COLUMNS: &str = "id, recipe_id, tag_name, suggested_by, status, created_at, decided_at";

pub struct TagSuggestionRepo;

impl TagSuggestionRepo {
    pub async fn create(
        conn: &mut PgConnection,
        input: &NewTagSuggestion,
    ) -> Result<TagSuggestion, sqlx::Error> {
        let query = format!(
            "INSERT INTO tag_suggestions (recipe_id, tag_name, suggested_by)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TagSuggestion>(&query)
            .bind(input.recipe_id)
            .bind(&input.tag_name)
            .bind(input.suggested_by)
            .fetch_one(conn)
            .await
    }

    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<TagSuggestion>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tag_suggestions WHERE id = $1");
        sqlx::query_as::<_, TagSuggestion>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    pub async fn find_by_key(
        conn: &mut PgConnection,
        recipe_id: DbId,
        tag_name: &str,
        suggested_by: DbId,
    ) -> Result<Option<TagSuggestion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tag_suggestions
             WHERE recipe_id = $1 AND tag_name = $2 AND suggested_by = $3"
        );
        sqlx::query_as::<_, TagSuggestion>(&query)
            .bind(recipe_id)
            .bind(tag_name)
            .bind(suggested_by)
            .fetch_optional(conn)
            .await
    }

    pub async fn set_status(
        conn: &mut PgConnection,
        id: DbId,
        status: TagSuggestionStatus,
    ) -> Result<Option<TagSuggestion>, sqlx::Error> {
        let query = format!(
            "UPDATE tag_suggestions SET status = $2, decided_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TagSuggestion>(&query)
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(conn)
            .await
    }

    /// Move every suggestion for `tag_name` on recipes in `community_id`
    /// from one status to another. Returns the number of rows moved.
    pub async fn transition_in_community(
        conn: &mut PgConnection,
        community_id: DbId,
        tag_name: &str,
        from: TagSuggestionStatus,
        to: TagSuggestionStatus,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE tag_suggestions s SET status = $4, decided_at = NOW()
             FROM recipes r
             WHERE s.recipe_id = r.id AND r.community_id = $1
               AND s.tag_name = $2 AND s.status = $3",
        )
        .bind(community_id)
        .bind(tag_name)
        .bind(from.as_str())
        .bind(to.as_str())
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }
}
