//! Repository for the `tags` table.

use forkful_core::tags::TagStatus;
use forkful_core::types::DbId;
use sqlx::PgConnection;

use crate::models::tag::{NewTag, Tag};

const COLUMNS: &str = "id, name, scope, status, community_id, created_by, created_at";

pub struct TagRepo;

impl TagRepo {
    pub async fn create(conn: &mut PgConnection, input: &NewTag) -> Result<Tag, sqlx::Error> {
        let query = format!(
            "INSERT INTO tags (name, scope, status, community_id, created_by)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Tag>(&query)
            .bind(&input.name)
            .bind(input.scope.as_str())
            .bind(input.status.as_str())
            .bind(input.community_id)
            .bind(input.created_by)
            .fetch_one(conn)
            .await
    }

    pub async fn find_by_id(conn: &mut PgConnection, id: DbId) -> Result<Option<Tag>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tags WHERE id = $1");
        sqlx::query_as::<_, Tag>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Find a GLOBAL tag by normalized name with the given status.
    pub async fn find_global(
        conn: &mut PgConnection,
        name: &str,
        status: TagStatus,
    ) -> Result<Option<Tag>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tags
             WHERE scope = 'GLOBAL' AND name = $1 AND status = $2"
        );
        sqlx::query_as::<_, Tag>(&query)
            .bind(name)
            .bind(status.as_str())
            .fetch_optional(conn)
            .await
    }

    /// Find a COMMUNITY tag by name in a community.
    ///
    /// With `status = None` any status matches, APPROVED preferred.
    pub async fn find_in_community(
        conn: &mut PgConnection,
        community_id: DbId,
        name: &str,
        status: Option<TagStatus>,
    ) -> Result<Option<Tag>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tags
             WHERE scope = 'COMMUNITY' AND community_id = $1 AND name = $2
               AND ($3::TEXT IS NULL OR status = $3)
             ORDER BY (status = 'APPROVED') DESC, id ASC
             LIMIT 1"
        );
        sqlx::query_as::<_, Tag>(&query)
            .bind(community_id)
            .bind(name)
            .bind(status.map(TagStatus::as_str))
            .fetch_optional(conn)
            .await
    }

    pub async fn count_in_community(
        conn: &mut PgConnection,
        community_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM tags WHERE scope = 'COMMUNITY' AND community_id = $1",
        )
        .bind(community_id)
        .fetch_one(conn)
        .await?;
        Ok(row.0)
    }

    pub async fn set_status(
        conn: &mut PgConnection,
        id: DbId,
        status: TagStatus,
    ) -> Result<Option<Tag>, sqlx::Error> {
        let query = format!("UPDATE tags SET status = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Tag>(&query)
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(conn)
            .await
    }

    /// Delete a tag. Recipe links go with it (`ON DELETE CASCADE`).
    pub async fn delete(conn: &mut PgConnection, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
