//! Repository for the `activity_events` table.

use forkful_core::activity::DomainEvent;
use forkful_core::types::DbId;
use sqlx::PgConnection;

use crate::models::activity::ActivityEvent;

const COLUMNS: &str =
    "id, kind, actor_user_id, community_id, recipe_id, recipient_ids, metadata, created_at";

pub struct ActivityRepo;

impl ActivityRepo {
    pub async fn insert(conn: &mut PgConnection, event: &DomainEvent) -> Result<DbId, sqlx::Error> {
        let row: (DbId,) = sqlx::query_as(
            "INSERT INTO activity_events
                (kind, actor_user_id, community_id, recipe_id, recipient_ids, metadata)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id",
        )
        .bind(event.kind.as_str())
        .bind(event.actor_user_id)
        .bind(event.community_id)
        .bind(event.recipe_id)
        .bind(&event.recipient_ids)
        .bind(&event.metadata)
        .fetch_one(conn)
        .await?;
        Ok(row.0)
    }

    /// Most recent events for a community, newest first.
    pub async fn list_for_community(
        conn: &mut PgConnection,
        community_id: DbId,
        limit: i64,
    ) -> Result<Vec<ActivityEvent>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM activity_events
             WHERE community_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2"
        );
        sqlx::query_as::<_, ActivityEvent>(&query)
            .bind(community_id)
            .bind(limit)
            .fetch_all(conn)
            .await
    }
}
