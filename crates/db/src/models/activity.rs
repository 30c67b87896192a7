use forkful_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A persisted domain event from `activity_events`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ActivityEvent {
    pub id: DbId,
    pub kind: String,
    pub actor_user_id: DbId,
    pub community_id: Option<DbId>,
    pub recipe_id: Option<DbId>,
    pub recipient_ids: Vec<DbId>,
    pub metadata: serde_json::Value,
    pub created_at: Timestamp,
}
