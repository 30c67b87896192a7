use forkful_core::tags::{TagScope, TagStatus};
use forkful_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `tags` table.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Tag {
    pub id: DbId,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub scope: TagScope,
    #[sqlx(try_from = "String")]
    pub status: TagStatus,
    pub community_id: Option<DbId>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
}

impl Tag {
    pub fn is_pending(&self) -> bool {
        self.status == TagStatus::Pending
    }
}

/// Input for inserting a tag. `community_id` must be set iff scope is COMMUNITY.
#[derive(Debug, Clone)]
pub struct NewTag {
    pub name: String,
    pub scope: TagScope,
    pub status: TagStatus,
    pub community_id: Option<DbId>,
    pub created_by: Option<DbId>,
}

impl NewTag {
    /// A COMMUNITY tag awaiting moderation, attributed to `created_by`.
    pub fn pending_community(name: &str, community_id: DbId, created_by: DbId) -> Self {
        Self {
            name: name.to_string(),
            scope: TagScope::Community,
            status: TagStatus::Pending,
            community_id: Some(community_id),
            created_by: Some(created_by),
        }
    }

    /// An approved GLOBAL tag. `created_by` is `None` for seeded tags.
    pub fn approved_global(name: &str, created_by: Option<DbId>) -> Self {
        Self {
            name: name.to_string(),
            scope: TagScope::Global,
            status: TagStatus::Approved,
            community_id: None,
            created_by,
        }
    }
}
