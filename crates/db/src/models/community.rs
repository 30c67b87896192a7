use forkful_core::membership::MemberRole;
use forkful_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `communities` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Community {
    pub id: DbId,
    pub name: String,
    pub created_at: Timestamp,
}

/// A row from `community_members`.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct CommunityMember {
    pub community_id: DbId,
    pub user_id: DbId,
    #[sqlx(try_from = "String")]
    pub role: MemberRole,
    pub joined_at: Timestamp,
}
