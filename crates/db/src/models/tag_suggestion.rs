use forkful_core::tag_suggestion::TagSuggestionStatus;
use forkful_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from `tag_suggestions`. Unique per (recipe, tag name, suggester).
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct TagSuggestion {
    pub id: DbId,
    pub recipe_id: DbId,
    pub tag_name: String,
    pub suggested_by: DbId,
    #[sqlx(try_from = "String")]
    pub status: TagSuggestionStatus,
    pub created_at: Timestamp,
    pub decided_at: Option<Timestamp>,
}

#[derive(Debug, Clone)]
pub struct NewTagSuggestion {
    pub recipe_id: DbId,
    pub tag_name: String,
    pub suggested_by: DbId,
}
