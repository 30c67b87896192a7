//! Tag suggestion state machine.
//!
//! `PENDING_OWNER` is the only non-terminal state. The owner's acceptance
//! ends in `APPROVED` when an approved tag already exists, otherwise in
//! `PENDING_MODERATOR` while the freshly created community tag awaits review.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TagSuggestionStatus {
    PendingOwner,
    Approved,
    PendingModerator,
    Rejected,
}

impl TagSuggestionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TagSuggestionStatus::PendingOwner => "PENDING_OWNER",
            TagSuggestionStatus::Approved => "APPROVED",
            TagSuggestionStatus::PendingModerator => "PENDING_MODERATOR",
            TagSuggestionStatus::Rejected => "REJECTED",
        }
    }
}

impl TryFrom<String> for TagSuggestionStatus {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "PENDING_OWNER" => Ok(TagSuggestionStatus::PendingOwner),
            "APPROVED" => Ok(TagSuggestionStatus::Approved),
            "PENDING_MODERATOR" => Ok(TagSuggestionStatus::PendingModerator),
            "REJECTED" => Ok(TagSuggestionStatus::Rejected),
            other => Err(CoreError::Internal(format!(
                "Unknown tag suggestion status '{other}'"
            ))),
        }
    }
}

/// Only suggestions still waiting on the owner may be decided by the owner.
pub fn ensure_pending_owner(status: TagSuggestionStatus) -> Result<(), CoreError> {
    if status == TagSuggestionStatus::PendingOwner {
        Ok(())
    } else {
        Err(CoreError::AlreadyDecided {
            entity: "TagSuggestion",
            status: status.as_str(),
        })
    }
}

/// Outcome of an owner's acceptance, given whether an approved tag already exists.
pub fn accepted_status(approved_tag_exists: bool) -> TagSuggestionStatus {
    if approved_tag_exists {
        TagSuggestionStatus::Approved
    } else {
        TagSuggestionStatus::PendingModerator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn only_pending_owner_is_decidable() {
        assert!(ensure_pending_owner(TagSuggestionStatus::PendingOwner).is_ok());
        for status in [
            TagSuggestionStatus::Approved,
            TagSuggestionStatus::PendingModerator,
            TagSuggestionStatus::Rejected,
        ] {
            assert_matches!(
                ensure_pending_owner(status),
                Err(CoreError::AlreadyDecided { .. })
            );
        }
    }

    #[test]
    fn acceptance_outcome() {
        assert_eq!(accepted_status(true), TagSuggestionStatus::Approved);
        assert_eq!(accepted_status(false), TagSuggestionStatus::PendingModerator);
    }
}
