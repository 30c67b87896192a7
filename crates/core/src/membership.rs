//! Community membership roles and the sharing eligibility rule.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberRole {
    Member,
    Moderator,
}

impl MemberRole {
    pub fn as_str(self) -> &'static str {
        match self {
            MemberRole::Member => "MEMBER",
            MemberRole::Moderator => "MODERATOR",
        }
    }

    pub fn is_moderator(self) -> bool {
        self == MemberRole::Moderator
    }
}

impl TryFrom<String> for MemberRole {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "MEMBER" => Ok(MemberRole::Member),
            "MODERATOR" => Ok(MemberRole::Moderator),
            other => Err(CoreError::Internal(format!("Unknown member role '{other}'"))),
        }
    }
}

/// Decide whether an actor may fork a community recipe into another community.
///
/// The actor must belong to both communities and be either the recipe's
/// creator or a moderator in one of them.
pub fn validate_share_eligibility(
    is_creator: bool,
    source_role: Option<MemberRole>,
    target_role: Option<MemberRole>,
) -> Result<(), CoreError> {
    let (Some(source_role), Some(target_role)) = (source_role, target_role) else {
        return Err(CoreError::Forbidden(
            "You must be a member of both communities to share this recipe".to_string(),
        ));
    };
    if is_creator || source_role.is_moderator() || target_role.is_moderator() {
        Ok(())
    } else {
        Err(CoreError::Forbidden(
            "Only the recipe creator or a moderator can share this recipe".to_string(),
        ))
    }
}
