//! Tag vocabulary rules: scopes, moderation status, name normalization, and caps.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const MIN_TAG_NAME_LENGTH: usize = 2;
pub const MAX_TAG_NAME_LENGTH: usize = 50;

/// Maximum number of tags linked to a single recipe.
pub const MAX_TAGS_PER_RECIPE: usize = 10;

/// Maximum number of names accepted by one resolution call.
pub const MAX_TAGS_PER_RESOLVE: usize = 10;

/// Maximum number of COMMUNITY-scope tags a community may own.
pub const MAX_COMMUNITY_TAGS: i64 = 100;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TagScope {
    Global,
    Community,
}

impl TagScope {
    pub fn as_str(self) -> &'static str {
        match self {
            TagScope::Global => "GLOBAL",
            TagScope::Community => "COMMUNITY",
        }
    }
}

impl TryFrom<String> for TagScope {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "GLOBAL" => Ok(TagScope::Global),
            "COMMUNITY" => Ok(TagScope::Community),
            other => Err(CoreError::Internal(format!("Unknown tag scope '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TagStatus {
    Approved,
    Pending,
}

impl TagStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TagStatus::Approved => "APPROVED",
            TagStatus::Pending => "PENDING",
        }
    }
}

impl TryFrom<String> for TagStatus {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "APPROVED" => Ok(TagStatus::Approved),
            "PENDING" => Ok(TagStatus::Pending),
            other => Err(CoreError::Internal(format!("Unknown tag status '{other}'"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Normalize a tag name: trim, lowercase, and collapse inner whitespace runs.
pub fn normalize_tag_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Check the length of an already-normalized tag name.
pub fn validate_tag_name(normalized: &str) -> Result<(), CoreError> {
    let len = normalized.chars().count();
    if !(MIN_TAG_NAME_LENGTH..=MAX_TAG_NAME_LENGTH).contains(&len) {
        return Err(CoreError::Validation(format!(
            "Tag name must be between {MIN_TAG_NAME_LENGTH} and {MAX_TAG_NAME_LENGTH} \
             characters, got '{normalized}'"
        )));
    }
    Ok(())
}

/// Normalize, validate, and deduplicate a batch of tag names.
///
/// Order of first occurrence is preserved. More than
/// [`MAX_TAGS_PER_RESOLVE`] distinct names is a [`CoreError::LimitExceeded`].
pub fn normalize_tag_names<S: AsRef<str>>(names: &[S]) -> Result<Vec<String>, CoreError> {
    let mut normalized: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let name = normalize_tag_name(name.as_ref());
        validate_tag_name(&name)?;
        if !normalized.contains(&name) {
            normalized.push(name);
        }
    }
    if normalized.len() > MAX_TAGS_PER_RESOLVE {
        return Err(CoreError::LimitExceeded(format!(
            "At most {MAX_TAGS_PER_RESOLVE} tags may be resolved at once, got {}",
            normalized.len()
        )));
    }
    Ok(normalized)
}

/// Fail if a recipe would end up with more than [`MAX_TAGS_PER_RECIPE`] tags.
pub fn validate_recipe_tag_count(resulting_count: usize) -> Result<(), CoreError> {
    if resulting_count > MAX_TAGS_PER_RECIPE {
        return Err(CoreError::LimitExceeded(format!(
            "A recipe may carry at most {MAX_TAGS_PER_RECIPE} tags"
        )));
    }
    Ok(())
}

/// Fail if a community already owns [`MAX_COMMUNITY_TAGS`] community tags.
pub fn validate_community_tag_capacity(current_count: i64) -> Result<(), CoreError> {
    if current_count >= MAX_COMMUNITY_TAGS {
        return Err(CoreError::LimitExceeded(format!(
            "Community already has the maximum of {MAX_COMMUNITY_TAGS} tags"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn normalize_trims_lowercases_and_collapses() {
        assert_eq!(normalize_tag_name("  Gluten   Free "), "gluten free");
        assert_eq!(normalize_tag_name("VEGAN"), "vegan");
    }

    #[test]
    fn dedup_preserves_first_occurrence() {
        let names = normalize_tag_names(&["Vegan", "quick", " vegan "]).unwrap();
        assert_eq!(names, vec!["vegan", "quick"]);
    }

    #[test]
    fn too_short_and_too_long_rejected() {
        assert_matches!(normalize_tag_names(&["a"]), Err(CoreError::Validation(_)));
        let long = "x".repeat(MAX_TAG_NAME_LENGTH + 1);
        assert_matches!(normalize_tag_names(&[long]), Err(CoreError::Validation(_)));
    }

    #[test]
    fn more_than_ten_distinct_names_rejected() {
        let names: Vec<String> = (0..11).map(|i| format!("tag{i}")).collect();
        assert_matches!(normalize_tag_names(&names), Err(CoreError::LimitExceeded(_)));
    }

    #[test]
    fn duplicates_do_not_count_toward_cap() {
        let mut names: Vec<String> = (0..10).map(|i| format!("tag{i}")).collect();
        names.push("TAG0".to_string());
        assert_eq!(normalize_tag_names(&names).unwrap().len(), 10);
    }

    #[test]
    fn community_capacity() {
        assert!(validate_community_tag_capacity(99).is_ok());
        assert_matches!(
            validate_community_tag_capacity(100),
            Err(CoreError::LimitExceeded(_))
        );
    }

    #[test]
    fn scope_and_status_round_trip_from_text() {
        assert_eq!(TagScope::try_from("COMMUNITY".to_string()).unwrap(), TagScope::Community);
        assert_eq!(TagStatus::try_from("PENDING".to_string()).unwrap(), TagStatus::Pending);
        assert!(TagScope::try_from("local".to_string()).is_err());
    }
}
