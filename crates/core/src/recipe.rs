//! Recipe classification, limits, and field validation.
//!
//! A recipe's place in the family graph is never stored as an enum; it is
//! derived from `community_id`, `shared_from_community_id`, and `is_variant`
//! by [`RecipeKind::classify`]. Sync propagation and forking both rely on
//! that single function.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::ingredients::{validate_ingredient_lines, IngredientInput};
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum length of a recipe title.
pub const MAX_TITLE_LENGTH: usize = 200;

/// Inclusive servings range.
pub const MIN_SERVINGS: i32 = 1;
pub const MAX_SERVINGS: i32 = 100;

/// Inclusive range for prep, cook, and rest time (minutes).
pub const MIN_TIME_MINUTES: i32 = 0;
pub const MAX_TIME_MINUTES: i32 = 10_000;

/// Maximum length of a single step instruction.
pub const MAX_STEP_LENGTH: usize = 5000;

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Position of a recipe in its family, derived from its stored fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecipeKind {
    /// No owning community.
    Personal,
    /// Community-owned, kept in sync with its personal origin and siblings.
    CommunityLinked,
    /// Shared across communities; isolated from sync.
    Fork,
    /// Branched from a rejected proposal; isolated from sync.
    Variant,
}

impl RecipeKind {
    pub fn classify(
        community_id: Option<DbId>,
        shared_from_community_id: Option<DbId>,
        is_variant: bool,
    ) -> Self {
        if is_variant {
            RecipeKind::Variant
        } else if shared_from_community_id.is_some() {
            RecipeKind::Fork
        } else if community_id.is_some() {
            RecipeKind::CommunityLinked
        } else {
            RecipeKind::Personal
        }
    }

    /// Whether edits to a recipe of this kind take part in field synchronization.
    pub fn is_synchronized(self) -> bool {
        matches!(self, RecipeKind::Personal | RecipeKind::CommunityLinked)
    }
}

// ---------------------------------------------------------------------------
// Drafts and patches
// ---------------------------------------------------------------------------

/// Full set of authored recipe values, used for direct creation and as the
/// shape check for proposals.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RecipeDraft {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(range(min = 1, max = 100))]
    pub servings: i32,
    #[validate(range(min = 0, max = 10000))]
    pub prep_time: Option<i32>,
    #[validate(range(min = 0, max = 10000))]
    pub cook_time: Option<i32>,
    #[validate(range(min = 0, max = 10000))]
    pub rest_time: Option<i32>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub steps: Vec<String>,
}

impl RecipeDraft {
    /// Validate every field, returning the first failure as [`CoreError::Validation`].
    pub fn check(&self) -> Result<(), CoreError> {
        self.validate()?;
        validate_title(&self.title)?;
        if let Some(url) = &self.image_url {
            validate_image_url(url)?;
        }
        validate_steps(&self.steps)
    }
}

/// Scalar fields supplied by an edit.
///
/// `None` means "not supplied, leave untouched". For nullable columns the
/// inner `Option` distinguishes "set to this value" from "explicitly clear".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldPatch {
    pub title: Option<String>,
    pub servings: Option<i32>,
    pub prep_time: Option<Option<i32>>,
    pub cook_time: Option<Option<i32>>,
    pub rest_time: Option<Option<i32>>,
    pub image_url: Option<Option<String>>,
}

impl FieldPatch {
    pub fn is_empty(&self) -> bool {
        self == &FieldPatch::default()
    }

    /// Names of the fields this patch supplies, for logging and event metadata.
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.title.is_some() {
            fields.push("title");
        }
        if self.servings.is_some() {
            fields.push("servings");
        }
        if self.prep_time.is_some() {
            fields.push("prepTime");
        }
        if self.cook_time.is_some() {
            fields.push("cookTime");
        }
        if self.rest_time.is_some() {
            fields.push("restTime");
        }
        if self.image_url.is_some() {
            fields.push("imageUrl");
        }
        fields
    }

    pub fn check(&self) -> Result<(), CoreError> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(servings) = self.servings {
            validate_servings(servings)?;
        }
        for (label, value) in [
            ("prep time", self.prep_time),
            ("cook time", self.cook_time),
            ("rest time", self.rest_time),
        ] {
            if let Some(Some(minutes)) = value {
                validate_minutes(label, minutes)?;
            }
        }
        if let Some(Some(url)) = &self.image_url {
            validate_image_url(url)?;
        }
        Ok(())
    }
}

/// A partial owner edit: scalar fields plus optional full replacements of
/// the step list and ingredient lines.
#[derive(Debug, Clone, Default)]
pub struct RecipeUpdate {
    pub fields: FieldPatch,
    pub steps: Option<Vec<String>>,
    pub ingredients: Option<Vec<IngredientInput>>,
}

impl RecipeUpdate {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.steps.is_none() && self.ingredients.is_none()
    }

    pub fn check(&self) -> Result<(), CoreError> {
        self.fields.check()?;
        if let Some(steps) = &self.steps {
            validate_steps(steps)?;
        }
        if let Some(lines) = &self.ingredients {
            validate_ingredient_lines(lines)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Field validation
// ---------------------------------------------------------------------------

pub fn validate_title(title: &str) -> Result<(), CoreError> {
    if title.trim().is_empty() {
        return Err(CoreError::Validation("Title must not be empty".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(CoreError::Validation(format!(
            "Title must not exceed {MAX_TITLE_LENGTH} characters"
        )));
    }
    Ok(())
}

pub fn validate_servings(servings: i32) -> Result<(), CoreError> {
    if !(MIN_SERVINGS..=MAX_SERVINGS).contains(&servings) {
        return Err(CoreError::Validation(format!(
            "Servings must be between {MIN_SERVINGS} and {MAX_SERVINGS}, got {servings}"
        )));
    }
    Ok(())
}

pub fn validate_minutes(label: &str, minutes: i32) -> Result<(), CoreError> {
    if !(MIN_TIME_MINUTES..=MAX_TIME_MINUTES).contains(&minutes) {
        return Err(CoreError::Validation(format!(
            "{label} must be between {MIN_TIME_MINUTES} and {MAX_TIME_MINUTES} minutes, got {minutes}"
        )));
    }
    Ok(())
}

/// Only absolute `http://` and `https://` URLs are accepted.
pub fn validate_image_url(url: &str) -> Result<(), CoreError> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    match rest {
        Some(host) if !host.is_empty() && !host.starts_with('/') => Ok(()),
        _ => Err(CoreError::Validation(
            "Image URL must be an http or https URL".to_string(),
        )),
    }
}

pub fn validate_steps(steps: &[String]) -> Result<(), CoreError> {
    for (index, step) in steps.iter().enumerate() {
        if step.trim().is_empty() {
            return Err(CoreError::Validation(format!(
                "Step {} must not be empty",
                index + 1
            )));
        }
        if step.chars().count() > MAX_STEP_LENGTH {
            return Err(CoreError::Validation(format!(
                "Step {} must not exceed {MAX_STEP_LENGTH} characters",
                index + 1
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
