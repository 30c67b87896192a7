//! Ingredient naming rules and line validation.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Maximum length of a normalized ingredient name.
pub const MAX_INGREDIENT_NAME_LENGTH: usize = 100;

/// Maximum number of ingredient lines a proposal may carry.
pub const MAX_PROPOSAL_INGREDIENTS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IngredientStatus {
    Approved,
    Pending,
}

impl IngredientStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            IngredientStatus::Approved => "APPROVED",
            IngredientStatus::Pending => "PENDING",
        }
    }

    /// User-attributed ingredients await moderation; seed/admin ones do not.
    pub fn for_creator<T>(created_by: Option<T>) -> Self {
        if created_by.is_some() {
            IngredientStatus::Pending
        } else {
            IngredientStatus::Approved
        }
    }
}

impl TryFrom<String> for IngredientStatus {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "APPROVED" => Ok(IngredientStatus::Approved),
            "PENDING" => Ok(IngredientStatus::Pending),
            other => Err(CoreError::Internal(format!(
                "Unknown ingredient status '{other}'"
            ))),
        }
    }
}

/// One ingredient line as supplied by a caller. Position is implied by the
/// index in the surrounding list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientInput {
    pub name: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
}

/// Ingredient names are unique case-insensitively; store them trimmed and lowercased.
pub fn normalize_ingredient_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub fn validate_ingredient_lines(lines: &[IngredientInput]) -> Result<(), CoreError> {
    for (index, line) in lines.iter().enumerate() {
        let name = normalize_ingredient_name(&line.name);
        if name.is_empty() {
            return Err(CoreError::Validation(format!(
                "Ingredient {} must have a name",
                index + 1
            )));
        }
        if name.chars().count() > MAX_INGREDIENT_NAME_LENGTH {
            return Err(CoreError::Validation(format!(
                "Ingredient name must not exceed {MAX_INGREDIENT_NAME_LENGTH} characters"
            )));
        }
        if let Some(quantity) = line.quantity {
            if !quantity.is_finite() || quantity < 0.0 {
                return Err(CoreError::Validation(format!(
                    "Ingredient {} has an invalid quantity",
                    index + 1
                )));
            }
        }
    }
    Ok(())
}

/// Proposals carry at most [`MAX_PROPOSAL_INGREDIENTS`] lines.
pub fn validate_proposal_ingredient_count(count: usize) -> Result<(), CoreError> {
    if count > MAX_PROPOSAL_INGREDIENTS {
        return Err(CoreError::Validation(format!(
            "A proposal may include at most {MAX_PROPOSAL_INGREDIENTS} ingredients, got {count}"
        )));
    }
    Ok(())
}
