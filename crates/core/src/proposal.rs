//! Recipe update proposals: shape checks, state machine, and staleness rule.
//!
//! A proposal is created PENDING and decided exactly once by the recipe's
//! creator. Acceptance is refused when the recipe changed after the proposal
//! was written, so a proposer never silently overwrites edits they never saw.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::ingredients::{
    validate_ingredient_lines, validate_proposal_ingredient_count, IngredientInput,
};
use crate::recipe::{validate_steps, validate_title, FieldPatch};
use crate::types::Timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProposalStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ProposalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProposalStatus::Pending => "PENDING",
            ProposalStatus::Accepted => "ACCEPTED",
            ProposalStatus::Rejected => "REJECTED",
        }
    }
}

impl TryFrom<String> for ProposalStatus {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "PENDING" => Ok(ProposalStatus::Pending),
            "ACCEPTED" => Ok(ProposalStatus::Accepted),
            "REJECTED" => Ok(ProposalStatus::Rejected),
            other => Err(CoreError::Internal(format!(
                "Unknown proposal status '{other}'"
            ))),
        }
    }
}

/// Proposed replacement values. `None` means "keep the recipe's value".
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProposalDraft {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(range(min = 1, max = 100))]
    pub servings: Option<i32>,
    #[validate(range(min = 0, max = 10000))]
    pub prep_time: Option<i32>,
    #[validate(range(min = 0, max = 10000))]
    pub cook_time: Option<i32>,
    #[validate(range(min = 0, max = 10000))]
    pub rest_time: Option<i32>,
    pub steps: Option<Vec<String>>,
    pub ingredients: Option<Vec<IngredientInput>>,
}

impl ProposalDraft {
    pub fn check(&self) -> Result<(), CoreError> {
        self.validate()?;
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(steps) = &self.steps {
            validate_steps(steps)?;
        }
        if let Some(lines) = &self.ingredients {
            validate_proposal_ingredient_count(lines.len())?;
            validate_ingredient_lines(lines)?;
        }
        let proposes_scalar = self.title.is_some()
            || self.servings.is_some()
            || self.prep_time.is_some()
            || self.cook_time.is_some()
            || self.rest_time.is_some();
        if !proposes_scalar && self.steps.is_none() && self.ingredients.is_none() {
            return Err(CoreError::Validation(
                "A proposal must change at least one field".to_string(),
            ));
        }
        Ok(())
    }
}

/// Scalar proposal values, as stored. Converted to a [`FieldPatch`] on acceptance.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProposedFields {
    pub title: Option<String>,
    pub servings: Option<i32>,
    pub prep_time: Option<i32>,
    pub cook_time: Option<i32>,
    pub rest_time: Option<i32>,
}

impl ProposedFields {
    /// Only values the proposal actually specified become part of the patch.
    pub fn to_patch(&self) -> FieldPatch {
        FieldPatch {
            title: self.title.clone(),
            servings: self.servings,
            prep_time: self.prep_time.map(Some),
            cook_time: self.cook_time.map(Some),
            rest_time: self.rest_time.map(Some),
            image_url: None,
        }
    }
}

impl From<&ProposalDraft> for ProposedFields {
    fn from(draft: &ProposalDraft) -> Self {
        Self {
            title: draft.title.clone(),
            servings: draft.servings,
            prep_time: draft.prep_time,
            cook_time: draft.cook_time,
            rest_time: draft.rest_time,
        }
    }
}

/// Only PENDING proposals may be decided.
pub fn ensure_pending(status: ProposalStatus) -> Result<(), CoreError> {
    if status == ProposalStatus::Pending {
        Ok(())
    } else {
        Err(CoreError::AlreadyDecided {
            entity: "Proposal",
            status: status.as_str(),
        })
    }
}

/// A proposal is stale once its recipe was updated after the proposal was created.
pub fn is_stale(recipe_updated_at: Timestamp, proposal_created_at: Timestamp) -> bool {
    recipe_updated_at > proposal_created_at
}
