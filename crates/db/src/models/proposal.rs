//! Recipe update proposals and their shadow steps / ingredient lines.

use forkful_core::proposal::{ProposalStatus, ProposedFields};
use forkful_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from `recipe_update_proposals`.
///
/// `proposes_steps` / `proposes_ingredients` record whether the proposer
/// supplied those lists at all, so an empty list is distinguishable from
/// "leave unchanged".
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Proposal {
    pub id: DbId,
    pub recipe_id: DbId,
    pub proposer_id: DbId,
    pub title: Option<String>,
    pub servings: Option<i32>,
    pub prep_time: Option<i32>,
    pub cook_time: Option<i32>,
    pub rest_time: Option<i32>,
    pub proposes_steps: bool,
    pub proposes_ingredients: bool,
    #[sqlx(try_from = "String")]
    pub status: ProposalStatus,
    pub created_at: Timestamp,
    pub decided_at: Option<Timestamp>,
}

impl Proposal {
    pub fn fields(&self) -> ProposedFields {
        ProposedFields {
            title: self.title.clone(),
            servings: self.servings,
            prep_time: self.prep_time,
            cook_time: self.cook_time,
            rest_time: self.rest_time,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewProposal {
    pub recipe_id: DbId,
    pub proposer_id: DbId,
    pub fields: ProposedFields,
    pub proposes_steps: bool,
    pub proposes_ingredients: bool,
}

/// A row from `proposal_ingredients`, joined with the ingredient name.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct ProposalIngredient {
    pub proposal_id: DbId,
    pub ingredient_id: DbId,
    pub ingredient_name: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub position: i32,
}
