//! Domain rules for the Forkful recipe-sharing platform.
//!
//! Everything in this crate is pure: classification of recipes in the
//! family graph, field validation, tag and ingredient name normalization,
//! and the proposal / tag-suggestion state machines. Persistence lives in
//! `forkful-db` and orchestration in `forkful-recipes`.

pub mod activity;
pub mod error;
pub mod ingredients;
pub mod membership;
pub mod proposal;
pub mod recipe;
pub mod tag_suggestion;
pub mod tags;
pub mod types;
