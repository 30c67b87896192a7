//! Row structs and insert DTOs.
//!
//! Each submodule contains a `FromRow` + `Serialize` entity matching the
//! database row and, where the store inserts it, a `New*` input struct.

pub mod activity;
pub mod community;
pub mod ingredient;
pub mod proposal;
pub mod recipe;
pub mod tag;
pub mod tag_suggestion;
