//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods
//! that accept `&mut PgConnection` as the first argument, so every call runs
//! on whichever transaction the caller holds.

pub mod activity_repo;
pub mod community_repo;
pub mod ingredient_repo;
pub mod proposal_repo;
pub mod recipe_repo;
pub mod tag_repo;
pub mod tag_suggestion_repo;

pub use activity_repo::ActivityRepo;
pub use community_repo::CommunityRepo;
pub use ingredient_repo::IngredientRepo;
pub use proposal_repo::ProposalRepo;
pub use recipe_repo::RecipeRepo;
pub use tag_repo::TagRepo;
pub use tag_suggestion_repo::TagSuggestionRepo;
