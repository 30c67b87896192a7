//! Recipe family services.
//!
//! Each component is a zero-sized struct whose operations take the open
//! transaction (`&mut dyn StoreTx`) as their first argument and stage
//! domain events in an [`EventQueue`]. [`RecipeService`] owns transaction
//! boundaries: it begins, runs one operation, commits, and only then hands
//! the staged events to the [`EventSink`].

pub mod access;
pub mod error;
pub mod events;
pub mod graph;
pub mod ingredient_resolver;
pub mod moderation;
pub mod proposal;
pub mod service;
pub mod share;
pub mod sync;
pub mod tag_resolver;
pub mod tag_suggestion;

pub use error::{ServiceError, ServiceResult};
pub use events::{EventQueue, EventSink};
pub use graph::{RecipeDetail, RecipeGraph};
pub use ingredient_resolver::IngredientResolver;
pub use moderation::TagModeration;
pub use proposal::{AcceptedProposal, ProposalLifecycle, RejectedProposal};
pub use service::{NewRecipeInput, RecipeService};
pub use share::{ForkedRecipe, RecipeSummary, ShareForkEngine};
pub use sync::{ResolvedEdit, SyncPropagator};
pub use tag_resolver::{ResolvedTags, TagResolver};
pub use tag_suggestion::{SuggestionDecision, TagSuggestionLifecycle};
