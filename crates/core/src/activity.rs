//! Domain events describing what happened to recipes, proposals, and tags.
//!
//! The core only classifies *what* happened. Deciding who hears about it
//! (community broadcast or targeted recipients) belongs to the event layer.

use serde::{Deserialize, Serialize};

use crate::types::DbId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityKind {
    RecipeCreated,
    RecipeUpdated,
    RecipeDeleted,
    RecipeShared,
    RecipePublished,
    VariantProposed,
    ProposalAccepted,
    ProposalRejected,
    VariantCreated,
    TagSuggestionCreated,
    TagSuggestionApproved,
    TagSuggestionRejected,
    TagSuggestionPendingModerator,
    TagApproved,
    TagRejected,
}

impl ActivityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityKind::RecipeCreated => "RECIPE_CREATED",
            ActivityKind::RecipeUpdated => "RECIPE_UPDATED",
            ActivityKind::RecipeDeleted => "RECIPE_DELETED",
            ActivityKind::RecipeShared => "RECIPE_SHARED",
            ActivityKind::RecipePublished => "RECIPE_PUBLISHED",
            ActivityKind::VariantProposed => "VARIANT_PROPOSED",
            ActivityKind::ProposalAccepted => "PROPOSAL_ACCEPTED",
            ActivityKind::ProposalRejected => "PROPOSAL_REJECTED",
            ActivityKind::VariantCreated => "VARIANT_CREATED",
            ActivityKind::TagSuggestionCreated => "TAG_SUGGESTION_CREATED",
            ActivityKind::TagSuggestionApproved => "TAG_SUGGESTION_APPROVED",
            ActivityKind::TagSuggestionRejected => "TAG_SUGGESTION_REJECTED",
            ActivityKind::TagSuggestionPendingModerator => "TAG_SUGGESTION_PENDING_MODERATOR",
            ActivityKind::TagApproved => "TAG_APPROVED",
            ActivityKind::TagRejected => "TAG_REJECTED",
        }
    }
}

impl std::fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A committed mutation, ready to hand to the event layer.
///
/// Built with [`DomainEvent::new`] and the builder methods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEvent {
    pub kind: ActivityKind,
    pub actor_user_id: DbId,
    pub community_id: Option<DbId>,
    /// `None` for events about the tag vocabulary rather than a recipe.
    pub recipe_id: Option<DbId>,
    /// Explicit recipients for personal notifications. Empty means the
    /// event layer decides the audience.
    pub recipient_ids: Vec<DbId>,
    pub metadata: serde_json::Value,
}

impl DomainEvent {
    pub fn new(kind: ActivityKind, actor_user_id: DbId) -> Self {
        Self {
            kind,
            actor_user_id,
            community_id: None,
            recipe_id: None,
            recipient_ids: Vec::new(),
            metadata: serde_json::Value::Object(Default::default()),
        }
    }

    pub fn for_recipe(mut self, recipe_id: DbId) -> Self {
        self.recipe_id = Some(recipe_id);
        self
    }

    pub fn in_community(mut self, community_id: Option<DbId>) -> Self {
        self.community_id = community_id;
        self
    }

    pub fn with_recipients(mut self, recipient_ids: Vec<DbId>) -> Self {
        self.recipient_ids = recipient_ids;
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}
