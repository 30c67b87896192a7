//! The transaction-scoped persistence seam.
//!
//! Services never hold a pool or a global connection. Each operation calls
//! [`Store::begin`], threads the returned [`StoreTx`] through every helper,
//! and finishes with [`StoreTx::commit`]. Dropping an uncommitted handle
//! rolls back every write made through it.
//!
//! Recipe lookups only ever return non-deleted rows.

use async_trait::async_trait;
use forkful_core::membership::MemberRole;
use forkful_core::proposal::ProposalStatus;
use forkful_core::recipe::FieldPatch;
use forkful_core::tag_suggestion::TagSuggestionStatus;
use forkful_core::tags::TagStatus;
use forkful_core::types::DbId;

use crate::error::StoreResult;
use crate::models::community::Community;
use crate::models::ingredient::{Ingredient, NewIngredient};
use crate::models::proposal::{NewProposal, Proposal, ProposalIngredient};
use crate::models::recipe::{IngredientLine, NewRecipe, Recipe, RecipeIngredient, RecipeStep};
use crate::models::tag::{NewTag, Tag};
use crate::models::tag_suggestion::{NewTagSuggestion, TagSuggestion};

/// Factory for transactions.
#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>>;
}

/// One open transaction.
#[async_trait]
pub trait StoreTx: Send {
    // --- communities ---------------------------------------------------------

    async fn insert_community(&mut self, name: &str) -> StoreResult<Community>;
    async fn find_community(&mut self, id: DbId) -> StoreResult<Option<Community>>;
    /// Communities with the given ids, ordered by id. Unknown ids are skipped.
    async fn find_communities(&mut self, ids: &[DbId]) -> StoreResult<Vec<Community>>;
    async fn upsert_member(
        &mut self,
        community_id: DbId,
        user_id: DbId,
        role: MemberRole,
    ) -> StoreResult<()>;
    async fn member_role(&mut self, community_id: DbId, user_id: DbId)
        -> StoreResult<Option<MemberRole>>;

    // --- recipes -------------------------------------------------------------

    async fn insert_recipe(&mut self, input: &NewRecipe) -> StoreResult<Recipe>;
    async fn find_recipe(&mut self, id: DbId) -> StoreResult<Option<Recipe>>;
    /// Non-deleted recipes whose origin is `origin_id`, ordered by id.
    async fn list_recipes_by_origin(&mut self, origin_id: DbId) -> StoreResult<Vec<Recipe>>;
    /// Apply `patch` and bump `updated_at`. `None` if the recipe is missing.
    async fn update_recipe_fields(
        &mut self,
        id: DbId,
        patch: &FieldPatch,
    ) -> StoreResult<Option<Recipe>>;
    async fn soft_delete_recipe(&mut self, id: DbId) -> StoreResult<bool>;

    async fn replace_steps(&mut self, recipe_id: DbId, steps: &[String]) -> StoreResult<()>;
    async fn list_steps(&mut self, recipe_id: DbId) -> StoreResult<Vec<RecipeStep>>;
    async fn replace_ingredient_lines(
        &mut self,
        recipe_id: DbId,
        lines: &[IngredientLine],
    ) -> StoreResult<()>;
    async fn list_ingredient_lines(&mut self, recipe_id: DbId) -> StoreResult<Vec<RecipeIngredient>>;

    /// Idempotent.
    async fn link_tag(&mut self, recipe_id: DbId, tag_id: DbId) -> StoreResult<()>;
    async fn list_recipe_tags(&mut self, recipe_id: DbId) -> StoreResult<Vec<Tag>>;

    async fn increment_share_count(&mut self, recipe_id: DbId) -> StoreResult<()>;
    async fn share_count(&mut self, recipe_id: DbId) -> StoreResult<i64>;

    // --- tags ----------------------------------------------------------------

    async fn insert_tag(&mut self, input: &NewTag) -> StoreResult<Tag>;
    async fn find_tag(&mut self, id: DbId) -> StoreResult<Option<Tag>>;
    async fn find_global_tag(&mut self, name: &str, status: TagStatus) -> StoreResult<Option<Tag>>;
    /// With `status = None` any status matches and APPROVED wins.
    async fn find_community_tag(
        &mut self,
        community_id: DbId,
        name: &str,
        status: Option<TagStatus>,
    ) -> StoreResult<Option<Tag>>;
    async fn count_community_tags(&mut self, community_id: DbId) -> StoreResult<i64>;
    async fn set_tag_status(&mut self, id: DbId, status: TagStatus) -> StoreResult<Option<Tag>>;
    /// Delete a tag together with its recipe links.
    async fn delete_tag(&mut self, id: DbId) -> StoreResult<bool>;

    // --- ingredients ---------------------------------------------------------

    async fn find_ingredient_by_name(&mut self, name: &str) -> StoreResult<Option<Ingredient>>;
    async fn insert_ingredient(&mut self, input: &NewIngredient) -> StoreResult<Ingredient>;

    // --- proposals -----------------------------------------------------------

    async fn insert_proposal(&mut self, input: &NewProposal) -> StoreResult<Proposal>;
    async fn find_proposal(&mut self, id: DbId) -> StoreResult<Option<Proposal>>;
    async fn list_pending_proposals(&mut self, recipe_id: DbId) -> StoreResult<Vec<Proposal>>;
    /// Set a decided status and stamp `decided_at`.
    async fn set_proposal_status(
        &mut self,
        id: DbId,
        status: ProposalStatus,
    ) -> StoreResult<Option<Proposal>>;
    async fn replace_proposal_steps(&mut self, proposal_id: DbId, steps: &[String])
        -> StoreResult<()>;
    async fn list_proposal_steps(&mut self, proposal_id: DbId) -> StoreResult<Vec<String>>;
    async fn replace_proposal_ingredients(
        &mut self,
        proposal_id: DbId,
        lines: &[IngredientLine],
    ) -> StoreResult<()>;
    async fn list_proposal_ingredients(
        &mut self,
        proposal_id: DbId,
    ) -> StoreResult<Vec<ProposalIngredient>>;

    // --- tag suggestions -----------------------------------------------------

    async fn insert_tag_suggestion(&mut self, input: &NewTagSuggestion) -> StoreResult<TagSuggestion>;
    async fn find_tag_suggestion(&mut self, id: DbId) -> StoreResult<Option<TagSuggestion>>;
    async fn find_tag_suggestion_by_key(
        &mut self,
        recipe_id: DbId,
        tag_name: &str,
        suggested_by: DbId,
    ) -> StoreResult<Option<TagSuggestion>>;
    async fn set_tag_suggestion_status(
        &mut self,
        id: DbId,
        status: TagSuggestionStatus,
    ) -> StoreResult<Option<TagSuggestion>>;
    /// Move suggestions for `tag_name` on recipes in `community_id` from
    /// `from` to `to`. Returns how many moved.
    async fn transition_tag_suggestions(
        &mut self,
        community_id: DbId,
        tag_name: &str,
        from: TagSuggestionStatus,
        to: TagSuggestionStatus,
    ) -> StoreResult<u64>;

    // --- lifecycle -----------------------------------------------------------

    async fn commit(self: Box<Self>) -> StoreResult<()>;
}
