//! In-memory [`Store`] with the same transactional semantics as Postgres.
//!
//! A transaction takes the store's lock for its whole lifetime and works on
//! a cloned snapshot. [`StoreTx::commit`] writes the snapshot back; dropping
//! the handle discards it. Transactions are therefore fully serialized.
//!
//! Timestamps come from a strictly monotonic clock so that "updated after"
//! comparisons never tie.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use forkful_core::membership::MemberRole;
use forkful_core::proposal::ProposalStatus;
use forkful_core::recipe::FieldPatch;
use forkful_core::tag_suggestion::TagSuggestionStatus;
use forkful_core::tags::{TagScope, TagStatus};
use forkful_core::types::{DbId, Timestamp};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::{StoreError, StoreResult};
use crate::models::community::Community;
use crate::models::ingredient::{Ingredient, NewIngredient};
use crate::models::proposal::{NewProposal, Proposal, ProposalIngredient};
use crate::models::recipe::{IngredientLine, NewRecipe, Recipe, RecipeIngredient, RecipeStep};
use crate::models::tag::{NewTag, Tag};
use crate::models::tag_suggestion::{NewTagSuggestion, TagSuggestion};
use crate::store::{Store, StoreTx};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    last_id: DbId,
    last_tick: Option<Timestamp>,
    communities: BTreeMap<DbId, Community>,
    members: BTreeMap<(DbId, DbId), MemberRole>,
    recipes: BTreeMap<DbId, Recipe>,
    steps: BTreeMap<DbId, Vec<String>>,
    ingredient_lines: BTreeMap<DbId, Vec<IngredientLine>>,
    /// Tag ids per recipe, in link order.
    recipe_tags: BTreeMap<DbId, Vec<DbId>>,
    shares: BTreeMap<DbId, i64>,
    tags: BTreeMap<DbId, Tag>,
    ingredients: BTreeMap<DbId, Ingredient>,
    proposals: BTreeMap<DbId, Proposal>,
    proposal_steps: BTreeMap<DbId, Vec<String>>,
    proposal_ingredients: BTreeMap<DbId, Vec<IngredientLine>>,
    suggestions: BTreeMap<DbId, TagSuggestion>,
}

impl MemoryState {
    fn next_id(&mut self) -> DbId {
        self.last_id += 1;
        self.last_id
    }

    fn tick(&mut self) -> Timestamp {
        let now = Utc::now();
        let next = match self.last_tick {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_tick = Some(next);
        next
    }

    fn live_recipe(&self, id: DbId) -> Option<&Recipe> {
        self.recipes.get(&id).filter(|r| r.deleted_at.is_none())
    }

    fn ingredient_name(&self, id: DbId) -> StoreResult<String> {
        self.ingredients
            .get(&id)
            .map(|i| i.name.clone())
            .ok_or_else(|| StoreError::MissingReference(format!("ingredient {id}")))
    }

    fn check_lines(&self, lines: &[IngredientLine]) -> StoreResult<()> {
        let mut positions = BTreeSet::new();
        for line in lines {
            self.ingredient_name(line.ingredient_id)?;
            if !positions.insert(line.position) {
                return Err(StoreError::UniqueViolation(
                    "pk_recipe_ingredients".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Shared in-memory store. Cloning shares the underlying state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTx { guard, working }))
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

#[async_trait]
impl StoreTx for MemoryTx {
    // --- communities ---------------------------------------------------------

    async fn insert_community(&mut self, name: &str) -> StoreResult<Community> {
        let s = &mut self.working;
        let community = Community {
            id: s.next_id(),
            name: name.to_string(),
            created_at: s.tick(),
        };
        s.communities.insert(community.id, community.clone());
        Ok(community)
    }

    async fn find_community(&mut self, id: DbId) -> StoreResult<Option<Community>> {
        Ok(self.working.communities.get(&id).cloned())
    }

    async fn find_communities(&mut self, ids: &[DbId]) -> StoreResult<Vec<Community>> {
        let wanted: BTreeSet<DbId> = ids.iter().copied().collect();
        Ok(wanted
            .into_iter()
            .filter_map(|id| self.working.communities.get(&id).cloned())
            .collect())
    }

    async fn upsert_member(
        &mut self,
        community_id: DbId,
        user_id: DbId,
        role: MemberRole,
    ) -> StoreResult<()> {
        if !self.working.communities.contains_key(&community_id) {
            return Err(StoreError::MissingReference(format!(
                "community {community_id}"
            )));
        }
        self.working.members.insert((community_id, user_id), role);
        Ok(())
    }

    async fn member_role(
        &mut self,
        community_id: DbId,
        user_id: DbId,
    ) -> StoreResult<Option<MemberRole>> {
        Ok(self.working.members.get(&(community_id, user_id)).copied())
    }

    // --- recipes -------------------------------------------------------------

    async fn insert_recipe(&mut self, input: &NewRecipe) -> StoreResult<Recipe> {
        let s = &mut self.working;
        if let Some(origin) = input.origin_recipe_id {
            if !s.recipes.contains_key(&origin) {
                return Err(StoreError::MissingReference(format!("recipe {origin}")));
            }
        }
        let now = s.tick();
        let recipe = Recipe {
            id: s.next_id(),
            title: input.title.clone(),
            servings: input.servings,
            prep_time: input.prep_time,
            cook_time: input.cook_time,
            rest_time: input.rest_time,
            image_url: input.image_url.clone(),
            creator_id: input.creator_id,
            community_id: input.community_id,
            origin_recipe_id: input.origin_recipe_id,
            shared_from_community_id: input.shared_from_community_id,
            is_variant: input.is_variant,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };
        s.recipes.insert(recipe.id, recipe.clone());
        Ok(recipe)
    }

    async fn find_recipe(&mut self, id: DbId) -> StoreResult<Option<Recipe>> {
        Ok(self.working.live_recipe(id).cloned())
    }

    async fn list_recipes_by_origin(&mut self, origin_id: DbId) -> StoreResult<Vec<Recipe>> {
        Ok(self
            .working
            .recipes
            .values()
            .filter(|r| r.origin_recipe_id == Some(origin_id) && r.deleted_at.is_none())
            .cloned()
            .collect())
    }

    async fn update_recipe_fields(
        &mut self,
        id: DbId,
        patch: &FieldPatch,
    ) -> StoreResult<Option<Recipe>> {
        let s = &mut self.working;
        if s.live_recipe(id).is_none() {
            return Ok(None);
        }
        let now = s.tick();
        let Some(recipe) = s.recipes.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = &patch.title {
            recipe.title = title.clone();
        }
        if let Some(servings) = patch.servings {
            recipe.servings = servings;
        }
        if let Some(prep_time) = patch.prep_time {
            recipe.prep_time = prep_time;
        }
        if let Some(cook_time) = patch.cook_time {
            recipe.cook_time = cook_time;
        }
        if let Some(rest_time) = patch.rest_time {
            recipe.rest_time = rest_time;
        }
        if let Some(image_url) = &patch.image_url {
            recipe.image_url = image_url.clone();
        }
        recipe.updated_at = now;
        Ok(Some(recipe.clone()))
    }

    async fn soft_delete_recipe(&mut self, id: DbId) -> StoreResult<bool> {
        let s = &mut self.working;
        if s.live_recipe(id).is_none() {
            return Ok(false);
        }
        let now = s.tick();
        if let Some(recipe) = s.recipes.get_mut(&id) {
            recipe.deleted_at = Some(now);
        }
        Ok(true)
    }

    async fn replace_steps(&mut self, recipe_id: DbId, steps: &[String]) -> StoreResult<()> {
        if !self.working.recipes.contains_key(&recipe_id) {
            return Err(StoreError::MissingReference(format!("recipe {recipe_id}")));
        }
        self.working.steps.insert(recipe_id, steps.to_vec());
        Ok(())
    }

    async fn list_steps(&mut self, recipe_id: DbId) -> StoreResult<Vec<RecipeStep>> {
        Ok(self
            .working
            .steps
            .get(&recipe_id)
            .map(|steps| {
                steps
                    .iter()
                    .enumerate()
                    .map(|(position, instruction)| RecipeStep {
                        recipe_id,
                        position: position as i32,
                        instruction: instruction.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn replace_ingredient_lines(
        &mut self,
        recipe_id: DbId,
        lines: &[IngredientLine],
    ) -> StoreResult<()> {
        if !self.working.recipes.contains_key(&recipe_id) {
            return Err(StoreError::MissingReference(format!("recipe {recipe_id}")));
        }
        self.working.check_lines(lines)?;
        self.working
            .ingredient_lines
            .insert(recipe_id, lines.to_vec());
        Ok(())
    }

    async fn list_ingredient_lines(&mut self, recipe_id: DbId) -> StoreResult<Vec<RecipeIngredient>> {
        let s = &self.working;
        let mut lines = s.ingredient_lines.get(&recipe_id).cloned().unwrap_or_default();
        lines.sort_by_key(|l| l.position);
        lines
            .into_iter()
            .map(|line| -> StoreResult<RecipeIngredient> {
                Ok(RecipeIngredient {
                    recipe_id,
                    ingredient_id: line.ingredient_id,
                    ingredient_name: s.ingredient_name(line.ingredient_id)?,
                    quantity: line.quantity,
                    unit: line.unit,
                    position: line.position,
                })
            })
            .collect()
    }

    async fn link_tag(&mut self, recipe_id: DbId, tag_id: DbId) -> StoreResult<()> {
        let s = &mut self.working;
        if !s.recipes.contains_key(&recipe_id) {
            return Err(StoreError::MissingReference(format!("recipe {recipe_id}")));
        }
        if !s.tags.contains_key(&tag_id) {
            return Err(StoreError::MissingReference(format!("tag {tag_id}")));
        }
        let links = s.recipe_tags.entry(recipe_id).or_default();
        if !links.contains(&tag_id) {
            links.push(tag_id);
        }
        Ok(())
    }

    async fn list_recipe_tags(&mut self, recipe_id: DbId) -> StoreResult<Vec<Tag>> {
        let s = &self.working;
        Ok(s.recipe_tags
            .get(&recipe_id)
            .map(|ids| ids.iter().filter_map(|id| s.tags.get(id).cloned()).collect())
            .unwrap_or_default())
    }

    async fn increment_share_count(&mut self, recipe_id: DbId) -> StoreResult<()> {
        *self.working.shares.entry(recipe_id).or_insert(0) += 1;
        Ok(())
    }

    async fn share_count(&mut self, recipe_id: DbId) -> StoreResult<i64> {
        Ok(self.working.shares.get(&recipe_id).copied().unwrap_or(0))
    }

    // --- tags ----------------------------------------------------------------

    async fn insert_tag(&mut self, input: &NewTag) -> StoreResult<Tag> {
        let s = &mut self.working;
        let duplicate = s.tags.values().any(|t| {
            t.name == input.name && t.scope == input.scope && t.community_id == input.community_id
        });
        if duplicate {
            let constraint = match input.scope {
                TagScope::Global => "uq_tags_global_name",
                TagScope::Community => "uq_tags_community_name",
            };
            return Err(StoreError::UniqueViolation(constraint.to_string()));
        }
        let tag = Tag {
            id: s.next_id(),
            name: input.name.clone(),
            scope: input.scope,
            status: input.status,
            community_id: input.community_id,
            created_by: input.created_by,
            created_at: s.tick(),
        };
        s.tags.insert(tag.id, tag.clone());
        Ok(tag)
    }

    async fn find_tag(&mut self, id: DbId) -> StoreResult<Option<Tag>> {
        Ok(self.working.tags.get(&id).cloned())
    }

    async fn find_global_tag(&mut self, name: &str, status: TagStatus) -> StoreResult<Option<Tag>> {
        Ok(self
            .working
            .tags
            .values()
            .find(|t| t.scope == TagScope::Global && t.name == name && t.status == status)
            .cloned())
    }

    async fn find_community_tag(
        &mut self,
        community_id: DbId,
        name: &str,
        status: Option<TagStatus>,
    ) -> StoreResult<Option<Tag>> {
        let mut matches: Vec<&Tag> = self
            .working
            .tags
            .values()
            .filter(|t| {
                t.scope == TagScope::Community
                    && t.community_id == Some(community_id)
                    && t.name == name
                    && status.map_or(true, |s| t.status == s)
            })
            .collect();
        matches.sort_by_key(|t| (t.status != TagStatus::Approved, t.id));
        Ok(matches.first().map(|t| (*t).clone()))
    }

    async fn count_community_tags(&mut self, community_id: DbId) -> StoreResult<i64> {
        Ok(self
            .working
            .tags
            .values()
            .filter(|t| t.scope == TagScope::Community && t.community_id == Some(community_id))
            .count() as i64)
    }

    async fn set_tag_status(&mut self, id: DbId, status: TagStatus) -> StoreResult<Option<Tag>> {
        Ok(self.working.tags.get_mut(&id).map(|tag| {
            tag.status = status;
            tag.clone()
        }))
    }

    async fn delete_tag(&mut self, id: DbId) -> StoreResult<bool> {
        let s = &mut self.working;
        if s.tags.remove(&id).is_none() {
            return Ok(false);
        }
        for links in s.recipe_tags.values_mut() {
            links.retain(|tag_id| *tag_id != id);
        }
        Ok(true)
    }

    // --- ingredients ---------------------------------------------------------

    async fn find_ingredient_by_name(&mut self, name: &str) -> StoreResult<Option<Ingredient>> {
        Ok(self
            .working
            .ingredients
            .values()
            .find(|i| i.name == name)
            .cloned())
    }

    async fn insert_ingredient(&mut self, input: &NewIngredient) -> StoreResult<Ingredient> {
        let s = &mut self.working;
        if s.ingredients.values().any(|i| i.name == input.name) {
            return Err(StoreError::UniqueViolation("uq_ingredients_name".to_string()));
        }
        let ingredient = Ingredient {
            id: s.next_id(),
            name: input.name.clone(),
            status: input.status,
            default_unit: input.default_unit.clone(),
            created_by: input.created_by,
            created_at: s.tick(),
        };
        s.ingredients.insert(ingredient.id, ingredient.clone());
        Ok(ingredient)
    }

    // --- proposals -----------------------------------------------------------

    async fn insert_proposal(&mut self, input: &NewProposal) -> StoreResult<Proposal> {
        let s = &mut self.working;
        if !s.recipes.contains_key(&input.recipe_id) {
            return Err(StoreError::MissingReference(format!(
                "recipe {}",
                input.recipe_id
            )));
        }
        let proposal = Proposal {
            id: s.next_id(),
            recipe_id: input.recipe_id,
            proposer_id: input.proposer_id,
            title: input.fields.title.clone(),
            servings: input.fields.servings,
            prep_time: input.fields.prep_time,
            cook_time: input.fields.cook_time,
            rest_time: input.fields.rest_time,
            proposes_steps: input.proposes_steps,
            proposes_ingredients: input.proposes_ingredients,
            status: ProposalStatus::Pending,
            created_at: s.tick(),
            decided_at: None,
        };
        s.proposals.insert(proposal.id, proposal.clone());
        Ok(proposal)
    }

    async fn find_proposal(&mut self, id: DbId) -> StoreResult<Option<Proposal>> {
        Ok(self.working.proposals.get(&id).cloned())
    }

    async fn list_pending_proposals(&mut self, recipe_id: DbId) -> StoreResult<Vec<Proposal>> {
        Ok(self
            .working
            .proposals
            .values()
            .filter(|p| p.recipe_id == recipe_id && p.status == ProposalStatus::Pending)
            .cloned()
            .collect())
    }

    async fn set_proposal_status(
        &mut self,
        id: DbId,
        status: ProposalStatus,
    ) -> StoreResult<Option<Proposal>> {
        let s = &mut self.working;
        if !s.proposals.contains_key(&id) {
            return Ok(None);
        }
        let now = s.tick();
        Ok(s.proposals.get_mut(&id).map(|proposal| {
            proposal.status = status;
            proposal.decided_at = Some(now);
            proposal.clone()
        }))
    }

    async fn replace_proposal_steps(
        &mut self,
        proposal_id: DbId,
        steps: &[String],
    ) -> StoreResult<()> {
        if !self.working.proposals.contains_key(&proposal_id) {
            return Err(StoreError::MissingReference(format!(
                "proposal {proposal_id}"
            )));
        }
        self.working.proposal_steps.insert(proposal_id, steps.to_vec());
        Ok(())
    }

    async fn list_proposal_steps(&mut self, proposal_id: DbId) -> StoreResult<Vec<String>> {
        Ok(self
            .working
            .proposal_steps
            .get(&proposal_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn replace_proposal_ingredients(
        &mut self,
        proposal_id: DbId,
        lines: &[IngredientLine],
    ) -> StoreResult<()> {
        if !self.working.proposals.contains_key(&proposal_id) {
            return Err(StoreError::MissingReference(format!(
                "proposal {proposal_id}"
            )));
        }
        self.working.check_lines(lines)?;
        self.working
            .proposal_ingredients
            .insert(proposal_id, lines.to_vec());
        Ok(())
    }

    async fn list_proposal_ingredients(
        &mut self,
        proposal_id: DbId,
    ) -> StoreResult<Vec<ProposalIngredient>> {
        let s = &self.working;
        let mut lines = s
            .proposal_ingredients
            .get(&proposal_id)
            .cloned()
            .unwrap_or_default();
        lines.sort_by_key(|l| l.position);
        lines
            .into_iter()
            .map(|line| -> StoreResult<ProposalIngredient> {
                Ok(ProposalIngredient {
                    proposal_id,
                    ingredient_id: line.ingredient_id,
                    ingredient_name: s.ingredient_name(line.ingredient_id)?,
                    quantity: line.quantity,
                    unit: line.unit,
                    position: line.position,
                })
            })
            .collect()
    }

    // --- tag suggestions -----------------------------------------------------

    async fn insert_tag_suggestion(&mut self, input: &NewTagSuggestion) -> StoreResult<TagSuggestion> {
        let s = &mut self.working;
        let duplicate = s.suggestions.values().any(|t| {
            t.recipe_id == input.recipe_id
                && t.tag_name == input.tag_name
                && t.suggested_by == input.suggested_by
        });
        if duplicate {
            return Err(StoreError::UniqueViolation(
                "uq_tag_suggestions_recipe_name_user".to_string(),
            ));
        }
        let suggestion = TagSuggestion {
            id: s.next_id(),
            recipe_id: input.recipe_id,
            tag_name: input.tag_name.clone(),
            suggested_by: input.suggested_by,
            status: TagSuggestionStatus::PendingOwner,
            created_at: s.tick(),
            decided_at: None,
        };
        s.suggestions.insert(suggestion.id, suggestion.clone());
        Ok(suggestion)
    }

    async fn find_tag_suggestion(&mut self, id: DbId) -> StoreResult<Option<TagSuggestion>> {
        Ok(self.working.suggestions.get(&id).cloned())
    }

    async fn find_tag_suggestion_by_key(
        &mut self,
        recipe_id: DbId,
        tag_name: &str,
        suggested_by: DbId,
    ) -> StoreResult<Option<TagSuggestion>> {
        Ok(self
            .working
            .suggestions
            .values()
            .find(|t| {
                t.recipe_id == recipe_id && t.tag_name == tag_name && t.suggested_by == suggested_by
            })
            .cloned())
    }

    async fn set_tag_suggestion_status(
        &mut self,
        id: DbId,
        status: TagSuggestionStatus,
    ) -> StoreResult<Option<TagSuggestion>> {
        let s = &mut self.working;
        if !s.suggestions.contains_key(&id) {
            return Ok(None);
        }
        let now = s.tick();
        Ok(s.suggestions.get_mut(&id).map(|suggestion| {
            suggestion.status = status;
            suggestion.decided_at = Some(now);
            suggestion.clone()
        }))
    }

    async fn transition_tag_suggestions(
        &mut self,
        community_id: DbId,
        tag_name: &str,
        from: TagSuggestionStatus,
        to: TagSuggestionStatus,
    ) -> StoreResult<u64> {
        let s = &mut self.working;
        let now = s.tick();
        let in_community: BTreeSet<DbId> = s
            .recipes
            .values()
            .filter(|r| r.community_id == Some(community_id))
            .map(|r| r.id)
            .collect();
        let mut moved = 0;
        for suggestion in s.suggestions.values_mut() {
            if in_community.contains(&suggestion.recipe_id)
                && suggestion.tag_name == tag_name
                && suggestion.status == from
            {
                suggestion.status = to;
                suggestion.decided_at = Some(now);
                moved += 1;
            }
        }
        Ok(moved)
    }

    // --- lifecycle -----------------------------------------------------------

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryTx { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
