//! Transactional facade over the recipe family services.
//!
//! Every operation begins one transaction, runs to completion against it,
//! commits, and only then dispatches the events it staged. An error at any
//! point drops the transaction, which rolls back every write.

use std::collections::BTreeSet;
use std::sync::Arc;

use forkful_core::activity::{ActivityKind, DomainEvent};
use forkful_core::error::CoreError;
use forkful_core::ingredients::{validate_ingredient_lines, IngredientInput};
use forkful_core::membership::{validate_share_eligibility, MemberRole};
use forkful_core::proposal::ProposalDraft;
use forkful_core::recipe::{RecipeDraft, RecipeKind, RecipeUpdate};
use forkful_core::tags::{normalize_tag_names, validate_recipe_tag_count};
use forkful_core::types::DbId;
use forkful_db::models::community::Community;
use forkful_db::models::proposal::Proposal;
use forkful_db::models::recipe::{NewRecipe, Recipe};
use forkful_db::models::tag::Tag;
use forkful_db::models::tag_suggestion::TagSuggestion;
use forkful_db::{Store, StoreTx};
use serde_json::json;

use crate::access::{load_community, require_creator, require_member, require_moderator};
use crate::error::{ServiceError, ServiceResult};
use crate::events::{EventQueue, EventSink};
use crate::graph::{RecipeDetail, RecipeGraph};
use crate::ingredient_resolver::IngredientResolver;
use crate::moderation::TagModeration;
use crate::proposal::{AcceptedProposal, ProposalLifecycle, RejectedProposal};
use crate::share::{ForkedRecipe, RecipeSummary, ShareForkEngine};
use crate::sync::{ResolvedEdit, SyncPropagator};
use crate::tag_resolver::{ResolvedTags, TagResolver};
use crate::tag_suggestion::{SuggestionDecision, TagSuggestionLifecycle};

/// Maximum length of a community name.
pub const MAX_COMMUNITY_NAME_LENGTH: usize = 100;

/// Input for direct recipe authoring.
#[derive(Debug, Clone)]
pub struct NewRecipeInput {
    pub draft: RecipeDraft,
    /// `None` authors a personal recipe.
    pub community_id: Option<DbId>,
    pub tags: Vec<String>,
    pub ingredients: Vec<IngredientInput>,
}

/// Entry point for every recipe family operation.
///
/// Cheap to clone; the store and sink are shared.
#[derive(Clone)]
pub struct RecipeService {
    store: Arc<dyn Store>,
    sink: Arc<dyn EventSink>,
}

impl RecipeService {
    pub fn new(store: Arc<dyn Store>, sink: Arc<dyn EventSink>) -> Self {
        Self { store, sink }
    }

    async fn begin(&self) -> ServiceResult<(Box<dyn StoreTx>, EventQueue)> {
        Ok((self.store.begin().await?, EventQueue::default()))
    }

    /// Commit, then hand the staged events to the sink.
    async fn finish(&self, tx: Box<dyn StoreTx>, events: EventQueue) -> ServiceResult<()> {
        tx.commit().await?;
        if !events.is_empty() {
            let staged = events.len();
            let delivered = events.dispatch(self.sink.as_ref());
            tracing::debug!(staged, delivered, "Dispatched domain events");
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Communities
    // -----------------------------------------------------------------------

    /// Create a community. The creator becomes its first moderator.
    pub async fn create_community(&self, creator_id: DbId, name: &str) -> ServiceResult<Community> {
        let name = name.trim();
        if name.is_empty() || name.chars().count() > MAX_COMMUNITY_NAME_LENGTH {
            return Err(CoreError::Validation(format!(
                "Community name must be between 1 and {MAX_COMMUNITY_NAME_LENGTH} characters"
            ))
            .into());
        }

        let (mut tx, events) = self.begin().await?;
        let community = tx.insert_community(name).await?;
        tx.upsert_member(community.id, creator_id, MemberRole::Moderator)
            .await?;
        self.finish(tx, events).await?;

        tracing::info!(community_id = community.id, user_id = creator_id, "Created community");
        Ok(community)
    }

    /// Add or re-role a member. Moderators only.
    pub async fn add_member(
        &self,
        actor_id: DbId,
        community_id: DbId,
        user_id: DbId,
        role: MemberRole,
    ) -> ServiceResult<()> {
        let (mut tx, events) = self.begin().await?;
        load_community(tx.as_mut(), community_id).await?;
        require_moderator(tx.as_mut(), community_id, actor_id).await?;
        tx.upsert_member(community_id, user_id, role).await?;
        self.finish(tx, events).await?;

        tracing::info!(community_id, user_id, role = role.as_str(), "Set community membership");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Recipes
    // -----------------------------------------------------------------------

    pub async fn create_recipe(
        &self,
        actor_id: DbId,
        input: NewRecipeInput,
    ) -> ServiceResult<RecipeDetail> {
        input.draft.check()?;
        validate_ingredient_lines(&input.ingredients)?;
        let tag_names = normalize_tag_names(&input.tags)?;
        validate_recipe_tag_count(tag_names.len())?;

        let (mut tx, mut events) = self.begin().await?;
        if let Some(community_id) = input.community_id {
            load_community(tx.as_mut(), community_id).await?;
            require_member(tx.as_mut(), community_id, actor_id).await?;
        }

        let draft = input.draft;
        let recipe = tx
            .insert_recipe(&NewRecipe {
                title: draft.title,
                servings: draft.servings,
                prep_time: draft.prep_time,
                cook_time: draft.cook_time,
                rest_time: draft.rest_time,
                image_url: draft.image_url,
                creator_id: actor_id,
                community_id: input.community_id,
                origin_recipe_id: None,
                shared_from_community_id: None,
                is_variant: false,
            })
            .await?;
        tx.replace_steps(recipe.id, &draft.steps).await?;
        IngredientResolver::replace_lines(tx.as_mut(), recipe.id, &input.ingredients, Some(actor_id))
            .await?;
        let tags = TagResolver::resolve(tx.as_mut(), &tag_names, actor_id, recipe.community_id).await?;
        TagResolver::link_all(tx.as_mut(), recipe.id, &tags.tag_ids).await?;

        events.stage(
            DomainEvent::new(ActivityKind::RecipeCreated, actor_id)
                .for_recipe(recipe.id)
                .in_community(recipe.community_id)
                .with_metadata(json!({ "pendingTagIds": tags.pending_tag_ids })),
        );
        let detail = RecipeGraph::detail_of(tx.as_mut(), recipe).await?;
        self.finish(tx, events).await?;

        tracing::info!(
            recipe_id = detail.recipe.id,
            community_id = ?detail.recipe.community_id,
            user_id = actor_id,
            "Created recipe"
        );
        Ok(detail)
    }

    pub async fn get_recipe(&self, recipe_id: DbId) -> ServiceResult<RecipeDetail> {
        let (mut tx, _) = self.begin().await?;
        RecipeGraph::detail(tx.as_mut(), recipe_id).await
    }

    /// Owner edit with partial-update semantics, mirrored onto every
    /// synchronized copy.
    pub async fn update_recipe(
        &self,
        actor_id: DbId,
        recipe_id: DbId,
        update: RecipeUpdate,
    ) -> ServiceResult<RecipeDetail> {
        update.check()?;
        if update.is_empty() {
            return Err(CoreError::Validation("No fields to update".to_string()).into());
        }

        let (mut tx, mut events) = self.begin().await?;
        let recipe = RecipeGraph::load(tx.as_mut(), recipe_id).await?;
        require_creator(&recipe, actor_id, "edit this recipe")?;

        let ingredients = match &update.ingredients {
            Some(items) => {
                Some(IngredientResolver::resolve(tx.as_mut(), items, Some(actor_id)).await?)
            }
            None => None,
        };
        let edit = ResolvedEdit {
            fields: update.fields,
            steps: update.steps,
            ingredients,
        };
        let updated = SyncPropagator::apply(tx.as_mut(), recipe.id, &edit).await?;
        let propagated = SyncPropagator::propagate(tx.as_mut(), &updated, &edit).await?;

        stage_updates(&mut events, actor_id, &updated, &propagated, &edit);
        let detail = RecipeGraph::detail_of(tx.as_mut(), updated).await?;
        self.finish(tx, events).await?;

        tracing::info!(
            recipe_id,
            user_id = actor_id,
            propagated = propagated.len(),
            fields = ?edit.changed_fields(),
            "Updated recipe"
        );
        Ok(detail)
    }

    pub async fn delete_recipe(&self, actor_id: DbId, recipe_id: DbId) -> ServiceResult<()> {
        let (mut tx, mut events) = self.begin().await?;
        let recipe = RecipeGraph::load(tx.as_mut(), recipe_id).await?;
        require_creator(&recipe, actor_id, "delete this recipe")?;
        tx.soft_delete_recipe(recipe_id).await?;

        events.stage(
            DomainEvent::new(ActivityKind::RecipeDeleted, actor_id)
                .for_recipe(recipe_id)
                .in_community(recipe.community_id),
        );
        self.finish(tx, events).await?;

        tracing::info!(recipe_id, user_id = actor_id, "Deleted recipe");
        Ok(())
    }

    /// Add tags to the actor's own recipe. The per-recipe cap is checked
    /// before any tag is created.
    pub async fn add_recipe_tags(
        &self,
        actor_id: DbId,
        recipe_id: DbId,
        names: &[String],
    ) -> ServiceResult<ResolvedTags> {
        let names = normalize_tag_names(names)?;

        let (mut tx, events) = self.begin().await?;
        let recipe = RecipeGraph::load(tx.as_mut(), recipe_id).await?;
        require_creator(&recipe, actor_id, "tag this recipe")?;

        let existing = tx.list_recipe_tags(recipe_id).await?;
        let added = names
            .iter()
            .filter(|name| !existing.iter().any(|t| &t.name == *name))
            .count();
        validate_recipe_tag_count(existing.len() + added)?;

        let resolved = TagResolver::resolve(tx.as_mut(), &names, actor_id, recipe.community_id).await?;
        TagResolver::link_all(tx.as_mut(), recipe_id, &resolved.tag_ids).await?;
        self.finish(tx, events).await?;

        tracing::info!(
            recipe_id,
            user_id = actor_id,
            tags = resolved.tag_ids.len(),
            pending = resolved.pending_tag_ids.len(),
            "Tagged recipe"
        );
        Ok(resolved)
    }

    pub async fn list_variants(&self, recipe_id: DbId) -> ServiceResult<Vec<Recipe>> {
        let (mut tx, _) = self.begin().await?;
        RecipeGraph::load(tx.as_mut(), recipe_id).await?;
        RecipeGraph::variants(tx.as_mut(), recipe_id).await
    }

    // -----------------------------------------------------------------------
    // Sharing
    // -----------------------------------------------------------------------

    /// Fork a community recipe into another community.
    pub async fn share_recipe(
        &self,
        actor_id: DbId,
        recipe_id: DbId,
        target_community_id: DbId,
    ) -> ServiceResult<ForkedRecipe> {
        let (mut tx, mut events) = self.begin().await?;
        let source = RecipeGraph::load(tx.as_mut(), recipe_id).await?;
        let Some(source_community_id) = source.community_id else {
            return Err(CoreError::Validation(
                "Only community recipes can be shared; publish personal recipes instead"
                    .to_string(),
            )
            .into());
        };
        if source_community_id == target_community_id {
            return Err(CoreError::Validation(
                "Cannot share a recipe into its own community".to_string(),
            )
            .into());
        }
        let target = load_community(tx.as_mut(), target_community_id).await?;

        if RecipeGraph::fork_into(tx.as_mut(), source.id, target_community_id)
            .await?
            .is_some()
        {
            return Err(CoreError::Conflict(format!(
                "Recipe already shared to community '{}'",
                target.name
            ))
            .into());
        }

        let source_role = tx.member_role(source_community_id, actor_id).await?;
        let target_role = tx.member_role(target_community_id, actor_id).await?;
        validate_share_eligibility(source.creator_id == actor_id, source_role, target_role)?;

        let forked = ShareForkEngine::fork_recipe(
            tx.as_mut(),
            &mut events,
            actor_id,
            &source,
            target.id,
            &target.name,
        )
        .await?;
        self.finish(tx, events).await?;
        Ok(forked)
    }

    /// Publish a personal recipe into communities as synchronized copies.
    pub async fn publish_recipe(
        &self,
        actor_id: DbId,
        recipe_id: DbId,
        community_ids: &[DbId],
    ) -> ServiceResult<Vec<RecipeSummary>> {
        if community_ids.is_empty() {
            return Err(
                CoreError::Validation("At least one community is required".to_string()).into(),
            );
        }

        let (mut tx, mut events) = self.begin().await?;
        let source = RecipeGraph::load(tx.as_mut(), recipe_id).await?;
        if source.kind() != RecipeKind::Personal {
            return Err(
                CoreError::Validation("Only personal recipes can be published".to_string()).into(),
            );
        }
        require_creator(&source, actor_id, "publish this recipe")?;
        for &community_id in community_ids {
            load_community(tx.as_mut(), community_id).await?;
            require_member(tx.as_mut(), community_id, actor_id).await?;
        }

        let published =
            ShareForkEngine::publish_recipe(tx.as_mut(), &mut events, actor_id, &source, community_ids)
                .await?;
        self.finish(tx, events).await?;
        Ok(published)
    }

    pub async fn share_count(&self, recipe_id: DbId) -> ServiceResult<i64> {
        let (mut tx, _) = self.begin().await?;
        RecipeGraph::load(tx.as_mut(), recipe_id).await?;
        Ok(tx.share_count(recipe_id).await?)
    }

    /// Distinct communities holding any member of the recipe's family.
    /// `None` when the recipe is missing or deleted.
    pub async fn recipe_family_communities(
        &self,
        recipe_id: DbId,
    ) -> ServiceResult<Option<Vec<Community>>> {
        let (mut tx, _) = self.begin().await?;
        RecipeGraph::family_communities(tx.as_mut(), recipe_id).await
    }

    // -----------------------------------------------------------------------
    // Proposals
    // -----------------------------------------------------------------------

    pub async fn propose_update(
        &self,
        actor_id: DbId,
        recipe_id: DbId,
        draft: &ProposalDraft,
    ) -> ServiceResult<Proposal> {
        let (mut tx, mut events) = self.begin().await?;
        let proposal =
            ProposalLifecycle::create(tx.as_mut(), &mut events, actor_id, recipe_id, draft).await?;
        self.finish(tx, events).await?;
        Ok(proposal)
    }

    pub async fn accept_proposal(
        &self,
        actor_id: DbId,
        proposal_id: DbId,
    ) -> ServiceResult<AcceptedProposal> {
        let (mut tx, mut events) = self.begin().await?;
        let accepted =
            ProposalLifecycle::accept(tx.as_mut(), &mut events, actor_id, proposal_id).await?;
        self.finish(tx, events).await?;
        Ok(accepted)
    }

    pub async fn reject_proposal(
        &self,
        actor_id: DbId,
        proposal_id: DbId,
    ) -> ServiceResult<RejectedProposal> {
        let (mut tx, mut events) = self.begin().await?;
        let rejected =
            ProposalLifecycle::reject(tx.as_mut(), &mut events, actor_id, proposal_id).await?;
        self.finish(tx, events).await?;
        Ok(rejected)
    }

    pub async fn list_pending_proposals(&self, recipe_id: DbId) -> ServiceResult<Vec<Proposal>> {
        let (mut tx, _) = self.begin().await?;
        ProposalLifecycle::list_pending(tx.as_mut(), recipe_id).await
    }

    // -----------------------------------------------------------------------
    // Tag suggestions and moderation
    // -----------------------------------------------------------------------

    pub async fn suggest_tag(
        &self,
        actor_id: DbId,
        recipe_id: DbId,
        tag_name: &str,
    ) -> ServiceResult<TagSuggestion> {
        let (mut tx, mut events) = self.begin().await?;
        let suggestion =
            TagSuggestionLifecycle::create(tx.as_mut(), &mut events, actor_id, recipe_id, tag_name)
                .await?;
        self.finish(tx, events).await?;
        Ok(suggestion)
    }

    pub async fn accept_tag_suggestion(
        &self,
        actor_id: DbId,
        suggestion_id: DbId,
    ) -> ServiceResult<TagSuggestion> {
        let (mut tx, mut events) = self.begin().await?;
        let decision =
            TagSuggestionLifecycle::accept(tx.as_mut(), &mut events, actor_id, suggestion_id)
                .await?;
        self.settle_decision(tx, events, decision).await
    }

    pub async fn reject_tag_suggestion(
        &self,
        actor_id: DbId,
        suggestion_id: DbId,
    ) -> ServiceResult<TagSuggestion> {
        let (mut tx, mut events) = self.begin().await?;
        let decision =
            TagSuggestionLifecycle::reject(tx.as_mut(), &mut events, actor_id, suggestion_id)
                .await?;
        self.settle_decision(tx, events, decision).await
    }

    /// Commit a suggestion decision. An orphaned suggestion keeps its
    /// auto-rejection but the caller still receives `NotFound`.
    async fn settle_decision(
        &self,
        tx: Box<dyn StoreTx>,
        events: EventQueue,
        decision: SuggestionDecision,
    ) -> ServiceResult<TagSuggestion> {
        self.finish(tx, events).await?;
        match decision {
            SuggestionDecision::Decided(suggestion) => Ok(suggestion),
            SuggestionDecision::Orphaned(suggestion) => {
                Err(ServiceError::not_found("Recipe", suggestion.recipe_id))
            }
        }
    }

    pub async fn approve_community_tag(&self, actor_id: DbId, tag_id: DbId) -> ServiceResult<Tag> {
        let (mut tx, mut events) = self.begin().await?;
        let tag = TagModeration::approve(tx.as_mut(), &mut events, actor_id, tag_id).await?;
        self.finish(tx, events).await?;
        Ok(tag)
    }

    pub async fn reject_community_tag(&self, actor_id: DbId, tag_id: DbId) -> ServiceResult<Tag> {
        let (mut tx, mut events) = self.begin().await?;
        let tag = TagModeration::reject(tx.as_mut(), &mut events, actor_id, tag_id).await?;
        self.finish(tx, events).await?;
        Ok(tag)
    }
}

/// One RECIPE_UPDATED per distinct community touched by an edit, or a single
/// community-less event when only personal recipes changed.
fn stage_updates(
    events: &mut EventQueue,
    actor_id: DbId,
    updated: &Recipe,
    propagated: &[Recipe],
    edit: &ResolvedEdit,
) {
    let mut communities = BTreeSet::new();
    for affected in std::iter::once(updated).chain(propagated) {
        let Some(community_id) = affected.community_id else {
            continue;
        };
        if communities.insert(community_id) {
            events.stage(
                DomainEvent::new(ActivityKind::RecipeUpdated, actor_id)
                    .for_recipe(affected.id)
                    .in_community(Some(community_id))
                    .with_metadata(json!({ "fields": edit.changed_fields() })),
            );
        }
    }
    if communities.is_empty() {
        events.stage(
            DomainEvent::new(ActivityKind::RecipeUpdated, actor_id)
                .for_recipe(updated.id)
                .with_metadata(json!({ "fields": edit.changed_fields() })),
        );
    }
}
