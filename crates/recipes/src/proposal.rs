//! Proposed edits to community recipes.
//!
//! Accepting a proposal rewrites the recipe and cascades the rewrite through
//! its linked copies. Rejecting it leaves the recipe alone and turns the
//! proposal into a variant owned by the proposer.

use std::collections::BTreeSet;

use forkful_core::activity::{ActivityKind, DomainEvent};
use forkful_core::error::CoreError;
use forkful_core::proposal::{ensure_pending, is_stale, ProposalDraft, ProposalStatus, ProposedFields};
use forkful_core::types::DbId;
use forkful_db::models::proposal::{NewProposal, Proposal};
use forkful_db::models::recipe::{IngredientLine, NewRecipe, Recipe};
use forkful_db::StoreTx;
use serde::Serialize;
use serde_json::json;

use crate::access::{require_creator, require_member};
use crate::error::{ServiceError, ServiceResult};
use crate::events::EventQueue;
use crate::graph::RecipeGraph;
use crate::ingredient_resolver::IngredientResolver;
use crate::sync::{ResolvedEdit, SyncPropagator};
use crate::tag_resolver::TagResolver;

#[derive(Debug, Clone, Serialize)]
pub struct AcceptedProposal {
    pub proposal: Proposal,
    pub recipe: Recipe,
    /// Linked copies the accepted edit was propagated to.
    pub propagated: Vec<Recipe>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RejectedProposal {
    pub proposal: Proposal,
    pub variant: Recipe,
}

pub struct ProposalLifecycle;

impl ProposalLifecycle {
    /// Record a proposal against a community recipe the actor does not own.
    pub async fn create(
        tx: &mut dyn StoreTx,
        events: &mut EventQueue,
        actor_id: DbId,
        recipe_id: DbId,
        draft: &ProposalDraft,
    ) -> ServiceResult<Proposal> {
        draft.check()?;

        let recipe = RecipeGraph::load(tx, recipe_id).await?;
        let Some(community_id) = recipe.community_id else {
            return Err(CoreError::Validation(
                "Updates can only be proposed on community recipes".to_string(),
            )
            .into());
        };
        if recipe.creator_id == actor_id {
            return Err(CoreError::Forbidden(
                "You cannot propose updates to your own recipe".to_string(),
            )
            .into());
        }
        require_member(tx, community_id, actor_id).await?;

        let proposal = tx
            .insert_proposal(&NewProposal {
                recipe_id,
                proposer_id: actor_id,
                fields: ProposedFields::from(draft),
                proposes_steps: draft.steps.is_some(),
                proposes_ingredients: draft.ingredients.is_some(),
            })
            .await?;
        if let Some(steps) = &draft.steps {
            tx.replace_proposal_steps(proposal.id, steps).await?;
        }
        if let Some(items) = &draft.ingredients {
            let lines = IngredientResolver::resolve(tx, items, Some(actor_id)).await?;
            tx.replace_proposal_ingredients(proposal.id, &lines).await?;
        }

        events.stage(
            DomainEvent::new(ActivityKind::VariantProposed, actor_id)
                .for_recipe(recipe_id)
                .in_community(Some(community_id))
                .with_recipients(vec![recipe.creator_id])
                .with_metadata(json!({ "proposalId": proposal.id })),
        );
        tracing::info!(
            proposal_id = proposal.id,
            recipe_id,
            user_id = actor_id,
            "Created recipe update proposal"
        );
        Ok(proposal)
    }

    /// Apply a pending proposal to its recipe and every linked copy.
    ///
    /// Fails with `Conflict` if the recipe changed after the proposal was
    /// written.
    pub async fn accept(
        tx: &mut dyn StoreTx,
        events: &mut EventQueue,
        actor_id: DbId,
        proposal_id: DbId,
    ) -> ServiceResult<AcceptedProposal> {
        let (proposal, recipe) = Self::load_decidable(tx, actor_id, proposal_id).await?;
        if is_stale(recipe.updated_at, proposal.created_at) {
            return Err(CoreError::Conflict(
                "The recipe was updated after this proposal was created".to_string(),
            )
            .into());
        }

        let edit = ResolvedEdit {
            fields: proposal.fields().to_patch(),
            steps: Self::proposed_steps(tx, &proposal).await?,
            ingredients: Self::proposed_lines(tx, &proposal).await?,
        };
        let updated = SyncPropagator::apply(tx, recipe.id, &edit).await?;
        let propagated = SyncPropagator::propagate(tx, &updated, &edit).await?;

        let proposal = tx
            .set_proposal_status(proposal.id, ProposalStatus::Accepted)
            .await?
            .ok_or_else(|| ServiceError::not_found("Proposal", proposal_id))?;

        events.stage(
            DomainEvent::new(ActivityKind::ProposalAccepted, actor_id)
                .for_recipe(updated.id)
                .in_community(updated.community_id)
                .with_recipients(vec![proposal.proposer_id])
                .with_metadata(json!({ "proposalId": proposal.id })),
        );
        let mut communities = BTreeSet::new();
        for affected in std::iter::once(&updated).chain(propagated.iter()) {
            let Some(community_id) = affected.community_id else {
                continue;
            };
            if !communities.insert(community_id) {
                continue;
            }
            events.stage(
                DomainEvent::new(ActivityKind::RecipeUpdated, actor_id)
                    .for_recipe(affected.id)
                    .in_community(Some(community_id))
                    .with_metadata(json!({
                        "proposalId": proposal.id,
                        "fields": edit.changed_fields(),
                    })),
            );
        }

        tracing::info!(
            proposal_id = proposal.id,
            recipe_id = updated.id,
            propagated = propagated.len(),
            user_id = actor_id,
            "Accepted proposal"
        );
        Ok(AcceptedProposal {
            proposal,
            recipe: updated,
            propagated,
        })
    }

    /// Decline a pending proposal and branch it into a variant owned by the
    /// proposer. The target recipe is never modified.
    pub async fn reject(
        tx: &mut dyn StoreTx,
        events: &mut EventQueue,
        actor_id: DbId,
        proposal_id: DbId,
    ) -> ServiceResult<RejectedProposal> {
        let (proposal, recipe) = Self::load_decidable(tx, actor_id, proposal_id).await?;

        let fields = proposal.fields();
        let mut input = NewRecipe::copy_of(&recipe, proposal.proposer_id, recipe.community_id);
        input.is_variant = true;
        if let Some(title) = fields.title {
            input.title = title;
        }
        if let Some(servings) = fields.servings {
            input.servings = servings;
        }
        input.prep_time = fields.prep_time.or(recipe.prep_time);
        input.cook_time = fields.cook_time.or(recipe.cook_time);
        input.rest_time = fields.rest_time.or(recipe.rest_time);
        let variant = tx.insert_recipe(&input).await?;

        let steps = match Self::proposed_steps(tx, &proposal).await? {
            Some(steps) => steps,
            None => tx
                .list_steps(recipe.id)
                .await?
                .into_iter()
                .map(|s| s.instruction)
                .collect(),
        };
        tx.replace_steps(variant.id, &steps).await?;

        let lines = match Self::proposed_lines(tx, &proposal).await? {
            Some(lines) => lines,
            None => tx
                .list_ingredient_lines(recipe.id)
                .await?
                .iter()
                .map(IngredientLine::from)
                .collect(),
        };
        tx.replace_ingredient_lines(variant.id, &lines).await?;

        let tag_ids: Vec<DbId> = tx
            .list_recipe_tags(recipe.id)
            .await?
            .iter()
            .map(|t| t.id)
            .collect();
        TagResolver::link_all(tx, variant.id, &tag_ids).await?;

        let proposal = tx
            .set_proposal_status(proposal.id, ProposalStatus::Rejected)
            .await?
            .ok_or_else(|| ServiceError::not_found("Proposal", proposal_id))?;

        events.stage(
            DomainEvent::new(ActivityKind::ProposalRejected, actor_id)
                .for_recipe(recipe.id)
                .in_community(recipe.community_id)
                .with_recipients(vec![proposal.proposer_id])
                .with_metadata(json!({
                    "proposalId": proposal.id,
                    "variantRecipeId": variant.id,
                })),
        );
        events.stage(
            DomainEvent::new(ActivityKind::VariantCreated, proposal.proposer_id)
                .for_recipe(variant.id)
                .in_community(variant.community_id)
                .with_metadata(json!({
                    "proposalId": proposal.id,
                    "originRecipeId": recipe.id,
                })),
        );

        tracing::info!(
            proposal_id = proposal.id,
            recipe_id = recipe.id,
            variant_id = variant.id,
            user_id = actor_id,
            "Rejected proposal into variant"
        );
        Ok(RejectedProposal { proposal, variant })
    }

    pub async fn list_pending(tx: &mut dyn StoreTx, recipe_id: DbId) -> ServiceResult<Vec<Proposal>> {
        RecipeGraph::load(tx, recipe_id).await?;
        Ok(tx.list_pending_proposals(recipe_id).await?)
    }

    /// Load a proposal and its recipe, checking that `actor_id` may decide
    /// it and that it is still pending. Performs no writes.
    async fn load_decidable(
        tx: &mut dyn StoreTx,
        actor_id: DbId,
        proposal_id: DbId,
    ) -> ServiceResult<(Proposal, Recipe)> {
        let proposal = tx
            .find_proposal(proposal_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Proposal", proposal_id))?;
        let recipe = RecipeGraph::load(tx, proposal.recipe_id).await?;
        require_creator(&recipe, actor_id, "decide proposals")?;
        ensure_pending(proposal.status)?;
        Ok((proposal, recipe))
    }

    async fn proposed_steps(
        tx: &mut dyn StoreTx,
        proposal: &Proposal,
    ) -> ServiceResult<Option<Vec<String>>> {
        if !proposal.proposes_steps {
            return Ok(None);
        }
        Ok(Some(tx.list_proposal_steps(proposal.id).await?))
    }

    async fn proposed_lines(
        tx: &mut dyn StoreTx,
        proposal: &Proposal,
    ) -> ServiceResult<Option<Vec<IngredientLine>>> {
        if !proposal.proposes_ingredients {
            return Ok(None);
        }
        let lines = tx
            .list_proposal_ingredients(proposal.id)
            .await?
            .into_iter()
            .map(|row| IngredientLine {
                ingredient_id: row.ingredient_id,
                quantity: row.quantity,
                unit: row.unit,
                position: row.position,
            })
            .collect();
        Ok(Some(lines))
    }
}
