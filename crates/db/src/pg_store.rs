//! [`Store`] backed by PostgreSQL. Every [`StoreTx`] call delegates to a
//! repository on the open `sqlx` transaction.

use async_trait::async_trait;
use forkful_core::membership::MemberRole;
use forkful_core::proposal::ProposalStatus;
use forkful_core::recipe::FieldPatch;
use forkful_core::tag_suggestion::TagSuggestionStatus;
use forkful_core::tags::TagStatus;
use forkful_core::types::DbId;
use sqlx::{Postgres, Transaction};

use crate::error::StoreResult;
use crate::models::community::Community;
use crate::models::ingredient::{Ingredient, NewIngredient};
use crate::models::proposal::{NewProposal, Proposal, ProposalIngredient};
use crate::models::recipe::{IngredientLine, NewRecipe, Recipe, RecipeIngredient, RecipeStep};
use crate::models::tag::{NewTag, Tag};
use crate::models::tag_suggestion::{NewTagSuggestion, TagSuggestion};
use crate::repositories::{
    CommunityRepo, IngredientRepo, ProposalRepo, RecipeRepo, TagRepo, TagSuggestionRepo,
};
use crate::store::{Store, StoreTx};
use crate::DbPool;

#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTx { tx }))
    }
}

/// An open Postgres transaction. Rolled back by `sqlx` on drop.
pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgTx {
    async fn insert_community(&mut self, name: &str) -> StoreResult<Community> {
        Ok(CommunityRepo::create(&mut *self.tx, name).await?)
    }

    async fn find_community(&mut self, id: DbId) -> StoreResult<Option<Community>> {
        Ok(CommunityRepo::find_by_id(&mut *self.tx, id).await?)
    }

    async fn find_communities(&mut self, ids: &[DbId]) -> StoreResult<Vec<Community>> {
        Ok(CommunityRepo::find_by_ids(&mut *self.tx, ids).await?)
    }

    async fn upsert_member(
        &mut self,
        community_id: DbId,
        user_id: DbId,
        role: MemberRole,
    ) -> StoreResult<()> {
        Ok(CommunityRepo::upsert_member(&mut *self.tx, community_id, user_id, role).await?)
    }

    async fn member_role(
        &mut self,
        community_id: DbId,
        user_id: DbId,
    ) -> StoreResult<Option<MemberRole>> {
        Ok(CommunityRepo::member_role(&mut *self.tx, community_id, user_id).await?)
    }

    async fn insert_recipe(&mut self, input: &NewRecipe) -> StoreResult<Recipe> {
        Ok(RecipeRepo::create(&mut *self.tx, input).await?)
    }

    async fn find_recipe(&mut self, id: DbId) -> StoreResult<Option<Recipe>> {
        Ok(RecipeRepo::find_by_id(&mut *self.tx, id).await?)
    }

    async fn list_recipes_by_origin(&mut self, origin_id: DbId) -> StoreResult<Vec<Recipe>> {
        Ok(RecipeRepo::list_by_origin(&mut *self.tx, origin_id).await?)
    }

    async fn update_recipe_fields(
        &mut self,
        id: DbId,
        patch: &FieldPatch,
    ) -> StoreResult<Option<Recipe>> {
        Ok(RecipeRepo::update_fields(&mut *self.tx, id, patch).await?)
    }

    async fn soft_delete_recipe(&mut self, id: DbId) -> StoreResult<bool> {
        Ok(RecipeRepo::soft_delete(&mut *self.tx, id).await?)
    }

    async fn replace_steps(&mut self, recipe_id: DbId, steps: &[String]) -> StoreResult<()> {
        Ok(RecipeRepo::replace_steps(&mut *self.tx, recipe_id, steps).await?)
    }

    async fn list_steps(&mut self, recipe_id: DbId) -> StoreResult<Vec<RecipeStep>> {
        Ok(RecipeRepo::list_steps(&mut *self.tx, recipe_id).await?)
    }

    async fn replace_ingredient_lines(
        &mut self,
        recipe_id: DbId,
        lines: &[IngredientLine],
    ) -> StoreResult<()> {
        Ok(RecipeRepo::replace_ingredients(&mut *self.tx, recipe_id, lines).await?)
    }

    async fn list_ingredient_lines(&mut self, recipe_id: DbId) -> StoreResult<Vec<RecipeIngredient>> {
        Ok(RecipeRepo::list_ingredients(&mut *self.tx, recipe_id).await?)
    }

    async fn link_tag(&mut self, recipe_id: DbId, tag_id: DbId) -> StoreResult<()> {
        Ok(RecipeRepo::link_tag(&mut *self.tx, recipe_id, tag_id).await?)
    }

    async fn list_recipe_tags(&mut self, recipe_id: DbId) -> StoreResult<Vec<Tag>> {
        Ok(RecipeRepo::list_tags(&mut *self.tx, recipe_id).await?)
    }

    async fn increment_share_count(&mut self, recipe_id: DbId) -> StoreResult<()> {
        Ok(RecipeRepo::increment_shares(&mut *self.tx, recipe_id).await?)
    }

    async fn share_count(&mut self, recipe_id: DbId) -> StoreResult<i64> {
        Ok(RecipeRepo::share_count(&mut *self.tx, recipe_id).await?)
    }

    async fn insert_tag(&mut self, input: &NewTag) -> StoreResult<Tag> {
        Ok(TagRepo::create(&mut *self.tx, input).await?)
    }

    async fn find_tag(&mut self, id: DbId) -> StoreResult<Option<Tag>> {
        Ok(TagRepo::find_by_id(&mut *self.tx, id).await?)
    }

    async fn find_global_tag(&mut self, name: &str, status: TagStatus) -> StoreResult<Option<Tag>> {
        Ok(TagRepo::find_global(&mut *self.tx, name, status).await?)
    }

    async fn find_community_tag(
        &mut self,
        community_id: DbId,
        name: &str,
        status: Option<TagStatus>,
    ) -> StoreResult<Option<Tag>> {
        Ok(TagRepo::find_in_community(&mut *self.tx, community_id, name, status).await?)
    }

    async fn count_community_tags(&mut self, community_id: DbId) -> StoreResult<i64> {
        Ok(TagRepo::count_in_community(&mut *self.tx, community_id).await?)
    }

    async fn set_tag_status(&mut self, id: DbId, status: TagStatus) -> StoreResult<Option<Tag>> {
        Ok(TagRepo::set_status(&mut *self.tx, id, status).await?)
    }

    async fn delete_tag(&mut self, id: DbId) -> StoreResult<bool> {
        Ok(TagRepo::delete(&mut *self.tx, id).await?)
    }

    async fn find_ingredient_by_name(&mut self, name: &str) -> StoreResult<Option<Ingredient>> {
        Ok(IngredientRepo::find_by_name(&mut *self.tx, name).await?)
    }

    async fn insert_ingredient(&mut self, input: &NewIngredient) -> StoreResult<Ingredient> {
        Ok(IngredientRepo::create(&mut *self.tx, input).await?)
    }

    async fn insert_proposal(&mut self, input: &NewProposal) -> StoreResult<Proposal> {
        Ok(ProposalRepo::create(&mut *self.tx, input).await?)
    }

    async fn find_proposal(&mut self, id: DbId) -> StoreResult<Option<Proposal>> {
        Ok(ProposalRepo::find_by_id(&mut *self.tx, id).await?)
    }

    async fn list_pending_proposals(&mut self, recipe_id: DbId) -> StoreResult<Vec<Proposal>> {
        Ok(ProposalRepo::list_pending_for_recipe(&mut *self.tx, recipe_id).await?)
    }

    async fn set_proposal_status(
        &mut self,
        id: DbId,
        status: ProposalStatus,
    ) -> StoreResult<Option<Proposal>> {
        Ok(ProposalRepo::set_status(&mut *self.tx, id, status).await?)
    }

    async fn replace_proposal_steps(
        &mut self,
        proposal_id: DbId,
        steps: &[String],
    ) -> StoreResult<()> {
        Ok(ProposalRepo::replace_steps(&mut *self.tx, proposal_id, steps).await?)
    }

    async fn list_proposal_steps(&mut self, proposal_id: DbId) -> StoreResult<Vec<String>> {
        Ok(ProposalRepo::list_steps(&mut *self.tx, proposal_id).await?)
    }

    async fn replace_proposal_ingredients(
        &mut self,
        proposal_id: DbId,
        lines: &[IngredientLine],
    ) -> StoreResult<()> {
        Ok(ProposalRepo::replace_ingredients(&mut *self.tx, proposal_id, lines).await?)
    }

    async fn list_proposal_ingredients(
        &mut self,
        proposal_id: DbId,
    ) -> StoreResult<Vec<ProposalIngredient>> {
        Ok(ProposalRepo::list_ingredients(&mut *self.tx, proposal_id).await?)
    }

    async fn insert_tag_suggestion(&mut self, input: &NewTagSuggestion) -> StoreResult<TagSuggestion> {
        Ok(TagSuggestionRepo::create(&mut *self.tx, input).await?)
    }

    async fn find_tag_suggestion(&mut self, id: DbId) -> StoreResult<Option<TagSuggestion>> {
        Ok(TagSuggestionRepo::find_by_id(&mut *self.tx, id).await?)
    }

    async fn find_tag_suggestion_by_key(
        &mut self,
        recipe_id: DbId,
        tag_name: &str,
        suggested_by: DbId,
    ) -> StoreResult<Option<TagSuggestion>> {
        Ok(TagSuggestionRepo::find_by_key(&mut *self.tx, recipe_id, tag_name, suggested_by).await?)
    }

    async fn set_tag_suggestion_status(
        &mut self,
        id: DbId,
        status: TagSuggestionStatus,
    ) -> StoreResult<Option<TagSuggestion>> {
        Ok(TagSuggestionRepo::set_status(&mut *self.tx, id, status).await?)
    }

    async fn transition_tag_suggestions(
        &mut self,
        community_id: DbId,
        tag_name: &str,
        from: TagSuggestionStatus,
        to: TagSuggestionStatus,
    ) -> StoreResult<u64> {
        Ok(TagSuggestionRepo::transition_in_community(
            &mut *self.tx,
            community_id,
            tag_name,
            from,
            to,
        )
        .await?)
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
