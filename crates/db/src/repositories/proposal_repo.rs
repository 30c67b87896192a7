//! Repository for `recipe_update_proposals` and its shadow tables.

use forkful_core::proposal::ProposalStatus;
use forkful_core::types::DbId;
use sqlx::PgConnection;

use crate::models::proposal::{NewProposal, Proposal, ProposalIngredient};
use crate::models::recipe::IngredientLine;

const COLUMNS: &str = "id, recipe_id, proposer_id, title, servings, prep_time, cook_time, \
    rest_time, proposes_steps, proposes_ingredients, status, created_at, decided_at";

pub struct ProposalRepo;

impl ProposalRepo {
    pub async fn create(conn: &mut PgConnection, input: &NewProposal) -> Result<Proposal, sqlx::Error> {
        let query = format!(
            "INSERT INTO recipe_update_proposals
                (recipe_id, proposer_id, title, servings, prep_time, cook_time, rest_time,
                 proposes_steps, proposes_ingredients)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Proposal>(&query)
            .bind(input.recipe_id)
            .bind(input.proposer_id)
            .bind(&input.fields.title)
            .bind(input.fields.servings)
            .bind(input.fields.prep_time)
            .bind(input.fields.cook_time)
            .bind(input.fields.rest_time)
            .bind(input.proposes_steps)
            .bind(input.proposes_ingredients)
            .fetch_one(conn)
            .await
    }

    pub async fn find_by_id(conn: &mut PgConnection, id: DbId) -> Result<Option<Proposal>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM recipe_update_proposals WHERE id = $1");
        sqlx::query_as::<_, Proposal>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    pub async fn list_pending_for_recipe(
        conn: &mut PgConnection,
        recipe_id: DbId,
    ) -> Result<Vec<Proposal>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM recipe_update_proposals
             WHERE recipe_id = $1 AND status = 'PENDING'
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, Proposal>(&query)
            .bind(recipe_id)
            .fetch_all(conn)
            .await
    }

    /// Move a proposal to a decided status and stamp `decided_at`.
    pub async fn set_status(
        conn: &mut PgConnection,
        id: DbId,
        status: ProposalStatus,
    ) -> Result<Option<Proposal>, sqlx::Error> {
        let query = format!(
            "UPDATE recipe_update_proposals SET status = $2, decided_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Proposal>(&query)
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(conn)
            .await
    }

    pub async fn replace_steps(
        conn: &mut PgConnection,
        proposal_id: DbId,
        steps: &[String],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM proposal_steps WHERE proposal_id = $1")
            .bind(proposal_id)
            .execute(&mut *conn)
            .await?;

        for (position, instruction) in steps.iter().enumerate() {
            sqlx::query(
                "INSERT INTO proposal_steps (proposal_id, position, instruction)
                 VALUES ($1, $2, $3)",
            )
            .bind(proposal_id)
            .bind(position as i32)
            .bind(instruction)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    pub async fn list_steps(conn: &mut PgConnection, proposal_id: DbId) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT instruction FROM proposal_steps WHERE proposal_id = $1 ORDER BY position ASC",
        )
        .bind(proposal_id)
        .fetch_all(conn)
        .await?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    pub async fn replace_ingredients(
        conn: &mut PgConnection,
        proposal_id: DbId,
        lines: &[IngredientLine],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM proposal_ingredients WHERE proposal_id = $1")
            .bind(proposal_id)
            .execute(&mut *conn)
            .await?;

        for line in lines {
            sqlx::query(
                "INSERT INTO proposal_ingredients
                    (proposal_id, ingredient_id, quantity, unit, position)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(proposal_id)
            .bind(line.ingredient_id)
            .bind(line.quantity)
            .bind(&line.unit)
            .bind(line.position)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    pub async fn list_ingredients(
        conn: &mut PgConnection,
        proposal_id: DbId,
    ) -> Result<Vec<ProposalIngredient>, sqlx::Error> {
        sqlx::query_as::<_, ProposalIngredient>(
            "SELECT pi.proposal_id, pi.ingredient_id, i.name AS ingredient_name,
                    pi.quantity, pi.unit, pi.position
             FROM proposal_ingredients pi
             JOIN ingredients i ON i.id = pi.ingredient_id
             WHERE pi.proposal_id = $1
             ORDER BY pi.position ASC",
        )
        .bind(proposal_id)
        .fetch_all(conn)
        .await
    }
}
