//! Repository for `communities` and `community_members`.

use forkful_core::membership::MemberRole;
use forkful_core::types::DbId;
use sqlx::PgConnection;

use crate::models::community::Community;

pub struct CommunityRepo;

impl CommunityRepo {
    pub async fn create(conn: &mut PgConnection, name: &str) -> Result<Community, sqlx::Error> {
        sqlx::query_as::<_, Community>(
            "INSERT INTO communities (name) VALUES ($1) RETURNING id, name, created_at",
        )
        .bind(name)
        .fetch_one(conn)
        .await
    }

    pub async fn find_by_id(conn: &mut PgConnection, id: DbId) -> Result<Option<Community>, sqlx::Error> {
        sqlx::query_as::<_, Community>("SELECT id, name, created_at FROM communities WHERE id = $1")
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Fetch the communities with the given ids, ordered by id.
    pub async fn find_by_ids(
        conn: &mut PgConnection,
        ids: &[DbId],
    ) -> Result<Vec<Community>, sqlx::Error> {
        sqlx::query_as::<_, Community>(
            "SELECT id, name, created_at FROM communities WHERE id = ANY($1) ORDER BY id ASC",
        )
        .bind(ids)
        .fetch_all(conn)
        .await
    }

    /// Add a member, or change the role of an existing one.
    pub async fn upsert_member(
        conn: &mut PgConnection,
        community_id: DbId,
        user_id: DbId,
        role: MemberRole,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO community_members (community_id, user_id, role)
             VALUES ($1, $2, $3)
             ON CONFLICT (community_id, user_id) DO UPDATE SET role = EXCLUDED.role",
        )
        .bind(community_id)
        .bind(user_id)
        .bind(role.as_str())
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn member_role(
        conn: &mut PgConnection,
        community_id: DbId,
        user_id: DbId,
    ) -> Result<Option<MemberRole>, sqlx::Error> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT role FROM community_members WHERE community_id = $1 AND user_id = $2",
        )
        .bind(community_id)
        .bind(user_id)
        .fetch_optional(conn)
        .await?;

        row.map(|(role,)| {
            MemberRole::try_from(role).map_err(|e| sqlx::Error::Decode(Box::new(e)))
        })
        .transpose()
    }
}
