//! Repository for the `users` directory mirror.

use sqlx::PgPool;

use angus_core::types::DbId;

use crate::models::user::{CreateUser, User, UserName};

const COLUMNS: &str = "id, tenant_id, username, full_name, avatar, created_at, updated_at";

/// Provides lookups used for name and avatar enrichment.
pub struct UserRepo;

impl UserRepo {
    pub async fn create(
        pool: &PgPool,
        tenant_id: DbId,
        input: &CreateUser,
    ) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (tenant_id, username, full_name, avatar) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(tenant_id)
            .bind(&input.username)
            .bind(&input.full_name)
            .bind(&input.avatar)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        tenant_id: DbId,
        id: DbId,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE tenant_id = $1 AND id = $2");
        sqlx::query_as::<_, User>(&query)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Display names for a set of user ids; unknown ids are skipped.
    pub async fn names_by_ids(
        pool: &PgPool,
        tenant_id: DbId,
        ids: &[DbId],
    ) -> Result<Vec<UserName>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, UserName>(
            "SELECT id, full_name, avatar FROM users \
             WHERE tenant_id = $1 AND id = ANY($2) \
             ORDER BY id",
        )
        .bind(tenant_id)
        .bind(ids)
        .fetch_all(pool)
        .await
    }

    pub async fn name_of(
        pool: &PgPool,
        tenant_id: DbId,
        id: DbId,
    ) -> Result<Option<UserName>, sqlx::Error> {
        sqlx::query_as::<_, UserName>(
            "SELECT id, full_name, avatar FROM users WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}
