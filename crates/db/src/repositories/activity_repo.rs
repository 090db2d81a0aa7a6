//! Repository for the append-only `activities` table.

use sqlx::PgPool;

use angus_core::activity::TargetType;
use angus_core::types::DbId;

use crate::models::activity::{Activity, NewActivity};
use crate::PgTx;

pub(crate) const COLUMNS: &str = "\
    id, tenant_id, project_id, user_id, target_type, target_id, \
    target_name, activity_type, detail, opt_date";

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 200;

pub struct ActivityRepo;

impl ActivityRepo {
    /// Append one activity inside the caller's transaction.
    pub async fn insert(tx: &mut PgTx<'_>, activity: &NewActivity) -> Result<DbId, sqlx::Error> {
        let (id,): (DbId,) = sqlx::query_as(
            "INSERT INTO activities \
                 (tenant_id, project_id, user_id, target_type, target_id, \
                  target_name, activity_type, detail) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING id",
        )
        .bind(activity.tenant_id)
        .bind(activity.project_id)
        .bind(activity.user_id)
        .bind(activity.target_type.as_str())
        .bind(activity.target_id)
        .bind(&activity.target_name)
        .bind(activity.activity_type.as_str())
        .bind(&activity.detail)
        .fetch_one(&mut **tx)
        .await?;
        Ok(id)
    }

    /// Append several activities inside the caller's transaction.
    pub async fn insert_all(
        tx: &mut PgTx<'_>,
        activities: &[NewActivity],
    ) -> Result<(), sqlx::Error> {
        for activity in activities {
            Self::insert(tx, activity).await?;
        }
        Ok(())
    }

    /// Activities of one target, newest first.
    pub async fn list_for_target(
        pool: &PgPool,
        tenant_id: DbId,
        target_type: TargetType,
        target_id: DbId,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Activity>, sqlx::Error> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = offset.unwrap_or(0).max(0);
        let query = format!(
            "SELECT {COLUMNS} FROM activities \
             WHERE tenant_id = $1 AND target_type = $2 AND target_id = $3 \
             ORDER BY opt_date DESC, id DESC \
             LIMIT $4 OFFSET $5"
        );
        sqlx::query_as::<_, Activity>(&query)
            .bind(tenant_id)
            .bind(target_type.as_str())
            .bind(target_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }
}
