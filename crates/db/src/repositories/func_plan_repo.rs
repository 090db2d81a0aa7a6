//! Repository for the `func_plans` table.

use sqlx::PgPool;

use angus_core::context::RequestContext;
use angus_core::func::PlanStatus;
use angus_core::types::{DbId, Timestamp};

use crate::models::func_plan::{FuncPlan, UpdatePlan};
use crate::PgTx;

pub(crate) const COLUMNS: &str = "\
    t.id, t.tenant_id, t.project_id, t.name, t.status, t.owner_id, \
    t.start_date, t.deadline_date, t.review_flag, t.description, \
    t.deleted_at, t.created_by, t.created_at, t.last_modified_by, t.updated_at";

#[derive(Debug, Clone)]
pub struct NewPlan<'a> {
    pub project_id: DbId,
    pub name: &'a str,
    pub owner_id: DbId,
    pub start_date: Timestamp,
    pub deadline_date: Timestamp,
    pub review_flag: bool,
    pub description: Option<&'a str>,
}

pub struct FuncPlanRepo;

impl FuncPlanRepo {
    pub async fn insert(
        tx: &mut PgTx<'_>,
        ctx: &RequestContext,
        new: &NewPlan<'_>,
    ) -> Result<FuncPlan, sqlx::Error> {
        let query = format!(
            "INSERT INTO func_plans AS t \
                 (tenant_id, project_id, name, owner_id, start_date, deadline_date, \
                  review_flag, description, created_by, last_modified_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FuncPlan>(&query)
            .bind(ctx.tenant_id)
            .bind(new.project_id)
            .bind(new.name)
            .bind(new.owner_id)
            .bind(new.start_date)
            .bind(new.deadline_date)
            .bind(new.review_flag)
            .bind(new.description)
            .bind(ctx.user_id)
            .fetch_one(&mut **tx)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        tenant_id: DbId,
        id: DbId,
    ) -> Result<Option<FuncPlan>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM func_plans t \
             WHERE t.tenant_id = $1 AND t.id = $2 AND t.deleted_at IS NULL"
        );
        sqlx::query_as::<_, FuncPlan>(&query)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn update(
        tx: &mut PgTx<'_>,
        ctx: &RequestContext,
        id: DbId,
        name: Option<&str>,
        input: &UpdatePlan,
    ) -> Result<Option<FuncPlan>, sqlx::Error> {
        let query = format!(
            "UPDATE func_plans t SET \
                 name = COALESCE($3, t.name), \
                 owner_id = COALESCE($4, t.owner_id), \
                 start_date = COALESCE($5, t.start_date), \
                 deadline_date = COALESCE($6, t.deadline_date), \
                 review_flag = COALESCE($7, t.review_flag), \
                 description = COALESCE($8, t.description), \
                 last_modified_by = $9, \
                 updated_at = NOW() \
             WHERE t.tenant_id = $1 AND t.id = $2 AND t.deleted_at IS NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FuncPlan>(&query)
            .bind(ctx.tenant_id)
            .bind(id)
            .bind(name)
            .bind(input.owner_id)
            .bind(input.start_date)
            .bind(input.deadline_date)
            .bind(input.review_flag)
            .bind(&input.description)
            .bind(ctx.user_id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Move from `from` to `to`. `None` when the row is gone or no longer
    /// in `from`.
    pub async fn set_status(
        tx: &mut PgTx<'_>,
        ctx: &RequestContext,
        id: DbId,
        from: PlanStatus,
        to: PlanStatus,
    ) -> Result<Option<FuncPlan>, sqlx::Error> {
        let query = format!(
            "UPDATE func_plans t SET status = $3, last_modified_by = $4, updated_at = NOW() \
             WHERE t.tenant_id = $1 AND t.id = $2 AND t.status = $5 AND t.deleted_at IS NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FuncPlan>(&query)
            .bind(ctx.tenant_id)
            .bind(id)
            .bind(to.as_str())
            .bind(ctx.user_id)
            .bind(from.as_str())
            .fetch_optional(&mut **tx)
            .await
    }

    pub async fn soft_delete(
        tx: &mut PgTx<'_>,
        ctx: &RequestContext,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE func_plans SET deleted_at = NOW(), last_modified_by = $3, updated_at = NOW() \
             WHERE tenant_id = $1 AND id = $2 AND deleted_at IS NULL",
        )
        .bind(ctx.tenant_id)
        .bind(id)
        .bind(ctx.user_id)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count_in_project(pool: &PgPool, project_id: DbId) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM func_plans WHERE project_id = $1 AND deleted_at IS NULL",
        )
        .bind(project_id)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }
}
