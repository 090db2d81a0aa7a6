//! Repository for the `task_sprints` table.

use sqlx::PgPool;

use angus_core::context::RequestContext;
use angus_core::sprint::SprintStatus;
use angus_core::types::{DbId, Timestamp};

use crate::models::sprint::{TaskSprint, UpdateSprint};
use crate::PgTx;

pub(crate) const COLUMNS: &str = "\
    t.id, t.tenant_id, t.project_id, t.name, t.status, t.owner_id, \
    t.start_date, t.deadline_date, t.acceptance_criteria, t.other_information, \
    t.deleted_at, t.created_by, t.created_at, t.last_modified_by, t.updated_at";

/// Normalized insert values for a sprint.
#[derive(Debug, Clone)]
pub struct NewSprint<'a> {
    pub project_id: DbId,
    pub name: &'a str,
    pub owner_id: DbId,
    pub start_date: Timestamp,
    pub deadline_date: Timestamp,
    pub acceptance_criteria: Option<&'a str>,
    pub other_information: Option<&'a str>,
}

pub struct SprintRepo;

impl SprintRepo {
    pub async fn insert(
        tx: &mut PgTx<'_>,
        ctx: &RequestContext,
        new: &NewSprint<'_>,
    ) -> Result<TaskSprint, sqlx::Error> {
        let query = format!(
            "INSERT INTO task_sprints AS t \
                 (tenant_id, project_id, name, owner_id, start_date, deadline_date, \
                  acceptance_criteria, other_information, created_by, last_modified_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TaskSprint>(&query)
            .bind(ctx.tenant_id)
            .bind(new.project_id)
            .bind(new.name)
            .bind(new.owner_id)
            .bind(new.start_date)
            .bind(new.deadline_date)
            .bind(new.acceptance_criteria)
            .bind(new.other_information)
            .bind(ctx.user_id)
            .fetch_one(&mut **tx)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        tenant_id: DbId,
        id: DbId,
    ) -> Result<Option<TaskSprint>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM task_sprints t \
             WHERE t.tenant_id = $1 AND t.id = $2 AND t.deleted_at IS NULL"
        );
        sqlx::query_as::<_, TaskSprint>(&query)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_by_project(
        pool: &PgPool,
        tenant_id: DbId,
        project_id: DbId,
    ) -> Result<Vec<TaskSprint>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM task_sprints t \
             WHERE t.tenant_id = $1 AND t.project_id = $2 AND t.deleted_at IS NULL \
             ORDER BY t.start_date DESC, t.id DESC"
        );
        sqlx::query_as::<_, TaskSprint>(&query)
            .bind(tenant_id)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        tx: &mut PgTx<'_>,
        ctx: &RequestContext,
        id: DbId,
        name: Option<&str>,
        input: &UpdateSprint,
    ) -> Result<Option<TaskSprint>, sqlx::Error> {
        let query = format!(
            "UPDATE task_sprints t SET \
                 name = COALESCE($3, t.name), \
                 owner_id = COALESCE($4, t.owner_id), \
                 start_date = COALESCE($5, t.start_date), \
                 deadline_date = COALESCE($6, t.deadline_date), \
                 acceptance_criteria = COALESCE($7, t.acceptance_criteria), \
                 other_information = COALESCE($8, t.other_information), \
                 last_modified_by = $9, \
                 updated_at = NOW() \
             WHERE t.tenant_id = $1 AND t.id = $2 AND t.deleted_at IS NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TaskSprint>(&query)
            .bind(ctx.tenant_id)
            .bind(id)
            .bind(name)
            .bind(input.owner_id)
            .bind(input.start_date)
            .bind(input.deadline_date)
            .bind(&input.acceptance_criteria)
            .bind(&input.other_information)
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
        from: SprintStatus,
        to: SprintStatus,
    ) -> Result<Option<TaskSprint>, sqlx::Error> {
        let query = format!(
            "UPDATE task_sprints t SET status = $3, last_modified_by = $4, updated_at = NOW() \
             WHERE t.tenant_id = $1 AND t.id = $2 AND t.status = $5 AND t.deleted_at IS NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TaskSprint>(&query)
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
            "UPDATE task_sprints SET deleted_at = NOW(), last_modified_by = $3, updated_at = NOW() \
             WHERE tenant_id = $1 AND id = $2 AND deleted_at IS NULL",
        )
        .bind(ctx.tenant_id)
        .bind(id)
        .bind(ctx.user_id)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Live sprints in a project.
    pub async fn count_in_project(pool: &PgPool, project_id: DbId) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM task_sprints WHERE project_id = $1 AND deleted_at IS NULL",
        )
        .bind(project_id)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }
}
