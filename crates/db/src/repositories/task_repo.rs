//! Repository for the `tasks` table.

use sqlx::PgPool;

use angus_core::context::RequestContext;
use angus_core::task::{format_code, TaskDate, TaskStatus, TaskTransition, TASK_CODE_PREFIX};
use angus_core::types::DbId;

use crate::models::task::{NewTask, Task, UpdateTask};
use crate::models::RefItem;
use crate::repositories::next_code_seq;
use crate::PgTx;

pub(crate) const COLUMNS: &str = "\
    t.id, t.tenant_id, t.project_id, t.sprint_id, t.name, t.code, t.task_type, \
    t.status, t.priority, t.assignee_id, t.confirmer_id, t.deadline_date, \
    t.start_date, t.processed_date, t.confirmed_date, t.completed_date, \
    t.canceled_date, t.eval_workload, t.actual_workload, t.failure_count, \
    t.description, t.deleted_at, t.created_by, t.created_at, \
    t.last_modified_by, t.updated_at";

pub struct TaskRepo;

impl TaskRepo {
    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Insert a task, allocating the next `T000123` code of its project.
    pub async fn insert(tx: &mut PgTx<'_>, new: &NewTask) -> Result<Task, sqlx::Error> {
        let seq = next_code_seq(tx, "tasks", new.project_id, TASK_CODE_PREFIX).await?;
        let code = format_code(TASK_CODE_PREFIX, seq);

        let query = format!(
            "INSERT INTO tasks AS t \
                 (tenant_id, project_id, sprint_id, name, code, task_type, priority, \
                  assignee_id, confirmer_id, deadline_date, eval_workload, description, \
                  created_by, last_modified_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $13) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(new.tenant_id)
            .bind(new.project_id)
            .bind(new.sprint_id)
            .bind(&new.name)
            .bind(&code)
            .bind(new.task_type.as_str())
            .bind(new.priority.as_str())
            .bind(new.assignee_id)
            .bind(new.confirmer_id)
            .bind(new.deadline_date)
            .bind(new.eval_workload)
            .bind(&new.description)
            .bind(new.created_by)
            .fetch_one(&mut **tx)
            .await
    }

    pub async fn update(
        tx: &mut PgTx<'_>,
        ctx: &RequestContext,
        id: DbId,
        name: Option<&str>,
        input: &UpdateTask,
    ) -> Result<Option<Task>, sqlx::Error> {
        let query = format!(
            "UPDATE tasks t SET \
                 name = COALESCE($3, t.name), \
                 task_type = COALESCE($4, t.task_type), \
                 priority = COALESCE($5, t.priority), \
                 confirmer_id = COALESCE($6, t.confirmer_id), \
                 deadline_date = COALESCE($7, t.deadline_date), \
                 eval_workload = COALESCE($8, t.eval_workload), \
                 actual_workload = COALESCE($9, t.actual_workload), \
                 description = COALESCE($10, t.description), \
                 last_modified_by = $11, \
                 updated_at = NOW() \
             WHERE t.tenant_id = $1 AND t.id = $2 AND t.deleted_at IS NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(ctx.tenant_id)
            .bind(id)
            .bind(name)
            .bind(input.task_type.map(|t| t.as_str()))
            .bind(input.priority.map(|p| p.as_str()))
            .bind(input.confirmer_id)
            .bind(input.deadline_date)
            .bind(input.eval_workload)
            .bind(input.actual_workload)
            .bind(&input.description)
            .bind(ctx.user_id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Set or clear the assignee.
    pub async fn assign(
        tx: &mut PgTx<'_>,
        ctx: &RequestContext,
        id: DbId,
        assignee_id: Option<DbId>,
    ) -> Result<Option<Task>, sqlx::Error> {
        let query = format!(
            "UPDATE tasks t SET assignee_id = $3, last_modified_by = $4, updated_at = NOW() \
             WHERE t.tenant_id = $1 AND t.id = $2 AND t.deleted_at IS NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(ctx.tenant_id)
            .bind(id)
            .bind(assignee_id)
            .bind(ctx.user_id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Move a task into another sprint of its project, or out of any sprint.
    pub async fn move_to_sprint(
        tx: &mut PgTx<'_>,
        ctx: &RequestContext,
        id: DbId,
        sprint_id: Option<DbId>,
    ) -> Result<Option<Task>, sqlx::Error> {
        let query = format!(
            "UPDATE tasks t SET sprint_id = $3, last_modified_by = $4, updated_at = NOW() \
             WHERE t.tenant_id = $1 AND t.id = $2 AND t.deleted_at IS NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(ctx.tenant_id)
            .bind(id)
            .bind(sprint_id)
            .bind(ctx.user_id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Write a status transition, stamping and clearing its date columns.
    ///
    /// The `WHERE` clause re-checks the expected current status so a
    /// concurrent transition makes this return `None`.
    pub async fn apply_transition(
        tx: &mut PgTx<'_>,
        ctx: &RequestContext,
        id: DbId,
        from: TaskStatus,
        transition: &TaskTransition,
    ) -> Result<Option<Task>, sqlx::Error> {
        let mut sets = vec![
            "status = $4".to_string(),
            "failure_count = t.failure_count + $5".to_string(),
        ];
        for stamp in transition.stamps {
            sets.push(format!("{} = NOW()", stamp.column()));
        }
        if transition.clear_progress_dates {
            for date in [
                TaskDate::Processed,
                TaskDate::Confirmed,
                TaskDate::Completed,
                TaskDate::Canceled,
            ] {
                sets.push(format!("{} = NULL", date.column()));
            }
        }

        let query = format!(
            "UPDATE tasks t SET {}, last_modified_by = $6, updated_at = NOW() \
             WHERE t.tenant_id = $1 AND t.id = $2 AND t.status = $3 AND t.deleted_at IS NULL \
             RETURNING {COLUMNS}",
            sets.join(", ")
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(ctx.tenant_id)
            .bind(id)
            .bind(from.as_str())
            .bind(transition.status.as_str())
            .bind(transition.failure_increment)
            .bind(ctx.user_id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Reset every live task of a sprint to PENDING (sprint restart).
    pub async fn reset_sprint_tasks(
        tx: &mut PgTx<'_>,
        ctx: &RequestContext,
        sprint_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE tasks SET status = 'PENDING', start_date = NULL, processed_date = NULL, \
                 confirmed_date = NULL, completed_date = NULL, canceled_date = NULL, \
                 last_modified_by = $3, updated_at = NOW() \
             WHERE tenant_id = $1 AND sprint_id = $2 AND deleted_at IS NULL",
        )
        .bind(ctx.tenant_id)
        .bind(sprint_id)
        .bind(ctx.user_id)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn soft_delete(
        tx: &mut PgTx<'_>,
        ctx: &RequestContext,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE tasks SET deleted_at = NOW(), last_modified_by = $3, updated_at = NOW() \
             WHERE tenant_id = $1 AND id = $2 AND deleted_at IS NULL",
        )
        .bind(ctx.tenant_id)
        .bind(id)
        .bind(ctx.user_id)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub async fn find_by_id(
        pool: &PgPool,
        tenant_id: DbId,
        id: DbId,
    ) -> Result<Option<Task>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tasks t \
             WHERE t.tenant_id = $1 AND t.id = $2 AND t.deleted_at IS NULL"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Live tasks of a project, optionally restricted to one sprint.
    pub async fn list_for_stats(
        pool: &PgPool,
        tenant_id: DbId,
        project_id: DbId,
        sprint_id: Option<DbId>,
    ) -> Result<Vec<Task>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tasks t \
             WHERE t.tenant_id = $1 AND t.project_id = $2 AND t.deleted_at IS NULL \
               AND ($3::BIGINT IS NULL OR t.sprint_id = $3) \
             ORDER BY t.id"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(tenant_id)
            .bind(project_id)
            .bind(sprint_id)
            .fetch_all(pool)
            .await
    }

    /// Live tasks of a sprint that are not yet completed or canceled.
    pub async fn count_unfinished_in_sprint(
        pool: &PgPool,
        sprint_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        let unfinished: Vec<&str> = TaskStatus::ALL
            .iter()
            .filter(|s| !s.is_terminal())
            .map(|s| s.as_str())
            .collect();
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM tasks \
             WHERE sprint_id = $1 AND deleted_at IS NULL AND status = ANY($2)",
        )
        .bind(sprint_id)
        .bind(&unfinished)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    pub async fn count_in_sprint(pool: &PgPool, sprint_id: DbId) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM tasks WHERE sprint_id = $1 AND deleted_at IS NULL",
        )
        .bind(sprint_id)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    /// `id`, `name` and `code` of live tasks among `ids`.
    pub async fn ref_items(pool: &PgPool, ids: &[DbId]) -> Result<Vec<RefItem>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, RefItem>(
            "SELECT id, name, code FROM tasks \
             WHERE id = ANY($1) AND deleted_at IS NULL ORDER BY id",
        )
        .bind(ids)
        .fetch_all(pool)
        .await
    }

    /// How many of `ids` are live tasks of `project_id`.
    pub async fn count_in_project(
        pool: &PgPool,
        project_id: DbId,
        ids: &[DbId],
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM tasks \
             WHERE project_id = $1 AND id = ANY($2) AND deleted_at IS NULL",
        )
        .bind(project_id)
        .bind(ids)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }
}
