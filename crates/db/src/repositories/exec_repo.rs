//! Repository for the `execs` job table read by the external runner.

use sqlx::PgPool;

use angus_core::context::RequestContext;
use angus_core::exec::ExecStatus;
use angus_core::types::DbId;

use crate::models::exec::{CreateExec, Exec, ExecResultReport, UpdateExec};
use crate::PgTx;

pub(crate) const COLUMNS: &str = "\
    t.id, t.tenant_id, t.project_id, t.name, t.script_type, t.plugin, t.script_id, \
    t.script_yaml, t.status, t.priority, t.thread_count, t.iterations, t.duration_secs, \
    t.ignore_assertions, t.available_node_ids, t.assign_node_ids, t.exec_by, \
    t.start_at, t.end_at, t.meter_status, t.meter_message, t.sample_summary, \
    t.created_by, t.created_at, t.last_modified_by, t.updated_at";

const DEFAULT_PRIORITY: i32 = 1000;
const DEFAULT_PLUGIN: &str = "Http";

pub struct ExecRepo;

impl ExecRepo {
    pub async fn insert(
        tx: &mut PgTx<'_>,
        ctx: &RequestContext,
        input: &CreateExec,
    ) -> Result<Exec, sqlx::Error> {
        let query = format!(
            "INSERT INTO execs AS t \
                 (tenant_id, project_id, name, script_type, plugin, script_id, script_yaml, \
                  priority, thread_count, iterations, duration_secs, ignore_assertions, \
                  available_node_ids, created_by, last_modified_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $14) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Exec>(&query)
            .bind(ctx.tenant_id)
            .bind(input.project_id)
            .bind(input.name.trim())
            .bind(input.script_type.as_str())
            .bind(input.plugin.as_deref().unwrap_or(DEFAULT_PLUGIN))
            .bind(input.script_id)
            .bind(&input.script_yaml)
            .bind(input.priority.unwrap_or(DEFAULT_PRIORITY))
            .bind(input.thread_count)
            .bind(input.iterations)
            .bind(input.duration_secs)
            .bind(input.ignore_assertions)
            .bind(&input.available_node_ids)
            .bind(ctx.user_id)
            .fetch_one(&mut **tx)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        tenant_id: DbId,
        id: DbId,
    ) -> Result<Option<Exec>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM execs t WHERE t.tenant_id = $1 AND t.id = $2");
        sqlx::query_as::<_, Exec>(&query)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Runner lookups are not tenant-scoped.
    pub async fn find_for_runner(pool: &PgPool, id: DbId) -> Result<Option<Exec>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM execs t WHERE t.id = $1");
        sqlx::query_as::<_, Exec>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn update(
        tx: &mut PgTx<'_>,
        ctx: &RequestContext,
        id: DbId,
        input: &UpdateExec,
    ) -> Result<Option<Exec>, sqlx::Error> {
        let query = format!(
            "UPDATE execs t SET \
                 name = COALESCE($3, t.name), \
                 script_yaml = COALESCE($4, t.script_yaml), \
                 priority = COALESCE($5, t.priority), \
                 thread_count = COALESCE($6, t.thread_count), \
                 iterations = COALESCE($7, t.iterations), \
                 duration_secs = COALESCE($8, t.duration_secs), \
                 ignore_assertions = COALESCE($9, t.ignore_assertions), \
                 available_node_ids = COALESCE($10, t.available_node_ids), \
                 last_modified_by = $11, \
                 updated_at = NOW() \
             WHERE t.tenant_id = $1 AND t.id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Exec>(&query)
            .bind(ctx.tenant_id)
            .bind(id)
            .bind(input.name.as_deref().map(str::trim))
            .bind(&input.script_yaml)
            .bind(input.priority)
            .bind(input.thread_count)
            .bind(input.iterations)
            .bind(input.duration_secs)
            .bind(input.ignore_assertions)
            .bind(&input.available_node_ids)
            .bind(ctx.user_id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Queue for the runner; clears the previous run's results.
    pub async fn mark_pending(
        tx: &mut PgTx<'_>,
        ctx: &RequestContext,
        id: DbId,
        from: ExecStatus,
    ) -> Result<Option<Exec>, sqlx::Error> {
        let query = format!(
            "UPDATE execs t SET \
                 status = 'PENDING', exec_by = $4, start_at = NULL, end_at = NULL, \
                 assign_node_ids = '{{}}', meter_status = NULL, meter_message = NULL, \
                 sample_summary = NULL, last_modified_by = $4, updated_at = NOW() \
             WHERE t.tenant_id = $1 AND t.id = $2 AND t.status = $3 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Exec>(&query)
            .bind(ctx.tenant_id)
            .bind(id)
            .bind(from.as_str())
            .bind(ctx.user_id)
            .fetch_optional(&mut **tx)
            .await
    }

    pub async fn mark_stopped(
        tx: &mut PgTx<'_>,
        ctx: &RequestContext,
        id: DbId,
        from: ExecStatus,
    ) -> Result<Option<Exec>, sqlx::Error> {
        let query = format!(
            "UPDATE execs t SET \
                 status = 'STOPPED', end_at = COALESCE(t.end_at, NOW()), \
                 last_modified_by = $4, updated_at = NOW() \
             WHERE t.tenant_id = $1 AND t.id = $2 AND t.status = $3 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Exec>(&query)
            .bind(ctx.tenant_id)
            .bind(id)
            .bind(from.as_str())
            .bind(ctx.user_id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Apply a runner report if the row is still in `from`.
    pub async fn apply_report(
        pool: &PgPool,
        id: DbId,
        from: ExecStatus,
        report: &ExecResultReport,
    ) -> Result<Option<Exec>, sqlx::Error> {
        let query = format!(
            "UPDATE execs t SET \
                 status = $3, \
                 start_at = COALESCE($4, t.start_at), \
                 end_at = COALESCE($5, t.end_at), \
                 assign_node_ids = CASE WHEN cardinality($6::BIGINT[]) > 0 \
                     THEN $6 ELSE t.assign_node_ids END, \
                 meter_status = COALESCE($7, t.meter_status), \
                 meter_message = COALESCE($8, t.meter_message), \
                 sample_summary = COALESCE($9, t.sample_summary), \
                 updated_at = NOW() \
             WHERE t.id = $1 AND t.status = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Exec>(&query)
            .bind(id)
            .bind(from.as_str())
            .bind(report.status.as_str())
            .bind(report.start_at)
            .bind(report.end_at)
            .bind(&report.assign_node_ids)
            .bind(&report.meter_status)
            .bind(&report.meter_message)
            .bind(&report.sample_summary)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(tx: &mut PgTx<'_>, tenant_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM execs WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count_in_project(pool: &PgPool, project_id: DbId) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM execs WHERE project_id = $1")
            .bind(project_id)
            .fetch_one(pool)
            .await?;
        Ok(count)
    }
}
