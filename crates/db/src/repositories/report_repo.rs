//! Repository for the `reports` and `report_records` tables.

use sqlx::PgPool;

use angus_core::context::RequestContext;
use angus_core::report::ReportStatus;
use angus_core::types::DbId;

use crate::models::report::{CreateReport, Report, ReportRecord, UpdateReport};
use crate::PgTx;

pub(crate) const COLUMNS: &str = "\
    t.id, t.tenant_id, t.project_id, t.name, t.version, t.description, t.template, \
    t.category, t.status, t.target_id, t.content_filter, t.failure_message, \
    t.deleted_at, t.created_by, t.created_at, t.last_modified_by, t.updated_at";

const RECORD_COLUMNS: &str = "id, report_id, content, created_by, created_at";

const DEFAULT_VERSION: &str = "1.0";

pub struct ReportRepo;

impl ReportRepo {
    // -----------------------------------------------------------------------
    // Reports
    // -----------------------------------------------------------------------

    pub async fn insert(
        tx: &mut PgTx<'_>,
        ctx: &RequestContext,
        name: &str,
        input: &CreateReport,
    ) -> Result<Report, sqlx::Error> {
        let query = format!(
            "INSERT INTO reports AS t \
                 (tenant_id, project_id, name, version, description, template, category, \
                  target_id, content_filter, created_by, last_modified_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Report>(&query)
            .bind(ctx.tenant_id)
            .bind(input.project_id)
            .bind(name)
            .bind(input.version.as_deref().unwrap_or(DEFAULT_VERSION))
            .bind(&input.description)
            .bind(input.template.as_str())
            .bind(input.template.category().as_str())
            .bind(input.target_id)
            .bind(&input.content_filter)
            .bind(ctx.user_id)
            .fetch_one(&mut **tx)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        tenant_id: DbId,
        id: DbId,
    ) -> Result<Option<Report>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM reports t \
             WHERE t.tenant_id = $1 AND t.id = $2 AND t.deleted_at IS NULL"
        );
        sqlx::query_as::<_, Report>(&query)
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
        input: &UpdateReport,
    ) -> Result<Option<Report>, sqlx::Error> {
        let query = format!(
            "UPDATE reports t SET \
                 name = COALESCE($3, t.name), \
                 version = COALESCE($4, t.version), \
                 description = COALESCE($5, t.description), \
                 content_filter = COALESCE($6, t.content_filter), \
                 last_modified_by = $7, \
                 updated_at = NOW() \
             WHERE t.tenant_id = $1 AND t.id = $2 AND t.deleted_at IS NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Report>(&query)
            .bind(ctx.tenant_id)
            .bind(id)
            .bind(name)
            .bind(&input.version)
            .bind(&input.description)
            .bind(&input.content_filter)
            .bind(ctx.user_id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Record the outcome of a generation run.
    pub async fn set_status(
        tx: &mut PgTx<'_>,
        ctx: &RequestContext,
        id: DbId,
        status: ReportStatus,
        failure_message: Option<&str>,
    ) -> Result<Option<Report>, sqlx::Error> {
        let query = format!(
            "UPDATE reports t SET \
                 status = $3, failure_message = $4, last_modified_by = $5, updated_at = NOW() \
             WHERE t.tenant_id = $1 AND t.id = $2 AND t.deleted_at IS NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Report>(&query)
            .bind(ctx.tenant_id)
            .bind(id)
            .bind(status.as_str())
            .bind(failure_message)
            .bind(ctx.user_id)
            .fetch_optional(&mut **tx)
            .await
    }

    pub async fn soft_delete(
        tx: &mut PgTx<'_>,
        ctx: &RequestContext,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE reports SET deleted_at = NOW(), last_modified_by = $3, updated_at = NOW() \
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
            "SELECT COUNT(*) FROM reports WHERE project_id = $1 AND deleted_at IS NULL",
        )
        .bind(project_id)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    // -----------------------------------------------------------------------
    // Records
    // -----------------------------------------------------------------------

    pub async fn insert_record(
        tx: &mut PgTx<'_>,
        report_id: DbId,
        content: &serde_json::Value,
        user_id: DbId,
    ) -> Result<ReportRecord, sqlx::Error> {
        let query = format!(
            "INSERT INTO report_records (report_id, content, created_by) \
             VALUES ($1, $2, $3) \
             RETURNING {RECORD_COLUMNS}"
        );
        sqlx::query_as::<_, ReportRecord>(&query)
            .bind(report_id)
            .bind(content)
            .bind(user_id)
            .fetch_one(&mut **tx)
            .await
    }

    /// Snapshots of a report, newest first.
    pub async fn list_records(
        pool: &PgPool,
        report_id: DbId,
    ) -> Result<Vec<ReportRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {RECORD_COLUMNS} FROM report_records \
             WHERE report_id = $1 ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, ReportRecord>(&query)
            .bind(report_id)
            .fetch_all(pool)
            .await
    }
}
