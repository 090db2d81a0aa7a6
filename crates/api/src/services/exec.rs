//! Executions: test jobs queued for an external runner.
//!
//! The service owns the lifecycle up to PENDING and the STOPPED override;
//! the runner drives RUNNING and the terminal states through
//! [`report_result`].

use angus_core::activity::{ActivityType, TargetType};
use angus_core::biz;
use angus_core::context::RequestContext;
use angus_core::error::CoreError;
use angus_core::exec::{check_runner_report, check_start, check_stop, validate_load, ExecStatus};
use angus_core::search::SearchRequest;
use angus_core::types::DbId;
use angus_db::models::activity::NewActivity;
use angus_db::models::exec::{CreateExec, Exec, ExecResultReport, UpdateExec};
use angus_db::models::Paged;
use angus_db::repositories::{ActivityRepo, ExecRepo};
use angus_db::search::EXEC_SEARCH;
use sqlx::PgPool;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::{access, search};

pub async fn create(pool: &PgPool, ctx: &RequestContext, input: CreateExec) -> AppResult<Exec> {
    let input = &input;
    biz::run(
        async {
            input.validate().map_err(CoreError::from)?;
            access::require_project(pool, ctx, input.project_id).await?;
            access::required_name(&input.name)?;
            validate_load(input.thread_count, input.iterations, input.duration_secs)?;
            Ok::<_, AppError>(())
        },
        |()| async move {
            let mut tx = pool.begin().await?;
            let exec = ExecRepo::insert(&mut tx, ctx, input).await?;
            ActivityRepo::insert(&mut tx, &activity(ctx, &exec, ActivityType::Created)).await?;
            tx.commit().await?;

            tracing::info!(
                tenant_id = ctx.tenant_id,
                project_id = exec.project_id,
                exec_id = exec.id,
                script_type = %exec.script_type,
                "Execution created"
            );
            Ok(exec)
        },
    )
    .await
}

pub async fn update(
    pool: &PgPool,
    ctx: &RequestContext,
    id: DbId,
    input: UpdateExec,
) -> AppResult<Exec> {
    let input = &input;
    biz::run(
        async {
            input.validate().map_err(CoreError::from)?;
            let exec = load(pool, ctx, id).await?;
            refuse_while_active(&exec)?;
            if let Some(name) = &input.name {
                access::required_name(name)?;
            }
            validate_load(
                input.thread_count.unwrap_or(exec.thread_count),
                input.iterations.or(exec.iterations),
                input.duration_secs.or(exec.duration_secs),
            )?;
            Ok::<_, AppError>(())
        },
        |()| async move {
            let mut tx = pool.begin().await?;
            let exec = ExecRepo::update(&mut tx, ctx, id, input)
                .await?
                .ok_or(AppError::not_found("Exec", id))?;
            ActivityRepo::insert(&mut tx, &activity(ctx, &exec, ActivityType::Updated)).await?;
            tx.commit().await?;
            Ok(exec)
        },
    )
    .await
}

pub async fn delete(pool: &PgPool, ctx: &RequestContext, id: DbId) -> AppResult<()> {
    biz::run(
        async {
            let exec = load(pool, ctx, id).await?;
            refuse_while_active(&exec)?;
            Ok::<_, AppError>(exec)
        },
        |exec| async move {
            let mut tx = pool.begin().await?;
            if !ExecRepo::delete(&mut tx, ctx.tenant_id, id).await? {
                return Err(AppError::not_found("Exec", id));
            }
            ActivityRepo::insert(&mut tx, &activity(ctx, &exec, ActivityType::Deleted)).await?;
            tx.commit().await?;

            tracing::info!(tenant_id = ctx.tenant_id, exec_id = id, "Execution deleted");
            Ok(())
        },
    )
    .await
}

/// Queue the execution for the runner.
pub async fn start(pool: &PgPool, ctx: &RequestContext, id: DbId) -> AppResult<Exec> {
    biz::run(
        async {
            let exec = load(pool, ctx, id).await?;
            let from = ExecStatus::from_str_value(&exec.status)?;
            check_start(from)?;
            Ok::<_, AppError>(from)
        },
        |from| async move {
            let mut tx = pool.begin().await?;
            let exec = ExecRepo::mark_pending(&mut tx, ctx, id, from)
                .await?
                .ok_or_else(|| concurrent_change(id))?;
            ActivityRepo::insert(&mut tx, &activity(ctx, &exec, ActivityType::ExecStarted))
                .await?;
            tx.commit().await?;

            tracing::info!(tenant_id = ctx.tenant_id, exec_id = id, from = %from, "Execution queued");
            Ok(exec)
        },
    )
    .await
}

pub async fn stop(pool: &PgPool, ctx: &RequestContext, id: DbId) -> AppResult<Exec> {
    biz::run(
        async {
            let exec = load(pool, ctx, id).await?;
            let from = ExecStatus::from_str_value(&exec.status)?;
            check_stop(from)?;
            Ok::<_, AppError>(from)
        },
        |from| async move {
            let mut tx = pool.begin().await?;
            let exec = ExecRepo::mark_stopped(&mut tx, ctx, id, from)
                .await?
                .ok_or_else(|| concurrent_change(id))?;
            ActivityRepo::insert(&mut tx, &activity(ctx, &exec, ActivityType::ExecStopped))
                .await?;
            tx.commit().await?;

            tracing::info!(tenant_id = ctx.tenant_id, exec_id = id, from = %from, "Execution stopped");
            Ok(exec)
        },
    )
    .await
}

/// Apply a status report from the runner.
///
/// The report is accepted only while the execution is PENDING or RUNNING,
/// so a late report cannot overwrite a user's stop.
pub async fn report_result(
    pool: &PgPool,
    ctx: &RequestContext,
    id: DbId,
    report: ExecResultReport,
) -> AppResult<Exec> {
    let report = &report;
    biz::run(
        async {
            report.validate().map_err(CoreError::from)?;
            let exec = ExecRepo::find_for_runner(pool, id)
                .await?
                .ok_or(AppError::not_found("Exec", id))?;
            ctx.require_same_tenant(exec.tenant_id)?;
            let from = ExecStatus::from_str_value(&exec.status)?;
            check_runner_report(from, report.status)?;
            if let (Some(start), Some(end)) = (report.start_at, report.end_at) {
                if start > end {
                    return Err(AppError::Core(CoreError::Validation(
                        "start_at must not be after end_at".to_string(),
                    )));
                }
            }
            Ok::<_, AppError>(from)
        },
        |from| async move {
            let exec = ExecRepo::apply_report(pool, id, from, report)
                .await?
                .ok_or_else(|| concurrent_change(id))?;

            tracing::info!(
                exec_id = id,
                from = %from,
                to = %report.status,
                "Runner reported execution status"
            );
            Ok(exec)
        },
    )
    .await
}

pub async fn get(pool: &PgPool, ctx: &RequestContext, id: DbId) -> AppResult<Exec> {
    load(pool, ctx, id).await
}

pub async fn search(
    pool: &PgPool,
    ctx: &RequestContext,
    req: &SearchRequest,
    project_id: Option<DbId>,
) -> AppResult<Paged<Exec>> {
    search::scoped_search(pool, ctx, &EXEC_SEARCH, req, project_id).await
}

async fn load(pool: &PgPool, ctx: &RequestContext, id: DbId) -> AppResult<Exec> {
    let exec = ExecRepo::find_by_id(pool, ctx.tenant_id, id)
        .await?
        .ok_or(AppError::not_found("Exec", id))?;
    access::require_member(pool, ctx, exec.project_id).await?;
    Ok(exec)
}

fn refuse_while_active(exec: &Exec) -> Result<(), CoreError> {
    match ExecStatus::from_str_value(&exec.status)? {
        ExecStatus::Pending | ExecStatus::Running => Err(CoreError::Business(format!(
            "Execution {} is {} and cannot be changed",
            exec.id, exec.status
        ))),
        _ => Ok(()),
    }
}

fn concurrent_change(id: DbId) -> AppError {
    AppError::Core(CoreError::Conflict(format!(
        "Execution {id} changed status concurrently"
    )))
}

fn activity(ctx: &RequestContext, exec: &Exec, kind: ActivityType) -> NewActivity {
    NewActivity::new(
        ctx,
        Some(exec.project_id),
        TargetType::Exec,
        exec.id,
        &exec.name,
        kind,
    )
}
