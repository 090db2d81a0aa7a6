//! Reports: named snapshots of a project, sprint, task, plan, case or
//! execution, regenerated on demand.

use angus_core::activity::{ActivityType, TargetType};
use angus_core::biz;
use angus_core::context::RequestContext;
use angus_core::error::CoreError;
use angus_core::quota::QuotaKind;
use angus_core::report::{ReportStatus, ReportTemplate};
use angus_core::search::SearchRequest;
use angus_core::types::{DbId, Timestamp};
use angus_db::models::activity::NewActivity;
use angus_db::models::report::{CreateReport, Report, ReportRecord, UpdateReport};
use angus_db::models::Paged;
use angus_db::repositories::{
    ActivityRepo, ExecRepo, FuncCaseRepo, FuncPlanRepo, ProjectRepo, ReportRepo, SprintRepo,
    TaskRepo,
};
use angus_db::search::REPORT_SEARCH;
use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::{access, analysis, search};

/// Outcome of one generation run.
#[derive(Debug, Serialize)]
pub struct Generation {
    pub report: Report,
    /// The stored snapshot; absent when generation failed.
    pub record: Option<ReportRecord>,
}

#[derive(Serialize)]
struct Snapshot<'a, T: Serialize, R: Serialize> {
    target: &'a T,
    rollup: Option<R>,
}

#[derive(Serialize)]
struct ReportContent {
    template: ReportTemplate,
    generated_at: Timestamp,
    target: serde_json::Value,
}

pub async fn create(pool: &PgPool, ctx: &RequestContext, input: CreateReport) -> AppResult<Report> {
    let input = &input;
    biz::run(
        async {
            input.validate().map_err(CoreError::from)?;
            access::require_project(pool, ctx, input.project_id).await?;
            let name = access::required_name(&input.name)?;
            if target_snapshot(pool, ctx, input.template, input.project_id, input.target_id)
                .await?
                .is_none()
            {
                return Err(AppError::Core(CoreError::Validation(format!(
                    "{} {} not found in project {}",
                    input.template.target_type(),
                    input.target_id,
                    input.project_id
                ))));
            }
            let current = ReportRepo::count_in_project(pool, input.project_id).await?;
            access::enforce_quota(pool, ctx, QuotaKind::ReportsPerProject, current, 1).await?;
            Ok::<_, AppError>(name)
        },
        |name| async move {
            let mut tx = pool.begin().await?;
            let report = ReportRepo::insert(&mut tx, ctx, &name, input).await?;
            ActivityRepo::insert(&mut tx, &activity(ctx, &report, ActivityType::Created)).await?;
            tx.commit().await?;

            tracing::info!(
                tenant_id = ctx.tenant_id,
                project_id = report.project_id,
                report_id = report.id,
                template = %report.template,
                "Report created"
            );
            Ok(report)
        },
    )
    .await
}

pub async fn update(
    pool: &PgPool,
    ctx: &RequestContext,
    id: DbId,
    input: UpdateReport,
) -> AppResult<Report> {
    let input = &input;
    biz::run(
        async {
            input.validate().map_err(CoreError::from)?;
            load(pool, ctx, id).await?;
            let name = input.name.as_deref().map(access::required_name).transpose()?;
            Ok::<_, AppError>(name)
        },
        |name| async move {
            let mut tx = pool.begin().await?;
            let report = ReportRepo::update(&mut tx, ctx, id, name.as_deref(), input)
                .await?
                .ok_or(AppError::not_found("Report", id))?;
            ActivityRepo::insert(&mut tx, &activity(ctx, &report, ActivityType::Updated)).await?;
            tx.commit().await?;
            Ok(report)
        },
    )
    .await
}

/// Move the report to the trash.
pub async fn delete(pool: &PgPool, ctx: &RequestContext, id: DbId) -> AppResult<()> {
    biz::run(load(pool, ctx, id), |report| async move {
        let mut tx = pool.begin().await?;
        if !ReportRepo::soft_delete(&mut tx, ctx, id).await? {
            return Err(AppError::not_found("Report", id));
        }
        ActivityRepo::insert(&mut tx, &activity(ctx, &report, ActivityType::Deleted)).await?;
        tx.commit().await?;

        tracing::info!(tenant_id = ctx.tenant_id, report_id = id, "Report moved to trash");
        Ok(())
    })
    .await
}

/// Snapshot the report target and store it as a new record.
///
/// A target that has since been deleted or moved marks the report FAILURE
/// instead of returning an error, so the failure stays visible on the report.
pub async fn generate(pool: &PgPool, ctx: &RequestContext, id: DbId) -> AppResult<Generation> {
    biz::run(
        async {
            let report = load(pool, ctx, id).await?;
            let template = ReportTemplate::from_str_value(&report.template)?;
            let target =
                target_snapshot(pool, ctx, template, report.project_id, report.target_id).await?;
            let content = match target {
                Some(target) => Ok(to_json(&ReportContent {
                    template,
                    generated_at: Utc::now(),
                    target,
                })?),
                None => Err(format!(
                    "{} {} no longer exists",
                    template.target_type(),
                    report.target_id
                )),
            };
            Ok::<_, AppError>(content)
        },
        |content| async move {
            let mut tx = pool.begin().await?;
            let (status, failure, record) = match &content {
                Ok(content) => (
                    ReportStatus::Success,
                    None,
                    Some(ReportRepo::insert_record(&mut tx, id, content, ctx.user_id).await?),
                ),
                Err(message) => (ReportStatus::Failure, Some(message.as_str()), None),
            };
            let report = ReportRepo::set_status(&mut tx, ctx, id, status, failure)
                .await?
                .ok_or(AppError::not_found("Report", id))?;
            ActivityRepo::insert(
                &mut tx,
                &activity(ctx, &report, ActivityType::ReportGenerated),
            )
            .await?;
            tx.commit().await?;

            match failure {
                None => tracing::info!(report_id = id, "Report generated"),
                Some(reason) => tracing::warn!(report_id = id, reason, "Report generation failed"),
            }
            Ok(Generation { report, record })
        },
    )
    .await
}

pub async fn get(pool: &PgPool, ctx: &RequestContext, id: DbId) -> AppResult<Report> {
    load(pool, ctx, id).await
}

/// Stored snapshots, newest first.
pub async fn records(pool: &PgPool, ctx: &RequestContext, id: DbId) -> AppResult<Vec<ReportRecord>> {
    load(pool, ctx, id).await?;
    Ok(ReportRepo::list_records(pool, id).await?)
}

pub async fn search(
    pool: &PgPool,
    ctx: &RequestContext,
    req: &SearchRequest,
    project_id: Option<DbId>,
) -> AppResult<Paged<Report>> {
    search::scoped_search(pool, ctx, &REPORT_SEARCH, req, project_id).await
}

async fn load(pool: &PgPool, ctx: &RequestContext, id: DbId) -> AppResult<Report> {
    let report = ReportRepo::find_by_id(pool, ctx.tenant_id, id)
        .await?
        .ok_or(AppError::not_found("Report", id))?;
    access::require_member(pool, ctx, report.project_id).await?;
    Ok(report)
}

/// The live target row plus its rollup, or `None` when the target is gone
/// or belongs to another project.
async fn target_snapshot(
    pool: &PgPool,
    ctx: &RequestContext,
    template: ReportTemplate,
    project_id: DbId,
    target_id: DbId,
) -> AppResult<Option<serde_json::Value>> {
    let tenant_id = ctx.tenant_id;
    let value = match template {
        ReportTemplate::ProjectProgress => {
            match ProjectRepo::find_by_id(pool, tenant_id, target_id).await? {
                Some(project) if project.id == project_id => {
                    let overview = analysis::project_overview(pool, ctx, project.id).await?;
                    Some(snapshot(&project, Some(overview))?)
                }
                _ => None,
            }
        }
        ReportTemplate::TaskSprint => match SprintRepo::find_by_id(pool, tenant_id, target_id).await? {
            Some(sprint) if sprint.project_id == project_id => {
                let tasks = analysis::task_count(pool, ctx, project_id, Some(sprint.id)).await?;
                Some(snapshot(&sprint, Some(tasks))?)
            }
            _ => None,
        },
        ReportTemplate::Task => match TaskRepo::find_by_id(pool, tenant_id, target_id).await? {
            Some(task) if task.project_id == project_id => Some(snapshot(&task, None::<()>)?),
            _ => None,
        },
        ReportTemplate::FuncTestingPlan => {
            match FuncPlanRepo::find_by_id(pool, tenant_id, target_id).await? {
                Some(plan) if plan.project_id == project_id => {
                    let cases = analysis::case_count(pool, ctx, project_id, Some(plan.id)).await?;
                    Some(snapshot(&plan, Some(cases))?)
                }
                _ => None,
            }
        }
        ReportTemplate::FuncTestingCase => {
            match FuncCaseRepo::find_by_id(pool, tenant_id, target_id).await? {
                Some(case) if case.project_id == project_id => Some(snapshot(&case, None::<()>)?),
                _ => None,
            }
        }
        ReportTemplate::ExecFunctionalResult
        | ReportTemplate::ExecPerfResult
        | ReportTemplate::ExecStabilityResult => {
            match ExecRepo::find_by_id(pool, tenant_id, target_id).await? {
                Some(exec) if exec.project_id == project_id => {
                    let summary = exec.sample_summary.clone();
                    Some(snapshot(&exec, summary)?)
                }
                _ => None,
            }
        }
    };
    Ok(value)
}

fn snapshot<T: Serialize, R: Serialize>(
    target: &T,
    rollup: Option<R>,
) -> Result<serde_json::Value, AppError> {
    to_json(&Snapshot { target, rollup })
}

fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value, AppError> {
    serde_json::to_value(value)
        .map_err(|e| AppError::InternalError(format!("Failed to serialize report content: {e}")))
}

fn activity(ctx: &RequestContext, report: &Report, kind: ActivityType) -> NewActivity {
    NewActivity::new(
        ctx,
        Some(report.project_id),
        TargetType::Report,
        report.id,
        &report.name,
        kind,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_nests_target_and_rollup() {
        let value = snapshot(&serde_json::json!({ "id": 7 }), Some(3)).unwrap();
        assert_eq!(value["target"]["id"], 7);
        assert_eq!(value["rollup"], 3);

        let bare = snapshot(&serde_json::json!({ "id": 7 }), None::<()>).unwrap();
        assert!(bare["rollup"].is_null());
    }
}
