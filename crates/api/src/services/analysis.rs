//! Project statistics computed on read.

use angus_core::context::RequestContext;
use angus_core::error::CoreError;
use angus_core::stats::{
    trend_by_day, CaseCount, CaseStat, DayCount, ProjectCounts, ProjectOverview, TaskCount, TaskStat,
};
use angus_core::types::DbId;
use angus_db::models::func_case::FuncCase;
use angus_db::models::task::Task;
use angus_db::repositories::{
    ExecRepo, FuncBaselineRepo, FuncCaseRepo, FuncPlanRepo, FuncReviewRepo, ProjectRepo,
    ReportRepo, SprintRepo, TagRepo, TaskRepo,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use crate::services::access;

/// Longest span a daily trend may cover.
const MAX_TREND_DAYS: i64 = 366;

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TaskStatsQuery {
    pub sprint_id: Option<DbId>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CaseStatsQuery {
    pub plan_id: Option<DbId>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TrendQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

pub async fn overview(
    pool: &PgPool,
    ctx: &RequestContext,
    project_id: DbId,
) -> AppResult<ProjectOverview> {
    access::require_project(pool, ctx, project_id).await?;
    project_overview(pool, ctx, project_id).await
}

/// Overview without the access check, for callers that already did it.
pub(crate) async fn project_overview(
    pool: &PgPool,
    ctx: &RequestContext,
    project_id: DbId,
) -> AppResult<ProjectOverview> {
    let tasks = TaskRepo::list_for_stats(pool, ctx.tenant_id, project_id, None).await?;
    let cases = FuncCaseRepo::list_for_stats(pool, ctx.tenant_id, project_id, None).await?;
    let members = ProjectRepo::member_views(pool, ctx.tenant_id, project_id).await?;

    let counts = ProjectCounts {
        sprints: SprintRepo::count_in_project(pool, project_id).await?,
        tasks: tasks.len() as i64,
        plans: FuncPlanRepo::count_in_project(pool, project_id).await?,
        cases: cases.len() as i64,
        baselines: FuncBaselineRepo::count_in_project(pool, project_id).await?,
        reviews: FuncReviewRepo::count_in_project(pool, project_id).await?,
        execs: ExecRepo::count_in_project(pool, project_id).await?,
        reports: ReportRepo::count_in_project(pool, project_id).await?,
        tags: TagRepo::count_in_project(pool, project_id).await?,
        members: members.len() as i64,
    };

    Ok(ProjectOverview::assemble(
        counts,
        &task_stats_of(&tasks)?,
        &case_stats_of(&cases)?,
        Utc::now(),
    ))
}

pub async fn task_stats(
    pool: &PgPool,
    ctx: &RequestContext,
    project_id: DbId,
    query: TaskStatsQuery,
) -> AppResult<TaskCount> {
    access::require_project(pool, ctx, project_id).await?;
    task_count(pool, ctx, project_id, query.sprint_id).await
}

pub(crate) async fn task_count(
    pool: &PgPool,
    ctx: &RequestContext,
    project_id: DbId,
    sprint_id: Option<DbId>,
) -> AppResult<TaskCount> {
    let tasks = TaskRepo::list_for_stats(pool, ctx.tenant_id, project_id, sprint_id).await?;
    Ok(TaskCount::from_stats(&task_stats_of(&tasks)?, Utc::now()))
}

pub async fn case_stats(
    pool: &PgPool,
    ctx: &RequestContext,
    project_id: DbId,
    query: CaseStatsQuery,
) -> AppResult<CaseCount> {
    access::require_project(pool, ctx, project_id).await?;
    case_count(pool, ctx, project_id, query.plan_id).await
}

pub(crate) async fn case_count(
    pool: &PgPool,
    ctx: &RequestContext,
    project_id: DbId,
    plan_id: Option<DbId>,
) -> AppResult<CaseCount> {
    let cases = FuncCaseRepo::list_for_stats(pool, ctx.tenant_id, project_id, plan_id).await?;
    Ok(CaseCount::from_stats(&case_stats_of(&cases)?, Utc::now()))
}

/// Tasks created per day over `[from, to]`.
pub async fn task_trend(
    pool: &PgPool,
    ctx: &RequestContext,
    project_id: DbId,
    query: TrendQuery,
) -> AppResult<Vec<DayCount>> {
    check_trend_window(query.from, query.to)?;
    access::require_project(pool, ctx, project_id).await?;
    let tasks = TaskRepo::list_for_stats(pool, ctx.tenant_id, project_id, None).await?;
    let created: Vec<_> = tasks.iter().map(|t| t.created_at).collect();
    Ok(trend_by_day(&created, query.from, query.to))
}

fn check_trend_window(from: NaiveDate, to: NaiveDate) -> Result<(), AppError> {
    if from > to {
        return Err(AppError::BadRequest("'from' must not be after 'to'".to_string()));
    }
    if (to - from).num_days() >= MAX_TREND_DAYS {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Trend window is limited to {MAX_TREND_DAYS} days"
        ))));
    }
    Ok(())
}

fn task_stats_of(tasks: &[Task]) -> Result<Vec<TaskStat>, CoreError> {
    tasks.iter().map(Task::to_stat).collect()
}

fn case_stats_of(cases: &[FuncCase]) -> Result<Vec<CaseStat>, CoreError> {
    cases.iter().map(FuncCase::to_stat).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn trend_window_bounds() {
        assert!(check_trend_window(day(1), day(31)).is_ok());
        assert!(check_trend_window(day(1), day(1)).is_ok());
        assert!(matches!(
            check_trend_window(day(5), day(1)),
            Err(AppError::BadRequest(_))
        ));
        let far = NaiveDate::from_ymd_opt(2027, 3, 1).unwrap();
        assert!(matches!(
            check_trend_window(day(1), far),
            Err(AppError::Core(CoreError::Validation(_)))
        ));
    }
}
