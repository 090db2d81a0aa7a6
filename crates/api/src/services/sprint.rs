//! Task sprint commands and queries.

use angus_core::activity::{ActivityType, TargetType};
use angus_core::biz;
use angus_core::context::RequestContext;
use angus_core::error::CoreError;
use angus_core::quota::QuotaKind;
use angus_core::search::SearchRequest;
use angus_core::sprint::{check_sprint_date_range, next_status, normalize_name, LifecycleAction, SprintStatus};
use angus_core::stats::TaskCount;
use angus_core::types::DbId;
use angus_db::models::activity::NewActivity;
use angus_db::models::sprint::{CreateSprint, TaskSprint, UpdateSprint};
use angus_db::models::task::Task;
use angus_db::models::Paged;
use angus_db::repositories::sprint_repo::NewSprint;
use angus_db::repositories::{ActivityRepo, SprintRepo, TaskRepo};
use angus_db::search::SPRINT_SEARCH;
use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::{access, search};

/// Sprint with the rollup of its tasks.
#[derive(Debug, Serialize)]
pub struct SprintDetail {
    #[serde(flatten)]
    pub sprint: TaskSprint,
    pub task_count: TaskCount,
}

pub async fn create(pool: &PgPool, ctx: &RequestContext, input: CreateSprint) -> AppResult<TaskSprint> {
    let input = &input;
    biz::run(
        async {
            input.validate().map_err(CoreError::from)?;
            access::require_project(pool, ctx, input.project_id).await?;
            let name = normalize_name(&input.name)?;
            check_sprint_date_range(input.start_date, input.deadline_date, Utc::now())?;
            let current = SprintRepo::count_in_project(pool, input.project_id).await?;
            access::enforce_quota(pool, ctx, QuotaKind::SprintsPerProject, current, 1).await?;
            Ok::<_, AppError>(name)
        },
        |name| async move {
            let mut tx = pool.begin().await?;
            let sprint = SprintRepo::insert(
                &mut tx,
                ctx,
                &NewSprint {
                    project_id: input.project_id,
                    name: &name,
                    owner_id: input.owner_id.unwrap_or(ctx.user_id),
                    start_date: input.start_date,
                    deadline_date: input.deadline_date,
                    acceptance_criteria: input.acceptance_criteria.as_deref(),
                    other_information: input.other_information.as_deref(),
                },
            )
            .await?;
            ActivityRepo::insert(&mut tx, &activity(ctx, &sprint, ActivityType::Created)).await?;
            tx.commit().await?;

            tracing::info!(
                tenant_id = ctx.tenant_id,
                project_id = sprint.project_id,
                sprint_id = sprint.id,
                "Sprint created"
            );
            Ok(sprint)
        },
    )
    .await
}

pub async fn update(
    pool: &PgPool,
    ctx: &RequestContext,
    id: DbId,
    input: UpdateSprint,
) -> AppResult<TaskSprint> {
    let input = &input;
    biz::run(
        async {
            input.validate().map_err(CoreError::from)?;
            let sprint = load(pool, ctx, id).await?;
            let name = input.name.as_deref().map(normalize_name).transpose()?;
            // Dates are only re-checked when they change.
            let start = input.start_date.unwrap_or(sprint.start_date);
            let deadline = input.deadline_date.unwrap_or(sprint.deadline_date);
            if start != sprint.start_date || deadline != sprint.deadline_date {
                check_sprint_date_range(start, deadline, Utc::now())?;
            }
            Ok::<_, AppError>(name)
        },
        |name| async move {
            let mut tx = pool.begin().await?;
            let sprint = SprintRepo::update(&mut tx, ctx, id, name.as_deref(), input)
                .await?
                .ok_or(AppError::not_found("TaskSprint", id))?;
            ActivityRepo::insert(&mut tx, &activity(ctx, &sprint, ActivityType::Updated)).await?;
            tx.commit().await?;

            tracing::info!(tenant_id = ctx.tenant_id, sprint_id = id, "Sprint updated");
            Ok(sprint)
        },
    )
    .await
}

/// Apply a lifecycle action. Completing requires every task to be finished;
/// restarting also returns the sprint's tasks to PENDING.
pub async fn change_status(
    pool: &PgPool,
    ctx: &RequestContext,
    id: DbId,
    action: LifecycleAction,
) -> AppResult<TaskSprint> {
    biz::run(
        async {
            let sprint = load(pool, ctx, id).await?;
            let current = SprintStatus::from_str_value(&sprint.status)?;
            let unfinished = if action == LifecycleAction::Complete {
                TaskRepo::count_unfinished_in_sprint(pool, id).await?
            } else {
                0
            };
            let next = next_status(current, action, unfinished)?;
            Ok::<_, AppError>((current, next))
        },
        |(current, next)| async move {
            let mut tx = pool.begin().await?;
            if action == LifecycleAction::Restart {
                let reset = TaskRepo::reset_sprint_tasks(&mut tx, ctx, id).await?;
                tracing::debug!(sprint_id = id, reset, "Sprint tasks reset");
            }
            let sprint = SprintRepo::set_status(&mut tx, ctx, id, current, next)
                .await?
                .ok_or_else(|| {
                    AppError::Core(CoreError::Conflict(format!(
                        "Sprint {id} changed status concurrently"
                    )))
                })?;
            ActivityRepo::insert(
                &mut tx,
                &activity(ctx, &sprint, ActivityType::StatusUpdated),
            )
            .await?;
            tx.commit().await?;

            tracing::info!(sprint_id = id, status = %next, "Sprint status changed");
            Ok(sprint)
        },
    )
    .await
}

pub async fn delete(pool: &PgPool, ctx: &RequestContext, id: DbId) -> AppResult<()> {
    biz::run(load(pool, ctx, id), |sprint| async move {
        let mut tx = pool.begin().await?;
        if !SprintRepo::soft_delete(&mut tx, ctx, id).await? {
            return Err(AppError::not_found("TaskSprint", id));
        }
        ActivityRepo::insert(&mut tx, &activity(ctx, &sprint, ActivityType::Deleted)).await?;
        tx.commit().await?;

        tracing::info!(tenant_id = ctx.tenant_id, sprint_id = id, "Sprint moved to trash");
        Ok(())
    })
    .await
}

pub async fn detail(pool: &PgPool, ctx: &RequestContext, id: DbId) -> AppResult<SprintDetail> {
    let sprint = load(pool, ctx, id).await?;
    let tasks = TaskRepo::list_for_stats(pool, ctx.tenant_id, sprint.project_id, Some(id)).await?;
    let stats = tasks.iter().map(Task::to_stat).collect::<Result<Vec<_>, _>>()?;
    Ok(SprintDetail {
        task_count: TaskCount::from_stats(&stats, Utc::now()),
        sprint,
    })
}

pub async fn list(pool: &PgPool, ctx: &RequestContext, project_id: DbId) -> AppResult<Vec<TaskSprint>> {
    access::require_member(pool, ctx, project_id).await?;
    Ok(SprintRepo::list_by_project(pool, ctx.tenant_id, project_id).await?)
}

pub async fn search(
    pool: &PgPool,
    ctx: &RequestContext,
    req: &SearchRequest,
    project_id: Option<DbId>,
) -> AppResult<Paged<TaskSprint>> {
    search::scoped_search(pool, ctx, &SPRINT_SEARCH, req, project_id).await
}

/// A live sprint the caller may act on.
pub(crate) async fn load(pool: &PgPool, ctx: &RequestContext, id: DbId) -> AppResult<TaskSprint> {
    let sprint = SprintRepo::find_by_id(pool, ctx.tenant_id, id)
        .await?
        .ok_or(AppError::not_found("TaskSprint", id))?;
    access::require_member(pool, ctx, sprint.project_id).await?;
    Ok(sprint)
}

fn activity(ctx: &RequestContext, sprint: &TaskSprint, kind: ActivityType) -> NewActivity {
    NewActivity::new(
        ctx,
        Some(sprint.project_id),
        TargetType::TaskSprint,
        sprint.id,
        &sprint.name,
        kind,
    )
}
