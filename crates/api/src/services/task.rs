//! Task commands and queries.

use angus_core::activity::{ActivityType, TargetType};
use angus_core::biz;
use angus_core::context::RequestContext;
use angus_core::error::CoreError;
use angus_core::priority::Priority;
use angus_core::quota::QuotaKind;
use angus_core::search::SearchRequest;
use angus_core::task::{transition, TaskAction, TaskType};
use angus_core::types::DbId;
use angus_db::models::activity::NewActivity;
use angus_db::models::task::{CreateTask, NewTask, Task, TaskDetail, UpdateTask};
use angus_db::models::Paged;
use angus_db::repositories::{ActivityRepo, CommentRepo, SprintRepo, TagRepo, TaskRepo, UserRepo};
use angus_db::search::TASK_SEARCH;
use sqlx::PgPool;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::{access, search, tag};

pub async fn create(pool: &PgPool, ctx: &RequestContext, input: CreateTask) -> AppResult<Task> {
    biz::run(
        async {
            input.validate().map_err(CoreError::from)?;
            access::require_project(pool, ctx, input.project_id).await?;
            if let Some(sprint_id) = input.sprint_id {
                check_sprint(pool, ctx, input.project_id, sprint_id).await?;
            }
            let tag_ids = tag::check_tags(pool, ctx, input.project_id, &input.tag_ids).await?;

            let new = NewTask {
                tenant_id: ctx.tenant_id,
                project_id: input.project_id,
                sprint_id: input.sprint_id,
                name: access::required_name(&input.name)?,
                task_type: input.task_type.unwrap_or(TaskType::Task),
                priority: input.priority.unwrap_or(Priority::Medium),
                assignee_id: input.assignee_id,
                confirmer_id: input.confirmer_id,
                deadline_date: input.deadline_date,
                eval_workload: input.eval_workload,
                description: input.description.filter(|d| !d.trim().is_empty()),
                created_by: ctx.user_id,
            };
            Ok::<_, AppError>((new, tag_ids))
        },
        |(new, tag_ids)| async move {
            let mut tx = pool.begin().await?;
            let task = TaskRepo::insert(&mut tx, &new).await?;
            if !tag_ids.is_empty() {
                TagRepo::replace_targets_in(&mut tx, ctx, TargetType::Task, task.id, &tag_ids)
                    .await?;
            }
            ActivityRepo::insert(&mut tx, &activity(ctx, &task, ActivityType::Created)).await?;
            tx.commit().await?;

            tracing::info!(
                tenant_id = ctx.tenant_id,
                project_id = task.project_id,
                task_id = task.id,
                code = %task.code,
                "Task created"
            );
            Ok(task)
        },
    )
    .await
}

pub async fn update(pool: &PgPool, ctx: &RequestContext, id: DbId, input: UpdateTask) -> AppResult<Task> {
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
            let task = TaskRepo::update(&mut tx, ctx, id, name.as_deref(), input)
                .await?
                .ok_or(AppError::not_found("Task", id))?;
            ActivityRepo::insert(&mut tx, &activity(ctx, &task, ActivityType::Updated)).await?;
            tx.commit().await?;

            tracing::info!(tenant_id = ctx.tenant_id, task_id = id, "Task updated");
            Ok(task)
        },
    )
    .await
}

/// Set or clear the assignee.
pub async fn assign(
    pool: &PgPool,
    ctx: &RequestContext,
    id: DbId,
    assignee_id: Option<DbId>,
) -> AppResult<Task> {
    biz::run(load(pool, ctx, id), |_| async move {
        let mut tx = pool.begin().await?;
        let task = TaskRepo::assign(&mut tx, ctx, id, assignee_id)
            .await?
            .ok_or(AppError::not_found("Task", id))?;
        ActivityRepo::insert(
            &mut tx,
            &activity(ctx, &task, ActivityType::AssigneeUpdated),
        )
        .await?;
        tx.commit().await?;

        tracing::info!(task_id = id, assignee_id = ?assignee_id, "Task assignee changed");
        Ok(task)
    })
    .await
}

/// Move a task into another sprint of its project, or out of any sprint.
pub async fn move_to_sprint(
    pool: &PgPool,
    ctx: &RequestContext,
    id: DbId,
    sprint_id: Option<DbId>,
) -> AppResult<Task> {
    biz::run(
        async {
            let task = load(pool, ctx, id).await?;
            if let Some(sprint_id) = sprint_id {
                if task.sprint_id != Some(sprint_id) {
                    check_sprint(pool, ctx, task.project_id, sprint_id).await?;
                }
            }
            Ok::<_, AppError>(task)
        },
        |_| async move {
            let mut tx = pool.begin().await?;
            let task = TaskRepo::move_to_sprint(&mut tx, ctx, id, sprint_id)
                .await?
                .ok_or(AppError::not_found("Task", id))?;
            ActivityRepo::insert(&mut tx, &activity(ctx, &task, ActivityType::Updated)).await?;
            tx.commit().await?;

            tracing::info!(task_id = id, sprint_id = ?sprint_id, "Task moved");
            Ok(task)
        },
    )
    .await
}

/// Run one step of the task workflow.
pub async fn apply_action(
    pool: &PgPool,
    ctx: &RequestContext,
    id: DbId,
    action: TaskAction,
) -> AppResult<Task> {
    biz::run(
        async {
            let task = load(pool, ctx, id).await?;
            let from = task.status()?;
            let change = transition(from, action, task.confirmer_id.is_some())?;
            Ok::<_, AppError>((from, change))
        },
        |(from, change)| async move {
            let mut tx = pool.begin().await?;
            // The row is only updated while it is still in `from`.
            let task = TaskRepo::apply_transition(&mut tx, ctx, id, from, &change)
                .await?
                .ok_or_else(|| {
                    AppError::Core(CoreError::Conflict(format!(
                        "Task {id} changed status concurrently"
                    )))
                })?;
            ActivityRepo::insert(
                &mut tx,
                &activity(ctx, &task, ActivityType::StatusUpdated),
            )
            .await?;
            tx.commit().await?;

            tracing::info!(
                task_id = id,
                from = %from,
                to = %change.status,
                "Task status changed"
            );
            Ok(task)
        },
    )
    .await
}

pub async fn delete(pool: &PgPool, ctx: &RequestContext, id: DbId) -> AppResult<()> {
    biz::run(load(pool, ctx, id), |task| async move {
        let mut tx = pool.begin().await?;
        if !TaskRepo::soft_delete(&mut tx, ctx, id).await? {
            return Err(AppError::not_found("Task", id));
        }
        ActivityRepo::insert(&mut tx, &activity(ctx, &task, ActivityType::Deleted)).await?;
        tx.commit().await?;

        tracing::info!(tenant_id = ctx.tenant_id, task_id = id, "Task moved to trash");
        Ok(())
    })
    .await
}

pub async fn detail(pool: &PgPool, ctx: &RequestContext, id: DbId) -> AppResult<TaskDetail> {
    let task = load(pool, ctx, id).await?;
    let tags = TagRepo::tags_of(pool, TargetType::Task, id).await?;
    let comment_count = CommentRepo::count_for(pool, TargetType::Task, id).await?;

    let user_ids: Vec<DbId> = task.assignee_id.into_iter().chain(task.confirmer_id).collect();
    let users = UserRepo::names_by_ids(pool, ctx.tenant_id, &user_ids).await?;
    let name_of = |uid: Option<DbId>| {
        uid.and_then(|uid| users.iter().find(|u| u.id == uid))
            .map(|u| u.full_name.clone())
    };

    Ok(TaskDetail {
        assignee_name: name_of(task.assignee_id),
        confirmer_name: name_of(task.confirmer_id),
        tags,
        comment_count,
        task,
    })
}

pub async fn search(
    pool: &PgPool,
    ctx: &RequestContext,
    req: &SearchRequest,
    project_id: Option<DbId>,
) -> AppResult<Paged<Task>> {
    search::scoped_search(pool, ctx, &TASK_SEARCH, req, project_id).await
}

/// A live task the caller may act on.
pub(crate) async fn load(pool: &PgPool, ctx: &RequestContext, id: DbId) -> AppResult<Task> {
    let task = TaskRepo::find_by_id(pool, ctx.tenant_id, id)
        .await?
        .ok_or(AppError::not_found("Task", id))?;
    access::require_member(pool, ctx, task.project_id).await?;
    Ok(task)
}

/// The sprint must be live, belong to the project and have room for one more task.
async fn check_sprint(
    pool: &PgPool,
    ctx: &RequestContext,
    project_id: DbId,
    sprint_id: DbId,
) -> AppResult<()> {
    let sprint = SprintRepo::find_by_id(pool, ctx.tenant_id, sprint_id)
        .await?
        .ok_or(AppError::not_found("TaskSprint", sprint_id))?;
    if sprint.project_id != project_id {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Sprint {sprint_id} does not belong to project {project_id}"
        ))));
    }
    let current = TaskRepo::count_in_sprint(pool, sprint_id).await?;
    access::enforce_quota(pool, ctx, QuotaKind::TasksPerSprint, current, 1).await
}

fn activity(ctx: &RequestContext, task: &Task, kind: ActivityType) -> NewActivity {
    NewActivity::new(ctx, Some(task.project_id), TargetType::Task, task.id, &task.name, kind)
}
