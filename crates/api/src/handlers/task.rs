//! Handlers for the `/tasks` resource.

use angus_core::activity::TargetType;
use angus_core::search::SearchRequest;
use angus_core::task::TaskAction;
use angus_core::types::DbId;
use angus_db::models::tag::ReplaceTags;
use angus_db::models::task::{AssignTask, ConfirmTask, CreateTask, MoveTask, UpdateTask};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::query::ProjectScope;
use crate::response::DataResponse;
use crate::services::{tag, task};
use crate::state::AppState;

/// POST /api/v1/tasks
pub async fn create_task(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateTask>,
) -> AppResult<impl IntoResponse> {
    let task = task::create(&state.pool, &auth.ctx(), input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: task })))
}

/// POST /api/v1/tasks/search?project_id=
pub async fn search_tasks(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(scope): Query<ProjectScope>,
    Json(req): Json<SearchRequest>,
) -> AppResult<impl IntoResponse> {
    let page = task::search(&state.pool, &auth.ctx(), &req, scope.project_id).await?;
    Ok(Json(DataResponse { data: page }))
}

/// GET /api/v1/tasks/{id}
///
/// Task with tags, comment count, and assignee/confirmer names.
pub async fn get_task(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let detail = task::detail(&state.pool, &auth.ctx(), id).await?;
    Ok(Json(DataResponse { data: detail }))
}

/// PUT /api/v1/tasks/{id}
pub async fn update_task(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateTask>,
) -> AppResult<impl IntoResponse> {
    let task = task::update(&state.pool, &auth.ctx(), id, input).await?;
    Ok(Json(DataResponse { data: task }))
}

/// DELETE /api/v1/tasks/{id}
pub async fn delete_task(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    task::delete(&state.pool, &auth.ctx(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/tasks/{id}/assignee
///
/// A null `assignee_id` unassigns the task.
pub async fn assign_task(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<AssignTask>,
) -> AppResult<impl IntoResponse> {
    let task = task::assign(&state.pool, &auth.ctx(), id, input.assignee_id).await?;
    Ok(Json(DataResponse { data: task }))
}

/// PUT /api/v1/tasks/{id}/sprint
pub async fn move_task(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<MoveTask>,
) -> AppResult<impl IntoResponse> {
    let task = task::move_to_sprint(&state.pool, &auth.ctx(), id, input.sprint_id).await?;
    Ok(Json(DataResponse { data: task }))
}

/// POST /api/v1/tasks/{id}/actions/{action}
///
/// `action` is one of `start`, `process`, `cancel`, `reopen`.
pub async fn apply_task_action(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((id, action)): Path<(DbId, String)>,
) -> AppResult<impl IntoResponse> {
    let action = TaskAction::from_path(&action)?;
    let task = task::apply_action(&state.pool, &auth.ctx(), id, action).await?;
    Ok(Json(DataResponse { data: task }))
}

/// POST /api/v1/tasks/{id}/confirm
pub async fn confirm_task(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ConfirmTask>,
) -> AppResult<impl IntoResponse> {
    let action = TaskAction::Confirm {
        passed: input.passed,
    };
    let task = task::apply_action(&state.pool, &auth.ctx(), id, action).await?;
    Ok(Json(DataResponse { data: task }))
}

/// GET /api/v1/tasks/{id}/tags
pub async fn get_task_tags(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let tags = tag::tags_of(&state.pool, &auth.ctx(), TargetType::Task, id).await?;
    Ok(Json(DataResponse { data: tags }))
}

/// PUT /api/v1/tasks/{id}/tags
///
/// Replace the whole tag set; sending the same list twice is a no-op.
pub async fn replace_task_tags(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ReplaceTags>,
) -> AppResult<impl IntoResponse> {
    let tags = tag::replace(&state.pool, &auth.ctx(), TargetType::Task, id, &input.tag_ids).await?;
    Ok(Json(DataResponse { data: tags }))
}
