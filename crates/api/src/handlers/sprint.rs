//! Handlers for the `/sprints` resource.

use angus_core::search::SearchRequest;
use angus_core::sprint::LifecycleAction;
use angus_core::types::DbId;
use angus_db::models::sprint::{CreateSprint, UpdateSprint};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::query::{ProjectParam, ProjectScope};
use crate::response::DataResponse;
use crate::services::sprint;
use crate::state::AppState;

/// POST /api/v1/sprints
pub async fn create_sprint(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateSprint>,
) -> AppResult<impl IntoResponse> {
    let sprint = sprint::create(&state.pool, &auth.ctx(), input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: sprint })))
}

/// GET /api/v1/sprints?project_id=
pub async fn list_sprints(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ProjectParam>,
) -> AppResult<impl IntoResponse> {
    let sprints = sprint::list(&state.pool, &auth.ctx(), params.project_id).await?;
    Ok(Json(DataResponse { data: sprints }))
}

/// POST /api/v1/sprints/search?project_id=
pub async fn search_sprints(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(scope): Query<ProjectScope>,
    Json(req): Json<SearchRequest>,
) -> AppResult<impl IntoResponse> {
    let page = sprint::search(&state.pool, &auth.ctx(), &req, scope.project_id).await?;
    Ok(Json(DataResponse { data: page }))
}

/// GET /api/v1/sprints/{id}
pub async fn get_sprint(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let detail = sprint::detail(&state.pool, &auth.ctx(), id).await?;
    Ok(Json(DataResponse { data: detail }))
}

/// PUT /api/v1/sprints/{id}
pub async fn update_sprint(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateSprint>,
) -> AppResult<impl IntoResponse> {
    let sprint = sprint::update(&state.pool, &auth.ctx(), id, input).await?;
    Ok(Json(DataResponse { data: sprint }))
}

/// POST /api/v1/sprints/{id}/status/{action}
///
/// `action` is one of `start`, `block`, `unblock`, `complete`, `reopen`,
/// `restart`. Completing requires every task to be finished.
pub async fn change_sprint_status(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((id, action)): Path<(DbId, String)>,
) -> AppResult<impl IntoResponse> {
    let action = LifecycleAction::from_str_value(&action)?;
    let sprint = sprint::change_status(&state.pool, &auth.ctx(), id, action).await?;
    Ok(Json(DataResponse { data: sprint }))
}

/// DELETE /api/v1/sprints/{id}
pub async fn delete_sprint(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    sprint::delete(&state.pool, &auth.ctx(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
