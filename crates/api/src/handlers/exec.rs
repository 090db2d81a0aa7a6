//! Handlers for the `/execs` resource.

use angus_core::search::SearchRequest;
use angus_core::types::DbId;
use angus_db::models::exec::{CreateExec, ExecResultReport, UpdateExec};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::query::ProjectScope;
use crate::response::DataResponse;
use crate::services::exec;
use crate::state::AppState;

/// POST /api/v1/execs
pub async fn create_exec(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateExec>,
) -> AppResult<impl IntoResponse> {
    let exec = exec::create(&state.pool, &auth.ctx(), input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: exec })))
}

/// POST /api/v1/execs/search?project_id=
pub async fn search_execs(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(scope): Query<ProjectScope>,
    Json(req): Json<SearchRequest>,
) -> AppResult<impl IntoResponse> {
    let page = exec::search(&state.pool, &auth.ctx(), &req, scope.project_id).await?;
    Ok(Json(DataResponse { data: page }))
}

/// GET /api/v1/execs/{id}
pub async fn get_exec(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let exec = exec::get(&state.pool, &auth.ctx(), id).await?;
    Ok(Json(DataResponse { data: exec }))
}

/// PUT /api/v1/execs/{id}
pub async fn update_exec(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateExec>,
) -> AppResult<impl IntoResponse> {
    let exec = exec::update(&state.pool, &auth.ctx(), id, input).await?;
    Ok(Json(DataResponse { data: exec }))
}

/// DELETE /api/v1/execs/{id}
pub async fn delete_exec(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    exec::delete(&state.pool, &auth.ctx(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/execs/{id}/start
pub async fn start_exec(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let exec = exec::start(&state.pool, &auth.ctx(), id).await?;
    Ok(Json(DataResponse { data: exec }))
}

/// POST /api/v1/execs/{id}/stop
pub async fn stop_exec(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let exec = exec::stop(&state.pool, &auth.ctx(), id).await?;
    Ok(Json(DataResponse { data: exec }))
}

/// PUT /api/v1/execs/{id}/result
///
/// Called by runners when an execution finishes.
pub async fn report_exec_result(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(report): Json<ExecResultReport>,
) -> AppResult<impl IntoResponse> {
    let exec = exec::report_result(&state.pool, &auth.ctx(), id, report).await?;
    Ok(Json(DataResponse { data: exec }))
}
