//! Handlers for the `/reports` resource.

use angus_core::search::SearchRequest;
use angus_core::types::DbId;
use angus_db::models::report::{CreateReport, UpdateReport};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::query::ProjectScope;
use crate::response::DataResponse;
use crate::services::report;
use crate::state::AppState;

/// POST /api/v1/reports
pub async fn create_report(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateReport>,
) -> AppResult<impl IntoResponse> {
    let report = report::create(&state.pool, &auth.ctx(), input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: report })))
}

/// POST /api/v1/reports/search?project_id=
pub async fn search_reports(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(scope): Query<ProjectScope>,
    Json(req): Json<SearchRequest>,
) -> AppResult<impl IntoResponse> {
    let page = report::search(&state.pool, &auth.ctx(), &req, scope.project_id).await?;
    Ok(Json(DataResponse { data: page }))
}

/// GET /api/v1/reports/{id}
pub async fn get_report(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let report = report::get(&state.pool, &auth.ctx(), id).await?;
    Ok(Json(DataResponse { data: report }))
}

/// PUT /api/v1/reports/{id}
pub async fn update_report(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateReport>,
) -> AppResult<impl IntoResponse> {
    let report = report::update(&state.pool, &auth.ctx(), id, input).await?;
    Ok(Json(DataResponse { data: report }))
}

/// DELETE /api/v1/reports/{id}
pub async fn delete_report(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    report::delete(&state.pool, &auth.ctx(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/reports/{id}/generate
///
/// Snapshot the report target now. A vanished target marks the report
/// FAILURE instead of returning an error.
pub async fn generate_report(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let generation = report::generate(&state.pool, &auth.ctx(), id).await?;
    Ok(Json(DataResponse { data: generation }))
}

/// GET /api/v1/reports/{id}/records
pub async fn list_report_records(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let records = report::records(&state.pool, &auth.ctx(), id).await?;
    Ok(Json(DataResponse { data: records }))
}
