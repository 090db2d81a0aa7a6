//! Handlers for the `/func/baselines` resource.
//!
//! A baseline freezes a set of plan cases. Case membership can change until
//! the baseline is established.

use angus_core::search::SearchRequest;
use angus_core::types::DbId;
use angus_db::models::func_baseline::{BaselineCaseIds, CreateBaseline, UpdateBaseline};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::query::ProjectScope;
use crate::response::DataResponse;
use crate::services::func_baseline;
use crate::state::AppState;

/// POST /api/v1/func/baselines
pub async fn create_baseline(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateBaseline>,
) -> AppResult<impl IntoResponse> {
    let baseline = func_baseline::create(&state.pool, &auth.ctx(), input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: baseline })))
}

/// POST /api/v1/func/baselines/search?project_id=
pub async fn search_baselines(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(scope): Query<ProjectScope>,
    Json(req): Json<SearchRequest>,
) -> AppResult<impl IntoResponse> {
    let page = func_baseline::search(&state.pool, &auth.ctx(), &req, scope.project_id).await?;
    Ok(Json(DataResponse { data: page }))
}

/// GET /api/v1/func/baselines/{id}
pub async fn get_baseline(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let baseline = func_baseline::get(&state.pool, &auth.ctx(), id).await?;
    Ok(Json(DataResponse { data: baseline }))
}

/// PUT /api/v1/func/baselines/{id}
pub async fn update_baseline(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateBaseline>,
) -> AppResult<impl IntoResponse> {
    let baseline = func_baseline::update(&state.pool, &auth.ctx(), id, input).await?;
    Ok(Json(DataResponse { data: baseline }))
}

/// DELETE /api/v1/func/baselines/{id}
pub async fn delete_baseline(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    func_baseline::delete(&state.pool, &auth.ctx(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/func/baselines/{id}/cases
pub async fn add_baseline_cases(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<BaselineCaseIds>,
) -> AppResult<impl IntoResponse> {
    let added = func_baseline::add_cases(&state.pool, &auth.ctx(), id, &input.case_ids).await?;
    Ok(Json(DataResponse {
        data: json!({ "added": added }),
    }))
}

/// POST /api/v1/func/baselines/{id}/cases/remove
pub async fn remove_baseline_cases(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<BaselineCaseIds>,
) -> AppResult<impl IntoResponse> {
    let removed =
        func_baseline::remove_cases(&state.pool, &auth.ctx(), id, &input.case_ids).await?;
    Ok(Json(DataResponse {
        data: json!({ "removed": removed }),
    }))
}

/// GET /api/v1/func/baselines/{id}/cases
pub async fn list_baseline_cases(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let cases = func_baseline::list_cases(&state.pool, &auth.ctx(), id).await?;
    Ok(Json(DataResponse { data: cases }))
}

/// GET /api/v1/func/baselines/{id}/cases/{case_id}
///
/// The frozen case snapshot with its tags, references, and people.
pub async fn get_baseline_case(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((id, case_id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    let detail = func_baseline::case_detail(&state.pool, &auth.ctx(), id, case_id).await?;
    Ok(Json(DataResponse { data: detail }))
}

/// POST /api/v1/func/baselines/{id}/establish
pub async fn establish_baseline(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let baseline = func_baseline::establish(&state.pool, &auth.ctx(), id).await?;
    Ok(Json(DataResponse { data: baseline }))
}
