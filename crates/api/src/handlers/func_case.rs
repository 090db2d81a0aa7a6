//! Handlers for the `/func/cases` resource.

use angus_core::activity::TargetType;
use angus_core::search::SearchRequest;
use angus_core::types::DbId;
use angus_db::models::func_case::{CreateCase, SetCaseRefs, SetCaseResult, UpdateCase};
use angus_db::models::tag::ReplaceTags;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::query::ProjectScope;
use crate::response::DataResponse;
use crate::services::{func_case, tag};
use crate::state::AppState;

/// POST /api/v1/func/cases
pub async fn create_case(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateCase>,
) -> AppResult<impl IntoResponse> {
    let case = func_case::create(&state.pool, &auth.ctx(), input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: case })))
}

/// POST /api/v1/func/cases/search?project_id=
pub async fn search_cases(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(scope): Query<ProjectScope>,
    Json(req): Json<SearchRequest>,
) -> AppResult<impl IntoResponse> {
    let page = func_case::search(&state.pool, &auth.ctx(), &req, scope.project_id).await?;
    Ok(Json(DataResponse { data: page }))
}

/// GET /api/v1/func/cases/{id}
pub async fn get_case(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let detail = func_case::detail(&state.pool, &auth.ctx(), id).await?;
    Ok(Json(DataResponse { data: detail }))
}

/// PUT /api/v1/func/cases/{id}
pub async fn update_case(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateCase>,
) -> AppResult<impl IntoResponse> {
    let case = func_case::update(&state.pool, &auth.ctx(), id, input).await?;
    Ok(Json(DataResponse { data: case }))
}

/// PUT /api/v1/func/cases/{id}/result
///
/// Record a test outcome. The plan must be in progress.
pub async fn set_case_result(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<SetCaseResult>,
) -> AppResult<impl IntoResponse> {
    let case = func_case::set_result(&state.pool, &auth.ctx(), id, input).await?;
    Ok(Json(DataResponse { data: case }))
}

/// PUT /api/v1/func/cases/{id}/refs
pub async fn set_case_refs(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<SetCaseRefs>,
) -> AppResult<impl IntoResponse> {
    let detail = func_case::set_refs(&state.pool, &auth.ctx(), id, input).await?;
    Ok(Json(DataResponse { data: detail }))
}

/// DELETE /api/v1/func/cases/{id}
pub async fn delete_case(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    func_case::delete(&state.pool, &auth.ctx(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/func/cases/{id}/tags
pub async fn get_case_tags(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let tags = tag::tags_of(&state.pool, &auth.ctx(), TargetType::FuncCase, id).await?;
    Ok(Json(DataResponse { data: tags }))
}

/// PUT /api/v1/func/cases/{id}/tags
pub async fn replace_case_tags(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ReplaceTags>,
) -> AppResult<impl IntoResponse> {
    let tags =
        tag::replace(&state.pool, &auth.ctx(), TargetType::FuncCase, id, &input.tag_ids).await?;
    Ok(Json(DataResponse { data: tags }))
}
