//! Handlers for the `/projects` resource.

use angus_core::project::MemberType;
use angus_core::search::SearchRequest;
use angus_core::types::DbId;
use angus_db::models::project::{AddMembers, CreateProject, UpdateProject};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::services::project;
use crate::state::AppState;

/// POST /api/v1/projects
pub async fn create_project(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateProject>,
) -> AppResult<impl IntoResponse> {
    let project = project::create(&state.pool, &auth.ctx(), input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: project })))
}

/// POST /api/v1/projects/search
///
/// Projects are tenant-wide, so no `project_id` scope applies here.
pub async fn search_projects(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> AppResult<impl IntoResponse> {
    let page = project::search(&state.pool, &auth.ctx(), &req).await?;
    Ok(Json(DataResponse { data: page }))
}

/// GET /api/v1/projects/{id}
///
/// Project with members and owner name.
pub async fn get_project(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let detail = project::detail(&state.pool, &auth.ctx(), id).await?;
    Ok(Json(DataResponse { data: detail }))
}

/// PUT /api/v1/projects/{id}
pub async fn update_project(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateProject>,
) -> AppResult<impl IntoResponse> {
    let project = project::update(&state.pool, &auth.ctx(), id, input).await?;
    Ok(Json(DataResponse { data: project }))
}

/// DELETE /api/v1/projects/{id}
///
/// Moves the project to the trash.
pub async fn delete_project(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    project::delete(&state.pool, &auth.ctx(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/projects/{id}/members
pub async fn add_members(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<AddMembers>,
) -> AppResult<impl IntoResponse> {
    let added = project::add_members(&state.pool, &auth.ctx(), id, input).await?;
    Ok(Json(DataResponse {
        data: json!({ "added": added }),
    }))
}

/// DELETE /api/v1/projects/{id}/members/{member_type}/{member_id}
pub async fn remove_member(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((id, member_type, member_id)): Path<(DbId, String, DbId)>,
) -> AppResult<StatusCode> {
    let member_type = MemberType::from_str_value(&member_type)?;
    project::remove_member(&state.pool, &auth.ctx(), id, member_type, member_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
