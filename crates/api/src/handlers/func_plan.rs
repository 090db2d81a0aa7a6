//! Handlers for the `/func/plans` resource.

use angus_core::search::SearchRequest;
use angus_core::sprint::LifecycleAction;
use angus_core::types::DbId;
use angus_db::models::func_plan::{CreatePlan, UpdatePlan};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::query::ProjectScope;
use crate::response::DataResponse;
use crate::services::func_plan;
use crate::state::AppState;

/// POST /api/v1/func/plans
pub async fn create_plan(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreatePlan>,
) -> AppResult<impl IntoResponse> {
    let plan = func_plan::create(&state.pool, &auth.ctx(), input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: plan })))
}

/// POST /api/v1/func/plans/search?project_id=
pub async fn search_plans(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(scope): Query<ProjectScope>,
    Json(req): Json<SearchRequest>,
) -> AppResult<impl IntoResponse> {
    let page = func_plan::search(&state.pool, &auth.ctx(), &req, scope.project_id).await?;
    Ok(Json(DataResponse { data: page }))
}

/// GET /api/v1/func/plans/{id}
pub async fn get_plan(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let detail = func_plan::detail(&state.pool, &auth.ctx(), id).await?;
    Ok(Json(DataResponse { data: detail }))
}

/// PUT /api/v1/func/plans/{id}
pub async fn update_plan(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdatePlan>,
) -> AppResult<impl IntoResponse> {
    let plan = func_plan::update(&state.pool, &auth.ctx(), id, input).await?;
    Ok(Json(DataResponse { data: plan }))
}

/// POST /api/v1/func/plans/{id}/status/{action}
pub async fn change_plan_status(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((id, action)): Path<(DbId, String)>,
) -> AppResult<impl IntoResponse> {
    let action = LifecycleAction::from_str_value(&action)?;
    let plan = func_plan::change_status(&state.pool, &auth.ctx(), id, action).await?;
    Ok(Json(DataResponse { data: plan }))
}

/// DELETE /api/v1/func/plans/{id}
///
/// Trashes the plan; its cases follow it into the trash.
pub async fn delete_plan(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    func_plan::delete(&state.pool, &auth.ctx(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
