//! Handlers for the `/activities` resource.

use angus_core::search::SearchRequest;
use angus_db::models::activity::TargetActivityParams;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::query::ProjectScope;
use crate::response::DataResponse;
use crate::services::activity;
use crate::state::AppState;

/// GET /api/v1/activities?target_type=&target_id=&limit=&offset=
///
/// Newest first.
pub async fn list_target_activities(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<TargetActivityParams>,
) -> AppResult<impl IntoResponse> {
    let activities = activity::list_for_target(&state.pool, &auth.ctx(), &params).await?;
    Ok(Json(DataResponse { data: activities }))
}

/// POST /api/v1/activities/search?project_id=
pub async fn search_activities(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(scope): Query<ProjectScope>,
    Json(req): Json<SearchRequest>,
) -> AppResult<impl IntoResponse> {
    let page = activity::search(&state.pool, &auth.ctx(), &req, scope.project_id).await?;
    Ok(Json(DataResponse { data: page }))
}
