//! Handlers for project statistics under `/projects/{id}`.

use angus_core::types::DbId;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::services::analysis::{self, CaseStatsQuery, TaskStatsQuery, TrendQuery};
use crate::state::AppState;

/// GET /api/v1/projects/{id}/overview
pub async fn overview(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let overview = analysis::overview(&state.pool, &auth.ctx(), id).await?;
    Ok(Json(DataResponse { data: overview }))
}

/// GET /api/v1/projects/{id}/task-stats?sprint_id=
pub async fn task_stats(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(query): Query<TaskStatsQuery>,
) -> AppResult<impl IntoResponse> {
    let count = analysis::task_stats(&state.pool, &auth.ctx(), id, query).await?;
    Ok(Json(DataResponse { data: count }))
}

/// GET /api/v1/projects/{id}/case-stats?plan_id=
pub async fn case_stats(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(query): Query<CaseStatsQuery>,
) -> AppResult<impl IntoResponse> {
    let count = analysis::case_stats(&state.pool, &auth.ctx(), id, query).await?;
    Ok(Json(DataResponse { data: count }))
}

/// GET /api/v1/projects/{id}/task-trend?from=&to=
///
/// Tasks created per day, inclusive of both ends.
pub async fn task_trend(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(query): Query<TrendQuery>,
) -> AppResult<impl IntoResponse> {
    let trend = analysis::task_trend(&state.pool, &auth.ctx(), id, query).await?;
    Ok(Json(DataResponse { data: trend }))
}
