//! Handlers for the `/nodes` resource.
//!
//! Node management is admin only. Agents push metric samples with an
//! ordinary tenant token.

use angus_core::search::SearchRequest;
use angus_core::types::DbId;
use angus_db::models::node::{CreateNode, MetricsQuery, NewNodeMetric, SetNodeEnabled, UpdateNode};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::services::node;
use crate::state::AppState;

/// POST /api/v1/nodes
pub async fn create_node(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateNode>,
) -> AppResult<impl IntoResponse> {
    let node = node::create(&state.pool, &admin.ctx(), input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: node })))
}

/// POST /api/v1/nodes/search
pub async fn search_nodes(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> AppResult<impl IntoResponse> {
    let page = node::search(&state.pool, &auth.ctx(), &req).await?;
    Ok(Json(DataResponse { data: page }))
}

/// GET /api/v1/nodes/{id}
pub async fn get_node(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let node = node::get(&state.pool, &auth.ctx(), id).await?;
    Ok(Json(DataResponse { data: node }))
}

/// PUT /api/v1/nodes/{id}
pub async fn update_node(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateNode>,
) -> AppResult<impl IntoResponse> {
    let node = node::update(&state.pool, &admin.ctx(), id, input).await?;
    Ok(Json(DataResponse { data: node }))
}

/// PUT /api/v1/nodes/{id}/enabled
pub async fn set_node_enabled(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<SetNodeEnabled>,
) -> AppResult<impl IntoResponse> {
    let node = node::set_enabled(&state.pool, &admin.ctx(), id, input.enabled).await?;
    Ok(Json(DataResponse { data: node }))
}

/// DELETE /api/v1/nodes/{id}
///
/// Also drops the node's metric history.
pub async fn delete_node(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    node::delete(&state.pool, &admin.ctx(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/nodes/{id}/metrics
pub async fn push_metric(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(sample): Json<NewNodeMetric>,
) -> AppResult<impl IntoResponse> {
    let metric = node::push_metric(&state.pool, &auth.ctx(), id, sample).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: metric })))
}

/// GET /api/v1/nodes/{id}/metrics?from=&to=&bucket_secs=
///
/// Samples averaged into fixed-width buckets.
pub async fn metric_history(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(query): Query<MetricsQuery>,
) -> AppResult<impl IntoResponse> {
    let history = node::history(&state.pool, &auth.ctx(), id, &query).await?;
    Ok(Json(DataResponse { data: history }))
}

/// GET /api/v1/nodes/metrics/latest
///
/// The most recent sample of every node in the tenant.
pub async fn latest_metrics(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let metrics = node::latest(&state.pool, &auth.ctx()).await?;
    Ok(Json(DataResponse { data: metrics }))
}
