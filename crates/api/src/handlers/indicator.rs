//! Handlers for the `/indicators` resource.
//!
//! Every route is keyed by `{target_type}/{target_id}`, where the type is
//! `API` or `SCENARIO`. Reads fall back to the tenant default.

use angus_core::indicator::{FuncIndicator, IndicatorTargetType, PerfIndicator, StabilityIndicator};
use angus_core::types::DbId;
use angus_db::models::indicator::IndicatorTarget;
use angus_db::repositories::indicator_repo::IndicatorKind;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::services::indicator;
use crate::state::AppState;

fn target(target_type: &str, target_id: DbId) -> AppResult<IndicatorTarget> {
    Ok(IndicatorTarget {
        target_type: IndicatorTargetType::from_str_value(target_type)?,
        target_id,
    })
}

// ---------------------------------------------------------------------------
// Performance
// ---------------------------------------------------------------------------

/// GET /api/v1/indicators/perf/{target_type}/{target_id}
pub async fn get_perf(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((target_type, target_id)): Path<(String, DbId)>,
) -> AppResult<impl IntoResponse> {
    let target = target(&target_type, target_id)?;
    let resolved = indicator::get_perf(&state.pool, &state.settings, &auth.ctx(), target).await?;
    Ok(Json(DataResponse { data: resolved }))
}

/// PUT /api/v1/indicators/perf/{target_type}/{target_id}
pub async fn set_perf(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((target_type, target_id)): Path<(String, DbId)>,
    Json(value): Json<PerfIndicator>,
) -> AppResult<impl IntoResponse> {
    let target = target(&target_type, target_id)?;
    let saved = indicator::set_perf(&state.pool, &auth.ctx(), target, value).await?;
    Ok(Json(DataResponse { data: saved }))
}

/// DELETE /api/v1/indicators/perf/{target_type}/{target_id}
pub async fn reset_perf(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((target_type, target_id)): Path<(String, DbId)>,
) -> AppResult<StatusCode> {
    let target = target(&target_type, target_id)?;
    indicator::reset(&state.pool, &auth.ctx(), IndicatorKind::Perf, target).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Stability
// ---------------------------------------------------------------------------

/// GET /api/v1/indicators/stability/{target_type}/{target_id}
pub async fn get_stability(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((target_type, target_id)): Path<(String, DbId)>,
) -> AppResult<impl IntoResponse> {
    let target = target(&target_type, target_id)?;
    let resolved =
        indicator::get_stability(&state.pool, &state.settings, &auth.ctx(), target).await?;
    Ok(Json(DataResponse { data: resolved }))
}

/// PUT /api/v1/indicators/stability/{target_type}/{target_id}
pub async fn set_stability(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((target_type, target_id)): Path<(String, DbId)>,
    Json(value): Json<StabilityIndicator>,
) -> AppResult<impl IntoResponse> {
    let target = target(&target_type, target_id)?;
    let saved = indicator::set_stability(&state.pool, &auth.ctx(), target, value).await?;
    Ok(Json(DataResponse { data: saved }))
}

/// DELETE /api/v1/indicators/stability/{target_type}/{target_id}
pub async fn reset_stability(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((target_type, target_id)): Path<(String, DbId)>,
) -> AppResult<StatusCode> {
    let target = target(&target_type, target_id)?;
    indicator::reset(&state.pool, &auth.ctx(), IndicatorKind::Stability, target).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Functional
// ---------------------------------------------------------------------------

/// GET /api/v1/indicators/func/{target_type}/{target_id}
pub async fn get_func(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((target_type, target_id)): Path<(String, DbId)>,
) -> AppResult<impl IntoResponse> {
    let target = target(&target_type, target_id)?;
    let resolved = indicator::get_func(&state.pool, &state.settings, &auth.ctx(), target).await?;
    Ok(Json(DataResponse { data: resolved }))
}

/// PUT /api/v1/indicators/func/{target_type}/{target_id}
pub async fn set_func(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((target_type, target_id)): Path<(String, DbId)>,
    Json(value): Json<FuncIndicator>,
) -> AppResult<impl IntoResponse> {
    let target = target(&target_type, target_id)?;
    let saved = indicator::set_func(&state.pool, &auth.ctx(), target, value).await?;
    Ok(Json(DataResponse { data: saved }))
}

/// DELETE /api/v1/indicators/func/{target_type}/{target_id}
pub async fn reset_func(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((target_type, target_id)): Path<(String, DbId)>,
) -> AppResult<StatusCode> {
    let target = target(&target_type, target_id)?;
    indicator::reset(&state.pool, &auth.ctx(), IndicatorKind::Func, target).await?;
    Ok(StatusCode::NO_CONTENT)
}
