//! Handlers for the `/settings` resource.

use angus_db::models::setting::{UpdateQuota, UpdateSettings};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::services::setting;
use crate::state::AppState;

/// GET /api/v1/settings
pub async fn get_settings(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let settings = setting::get(&state.pool, &state.settings, &auth.ctx()).await?;
    Ok(Json(DataResponse { data: settings }))
}

/// PUT /api/v1/settings
pub async fn update_settings(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<UpdateSettings>,
) -> AppResult<impl IntoResponse> {
    let settings = setting::update(&state.pool, &state.settings, &admin.ctx(), input).await?;
    Ok(Json(DataResponse { data: settings }))
}

/// GET /api/v1/settings/quotas
pub async fn list_quotas(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let quotas = setting::quotas(&state.pool, &auth.ctx()).await?;
    Ok(Json(DataResponse { data: quotas }))
}

/// PUT /api/v1/settings/quotas
///
/// Override one quota; returns every effective quota.
pub async fn update_quota(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<UpdateQuota>,
) -> AppResult<impl IntoResponse> {
    let quotas = setting::update_quota(&state.pool, &state.settings, &admin.ctx(), input).await?;
    Ok(Json(DataResponse { data: quotas }))
}
