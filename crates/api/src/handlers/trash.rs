//! Handlers for the `/trash` resource.

use angus_core::activity::TargetType;
use angus_core::types::DbId;
use angus_db::models::trash::TrashListParams;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::services::trash;
use crate::state::AppState;

/// GET /api/v1/trash?type=&project_id=
///
/// Without `project_id` the whole tenant is listed, which requires admin.
pub async fn list_trash(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<TrashListParams>,
) -> AppResult<impl IntoResponse> {
    let items = trash::list(&state.pool, &auth.ctx(), &params).await?;
    Ok(Json(DataResponse { data: items }))
}

/// POST /api/v1/trash/{target_type}/{id}/restore
pub async fn restore_item(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((target_type, id)): Path<(String, DbId)>,
) -> AppResult<StatusCode> {
    let target_type = TargetType::from_str_value(&target_type)?;
    trash::restore(&state.pool, &auth.ctx(), target_type, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/trash/{target_type}/{id}
///
/// Permanently delete one trashed item.
pub async fn purge_item(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((target_type, id)): Path<(String, DbId)>,
) -> AppResult<StatusCode> {
    let target_type = TargetType::from_str_value(&target_type)?;
    trash::purge_one(&state.pool, &auth.ctx(), target_type, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/trash
pub async fn purge_all(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let purged = trash::purge_all(&state.pool, &admin.ctx()).await?;
    Ok(Json(DataResponse {
        data: json!({ "purged": purged }),
    }))
}
