//! Handlers for the `/tags` resource.

use angus_core::types::DbId;
use angus_db::models::tag::{CreateTags, UpdateTag};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::query::KeywordParams;
use crate::response::DataResponse;
use crate::services::tag;
use crate::state::AppState;

/// POST /api/v1/tags
///
/// Create several tags at once; names that already exist are returned as is.
pub async fn create_tags(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateTags>,
) -> AppResult<impl IntoResponse> {
    let tags = tag::create(&state.pool, &auth.ctx(), input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: tags })))
}

/// GET /api/v1/tags?project_id=&keyword=
pub async fn list_tags(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<KeywordParams>,
) -> AppResult<impl IntoResponse> {
    let tags = tag::list(
        &state.pool,
        &auth.ctx(),
        params.project_id,
        params.keyword.as_deref(),
    )
    .await?;
    Ok(Json(DataResponse { data: tags }))
}

/// PUT /api/v1/tags/{id}
pub async fn rename_tag(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateTag>,
) -> AppResult<impl IntoResponse> {
    let tag = tag::rename(&state.pool, &auth.ctx(), id, input).await?;
    Ok(Json(DataResponse { data: tag }))
}

/// DELETE /api/v1/tags/{id}
pub async fn delete_tag(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    tag::delete(&state.pool, &auth.ctx(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
