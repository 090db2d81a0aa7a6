//! Handlers for the `/comments` resource.

use angus_core::types::DbId;
use angus_db::models::comment::{CommentTarget, CreateComment};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::services::comment;
use crate::state::AppState;

/// POST /api/v1/comments
pub async fn add_comment(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateComment>,
) -> AppResult<impl IntoResponse> {
    let comment = comment::add(&state.pool, &auth.ctx(), input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: comment })))
}

/// GET /api/v1/comments?target_type=&target_id=
pub async fn list_comments(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(target): Query<CommentTarget>,
) -> AppResult<impl IntoResponse> {
    let comments = comment::list(&state.pool, &auth.ctx(), target).await?;
    Ok(Json(DataResponse { data: comments }))
}

/// DELETE /api/v1/comments/{id}
///
/// Only the author or an admin may delete a comment.
pub async fn delete_comment(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    comment::delete(&state.pool, &auth.ctx(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
