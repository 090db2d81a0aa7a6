//! Handlers for the `/func/reviews` resource.

use angus_core::func::ReviewAction;
use angus_core::search::SearchRequest;
use angus_core::types::DbId;
use angus_db::models::func_review::{CreateReview, ReviewCaseInput};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::query::ProjectScope;
use crate::response::DataResponse;
use crate::services::func_review;
use crate::state::AppState;

/// POST /api/v1/func/reviews
pub async fn create_review(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateReview>,
) -> AppResult<impl IntoResponse> {
    let review = func_review::create(&state.pool, &auth.ctx(), input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: review })))
}

/// POST /api/v1/func/reviews/search?project_id=
pub async fn search_reviews(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(scope): Query<ProjectScope>,
    Json(req): Json<SearchRequest>,
) -> AppResult<impl IntoResponse> {
    let page = func_review::search(&state.pool, &auth.ctx(), &req, scope.project_id).await?;
    Ok(Json(DataResponse { data: page }))
}

/// GET /api/v1/func/reviews/{id}
pub async fn get_review(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let review = func_review::get(&state.pool, &auth.ctx(), id).await?;
    Ok(Json(DataResponse { data: review }))
}

/// DELETE /api/v1/func/reviews/{id}
pub async fn delete_review(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    func_review::delete(&state.pool, &auth.ctx(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/func/reviews/{id}/status/{action}
///
/// `action` is `start` or `end`.
pub async fn change_review_status(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((id, action)): Path<(DbId, String)>,
) -> AppResult<impl IntoResponse> {
    let action = ReviewAction::from_str_value(&action)?;
    let review = func_review::change_status(&state.pool, &auth.ctx(), id, action).await?;
    Ok(Json(DataResponse { data: review }))
}

/// GET /api/v1/func/reviews/{id}/cases
pub async fn list_review_cases(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let cases = func_review::cases(&state.pool, &auth.ctx(), id).await?;
    Ok(Json(DataResponse { data: cases }))
}

/// PUT /api/v1/func/reviews/{id}/cases/{case_id}
pub async fn review_case(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((id, case_id)): Path<(DbId, DbId)>,
    Json(input): Json<ReviewCaseInput>,
) -> AppResult<impl IntoResponse> {
    let reviewed = func_review::review_case(&state.pool, &auth.ctx(), id, case_id, input).await?;
    Ok(Json(DataResponse { data: reviewed }))
}
