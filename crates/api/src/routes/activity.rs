//! Route definitions for the `/activities` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::activity;
use crate::state::AppState;

/// Routes mounted at `/activities`.
///
/// ```text
/// GET    /          -> list_target_activities  (?target_type&target_id&limit&offset)
/// POST   /search    -> search_activities       (?project_id)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(activity::list_target_activities))
        .route("/search", post(activity::search_activities))
}
