//! Route definitions for the `/tags` resource.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::tag;
use crate::state::AppState;

/// Routes mounted at `/tags`.
///
/// ```text
/// GET    /        -> list_tags   (?project_id&keyword)
/// POST   /        -> create_tags
/// PUT    /{id}    -> rename_tag
/// DELETE /{id}    -> delete_tag
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(tag::list_tags).post(tag::create_tags))
        .route("/{id}", put(tag::rename_tag).delete(tag::delete_tag))
}
