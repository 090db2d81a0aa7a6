//! Route definitions for the `/comments` resource.

use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::comment;
use crate::state::AppState;

/// Routes mounted at `/comments`.
///
/// ```text
/// GET    /        -> list_comments  (?target_type&target_id)
/// POST   /        -> add_comment
/// DELETE /{id}    -> delete_comment
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(comment::list_comments).post(comment::add_comment))
        .route("/{id}", delete(comment::delete_comment))
}
