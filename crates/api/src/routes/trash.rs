//! Route definitions for the `/trash` resource.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::trash;
use crate::state::AppState;

/// Routes mounted at `/trash`.
///
/// ```text
/// GET    /                               -> list_trash   (?type&project_id)
/// DELETE /                               -> purge_all    (admin)
/// POST   /{target_type}/{id}/restore     -> restore_item
/// DELETE /{target_type}/{id}             -> purge_item
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(trash::list_trash).delete(trash::purge_all))
        .route("/{target_type}/{id}/restore", post(trash::restore_item))
        .route("/{target_type}/{id}", delete(trash::purge_item))
}
