//! Route definitions for the `/sprints` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::sprint;
use crate::state::AppState;

/// Routes mounted at `/sprints`.
///
/// ```text
/// GET    /                        -> list_sprints   (?project_id)
/// POST   /                        -> create_sprint
/// POST   /search                  -> search_sprints (?project_id)
/// GET    /{id}                    -> get_sprint
/// PUT    /{id}                    -> update_sprint
/// DELETE /{id}                    -> delete_sprint
/// POST   /{id}/status/{action}    -> change_sprint_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(sprint::list_sprints).post(sprint::create_sprint))
        .route("/search", post(sprint::search_sprints))
        .route(
            "/{id}",
            get(sprint::get_sprint)
                .put(sprint::update_sprint)
                .delete(sprint::delete_sprint),
        )
        .route("/{id}/status/{action}", post(sprint::change_sprint_status))
}
