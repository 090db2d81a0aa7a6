//! Route definitions for the `/tasks` resource.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::task;
use crate::state::AppState;

/// Routes mounted at `/tasks`.
///
/// ```text
/// POST   /                        -> create_task
/// POST   /search                  -> search_tasks      (?project_id)
/// GET    /{id}                    -> get_task
/// PUT    /{id}                    -> update_task
/// DELETE /{id}                    -> delete_task
/// PUT    /{id}/assignee           -> assign_task
/// PUT    /{id}/sprint             -> move_task
/// POST   /{id}/actions/{action}   -> apply_task_action
/// POST   /{id}/confirm            -> confirm_task
/// GET    /{id}/tags               -> get_task_tags
/// PUT    /{id}/tags               -> replace_task_tags
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(task::create_task))
        .route("/search", post(task::search_tasks))
        .route(
            "/{id}",
            get(task::get_task)
                .put(task::update_task)
                .delete(task::delete_task),
        )
        .route("/{id}/assignee", put(task::assign_task))
        .route("/{id}/sprint", put(task::move_task))
        .route("/{id}/actions/{action}", post(task::apply_task_action))
        .route("/{id}/confirm", post(task::confirm_task))
        .route(
            "/{id}/tags",
            get(task::get_task_tags).put(task::replace_task_tags),
        )
}
