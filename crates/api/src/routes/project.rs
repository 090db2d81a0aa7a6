//! Route definitions for the `/projects` resource.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::{analysis, project};
use crate::state::AppState;

/// Routes mounted at `/projects`.
///
/// ```text
/// POST   /                                          -> create_project
/// POST   /search                                    -> search_projects
/// GET    /{id}                                      -> get_project
/// PUT    /{id}                                      -> update_project
/// DELETE /{id}                                      -> delete_project
/// POST   /{id}/members                              -> add_members
/// DELETE /{id}/members/{member_type}/{member_id}    -> remove_member
/// GET    /{id}/overview                             -> overview
/// GET    /{id}/task-stats                           -> task_stats   (?sprint_id)
/// GET    /{id}/case-stats                           -> case_stats   (?plan_id)
/// GET    /{id}/task-trend                           -> task_trend   (?from&to)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(project::create_project))
        .route("/search", post(project::search_projects))
        .route(
            "/{id}",
            get(project::get_project)
                .put(project::update_project)
                .delete(project::delete_project),
        )
        .route("/{id}/members", post(project::add_members))
        .route(
            "/{id}/members/{member_type}/{member_id}",
            delete(project::remove_member),
        )
        .route("/{id}/overview", get(analysis::overview))
        .route("/{id}/task-stats", get(analysis::task_stats))
        .route("/{id}/case-stats", get(analysis::case_stats))
        .route("/{id}/task-trend", get(analysis::task_trend))
}
