//! Route definitions for the `/execs` resource.

use std::time::Duration;

use axum::routing::{get, post, put};
use axum::Router;

use super::ingest_timeout_layer;
use crate::handlers::exec;
use crate::state::AppState;

/// Routes mounted at `/execs`.
///
/// ```text
/// POST   /                -> create_exec
/// POST   /search          -> search_execs  (?project_id)
/// GET    /{id}            -> get_exec
/// PUT    /{id}            -> update_exec
/// DELETE /{id}            -> delete_exec
/// POST   /{id}/start      -> start_exec
/// POST   /{id}/stop       -> stop_exec
/// PUT    /{id}/result     -> report_exec_result  (runner, ingest timeout)
/// ```
pub fn router(ingest_timeout: Duration) -> Router<AppState> {
    Router::new()
        .route("/", post(exec::create_exec))
        .route("/search", post(exec::search_execs))
        .route(
            "/{id}",
            get(exec::get_exec)
                .put(exec::update_exec)
                .delete(exec::delete_exec),
        )
        .route("/{id}/start", post(exec::start_exec))
        .route("/{id}/stop", post(exec::stop_exec))
        .route(
            "/{id}/result",
            put(exec::report_exec_result).layer(ingest_timeout_layer(ingest_timeout)),
        )
}
