//! Route definitions for the `/indicators` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::indicator;
use crate::state::AppState;

/// Routes mounted at `/indicators`.
///
/// ```text
/// GET|PUT|DELETE /perf/{target_type}/{target_id}        -> get_perf, set_perf, reset_perf
/// GET|PUT|DELETE /stability/{target_type}/{target_id}   -> get_stability, set_stability, reset_stability
/// GET|PUT|DELETE /func/{target_type}/{target_id}        -> get_func, set_func, reset_func
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/perf/{target_type}/{target_id}",
            get(indicator::get_perf)
                .put(indicator::set_perf)
                .delete(indicator::reset_perf),
        )
        .route(
            "/stability/{target_type}/{target_id}",
            get(indicator::get_stability)
                .put(indicator::set_stability)
                .delete(indicator::reset_stability),
        )
        .route(
            "/func/{target_type}/{target_id}",
            get(indicator::get_func)
                .put(indicator::set_func)
                .delete(indicator::reset_func),
        )
}
