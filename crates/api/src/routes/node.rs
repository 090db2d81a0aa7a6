//! Route definitions for the `/nodes` resource.

use std::time::Duration;

use axum::routing::{get, post, put};
use axum::Router;

use super::ingest_timeout_layer;
use crate::handlers::node;
use crate::state::AppState;

/// Routes mounted at `/nodes`.
///
/// ```text
/// POST   /                    -> create_node        (admin)
/// POST   /search              -> search_nodes
/// GET    /metrics/latest      -> latest_metrics
/// GET    /{id}                -> get_node
/// PUT    /{id}                -> update_node        (admin)
/// DELETE /{id}                -> delete_node        (admin)
/// PUT    /{id}/enabled        -> set_node_enabled   (admin)
/// POST   /{id}/metrics        -> push_metric        (agent, ingest timeout)
/// GET    /{id}/metrics        -> metric_history     (?from&to&bucket_secs)
/// ```
pub fn router(ingest_timeout: Duration) -> Router<AppState> {
    Router::new()
        .route("/", post(node::create_node))
        .route("/search", post(node::search_nodes))
        .route("/metrics/latest", get(node::latest_metrics))
        .route(
            "/{id}",
            get(node::get_node)
                .put(node::update_node)
                .delete(node::delete_node),
        )
        .route("/{id}/enabled", put(node::set_node_enabled))
        .route(
            "/{id}/metrics",
            get(node::metric_history)
                .merge(post(node::push_metric).layer(ingest_timeout_layer(ingest_timeout))),
        )
}
