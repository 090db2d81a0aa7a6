//! Route definitions for the `/reports` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::report;
use crate::state::AppState;

/// Routes mounted at `/reports`.
///
/// ```text
/// POST   /                -> create_report
/// POST   /search          -> search_reports  (?project_id)
/// GET    /{id}            -> get_report
/// PUT    /{id}            -> update_report
/// DELETE /{id}            -> delete_report
/// POST   /{id}/generate   -> generate_report
/// GET    /{id}/records    -> list_report_records
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(report::create_report))
        .route("/search", post(report::search_reports))
        .route(
            "/{id}",
            get(report::get_report)
                .put(report::update_report)
                .delete(report::delete_report),
        )
        .route("/{id}/generate", post(report::generate_report))
        .route("/{id}/records", get(report::list_report_records))
}
