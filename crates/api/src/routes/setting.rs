//! Route definitions for the `/settings` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::setting;
use crate::state::AppState;

/// Routes mounted at `/settings`.
///
/// ```text
/// GET    /          -> get_settings
/// PUT    /          -> update_settings  (admin)
/// GET    /quotas    -> list_quotas
/// PUT    /quotas    -> update_quota     (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(setting::get_settings).put(setting::update_settings),
        )
        .route(
            "/quotas",
            get(setting::list_quotas).put(setting::update_quota),
        )
}
