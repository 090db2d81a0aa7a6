pub mod activity;
pub mod comment;
pub mod exec;
pub mod func;
pub mod health;
pub mod indicator;
pub mod node;
pub mod project;
pub mod report;
pub mod setting;
pub mod sprint;
pub mod tag;
pub mod task;
pub mod trash;

use std::time::Duration;

use axum::http::StatusCode;
use axum::Router;
use tower_http::timeout::TimeoutLayer;

use crate::state::AppState;

/// Build the `/api/v1` route tree. Every route requires a Bearer token.
///
/// Route hierarchy:
///
/// ```text
/// /projects                                        create, search
/// /projects/{id}                                   get, update, trash
/// /projects/{id}/members                           add members
/// /projects/{id}/overview|task-stats|case-stats    statistics
/// /projects/{id}/task-trend                        tasks created per day
///
/// /sprints                                         list, create, search
/// /sprints/{id}/status/{action}                    lifecycle
///
/// /tasks                                           create, search
/// /tasks/{id}/assignee|sprint|confirm|tags         task operations
/// /tasks/{id}/actions/{action}                     status changes
///
/// /tags                                            project tag dictionary
///
/// /func/plans                                      functional test plans
/// /func/cases                                      cases, results, references
/// /func/baselines                                  frozen case sets
/// /func/reviews                                    case reviews
///
/// /comments                                        comments on any target
/// /activities                                      activity log
///
/// /execs                                           test executions
/// /execs/{id}/result                               runner reports (ingest timeout)
/// /reports                                         reports and generated records
/// /nodes                                           execution nodes and metrics
/// /nodes/{id}/metrics                              agent samples (ingest timeout)
///
/// /settings                                        tenant settings and quotas
/// /indicators/{perf|stability|func}/{type}/{id}    target indicators
///
/// /trash                                           list, restore, purge
/// ```
pub fn api_routes(ingest_timeout: Duration) -> Router<AppState> {
    Router::new()
        // Projects, including statistics.
        .nest("/projects", project::router())
        .nest("/sprints", sprint::router())
        .nest("/tasks", task::router())
        .nest("/tags", tag::router())
        // Functional testing.
        .nest("/func", func::router())
        .nest("/comments", comment::router())
        .nest("/activities", activity::router())
        // Execution and reporting.
        .nest("/execs", exec::router(ingest_timeout))
        .nest("/reports", report::router())
        .nest("/nodes", node::router(ingest_timeout))
        // Tenant configuration.
        .nest("/settings", setting::router())
        .nest("/indicators", indicator::router())
        .nest("/trash", trash::router())
}

/// Timeout for endpoints that runners and agents push to. They retry, so a
/// stuck request is cut short rather than holding a pool connection.
pub(crate) fn ingest_timeout_layer(timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout)
}
