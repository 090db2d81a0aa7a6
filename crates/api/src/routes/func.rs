//! Route definitions for functional testing under `/func`.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{func_baseline, func_case, func_plan, func_review};
use crate::state::AppState;

/// Routes mounted at `/func`.
///
/// ```text
/// /plans                                plans and their lifecycle
/// /cases                                cases, results, references, tags
/// /baselines                            frozen case sets
/// /reviews                              case reviews
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/plans", plan_router())
        .nest("/cases", case_router())
        .nest("/baselines", baseline_router())
        .nest("/reviews", review_router())
}

/// ```text
/// POST   /                        -> create_plan
/// POST   /search                  -> search_plans  (?project_id)
/// GET    /{id}                    -> get_plan
/// PUT    /{id}                    -> update_plan
/// DELETE /{id}                    -> delete_plan
/// POST   /{id}/status/{action}    -> change_plan_status
/// ```
fn plan_router() -> Router<AppState> {
    Router::new()
        .route("/", post(func_plan::create_plan))
        .route("/search", post(func_plan::search_plans))
        .route(
            "/{id}",
            get(func_plan::get_plan)
                .put(func_plan::update_plan)
                .delete(func_plan::delete_plan),
        )
        .route("/{id}/status/{action}", post(func_plan::change_plan_status))
}

/// ```text
/// POST   /                -> create_case
/// POST   /search          -> search_cases  (?project_id)
/// GET    /{id}            -> get_case
/// PUT    /{id}            -> update_case
/// DELETE /{id}            -> delete_case
/// PUT    /{id}/result     -> set_case_result
/// PUT    /{id}/refs       -> set_case_refs
/// GET    /{id}/tags       -> get_case_tags
/// PUT    /{id}/tags       -> replace_case_tags
/// ```
fn case_router() -> Router<AppState> {
    Router::new()
        .route("/", post(func_case::create_case))
        .route("/search", post(func_case::search_cases))
        .route(
            "/{id}",
            get(func_case::get_case)
                .put(func_case::update_case)
                .delete(func_case::delete_case),
        )
        .route("/{id}/result", put(func_case::set_case_result))
        .route("/{id}/refs", put(func_case::set_case_refs))
        .route(
            "/{id}/tags",
            get(func_case::get_case_tags).put(func_case::replace_case_tags),
        )
}

/// ```text
/// POST   /                        -> create_baseline
/// POST   /search                  -> search_baselines  (?project_id)
/// GET    /{id}                    -> get_baseline
/// PUT    /{id}                    -> update_baseline
/// DELETE /{id}                    -> delete_baseline
/// GET    /{id}/cases              -> list_baseline_cases
/// POST   /{id}/cases              -> add_baseline_cases
/// POST   /{id}/cases/remove       -> remove_baseline_cases
/// GET    /{id}/cases/{case_id}    -> get_baseline_case
/// POST   /{id}/establish          -> establish_baseline
/// ```
fn baseline_router() -> Router<AppState> {
    Router::new()
        .route("/", post(func_baseline::create_baseline))
        .route("/search", post(func_baseline::search_baselines))
        .route(
            "/{id}",
            get(func_baseline::get_baseline)
                .put(func_baseline::update_baseline)
                .delete(func_baseline::delete_baseline),
        )
        .route(
            "/{id}/cases",
            get(func_baseline::list_baseline_cases).post(func_baseline::add_baseline_cases),
        )
        .route(
            "/{id}/cases/remove",
            post(func_baseline::remove_baseline_cases),
        )
        .route("/{id}/cases/{case_id}", get(func_baseline::get_baseline_case))
        .route("/{id}/establish", post(func_baseline::establish_baseline))
}

/// ```text
/// POST   /                        -> create_review
/// POST   /search                  -> search_reviews  (?project_id)
/// GET    /{id}                    -> get_review
/// DELETE /{id}                    -> delete_review
/// POST   /{id}/status/{action}    -> change_review_status
/// GET    /{id}/cases              -> list_review_cases
/// PUT    /{id}/cases/{case_id}    -> review_case
/// ```
fn review_router() -> Router<AppState> {
    Router::new()
        .route("/", post(func_review::create_review))
        .route("/search", post(func_review::search_reviews))
        .route(
            "/{id}",
            get(func_review::get_review).delete(func_review::delete_review),
        )
        .route(
            "/{id}/status/{action}",
            post(func_review::change_review_status),
        )
        .route("/{id}/cases", get(func_review::list_review_cases))
        .route("/{id}/cases/{case_id}", put(func_review::review_case))
}
