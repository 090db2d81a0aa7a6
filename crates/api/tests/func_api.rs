//! HTTP-level tests for plans, cases and baselines under `/func`.

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{body_json, build_test_app, create_project, get, post_json, put_json, user_token};
use serde_json::json;
use sqlx::PgPool;

struct Fixture {
    plan_id: i64,
    case_id: i64,
}

async fn seed(app: axum::Router) -> Fixture {
    seed_plan(app, false).await
}

async fn seed_plan(app: axum::Router, review_flag: bool) -> Fixture {
    let project_id = create_project(app.clone(), "Functional").await;
    let now = Utc::now();

    let response = post_json(
        app.clone(),
        "/api/v1/func/plans",
        &user_token(),
        json!({
            "project_id": project_id,
            "name": "Release 1.0",
            "start_date": (now + Duration::hours(1)).to_rfc3339(),
            "deadline_date": (now + Duration::days(30)).to_rfc3339(),
            "review_flag": review_flag,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let plan_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = post_json(
        app,
        "/api/v1/func/cases",
        &user_token(),
        json!({
            "plan_id": plan_id,
            "name": "Login with valid password",
            "steps": [{ "step": "Submit the form", "expected_result": "Dashboard shown" }],
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let case_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    Fixture { plan_id, case_id }
}

async fn create_baseline(app: axum::Router, fx: &Fixture) -> i64 {
    let response = post_json(
        app,
        "/api/v1/func/baselines",
        &user_token(),
        json!({ "plan_id": fx.plan_id, "name": "RC1", "case_ids": [fx.case_id] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn baseline_case_detail_returns_snapshot(pool: PgPool) {
    let app = build_test_app(pool);
    let fx = seed(app.clone()).await;
    let baseline_id = create_baseline(app.clone(), &fx).await;

    let response = get(
        app,
        &format!("/api/v1/func/baselines/{baseline_id}/cases/{}", fx.case_id),
        &user_token(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["case_id"], fx.case_id);
    assert_eq!(json["data"]["snapshot"]["name"], "Login with valid password");
    assert_eq!(json["data"]["comment_count"], 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn case_outside_baseline_is_404(pool: PgPool) {
    let app = build_test_app(pool);
    let fx = seed(app.clone()).await;
    let baseline_id = create_baseline(app.clone(), &fx).await;

    let response = get(
        app,
        &format!("/api/v1/func/baselines/{baseline_id}/cases/987654"),
        &user_token(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn established_baseline_is_frozen(pool: PgPool) {
    let app = build_test_app(pool);
    let fx = seed(app.clone()).await;
    let baseline_id = create_baseline(app.clone(), &fx).await;

    let response = post_json(
        app.clone(),
        &format!("/api/v1/func/baselines/{baseline_id}/establish"),
        &user_token(),
        json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["established"], true);

    let response = post_json(
        app,
        &format!("/api/v1/func/baselines/{baseline_id}/cases/remove"),
        &user_token(),
        json!({ "case_ids": [fx.case_id] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn review_requires_review_flag(pool: PgPool) {
    let app = build_test_app(pool);
    let fx = seed(app.clone()).await;
    let now = Utc::now();

    let response = post_json(
        app,
        "/api/v1/func/reviews",
        &user_token(),
        json!({
            "plan_id": fx.plan_id,
            "name": "Review 1",
            "start_date": (now + Duration::hours(1)).to_rfc3339(),
            "deadline_date": (now + Duration::days(3)).to_rfc3339(),
            "case_ids": [fx.case_id],
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn reviewing_a_case_stamps_the_case(pool: PgPool) {
    let app = build_test_app(pool);
    let fx = seed_plan(app.clone(), true).await;

    let response = post_json(
        app.clone(),
        "/api/v1/func/reviews",
        &user_token(),
        json!({ "plan_id": fx.plan_id, "name": "Review 1", "case_ids": [fx.case_id] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let review_id = body_json(response).await["data"]["id"].as_i64().unwrap();
    let review_uri = format!("/api/v1/func/reviews/{review_id}/cases/{}", fx.case_id);

    // Not started yet.
    let response = put_json(
        app.clone(),
        &review_uri,
        &user_token(),
        json!({ "review_status": "PASSED" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = post_json(
        app.clone(),
        &format!("/api/v1/func/reviews/{review_id}/status/start"),
        &user_token(),
        json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["status"], "IN_PROGRESS");

    let response = put_json(
        app.clone(),
        &review_uri,
        &user_token(),
        json!({ "review_status": "PASSED", "review_remark": "Steps are clear" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["review_status"], "PASSED");
    assert_eq!(json["data"]["reviewer_id"], common::USER);

    let response = get(app, &format!("/api/v1/func/cases/{}", fx.case_id), &user_token()).await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["review_status"], "PASSED");
    assert_eq!(json["data"]["review_num"], 1);
    assert!(!json["data"]["review_date"].is_null());
}
