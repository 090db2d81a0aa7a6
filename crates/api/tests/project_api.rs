//! HTTP-level tests for `/projects`, membership, quotas and statistics.

mod common;

use axum::http::StatusCode;
use common::{
    admin_token, body_json, build_test_app, create_project, delete, get, post_json, put_json,
    token, user_token, USER,
};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_then_get_project(pool: PgPool) {
    let app = build_test_app(pool);
    let id = create_project(app.clone(), "  Payments  ").await;

    let response = get(app, &format!("/api/v1/projects/{id}"), &user_token()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["name"], "Payments");
    assert_eq!(json["data"]["owner_id"], USER);
    let members = json["data"]["members"].as_array().unwrap();
    assert!(members.iter().any(|m| m["member_id"] == USER));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_name_conflicts(pool: PgPool) {
    let app = build_test_app(pool);
    create_project(app.clone(), "Billing").await;

    let response = post_json(
        app,
        "/api/v1/projects",
        &user_token(),
        json!({ "name": "Billing" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn blank_name_is_rejected(pool: PgPool) {
    let app = build_test_app(pool);
    let response = post_json(
        app,
        "/api/v1/projects",
        &user_token(),
        json!({ "name": "   " }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn outsider_is_forbidden(pool: PgPool) {
    let app = build_test_app(pool);
    let id = create_project(app.clone(), "Private").await;

    let response = get(app, &format!("/api/v1/projects/{id}"), &token(777, "user")).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn added_member_gains_access(pool: PgPool) {
    let app = build_test_app(pool);
    let id = create_project(app.clone(), "Shared").await;

    let response = post_json(
        app.clone(),
        &format!("/api/v1/projects/{id}/members"),
        &user_token(),
        json!({ "member_type": "USER", "member_ids": [555] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(app, &format!("/api/v1/projects/{id}"), &token(555, "user")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn update_and_delete_project(pool: PgPool) {
    let app = build_test_app(pool);
    let id = create_project(app.clone(), "Old name").await;

    let response = put_json(
        app.clone(),
        &format!("/api/v1/projects/{id}"),
        &user_token(),
        json!({ "name": "New name" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["name"], "New name");

    let response = delete(app.clone(), &format!("/api/v1/projects/{id}"), &user_token()).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get(app, &format!("/api/v1/projects/{id}"), &user_token()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn project_quota_is_429(pool: PgPool) {
    let app = build_test_app(pool);

    let response = put_json(
        app.clone(),
        "/api/v1/settings/quotas",
        &admin_token(),
        json!({ "name": "PROJECTS", "quota": 1 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    create_project(app.clone(), "First").await;
    let response = post_json(
        app,
        "/api/v1/projects",
        &user_token(),
        json!({ "name": "Second" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body_json(response).await["code"], "QUOTA_EXCEEDED");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn quota_update_requires_admin(pool: PgPool) {
    let app = build_test_app(pool);
    let response = put_json(
        app,
        "/api/v1/settings/quotas",
        &user_token(),
        json!({ "name": "PROJECTS", "quota": 1 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn overview_of_empty_project(pool: PgPool) {
    let app = build_test_app(pool);
    let id = create_project(app.clone(), "Fresh").await;

    let response = get(app, &format!("/api/v1/projects/{id}/overview"), &user_token()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["data"].is_object());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn reversed_trend_window_is_400(pool: PgPool) {
    let app = build_test_app(pool);
    let id = create_project(app.clone(), "Trend").await;

    let response = get(
        app,
        &format!("/api/v1/projects/{id}/task-trend?from=2026-03-10&to=2026-03-01"),
        &user_token(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
