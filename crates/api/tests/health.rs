//! Health check, authentication, and error envelope behaviour.

mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, build_test_app, get, send, token, user_token};
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn health_check_reports_db(pool: PgPool) {
    let app = build_test_app(pool);
    let response = send(app, Method::GET, "/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["db_healthy"], true);
    assert!(json["version"].is_string());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn response_carries_request_id(pool: PgPool) {
    let app = build_test_app(pool);
    let response = send(app, Method::GET, "/health", None, None).await;
    assert!(response.headers().contains_key("x-request-id"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn missing_token_is_401(pool: PgPool) {
    let app = build_test_app(pool);
    let response = send(app, Method::GET, "/api/v1/projects/1", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let json = body_json(response).await;
    assert_eq!(json["code"], "UNAUTHORIZED");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn garbage_token_is_401(pool: PgPool) {
    let app = build_test_app(pool);
    let response = get(app, "/api/v1/projects/1", "not-a-jwt").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_entity_is_404_json(pool: PgPool) {
    let app = build_test_app(pool);
    let response = get(app, "/api/v1/tasks/999999", &user_token()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
    assert!(json["error"].as_str().unwrap().contains("999999"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn bad_path_enum_is_400(pool: PgPool) {
    let app = build_test_app(pool);
    let response = send(
        app,
        Method::POST,
        "/api/v1/trash/WIDGET/1/restore",
        Some(&token(5, "user")),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn oversized_body_is_413(pool: PgPool) {
    let app = build_test_app(pool);
    let description = "x".repeat(128 * 1024);
    let response = send(
        app,
        Method::POST,
        "/api/v1/projects",
        Some(&user_token()),
        Some(serde_json::json!({ "name": "Big", "description": description })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn caller_request_id_is_echoed(pool: PgPool) {
    let app = build_test_app(pool);
    let request = axum::http::Request::builder()
        .uri("/health")
        .header("x-request-id", "run-42")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(app, request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "run-42");
}
