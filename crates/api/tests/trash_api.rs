//! HTTP-level tests for `/trash`.

mod common;

use axum::http::StatusCode;
use common::{
    admin_token, body_json, build_test_app, create_project, delete, get, post_json, user_token,
};
use serde_json::json;
use sqlx::PgPool;

async fn trashed_project(app: axum::Router, name: &str) -> i64 {
    let id = create_project(app.clone(), name).await;
    let response = delete(app, &format!("/api/v1/projects/{id}"), &user_token()).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    id
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn trashed_project_is_listed(pool: PgPool) {
    let app = build_test_app(pool);
    let id = trashed_project(app.clone(), "Gone").await;

    let response = get(
        app,
        &format!("/api/v1/trash?project_id={id}&type=PROJECT"),
        &user_token(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let items = json["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], id);
    assert_eq!(items[0]["target_type"], "PROJECT");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn tenant_wide_listing_needs_admin(pool: PgPool) {
    let app = build_test_app(pool);

    let response = get(app.clone(), "/api/v1/trash", &user_token()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = get(app, "/api/v1/trash", &admin_token()).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn restore_brings_project_back(pool: PgPool) {
    let app = build_test_app(pool);
    let id = trashed_project(app.clone(), "Comeback").await;

    let response = post_json(
        app.clone(),
        &format!("/api/v1/trash/PROJECT/{id}/restore"),
        &user_token(),
        json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get(app, &format!("/api/v1/projects/{id}"), &user_token()).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn purge_removes_item(pool: PgPool) {
    let app = build_test_app(pool);
    let id = trashed_project(app.clone(), "Forever").await;

    let response = delete(app.clone(), &format!("/api/v1/trash/PROJECT/{id}"), &user_token()).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = post_json(
        app,
        &format!("/api/v1/trash/PROJECT/{id}/restore"),
        &user_token(),
        json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn empty_trash_is_admin_only(pool: PgPool) {
    let app = build_test_app(pool);
    trashed_project(app.clone(), "One").await;
    trashed_project(app.clone(), "Two").await;

    let response = delete(app.clone(), "/api/v1/trash", &user_token()).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = delete(app, "/api/v1/trash", &admin_token()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["purged"], 2);
}
