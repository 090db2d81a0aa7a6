//! HTTP-level tests for `/execs`: queueing, stopping and runner reports.

mod common;

use angus_api::auth::jwt::generate_access_token;
use axum::http::StatusCode;
use common::{body_json, build_test_app, create_project, post_json, put_json, test_config, user_token};
use serde_json::json;
use sqlx::PgPool;

async fn create_exec(app: axum::Router, project_id: i64) -> i64 {
    let response = post_json(
        app,
        "/api/v1/execs",
        &user_token(),
        json!({
            "project_id": project_id,
            "name": "Checkout load",
            "script_type": "TEST_PERFORMANCE",
            "script_yaml": "task:\n  pipelines: []\n",
            "thread_count": 10,
            "iterations": 100,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "CREATED");
    json["data"]["id"].as_i64().unwrap()
}

async fn exec_command(app: axum::Router, id: i64, command: &str) -> (StatusCode, serde_json::Value) {
    let response = post_json(
        app,
        &format!("/api/v1/execs/{id}/{command}"),
        &user_token(),
        json!({}),
    )
    .await;
    let status = response.status();
    (status, body_json(response).await)
}

async fn report(
    app: axum::Router,
    id: i64,
    token: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let response = put_json(app, &format!("/api/v1/execs/{id}/result"), token, body).await;
    let status = response.status();
    (status, body_json(response).await)
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn exec_runs_through_queue_and_runner(pool: PgPool) {
    let app = build_test_app(pool);
    let project_id = create_project(app.clone(), "Perf").await;
    let id = create_exec(app.clone(), project_id).await;

    let (status, _) = exec_command(app.clone(), id, "stop").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, json) = exec_command(app.clone(), id, "start").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "PENDING");

    let (status, _) = exec_command(app.clone(), id, "start").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, json) = report(
        app.clone(),
        id,
        &user_token(),
        json!({ "status": "RUNNING", "assign_node_ids": [3] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "RUNNING");
    assert_eq!(json["data"]["assign_node_ids"], json!([3]));

    let (status, json) = report(
        app,
        id,
        &user_token(),
        json!({ "status": "COMPLETED", "meter_status": "SUCCESS", "sample_summary": { "tps": 120.5 } }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "COMPLETED");
    assert_eq!(json["data"]["sample_summary"]["tps"], 120.5);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn late_report_cannot_override_stop(pool: PgPool) {
    let app = build_test_app(pool);
    let project_id = create_project(app.clone(), "Stopped").await;
    let id = create_exec(app.clone(), project_id).await;

    exec_command(app.clone(), id, "start").await;
    let (status, json) = exec_command(app.clone(), id, "stop").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "STOPPED");

    let (status, json) = report(app.clone(), id, &user_token(), json!({ "status": "COMPLETED" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");

    // A stopped execution may be queued again.
    let (status, json) = exec_command(app, id, "start").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "PENDING");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn runner_report_is_checked(pool: PgPool) {
    let app = build_test_app(pool);
    let project_id = create_project(app.clone(), "Checked").await;
    let id = create_exec(app.clone(), project_id).await;
    exec_command(app.clone(), id, "start").await;

    let (status, _) = report(app.clone(), id, &user_token(), json!({ "status": "PENDING" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let foreign = generate_access_token(100, 2, "user", &test_config().jwt).unwrap();
    let (status, _) = report(app, id, &foreign, json!({ "status": "RUNNING" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
