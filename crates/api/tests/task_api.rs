//! HTTP-level tests for `/sprints`, `/tasks` and task tagging.

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{
    admin_token, body_json, build_test_app, create_project, get, post_json, put_json, token,
    user_token, USER,
};
use serde_json::json;
use sqlx::PgPool;

async fn create_task(app: axum::Router, body: serde_json::Value) -> serde_json::Value {
    let response = post_json(app, "/api/v1/tasks", &user_token(), body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn sprint_start_after_deadline_is_400(pool: PgPool) {
    let app = build_test_app(pool);
    let project_id = create_project(app.clone(), "Sprints").await;
    let now = Utc::now();

    let response = post_json(
        app,
        "/api/v1/sprints",
        &user_token(),
        json!({
            "project_id": project_id,
            "name": "Sprint 1",
            "start_date": (now + Duration::days(5)).to_rfc3339(),
            "deadline_date": (now + Duration::days(1)).to_rfc3339(),
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn sprint_lists_under_project(pool: PgPool) {
    let app = build_test_app(pool);
    let project_id = create_project(app.clone(), "Sprints").await;
    let now = Utc::now();

    let response = post_json(
        app.clone(),
        "/api/v1/sprints",
        &user_token(),
        json!({
            "project_id": project_id,
            "name": "Sprint 1",
            "start_date": (now + Duration::hours(1)).to_rfc3339(),
            "deadline_date": (now + Duration::days(14)).to_rfc3339(),
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = get(
        app,
        &format!("/api/v1/sprints?project_id={project_id}"),
        &user_token(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn task_gets_code_and_pending_status(pool: PgPool) {
    let app = build_test_app(pool);
    let project_id = create_project(app.clone(), "Tasks").await;

    let task = create_task(app, json!({ "project_id": project_id, "name": "Write docs" })).await;
    assert_eq!(task["status"], "PENDING");
    assert!(task["code"].as_str().unwrap().starts_with('T'));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn confirm_failure_returns_task_to_pending(pool: PgPool) {
    let app = build_test_app(pool);
    let project_id = create_project(app.clone(), "Flow").await;
    let task = create_task(
        app.clone(),
        json!({ "project_id": project_id, "name": "Fix login", "confirmer_id": USER }),
    )
    .await;
    let id = task["id"].as_i64().unwrap();
    let token = user_token();

    for (action, expected) in [("start", "IN_PROGRESS"), ("process", "CONFIRMING")] {
        let response = post_json(
            app.clone(),
            &format!("/api/v1/tasks/{id}/actions/{action}"),
            &token,
            json!({}),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["data"]["status"], expected);
    }

    let response = post_json(
        app,
        &format!("/api/v1/tasks/{id}/confirm"),
        &token,
        json!({ "passed": false }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "PENDING");
    assert_eq!(json["data"]["failure_count"], 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn illegal_transition_is_422(pool: PgPool) {
    let app = build_test_app(pool);
    let project_id = create_project(app.clone(), "Illegal").await;
    let task = create_task(app.clone(), json!({ "project_id": project_id, "name": "T" })).await;
    let id = task["id"].as_i64().unwrap();

    let response = post_json(
        app,
        &format!("/api/v1/tasks/{id}/actions/process"),
        &user_token(),
        json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_action_is_400(pool: PgPool) {
    let app = build_test_app(pool);
    let project_id = create_project(app.clone(), "Unknown").await;
    let task = create_task(app.clone(), json!({ "project_id": project_id, "name": "T" })).await;
    let id = task["id"].as_i64().unwrap();

    let response = post_json(
        app,
        &format!("/api/v1/tasks/{id}/actions/confirm"),
        &user_token(),
        json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn replacing_task_tags_is_idempotent(pool: PgPool) {
    let app = build_test_app(pool);
    let project_id = create_project(app.clone(), "Tagged").await;

    let response = post_json(
        app.clone(),
        "/api/v1/tags",
        &user_token(),
        json!({ "project_id": project_id, "names": ["backend", "urgent"] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let tags = body_json(response).await["data"].clone();
    let tag_ids: Vec<i64> = tags
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_i64().unwrap())
        .collect();
    assert_eq!(tag_ids.len(), 2);

    let task = create_task(app.clone(), json!({ "project_id": project_id, "name": "T" })).await;
    let uri = format!("/api/v1/tasks/{}/tags", task["id"]);

    for _ in 0..2 {
        let response =
            put_json(app.clone(), &uri, &user_token(), json!({ "tag_ids": tag_ids })).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = get(app, &uri, &user_token()).await;
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn search_without_project_hides_foreign_tasks(pool: PgPool) {
    let app = build_test_app(pool);
    let project_id = create_project(app.clone(), "Private").await;
    let task = create_task(app.clone(), json!({ "project_id": project_id, "name": "Secret" })).await;

    let outsider = token(777, "user");
    let response = post_json(app.clone(), "/api/v1/tasks/search", &outsider, json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["total"], 0);
    assert!(json["data"]["items"].as_array().unwrap().is_empty());

    let scoped = format!("/api/v1/tasks/search?project_id={project_id}");
    let response = post_json(app.clone(), &scoped, &outsider, json!({})).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    for viewer in [user_token(), admin_token()] {
        let response = post_json(app.clone(), "/api/v1/tasks/search", &viewer, json!({})).await;
        let json = body_json(response).await;
        assert_eq!(json["data"]["total"], 1);
        assert_eq!(json["data"]["items"][0]["id"], task["id"]);
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn reposting_existing_tags_at_quota_succeeds(pool: PgPool) {
    let app = build_test_app(pool);
    let project_id = create_project(app.clone(), "Tag quota").await;

    let response = post_json(
        app.clone(),
        "/api/v1/tags",
        &user_token(),
        json!({ "project_id": project_id, "names": ["a", "b"] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = put_json(
        app.clone(),
        "/api/v1/settings/quotas",
        &admin_token(),
        json!({ "name": "TAGS_PER_PROJECT", "quota": 2 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post_json(
        app.clone(),
        "/api/v1/tags",
        &user_token(),
        json!({ "project_id": project_id, "names": ["a"] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = post_json(
        app,
        "/api/v1/tags",
        &user_token(),
        json!({ "project_id": project_id, "names": ["a", "c"] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

async fn create_sprint(app: axum::Router, project_id: i64) -> i64 {
    let now = Utc::now();
    let response = post_json(
        app,
        "/api/v1/sprints",
        &user_token(),
        json!({
            "project_id": project_id,
            "name": "Sprint",
            "start_date": (now + Duration::hours(1)).to_rfc3339(),
            "deadline_date": (now + Duration::days(14)).to_rfc3339(),
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

async fn sprint_action(
    app: axum::Router,
    sprint_id: i64,
    action: &str,
) -> axum::http::Response<axum::body::Body> {
    post_json(
        app,
        &format!("/api/v1/sprints/{sprint_id}/status/{action}"),
        &user_token(),
        json!({}),
    )
    .await
}

async fn task_action(app: axum::Router, task_id: i64, action: &str) -> serde_json::Value {
    let response = post_json(
        app,
        &format!("/api/v1/tasks/{task_id}/actions/{action}"),
        &user_token(),
        json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"].clone()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn sprint_completes_only_when_tasks_are_finished(pool: PgPool) {
    let app = build_test_app(pool);
    let project_id = create_project(app.clone(), "Completion").await;
    let sprint_id = create_sprint(app.clone(), project_id).await;
    let task = create_task(
        app.clone(),
        json!({ "project_id": project_id, "sprint_id": sprint_id, "name": "Open work" }),
    )
    .await;
    let task_id = task["id"].as_i64().unwrap();

    assert_eq!(sprint_action(app.clone(), sprint_id, "start").await.status(), StatusCode::OK);

    let response = sprint_action(app.clone(), sprint_id, "complete").await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["code"], "BUSINESS_ERROR");

    task_action(app.clone(), task_id, "start").await;
    let done = task_action(app.clone(), task_id, "process").await;
    assert_eq!(done["status"], "COMPLETED");

    let response = sprint_action(app, sprint_id, "complete").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["status"], "COMPLETED");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn sprint_restart_resets_its_tasks(pool: PgPool) {
    let app = build_test_app(pool);
    let project_id = create_project(app.clone(), "Restart").await;
    let sprint_id = create_sprint(app.clone(), project_id).await;
    let task = create_task(
        app.clone(),
        json!({ "project_id": project_id, "sprint_id": sprint_id, "name": "Redo" }),
    )
    .await;
    let task_id = task["id"].as_i64().unwrap();

    sprint_action(app.clone(), sprint_id, "start").await;
    task_action(app.clone(), task_id, "start").await;
    task_action(app.clone(), task_id, "process").await;

    let response = sprint_action(app.clone(), sprint_id, "restart").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["status"], "PENDING");

    let response = get(app, &format!("/api/v1/tasks/{task_id}"), &user_token()).await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "PENDING");
    assert!(json["data"]["completed_date"].is_null());
    assert!(json["data"]["start_date"].is_null());
}
