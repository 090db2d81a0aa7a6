//! HTTP-level tests for `/indicators` fallback and `/nodes` metric ingest.

mod common;

use axum::http::StatusCode;
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use common::{admin_token, body_json, build_test_app, delete, get, post_json, put_json, user_token};
use serde_json::json;
use sqlx::PgPool;

fn at(min: u32, sec: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, min, sec).unwrap()
}

fn stamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn perf_indicator_falls_back_to_tenant_default(pool: PgPool) {
    let app = build_test_app(pool);
    let uri = "/api/v1/indicators/perf/API/42";

    let response = get(app.clone(), uri, &user_token()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["is_default"], true);
    assert_eq!(json["data"]["threads"], 50);

    let response = put_json(
        app.clone(),
        uri,
        &user_token(),
        json!({
            "threads": 20,
            "duration_secs": 600,
            "art_ms": 300,
            "percentile": "P95",
            "tps": 80.0,
            "error_rate": 0.5,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(get(app.clone(), uri, &user_token()).await).await;
    assert_eq!(json["data"]["is_default"], false);
    assert_eq!(json["data"]["threads"], 20);
    assert_eq!(json["data"]["percentile"], "P95");

    let response = delete(app.clone(), uri, &user_token()).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let json = body_json(get(app, uri, &user_token()).await).await;
    assert_eq!(json["data"]["is_default"], true);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_indicator_target_type_is_rejected(pool: PgPool) {
    let app = build_test_app(pool);
    let response = get(app, "/api/v1/indicators/func/SERVICE/1", &user_token()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

async fn create_node(app: axum::Router) -> i64 {
    let body = json!({ "name": "exec-01", "ip": "10.0.0.5", "roles": ["EXECUTION"] });

    let response = post_json(app.clone(), "/api/v1/nodes", &user_token(), body.clone()).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = post_json(app, "/api/v1/nodes", &admin_token(), body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

async fn push(app: axum::Router, node_id: i64, ts: DateTime<Utc>, cpu: f64) -> StatusCode {
    post_json(
        app,
        &format!("/api/v1/nodes/{node_id}/metrics"),
        &user_token(),
        json!({
            "cpu_percent": cpu,
            "memory_percent": 40.0,
            "disk_percent": 10.0,
            "sampled_at": stamp(ts),
        }),
    )
    .await
    .status()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn node_metrics_are_bucketed(pool: PgPool) {
    let app = build_test_app(pool);
    let node_id = create_node(app.clone()).await;

    assert_eq!(push(app.clone(), node_id, at(0, 10), 10.0).await, StatusCode::CREATED);
    assert_eq!(push(app.clone(), node_id, at(0, 50), 20.0).await, StatusCode::CREATED);
    assert_eq!(push(app.clone(), node_id, at(1, 30), 30.0).await, StatusCode::CREATED);
    assert_eq!(push(app.clone(), node_id, at(2, 0), 150.0).await, StatusCode::BAD_REQUEST);

    let response = get(
        app.clone(),
        &format!(
            "/api/v1/nodes/{node_id}/metrics?from={}&to={}&bucket_secs=60",
            stamp(at(0, 0)),
            stamp(at(5, 0)),
        ),
        &user_token(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let buckets = json["data"]["buckets"].as_array().unwrap();
    assert_eq!(buckets.len(), 2);
    assert_eq!(buckets[0]["samples"], 2);
    assert_eq!(buckets[0]["cpu_percent"], 15.0);
    assert_eq!(buckets[1]["cpu_percent"], 30.0);

    let response = get(app, "/api/v1/nodes/metrics/latest", &user_token()).await;
    let json = body_json(response).await;
    let latest = json["data"].as_array().unwrap();
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0]["node_id"], node_id);
    assert_eq!(latest[0]["cpu_percent"], 30.0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn disabled_node_rejects_samples(pool: PgPool) {
    let app = build_test_app(pool);
    let node_id = create_node(app.clone()).await;

    let response = put_json(
        app.clone(),
        &format!("/api/v1/nodes/{node_id}/enabled"),
        &admin_token(),
        json!({ "enabled": false }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let status = push(app, node_id, at(0, 10), 10.0).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
