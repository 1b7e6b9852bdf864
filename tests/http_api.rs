//! HTTP contract of the analysis API.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use bloodsmear::pipeline::AppContext;
use bloodsmear::server::router;
use bloodsmear::store::MemoryStore;
use common::{BrokenStore, FlakyBackend, context, context_with_store, png_payload};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

async fn send(ctx: &AppContext, request: Request<Body>) -> (StatusCode, Value) {
    let response = router(ctx.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn analyze_returns_id_and_ranked_result() {
    let ctx = context();
    let image = format!("data:image/png;base64,{}", png_payload(32, 32, [240, 20, 20]));
    let (status, body) = send(
        &ctx,
        post_json("/api/analyze", &json!({"image": image, "user_id": "u-1", "notes": "slide 4"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["analysis_id"].is_string());
    assert_eq!(body["saved"], true);
    // The red channel dominates, which the test backend maps to the first label.
    assert_eq!(body["result"]["top_label"], "babesia");
    let ranked = body["result"]["ranked"].as_array().unwrap();
    assert_eq!(ranked.len(), 3);
    let total: f64 = ranked.iter().map(|e| e["confidence"].as_f64().unwrap()).sum();
    assert!((total - 100.0).abs() < 1e-3);
}

#[tokio::test]
async fn analyze_without_image_is_bad_request() {
    let ctx = context();
    let (status, body) = send(&ctx, post_json("/api/analyze", &json!({"user_id": "u"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_input");
    assert!(body["error"].as_str().unwrap().contains("No image data provided"));
}

#[tokio::test]
async fn malformed_base64_is_structured_decode_error() {
    let ctx = context();
    let (status, body) = send(
        &ctx,
        post_json("/api/analyze", &json!({"image": "%%% not base64 %%%", "user_id": "u"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "decode");
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn non_image_bytes_are_decode_error() {
    let ctx = context();
    let payload = bloodsmear::utils::encode_payload(b"just some text");
    let (status, body) = send(
        &ctx,
        post_json("/api/analyze", &json!({"image": payload, "user_id": "u"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "decode");
}

#[tokio::test]
async fn invalid_json_body_is_rejected() {
    let ctx = context();
    let request = Request::post("/api/analyze")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ nope"))
        .unwrap();
    let (status, body) = send(&ctx, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_input");
}

#[tokio::test]
async fn persistence_failure_still_returns_prediction() {
    let ctx = context_with_store(Arc::new(BrokenStore));
    let (status, body) = send(
        &ctx,
        post_json("/api/analyze", &json!({"image": png_payload(8, 8, [0, 0, 0]), "user_id": "u"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["analysis_id"].is_null());
    assert_eq!(body["saved"], false);
    assert!(body["persistence_error"].is_string());
    assert!(body["result"]["top_label"].is_string());
}

#[tokio::test]
async fn inference_failure_is_server_error() {
    let ctx = AppContext::new(
        common::pipeline_with(FlakyBackend::default()),
        Arc::new(MemoryStore::new()),
    );
    let (status, body) = send(
        &ctx,
        post_json("/api/analyze", &json!({"image": png_payload(8, 8, [9, 9, 9]), "user_id": "u"})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["kind"], "inference");
    assert!(ctx.results_for("u").unwrap().is_empty());
}

#[tokio::test]
async fn results_and_stats_reflect_analyses() {
    let ctx = context();
    for rgb in [[200, 0, 0], [0, 200, 0]] {
        let (status, _) = send(
            &ctx,
            post_json("/api/analyze", &json!({"image": png_payload(16, 16, rgb), "user_id": "u-7"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(&ctx, get("/api/results?user_id=u-7")).await;
    assert_eq!(status, StatusCode::OK);
    let analyses = body["analyses"].as_array().unwrap();
    assert_eq!(analyses.len(), 2);
    assert_eq!(analyses[0]["result"]["top_label"], "healthy");
    assert!(analyses[0]["created_at"].as_str().unwrap().ends_with('Z'));

    let (status, body) = send(&ctx, get("/api/stats/u-7")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_analyses"], 2);
    assert_eq!(body["month_analyses"], 2);
    assert_eq!(body["week_analyses"], 2);
}

#[tokio::test]
async fn results_require_user_id() {
    let ctx = context();
    let (status, body) = send(&ctx, get("/api/results")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_input");
}

#[tokio::test]
async fn store_failure_on_read_is_server_error() {
    let ctx = context_with_store(Arc::new(BrokenStore));
    let (status, body) = send(&ctx, get("/api/stats/u")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["kind"], "persistence");
}

#[tokio::test]
async fn health_runs_probe_image() {
    let ctx = context();
    let (status, body) = send(&ctx, get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["model_loaded"], true);
    assert_eq!(body["device"], "cpu");
    assert_eq!(body["test_prediction_status"], "success");
}

#[tokio::test]
async fn unhealthy_when_probe_fails() {
    let ctx = AppContext::new(
        common::pipeline_with(FlakyBackend::default()),
        Arc::new(MemoryStore::new()),
    );
    let (status, body) = send(&ctx, get("/api/health")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "unhealthy");
    assert!(body["error"].is_string());
}
