use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use voxbridge_server::{app, config::Config, AppState};
use voxbridge_voice::MapEnv;

fn setup_app(env: MapEnv) -> axum::Router {
    app(AppState::new(Config::default(), Arc::new(env)).unwrap())
}

async fn gate(app: axum::Router, method: &str, body: Option<Value>) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method(method)
                .uri("/gate")
                .header("Content-Type", "application/json")
                .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_open_gate_without_password() {
    let app = setup_app(MapEnv::new());

    let (status, json) = gate(app.clone(), "GET", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["required"], false);

    let (status, json) = gate(app, "POST", Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], true);
}

#[tokio::test]
async fn test_password_is_checked_after_trimming() {
    let app = setup_app(MapEnv::new().with("ACCESS_PASSWORD", " hunter2 \n"));

    let (_, json) = gate(app.clone(), "GET", None).await;
    assert_eq!(json["required"], true);

    let (status, json) = gate(app.clone(), "POST", Some(json!({ "password": "hunter2" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], true);

    let (status, json) = gate(app.clone(), "POST", Some(json!({ "password": "hunter3" }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "wrong password");

    let (status, _) = gate(app, "POST", Some(json!({}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
