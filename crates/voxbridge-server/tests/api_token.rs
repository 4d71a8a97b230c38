use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use voxbridge_server::{app, config::Config, AppState};
use voxbridge_voice::MapEnv;

const APP_ID: &str = "0123456789abcdef";
const CERTIFICATE: &str = "fedcba9876543210fedcba9876543210";

#[derive(Deserialize)]
struct Claims {
    sub: String,
    video: VideoClaims,
}

#[derive(Deserialize)]
struct VideoClaims {
    room: String,
}

fn setup_app(env: MapEnv) -> (axum::Router, AppState) {
    let state = AppState::new(Config::default(), Arc::new(env)).unwrap();
    (app(state.clone()), state)
}

fn configured_env() -> MapEnv {
    MapEnv::new()
        .with("AGORA_APP_ID", format!("  {APP_ID}"))
        .with("AGORA_APP_CERTIFICATE", format!("{CERTIFICATE}\r\n"))
}

async fn post_token(app: axum::Router, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/token")
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_token_issued_for_trimmed_credentials() {
    let (app, state) = setup_app(configured_env());

    let (status, json) = post_token(
        app,
        json!({ "channelName": "voxbridge-1-abcdef", "uid": "1234", "platform": "agora" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["appId"], APP_ID);
    assert_eq!(json["channelName"], "voxbridge-1-abcdef");
    assert_eq!(json["uid"], 1234);
    assert_eq!(json["platform"], "agora");
    assert!(json["expiresAt"].is_string());

    let claims = decode::<Claims>(
        json["token"].as_str().unwrap(),
        &DecodingKey::from_secret(CERTIFICATE.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .unwrap()
    .claims;
    assert_eq!(claims.sub, "1234");
    assert_eq!(claims.video.room, "voxbridge-1-abcdef");

    let logs = state.logs.snapshot();
    assert!(logs
        .iter()
        .any(|e| e.category == "token" && !e.is_error));
    assert!(logs.iter().all(|e| !e.message.contains(CERTIFICATE)));
}

#[tokio::test]
async fn test_missing_fields_are_bad_requests() {
    let (app, _) = setup_app(configured_env());

    let (status, json) = post_token(app.clone(), json!({ "uid": 1 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "channelName is required");

    let (status, json) = post_token(app.clone(), json!({ "channelName": "c" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "uid is required");

    let (status, _) = post_token(
        app,
        json!({ "channelName": "c", "uid": 1, "platform": "zoom" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unconfigured_platform_is_500_with_details() {
    // Agora is configured, Shengwang is not.
    let (app, state) = setup_app(configured_env());

    let (status, json) = post_token(
        app,
        json!({ "channelName": "c", "uid": 5, "platform": "shengwang" }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "Failed to generate token");
    assert!(json["details"]
        .as_str()
        .unwrap()
        .contains("SHENGWANG_APP_ID"));

    let errors: Vec<_> = state
        .logs
        .snapshot()
        .into_iter()
        .filter(|e| e.is_error)
        .collect();
    assert_eq!(errors.iter().filter(|e| e.category == "token").count(), 1);
    assert_eq!(errors.iter().filter(|e| e.category == "http").count(), 1);
}

#[tokio::test]
async fn test_health() {
    let (app, _) = setup_app(MapEnv::new());
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
}
