//! `/gate`: the optional shared password in front of the UI.
//!
//! The password comes from `ACCESS_PASSWORD`, read per request. When it is
//! unset the gate is open.

use crate::api::ApiError;
use crate::AppState;
use axum::{extract::Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use voxbridge_voice::read_trimmed;

const PASSWORD_VAR: &str = "ACCESS_PASSWORD";

#[derive(Debug, Default, Deserialize)]
pub struct GateRequest {
    #[serde(default)]
    pub password: Option<String>,
}

/// Handler for `GET /gate`: tells the UI whether to ask for a password.
pub async fn gate_status_handler(Extension(state): Extension<Arc<AppState>>) -> Json<Value> {
    let required = !read_trimmed(&*state.env, PASSWORD_VAR).is_empty();
    Json(json!({ "required": required }))
}

/// Handler for `POST /gate`.
pub async fn verify_gate_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<GateRequest>,
) -> Result<Json<Value>, ApiError> {
    let expected = read_trimmed(&*state.env, PASSWORD_VAR);
    if expected.is_empty() {
        return Ok(Json(json!({ "ok": true, "required": false })));
    }

    let given = body.password.as_deref().map(str::trim).unwrap_or_default();
    if constant_time_eq(given.as_bytes(), expected.as_bytes()) {
        state.logs.push("gate", "access granted");
        Ok(Json(json!({ "ok": true, "required": true })))
    } else {
        state.logs.push_error("gate", "access denied: wrong password");
        Err(ApiError::Unauthorized("wrong password".to_string()))
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compares_whole_value() {
        assert!(constant_time_eq(b"open sesame", b"open sesame"));
        assert!(!constant_time_eq(b"open sesame", b"open sesamE"));
        assert!(!constant_time_eq(b"open", b"open sesame"));
        assert!(constant_time_eq(b"", b""));
    }
}
