//! Shared HTTP error type and request-body helpers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;
use voxbridge_agent::AgentError;
use voxbridge_types::Platform;
use voxbridge_voice::TokenError;

/// API error type mapping to HTTP status codes.
///
/// Serialised as `{"error": ..., "details": ...}`; `details` is omitted
/// when nothing was captured.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Non-2xx from the vendor, passed through with its own status and message.
    #[error("{message}")]
    Upstream {
        status: u16,
        message: String,
        details: Option<String>,
    },

    #[error("{message}")]
    Internal {
        message: String,
        details: Option<String>,
    },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (message, details) = match self {
            ApiError::BadRequest(msg) | ApiError::Unauthorized(msg) => (msg, None),
            ApiError::Upstream {
                message, details, ..
            }
            | ApiError::Internal { message, details } => (message, details),
        };

        let mut body = json!({ "error": message });
        if let Some(details) = details {
            body["details"] = Value::String(details);
        }

        (status, Json(body)).into_response()
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Validation(msg) => ApiError::BadRequest(msg),
            other => ApiError::Internal {
                message: "Failed to generate token".to_string(),
                details: Some(other.to_string()),
            },
        }
    }
}

impl From<AgentError> for ApiError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::Validation(msg) => ApiError::BadRequest(msg),
            AgentError::Configuration(msg) => ApiError::Internal {
                message: "Agent service is not configured".to_string(),
                details: Some(msg),
            },
            AgentError::Upstream {
                status,
                message,
                details,
            } => ApiError::Upstream {
                status,
                message,
                details: Some(details).filter(|d| !d.is_empty()),
            },
            AgentError::Transport { message, details } => ApiError::Internal {
                message,
                details: Some(details).filter(|d| !d.is_empty()),
            },
        }
    }
}

/// Reads a participant id sent either as a JSON number or a numeric string.
pub(crate) fn parse_uid(value: Option<&Value>, field: &str) -> Result<u32, ApiError> {
    let missing = || ApiError::BadRequest(format!("{} is required", field));
    match value {
        None | Some(Value::Null) => Err(missing()),
        Some(Value::String(s)) if s.trim().is_empty() => Err(missing()),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map_err(|_| ApiError::BadRequest(format!("{} must be a non-negative integer", field))),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| ApiError::BadRequest(format!("{} must be a non-negative integer", field))),
        Some(_) => Err(ApiError::BadRequest(format!(
            "{} must be a non-negative integer",
            field
        ))),
    }
}

/// Reads a required, non-blank string field.
pub(crate) fn required(value: Option<&str>, field: &str) -> Result<String, ApiError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::BadRequest(format!("{} is required", field)))
}

/// Parses the optional platform selector; absent means the default platform.
pub(crate) fn parse_platform(value: Option<&str>) -> Result<Platform, ApiError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(Platform::default()),
        Some(p) => p.parse().map_err(|e: voxbridge_types::ParseTypeError| {
            ApiError::BadRequest(e.to_string())
        }),
    }
}
