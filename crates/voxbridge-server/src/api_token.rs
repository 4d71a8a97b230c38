//! `POST /token`: access grants for the browser caller.

use crate::api::{parse_platform, parse_uid, required, ApiError};
use crate::AppState;
use axum::{extract::Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use voxbridge_types::{AccessGrant, Platform};
use voxbridge_voice::preview;

/// Request body for `POST /token`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest {
    #[serde(default)]
    pub channel_name: Option<String>,
    /// Number or numeric string.
    #[serde(default)]
    pub uid: Option<Value>,
    #[serde(default)]
    pub platform: Option<String>,
}

/// Response body for `POST /token`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub token: String,
    pub app_id: String,
    pub channel_name: String,
    pub uid: u32,
    pub platform: Platform,
    /// RFC 3339; grants are not renewed.
    pub expires_at: String,
}

impl From<AccessGrant> for TokenResponse {
    fn from(grant: AccessGrant) -> Self {
        Self {
            expires_at: grant.expires_at.to_rfc3339(),
            token: grant.token,
            app_id: grant.app_id,
            channel_name: grant.channel_name,
            uid: grant.participant_id,
            platform: grant.platform,
        }
    }
}

/// Handler for `POST /token`.
///
/// `400` when `channelName` or `uid` is missing, `500` with details when the
/// platform's credentials are unset or signing fails.
pub async fn issue_token_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<TokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let channel_name = required(body.channel_name.as_deref(), "channelName")?;
    let uid = parse_uid(body.uid.as_ref(), "uid")?;
    let platform = parse_platform(body.platform.as_deref())?;

    match state.tokens.issue_default(&channel_name, uid, platform) {
        Ok(grant) => {
            state.logs.push(
                "token",
                format!(
                    "issued {} token for uid {} in {} ({} chars)",
                    platform,
                    uid,
                    channel_name,
                    grant.token.len()
                ),
            );
            Ok(Json(grant.into()))
        }
        Err(err) => {
            let creds = state.tokens.resolver().resolve(platform);
            state.logs.push_error(
                "token",
                format!(
                    "token for uid {} in {} failed: {} (app id {}, certificate {})",
                    uid,
                    channel_name,
                    err,
                    preview(&creds.app_id),
                    preview(&creds.app_certificate)
                ),
            );
            Err(err.into())
        }
    }
}
