//! `/agent`: start, stop and inspect the remote conversational agent.

use crate::api::{parse_platform, parse_uid, required, ApiError};
use crate::AppState;
use axum::{extract::Extension, Json};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use voxbridge_agent::{build_launch_request, validate_agent_id, LaunchOptions, LaunchTarget};

const LOG_CATEGORY: &str = "agent";

/// Request body for `POST /agent`.
///
/// Everything besides the identity fields is a [`LaunchOptions`] override.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartAgentRequest {
    #[serde(default)]
    pub channel_name: Option<String>,
    #[serde(default)]
    pub agent_uid: Option<Value>,
    #[serde(default)]
    pub user_uid: Option<Value>,
    /// The agent's access token. Issued here when absent.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(flatten)]
    pub options: LaunchOptions,
}

/// Request body for `DELETE /agent`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopAgentRequest {
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
}

/// Handler for `POST /agent`.
///
/// Responds `{agentId, status: "started", platform, providerStatus, ...}`
/// with every field of the vendor's response merged in. Vendor rejections
/// keep the vendor's status code and message.
pub async fn start_agent_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<StartAgentRequest>,
) -> Result<Json<Value>, ApiError> {
    let channel_name = required(body.channel_name.as_deref(), "channelName")?;
    let agent_uid = parse_uid(body.agent_uid.as_ref(), "agentUid")?;
    let user_uid = parse_uid(body.user_uid.as_ref(), "userUid")?;
    let platform = parse_platform(body.platform.as_deref())?;

    let token = match body.token.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        Some(token) => token.to_string(),
        None => {
            let grant = state
                .tokens
                .issue_default(&channel_name, agent_uid, platform)
                .inspect_err(|err| {
                    state
                        .logs
                        .push_error(LOG_CATEGORY, format!("agent token failed: {}", err));
                })?;
            grant.token
        }
    };

    let target = LaunchTarget {
        channel_name,
        agent_uid,
        user_uid,
        token,
        platform,
    };
    let request =
        build_launch_request(&target, &body.options, &*state.env).inspect_err(|err| {
            state
                .logs
                .push_error(LOG_CATEGORY, format!("launch request rejected: {}", err));
        })?;

    state.logs.push(
        LOG_CATEGORY,
        format!(
            "starting agent in {} on {}: {}",
            request.channel_name,
            platform,
            request.redacted()
        ),
    );

    match state.gateway.start_agent(&request).await {
        Ok(started) => {
            state.logs.push(
                LOG_CATEGORY,
                format!(
                    "agent {} started ({})",
                    started.agent_id, started.provider_status
                ),
            );
            let mut response = started.upstream;
            response.insert("agentId".into(), json!(started.agent_id));
            response.insert("status".into(), json!("started"));
            response.insert("providerStatus".into(), json!(started.provider_status));
            response.insert("platform".into(), json!(platform));
            response.insert("channelName".into(), json!(request.channel_name));
            Ok(Json(Value::Object(response)))
        }
        Err(err) => {
            state.logs.push_error(
                LOG_CATEGORY,
                format!("agent start failed ({}): {}", err.status_code(), err),
            );
            Err(err.into())
        }
    }
}

/// Handler for `DELETE /agent`.
///
/// Always `200` once `agentId` is present and well formed: a vendor failure (for example an
/// agent that already left) is reported under `upstreamError`.
pub async fn stop_agent_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<StopAgentRequest>,
) -> Result<Json<Value>, ApiError> {
    let agent_id = required(body.agent_id.as_deref(), "agentId")?;
    validate_agent_id(&agent_id)?;
    let platform = parse_platform(body.platform.as_deref())?;

    let outcome = state.gateway.stop_agent(&agent_id, platform).await;

    let mut response: Map<String, Value> = outcome.upstream;
    response.insert("status".into(), json!("stopped"));
    response.insert("agentId".into(), json!(outcome.agent_id));
    response.insert("platform".into(), json!(platform));
    match outcome.upstream_error {
        None => {
            state
                .logs
                .push(LOG_CATEGORY, format!("agent {} stopped", agent_id));
        }
        Some(err) => {
            state.logs.push_error(
                LOG_CATEGORY,
                format!("agent {} stop reported {}: {}", agent_id, err.status_code(), err),
            );
            response.insert(
                "upstreamError".into(),
                json!({
                    "status": err.status_code(),
                    "error": err.to_string(),
                    "details": err.details(),
                }),
            );
        }
    }

    Ok(Json(Value::Object(response)))
}

/// Handler for `GET /agent`: the diagnostic log ring, oldest first.
pub async fn get_logs_handler(Extension(state): Extension<Arc<AppState>>) -> Json<Value> {
    let logs = state.logs.snapshot();
    Json(json!({
        "count": logs.len(),
        "capacity": state.logs.capacity(),
        "logs": logs,
    }))
}
