//! HTTP client for the vendor's conversational agent API.
//!
//! Every call is a single authenticated request: no retries and no
//! connection state beyond what `reqwest` pools internally. Callers decide
//! whether to try again.

use crate::error::AgentError;
use crate::launch::LaunchRequest;
use crate::profile::PlatformProfile;
use base64::Engine;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, warn};
use voxbridge_types::Platform;
use voxbridge_voice::{preview, CredentialResolver, Credentials};

/// Default upper bound for one upstream round trip.
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(15);

/// Result of a successful `join`.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentStarted {
    pub agent_id: String,
    /// Status string reported by the vendor (for example `RUNNING`).
    pub provider_status: String,
    /// Every field of the vendor's response body.
    pub upstream: Map<String, Value>,
}

/// Result of a `leave` call. Stopping never fails; problems are reported.
#[derive(Debug, Clone, PartialEq)]
pub struct StopOutcome {
    pub agent_id: String,
    pub upstream: Map<String, Value>,
    pub upstream_error: Option<AgentError>,
}

/// Checks an agent id before it becomes a URL path segment.
///
/// Vendor ids are opaque tokens of ASCII letters, digits, `-` and `_`;
/// anything else is rejected without contacting the vendor.
pub fn validate_agent_id(agent_id: &str) -> Result<&str, AgentError> {
    let agent_id = agent_id.trim();
    if agent_id.is_empty() {
        return Err(AgentError::Validation("agentId is required".to_string()));
    }
    if !agent_id
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    {
        return Err(AgentError::Validation(
            "agentId may only contain letters, digits, '-' and '_'".to_string(),
        ));
    }
    Ok(agent_id)
}

impl StopOutcome {
    pub fn is_clean(&self) -> bool {
        self.upstream_error.is_none()
    }
}

/// Client for starting and stopping remote agents.
#[derive(Debug, Clone)]
pub struct AgentGateway {
    http: reqwest::Client,
    resolver: CredentialResolver,
    api_bases: HashMap<Platform, String>,
}

impl AgentGateway {
    pub fn new(resolver: CredentialResolver) -> Result<Self, AgentError> {
        Self::with_timeout(resolver, DEFAULT_UPSTREAM_TIMEOUT)
    }

    pub fn with_timeout(resolver: CredentialResolver, timeout: Duration) -> Result<Self, AgentError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AgentError::Configuration(format!("failed to build http client: {}", e)))?;
        Ok(Self {
            http,
            resolver,
            api_bases: HashMap::new(),
        })
    }

    /// Points `platform` at a different API base (staging, tests).
    pub fn with_api_base(mut self, platform: Platform, base: impl Into<String>) -> Self {
        let base = base.into();
        self.api_bases
            .insert(platform, base.trim_end_matches('/').to_string());
        self
    }

    pub fn resolver(&self) -> &CredentialResolver {
        &self.resolver
    }

    pub fn api_base(&self, platform: Platform) -> &str {
        self.api_bases
            .get(&platform)
            .map(String::as_str)
            .unwrap_or(PlatformProfile::for_platform(platform).api_base)
    }

    fn credentials(&self, platform: Platform) -> Result<Credentials, AgentError> {
        let creds = self.resolver.resolve(platform);
        if !creds.has_api_auth() {
            return Err(AgentError::Configuration(format!(
                "{prefix}_APP_ID, {prefix}_CUSTOMER_ID and {prefix}_CUSTOMER_SECRET must be set",
                prefix = platform.env_prefix()
            )));
        }
        Ok(creds)
    }

    /// Starts the remote agent described by `request`.
    ///
    /// # Errors
    ///
    /// `Configuration` when API credentials are unset (no request is sent),
    /// `Upstream` for a non-2xx answer, `Transport` when the request fails or
    /// the body is not the expected JSON.
    pub async fn start_agent(&self, request: &LaunchRequest) -> Result<AgentStarted, AgentError> {
        let creds = self.credentials(request.platform)?;
        let url = self.endpoint(request.platform, &["projects", &creds.app_id, "join"])?;

        info!(
            platform = %request.platform,
            channel = %request.channel_name,
            agent_uid = request.agent_uid,
            customer_id = %preview(&creds.client_id),
            "starting remote agent"
        );

        let body = self.post(url, &creds, Some(&request.payload)).await?;

        let agent_id = body
            .get("agent_id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AgentError::Transport {
                message: "agent start response carried no agent_id".to_string(),
                details: Value::Object(body.clone()).to_string(),
            })?
            .to_string();
        let provider_status = body
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        info!(%agent_id, %provider_status, "remote agent started");
        Ok(AgentStarted {
            agent_id,
            provider_status,
            upstream: body,
        })
    }

    /// Asks the vendor to remove `agent_id` from its channel.
    ///
    /// Safe to call for agents that already stopped: the vendor's error is
    /// attached to the outcome instead of being returned.
    pub async fn stop_agent(&self, agent_id: &str, platform: Platform) -> StopOutcome {
        let agent_id = agent_id.trim();
        let result = self.leave(agent_id, platform).await;

        match result {
            Ok(upstream) => {
                info!(%agent_id, %platform, "remote agent stopped");
                StopOutcome {
                    agent_id: agent_id.to_string(),
                    upstream,
                    upstream_error: None,
                }
            }
            Err(err) => {
                warn!(%agent_id, %platform, status = err.status_code(), "agent stop reported an error: {}", err);
                StopOutcome {
                    agent_id: agent_id.to_string(),
                    upstream: Map::new(),
                    upstream_error: Some(err),
                }
            }
        }
    }

    async fn leave(&self, agent_id: &str, platform: Platform) -> Result<Map<String, Value>, AgentError> {
        let agent_id = validate_agent_id(agent_id)?;
        let creds = self.credentials(platform)?;
        let url = self.endpoint(
            platform,
            &["projects", &creds.app_id, "agents", agent_id, "leave"],
        )?;
        self.post::<()>(url, &creds, None).await
    }

    /// Appends percent-encoded `segments` to the platform's API base.
    fn endpoint(&self, platform: Platform, segments: &[&str]) -> Result<reqwest::Url, AgentError> {
        let base = self.api_base(platform);
        let mut url = reqwest::Url::parse(base).map_err(|e| {
            AgentError::Configuration(format!("invalid agent API base {}: {}", base, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| AgentError::Configuration(format!("agent API base {} cannot carry a path", base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn post<T: serde::Serialize + ?Sized>(
        &self,
        url: reqwest::Url,
        creds: &Credentials,
        body: Option<&T>,
    ) -> Result<Map<String, Value>, AgentError> {
        let mut req = self
            .http
            .post(url)
            .header(reqwest::header::AUTHORIZATION, basic_auth(creds));
        req = match body {
            Some(body) => req.json(body),
            None => req.header(reqwest::header::CONTENT_TYPE, "application/json"),
        };

        let response = req.send().await.map_err(|e| AgentError::Transport {
            message: format!("agent API request failed: {}", e),
            details: String::new(),
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| AgentError::Transport {
            message: format!("failed to read agent API response: {}", e),
            details: String::new(),
        })?;

        if !status.is_success() {
            return Err(upstream_error(status.as_u16(), text));
        }

        if text.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => Ok(map),
            _ => Err(AgentError::Transport {
                message: "agent API returned a malformed response".to_string(),
                details: text,
            }),
        }
    }
}

fn basic_auth(creds: &Credentials) -> String {
    let raw = format!("{}:{}", creds.client_id, creds.client_secret);
    format!(
        "Basic {}",
        base64::engine::general_purpose::STANDARD.encode(raw)
    )
}

/// Extracts the vendor's own message from an error body.
fn upstream_error(status: u16, text: String) -> AgentError {
    let message = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|v| {
            ["message", "detail", "reason", "error"]
                .iter()
                .find_map(|k| v.get(*k).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| format!("agent API returned status {}", status));
    AgentError::Upstream {
        status,
        message,
        details: text,
    }
}
