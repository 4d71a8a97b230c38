//! Voxbridge HTTP service.
//!
//! Issues RTC access tokens to the browser front end, starts and stops the
//! remote conversational agent on the caller's behalf and exposes the
//! diagnostic log ring.

pub mod api;
pub mod api_agent;
pub mod api_gate;
pub mod api_token;
pub mod config;
pub mod middleware;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Json, Router,
};
use config::Config;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use voxbridge_agent::{AgentError, AgentGateway};
use voxbridge_observe::LogBuffer;
use voxbridge_types::Platform;
use voxbridge_voice::{CredentialResolver, EnvSource, TokenService};

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub tokens: TokenService,
    pub gateway: AgentGateway,
    /// Process-wide diagnostic log ring.
    pub logs: LogBuffer,
    /// Source of credentials and vendor settings, read per request.
    pub env: Arc<dyn EnvSource>,
    pub config: Config,
}

impl AppState {
    /// Wires the services from `config`, reading credentials from `env`.
    ///
    /// # Errors
    ///
    /// Fails only if the upstream HTTP client cannot be built.
    pub fn new(config: Config, env: Arc<dyn EnvSource>) -> Result<Self, AgentError> {
        let resolver = CredentialResolver::new(env.clone());
        let mut gateway =
            AgentGateway::with_timeout(resolver.clone(), config.agent.upstream_timeout())?;
        for platform in Platform::ALL {
            if let Some(base) = config.agent.api_base(platform) {
                tracing::info!(%platform, base, "using agent API base override");
                gateway = gateway.with_api_base(platform, base);
            }
        }

        Ok(Self {
            tokens: TokenService::new(resolver),
            gateway,
            logs: LogBuffer::new(config.logging.capacity),
            env,
            config,
        })
    }
}

/// Maximum request body size (64 KiB). Every endpoint takes a small JSON body.
const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .route("/token", post(api_token::issue_token_handler))
        .route(
            "/agent",
            post(api_agent::start_agent_handler)
                .delete(api_agent::stop_agent_handler)
                .get(api_agent::get_logs_handler),
        )
        .route(
            "/gate",
            get(api_gate::gate_status_handler).post(api_gate::verify_gate_handler),
        );

    // The browser bundle is optional.
    let client_dir = std::path::PathBuf::from(&state.config.server.client_dir);
    let index = client_dir.join("index.html");
    let router = if index.is_file() {
        tracing::info!(path = %client_dir.display(), "serving client bundle");
        router.fallback_service(ServeDir::new(&client_dir).fallback(ServeFile::new(index)))
    } else {
        tracing::debug!(path = %client_dir.display(), "no client bundle, API only");
        router
    };

    router
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(axum::middleware::from_fn(middleware::request_log_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
