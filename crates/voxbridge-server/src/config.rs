//! Server configuration loading from file and environment variables.
//!
//! Vendor credentials never live in the file; they are read from the
//! process environment on every request.

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;
use thiserror::Error;
use voxbridge_observe::DEFAULT_LOG_CAPACITY;
use voxbridge_types::Platform;
use voxbridge_voice::{read_trimmed, EnvSource, ProcessEnv};

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub agent: AgentConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding the built front end (`index.html` and assets).
    #[serde(default = "default_client_dir")]
    pub client_dir: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "voxbridge_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,

    /// Entries kept by the diagnostic log ring served at `GET /agent`.
    #[serde(default = "default_log_capacity")]
    pub capacity: usize,
}

/// Upstream agent API settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Overrides the Agora conversational agent API base.
    #[serde(default)]
    pub agora_api_base: Option<String>,

    /// Overrides the Shengwang conversational agent API base.
    #[serde(default)]
    pub shengwang_api_base: Option<String>,

    #[serde(default = "default_upstream_timeout_secs")]
    pub upstream_timeout_secs: u64,
}

impl AgentConfig {
    pub fn api_base(&self, platform: Platform) -> Option<&str> {
        match platform {
            Platform::Agora => self.agora_api_base.as_deref(),
            Platform::Shengwang => self.shengwang_api_base.as_deref(),
        }
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs.max(1))
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    3000
}

fn default_client_dir() -> String {
    "client/dist".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_capacity() -> usize {
    DEFAULT_LOG_CAPACITY
}

fn default_upstream_timeout_secs() -> u64 {
    15
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            client_dir: default_client_dir(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            capacity: default_log_capacity(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            agora_api_base: None,
            shengwang_api_base: None,
            upstream_timeout_secs: default_upstream_timeout_secs(),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults, then
/// applies overrides from the process environment.
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    load_config_with(path, &ProcessEnv)
}

/// Like [`load_config`], reading overrides from `env`:
///
/// - `VOXBRIDGE_HOST`, `VOXBRIDGE_PORT`, `VOXBRIDGE_CLIENT_DIR`
/// - `VOXBRIDGE_LOG_LEVEL`, `VOXBRIDGE_LOG_JSON` ("true"/"1"), `VOXBRIDGE_LOG_CAPACITY`
/// - `AGORA_API_BASE`, `SHENGWANG_API_BASE`, `VOXBRIDGE_UPSTREAM_TIMEOUT_SECS`
///
/// Unparseable values are ignored.
pub fn load_config_with(path: Option<&str>, env: &dyn EnvSource) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    let var = |key: &str| Some(read_trimmed(env, key)).filter(|v| !v.is_empty());

    if let Some(parsed) = var("VOXBRIDGE_HOST").and_then(|v| v.parse().ok()) {
        config.server.host = parsed;
    }
    if let Some(parsed) = var("VOXBRIDGE_PORT").and_then(|v| v.parse().ok()) {
        config.server.port = parsed;
    }
    if let Some(dir) = var("VOXBRIDGE_CLIENT_DIR") {
        config.server.client_dir = dir;
    }
    if let Some(level) = var("VOXBRIDGE_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = var("VOXBRIDGE_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    if let Some(parsed) = var("VOXBRIDGE_LOG_CAPACITY").and_then(|v| v.parse().ok()) {
        config.logging.capacity = parsed;
    }
    if let Some(base) = var("AGORA_API_BASE") {
        config.agent.agora_api_base = Some(base);
    }
    if let Some(base) = var("SHENGWANG_API_BASE") {
        config.agent.shengwang_api_base = Some(base);
    }
    if let Some(parsed) = var("VOXBRIDGE_UPSTREAM_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
        config.agent.upstream_timeout_secs = parsed;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use voxbridge_voice::MapEnv;

    #[test]
    fn missing_file_uses_defaults() {
        let config = load_config_with(Some("/nonexistent/voxbridge.toml"), &MapEnv::new()).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.logging.capacity, DEFAULT_LOG_CAPACITY);
        assert_eq!(config.agent.upstream_timeout(), Duration::from_secs(15));
        assert_eq!(config.agent.api_base(Platform::Agora), None);
    }

    #[test]
    fn file_values_then_env_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 8080

[logging]
level = "debug"
capacity = 50

[agent]
shengwang_api_base = "https://staging.example.com/v2"
"#
        )
        .unwrap();

        let env = MapEnv::new()
            .with("VOXBRIDGE_PORT", " 9090 ")
            .with("VOXBRIDGE_LOG_JSON", "1")
            .with("VOXBRIDGE_UPSTREAM_TIMEOUT_SECS", "not-a-number");
        let config = load_config_with(file.path().to_str(), &env).unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
        assert_eq!(config.logging.capacity, 50);
        assert_eq!(config.agent.upstream_timeout_secs, 15);
        assert_eq!(
            config.agent.api_base(Platform::Shengwang),
            Some("https://staging.example.com/v2")
        );
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nport = ").unwrap();
        let err = load_config_with(file.path().to_str(), &MapEnv::new()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
