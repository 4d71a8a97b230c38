//! `voxbridge-server` binary.
//!
//! Usage: `voxbridge-server [CONFIG_PATH]`. Without an argument the path
//! comes from `VOXBRIDGE_CONFIG_PATH`, then `config.toml`; a missing file
//! means defaults plus environment overrides.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use voxbridge_server::config::{self, LoggingConfig};
use voxbridge_server::{app, AppState};
use voxbridge_voice::ProcessEnv;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Where the config path came from, for the startup log line.
#[derive(Debug, Clone, Copy)]
enum ConfigSource {
    Argument,
    Environment,
    Default,
}

fn config_path() -> (String, ConfigSource) {
    let non_blank = |value: &String| !value.trim().is_empty();
    if let Some(path) = std::env::args().nth(1).filter(non_blank) {
        (path, ConfigSource::Argument)
    } else if let Some(path) = std::env::var("VOXBRIDGE_CONFIG_PATH").ok().filter(non_blank) {
        (path, ConfigSource::Environment)
    } else {
        (DEFAULT_CONFIG_PATH.to_string(), ConfigSource::Default)
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_new(&logging.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

#[tokio::main]
async fn main() {
    let (path, source) = config_path();
    let config = config::load_config(Some(&path))
        .unwrap_or_else(|err| panic!("cannot start with config {}: {}", path, err));

    init_tracing(&config.logging);
    tracing::info!(%path, ?source, "configuration loaded");

    let addr = SocketAddr::new(config.server.host, config.server.port);
    let state = AppState::new(config, Arc::new(ProcessEnv))
        .expect("upstream HTTP client must build at startup");

    let listener = TcpListener::bind(addr)
        .await
        .unwrap_or_else(|err| panic!("cannot listen on {}: {}", addr, err));
    tracing::info!(%addr, "voxbridge listening");

    if let Err(err) = axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(%err, "server stopped with an error");
        std::process::exit(1);
    }
    tracing::info!("voxbridge stopped");
}

/// Resolves on SIGINT, or SIGTERM on unix.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => tracing::info!("SIGINT received, draining"),
                    _ = sigterm.recv() => tracing::info!("SIGTERM received, draining"),
                }
            }
            Err(err) => {
                tracing::warn!(%err, "SIGTERM handler unavailable, waiting for SIGINT only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("SIGINT received, draining");
    }
}
