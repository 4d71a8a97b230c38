use axum::{body::Body, http::Request, middleware::Next, response::Response};
use std::sync::Arc;
use std::time::Instant;

use crate::AppState;

const LOG_CATEGORY: &str = "http";

/// Appends one `http` entry per API request to the diagnostic log ring.
///
/// Static asset requests and health probes are skipped.
pub async fn request_log_middleware(req: Request<Body>, next: Next) -> Response {
    let state = req.extensions().get::<Arc<AppState>>().cloned();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let logged = matches!(path.as_str(), "/token" | "/agent" | "/gate");

    let started = Instant::now();
    let response = next.run(req).await;

    if let (Some(state), true) = (state, logged) {
        let status = response.status();
        let message = format!(
            "{} {} -> {} ({} ms)",
            method,
            path,
            status.as_u16(),
            started.elapsed().as_millis()
        );
        if status.is_server_error() {
            state.logs.push_error(LOG_CATEGORY, message);
        } else {
            state.logs.push(LOG_CATEGORY, message);
        }
    }

    response
}
