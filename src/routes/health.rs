//! Health and status endpoints
//!
//! - /health, /healthz - liveness probe
//! - /status - runtime info including fallback counters

use hyper::{Response, StatusCode};
use serde::Serialize;

use crate::logging::FallbackSnapshot;
use crate::routes::response::{json_response, FullBody};
use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub status: &'static str,
    pub version: &'static str,
    /// Uptime in seconds
    pub uptime: u64,
    pub timestamp: String,
    pub mode: &'static str,
    /// Store backend in use ("mongodb" or "memory")
    pub store: &'static str,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub version: &'static str,
    pub uptime: u64,
    pub timestamp: String,
    pub mode: &'static str,
    pub store: &'static str,
    pub default_timezone: String,
    pub api_key_required: bool,
    pub fallbacks: FallbackSnapshot,
}

fn mode(state: &AppState) -> &'static str {
    if state.args.dev_mode {
        "development"
    } else {
        "production"
    }
}

pub fn health_check(state: &AppState) -> Response<FullBody> {
    json_response(
        StatusCode::OK,
        &HealthResponse {
            healthy: true,
            status: "online",
            version: env!("CARGO_PKG_VERSION"),
            uptime: state.started_at.elapsed().as_secs(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            mode: mode(state),
            store: state.backend,
        },
    )
}

pub fn status_check(state: &AppState) -> Response<FullBody> {
    json_response(
        StatusCode::OK,
        &StatusResponse {
            version: env!("CARGO_PKG_VERSION"),
            uptime: state.started_at.elapsed().as_secs(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            mode: mode(state),
            store: state.backend,
            default_timezone: state.default_tz.name().to_string(),
            api_key_required: state.api_keys.is_configured(),
            fallbacks: state.metrics.snapshot(),
        },
    )
}
