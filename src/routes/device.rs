//! Device-facing outstanding work endpoint
//!
//! `GET /api/devices/{deviceID}/chainingnew` lists the chainings the calling
//! user still has to work through on that device, evaluated in the timezone
//! sent in `X-Timezone`.

use hyper::{Method, Request, Response, StatusCode};
use std::sync::Arc;
use tracing::debug;

use crate::auth::Principal;
use crate::logging::FallbackKind;
use crate::routes::response::{error_response, not_found_response, path_param, success, FullBody};
use crate::schedule::{resolve_timezone, Outcome, TIMEZONE_HEADER};
use crate::server::AppState;
use crate::types::AssuranceError;

pub async fn handle_device_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    path: &str,
    principal: Principal,
) -> Response<FullBody> {
    // Non-UTF-8 bytes are replaced, so the name fails parsing and counts as a fallback
    let raw_tz = req
        .headers()
        .get(TIMEZONE_HEADER)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());

    let method = req.method().clone();

    match (&method, path_param(path, "/api/devices/", "/chainingnew")) {
        (&Method::GET, Some(device_id)) => {
            outstanding_chainings(&state, &device_id, &principal, raw_tz.as_deref())
                .await
                .unwrap_or_else(Into::into)
        }
        _ => not_found_response(path),
    }
}

async fn outstanding_chainings(
    state: &AppState,
    device_id: &str,
    principal: &Principal,
    raw_tz: Option<&str>,
) -> Result<Response<FullBody>, AssuranceError> {
    if principal.username.trim().is_empty() {
        return Err(AssuranceError::BadRequest(
            "user parameter is required".to_string(),
        ));
    }

    let resolved = resolve_timezone(raw_tz, state.default_tz);
    if resolved.fell_back {
        state
            .metrics
            .record(FallbackKind::Timezone, raw_tz.unwrap_or_default());
    }

    let outcome = state
        .resolver
        .resolve_outstanding(device_id, &principal.username, resolved.tz)
        .await?;

    match outcome {
        Outcome::Outstanding(chainings) => {
            debug!(device = device_id, count = chainings.len(), "Outstanding chainings");
            Ok(success("Active chaining fetched successfully", chainings))
        }
        Outcome::NoneOutstanding => Ok(error_response(
            StatusCode::NOT_FOUND,
            "No active chaining for this user",
        )),
    }
}
