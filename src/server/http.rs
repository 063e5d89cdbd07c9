//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling.

use bytes::Bytes;
use chrono_tz::Tz;
use hyper::body::Body;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::auth::{ApiKeyValidator, JwtValidator};
use crate::config::Args;
use crate::logging::FallbackMetrics;
use crate::routes::{self, not_found_response, preflight_response, FullBody};
use crate::schedule::ChainingResolver;
use crate::store::{ChainingStore, ManagementStore};
use crate::types::AssuranceError;

/// Shared application state
pub struct AppState {
    pub args: Args,
    /// Chaining, event and group administration
    pub management: Arc<dyn ManagementStore>,
    /// Outstanding-work evaluation over the read path
    pub resolver: ChainingResolver,
    pub jwt: JwtValidator,
    pub api_keys: ApiKeyValidator,
    pub metrics: Arc<FallbackMetrics>,
    pub default_tz: Tz,
    /// Store backend name reported by health endpoints
    pub backend: &'static str,
    pub started_at: Instant,
}

impl AppState {
    /// Build state around a store implementing both store traits
    pub fn new<S>(args: Args, store: Arc<S>, backend: &'static str) -> Result<Self, AssuranceError>
    where
        S: ChainingStore + ManagementStore + 'static,
    {
        Self::with_stores(args, store.clone(), store, backend)
    }

    /// Build state from separate read-path and management stores
    pub fn with_stores(
        args: Args,
        chainings: Arc<dyn ChainingStore>,
        management: Arc<dyn ManagementStore>,
        backend: &'static str,
    ) -> Result<Self, AssuranceError> {
        let jwt = args.jwt_validator()?;
        let api_keys = ApiKeyValidator::new(args.api_key.clone());
        let metrics = Arc::new(FallbackMetrics::new());

        Ok(Self {
            resolver: ChainingResolver::new(chainings, metrics.clone()),
            default_tz: args.default_tz(),
            args,
            management,
            jwt,
            api_keys,
            metrics,
            backend,
            started_at: Instant::now(),
        })
    }
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<(), AssuranceError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "Assurance listening on {} (store: {}, default timezone: {})",
        state.args.listen,
        state.backend,
        state.default_tz.name()
    );

    if state.args.dev_mode {
        warn!("Development mode enabled - dev JWT secret may be in use");
    }
    if !state.api_keys.is_configured() {
        warn!("API_KEY not set - X-API-KEY check disabled");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { Ok::<_, Infallible>(handle_request(state, addr, req).await) }
                    });

                    if let Err(err) = http1::Builder::new()
                        .preserve_header_case(true)
                        .title_case_headers(true)
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
pub async fn handle_request<B>(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<B>,
) -> Response<FullBody>
where
    B: Body<Data = Bytes>,
    B::Error: std::fmt::Display,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("[{}] {} {}", addr, method, path);

    match (method, path.as_str()) {
        (Method::GET, "/health") | (Method::GET, "/healthz") => routes::health_check(&state),

        (Method::GET, "/status") => routes::status_check(&state),

        // CORS preflight
        (Method::OPTIONS, _) => preflight_response(),

        (_, p) if p.starts_with("/api/") => handle_api_request(req, state, p).await,

        _ => not_found_response(&path),
    }
}

/// Authenticate, then dispatch by resource prefix
async fn handle_api_request<B>(req: Request<B>, state: Arc<AppState>, path: &str) -> Response<FullBody>
where
    B: Body<Data = Bytes>,
    B::Error: std::fmt::Display,
{
    let principal = match routes::authorize(&req, &state) {
        Ok(p) => p,
        Err(e) => {
            warn!(path, error = %e, "Rejected API request");
            return e.into();
        }
    };

    if path.starts_with("/api/devices/") {
        routes::handle_device_request(req, state, path, principal).await
    } else if path.starts_with("/api/chainings") {
        routes::handle_chaining_request(req, state, path, principal).await
    } else if path.starts_with("/api/events") {
        routes::handle_event_request(req, state, path, principal).await
    } else if path.starts_with("/api/groups/") {
        routes::handle_group_request(req, state, path, principal).await
    } else {
        not_found_response(path)
    }
}
