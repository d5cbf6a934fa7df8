//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the intake endpoint
//! - Wire up middleware (tracing, request ID, concurrency cap)
//! - Bind server to listener
//! - Run the gate, read the body, hand it to the store
//! - Observability (metrics, correlation IDs)
//!
//! # Design Decisions
//! - `timeouts.request_secs` bounds receiving the report. Once the body is
//!   in hand the store runs to completion, so a timed-out request never
//!   leaves a stored file behind.

use axum::{
    body::{Body, Bytes},
    extract::{ConnectInfo, State},
    http::{header, Request},
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{validate_config, ConfigError, IntakeConfig};
use crate::http::gate::RequestGate;
use crate::http::middleware::{concurrency_limit, ConcurrencyLimit};
use crate::http::request::{MakeRequestUuidV4, RequestIdExt, X_REQUEST_ID};
use crate::http::response::{IntakeError, IntakeReply};
use crate::lifecycle::shutdown;
use crate::observability::metrics;
use crate::store::{ReportStore, StoredReport};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub gate: RequestGate,
    pub store: Arc<ReportStore>,
    pub read_timeout: Duration,
}

/// HTTP server for the intake endpoint.
pub struct HttpServer {
    router: Router,
    config: IntakeConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    ///
    /// Fails if the configuration does not validate or the destination
    /// directory is unusable.
    pub fn new(config: IntakeConfig) -> Result<Self, ConfigError> {
        validate_config(&config).map_err(ConfigError::Validation)?;

        let store = ReportStore::from_config(&config.store)?;
        let state = AppState {
            gate: RequestGate::new(config.intake.max_body_size),
            store: Arc::new(store),
            read_timeout: Duration::from_secs(config.timeouts.request_secs),
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &IntakeConfig, state: AppState) -> Router {
        let limit = ConcurrencyLimit::new(config.listener.max_connections);

        Router::new()
            .route(&config.intake.path, any(submit_report))
            .with_state(state)
            .layer(from_fn_with_state(limit, concurrency_limit))
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuidV4))
                    .layer(TraceLayer::new_for_http().make_span_with(request_span))
                    .layer(PropagateRequestIdLayer::new(X_REQUEST_ID)),
            )
    }

    /// Consume the server, returning its router (for in-process testing).
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Run the server until `shutdown_rx` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            path = %self.config.intake.path,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown::wait(shutdown_rx))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &IntakeConfig {
        &self.config
    }
}

fn request_span(request: &Request<Body>) -> tracing::Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request.request_id(),
    )
}

/// Intake handler.
/// Gates the request, reads the report, and stores it.
async fn submit_report(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let start_time = Instant::now();
    let request_id = request.request_id().to_string();

    match accept_report(&state, peer, request).await {
        Ok(stored) => {
            tracing::info!(
                request_id = %request_id,
                peer = %peer,
                file = %stored.path.display(),
                collisions = stored.collisions,
                "Report stored"
            );
            metrics::record_collisions(stored.collisions);
            metrics::record_request("stored", 200, start_time);
            IntakeReply::stored().into_response()
        }
        Err(err) => {
            let reply = err.reply();
            match &err {
                IntakeError::Store(e) if !e.is_validation() => {
                    tracing::error!(request_id = %request_id, peer = %peer, error = %err, "Failed to store report");
                }
                IntakeError::Join(_) => {
                    tracing::error!(request_id = %request_id, peer = %peer, error = %err, "Store task failed");
                }
                _ => {
                    tracing::warn!(request_id = %request_id, peer = %peer, error = %err, "Report rejected");
                }
            }
            metrics::record_request(err.outcome(), reply.status.as_u16(), start_time);
            reply.into_response()
        }
    }
}

async fn accept_report(
    state: &AppState,
    peer: SocketAddr,
    request: Request<Body>,
) -> Result<StoredReport, IntakeError> {
    let (parts, body) = request.into_parts();

    // 1. Gate on the request head
    let declared = state
        .gate
        .admit(&parts.method, parts.headers.get(header::CONTENT_LENGTH))?;

    // 2. Read exactly the declared body, within the request timeout
    let report = tokio::time::timeout(state.read_timeout, read_report(body, declared))
        .await
        .map_err(|_| IntakeError::Timeout(state.read_timeout))??;

    // 3. Validate and persist off the reactor
    let store = state.store.clone();
    let address = peer.ip().to_canonical().to_string();
    let stored = tokio::task::spawn_blocking(move || store.store(&report, &address)).await??;

    Ok(stored)
}

async fn read_report(body: Body, declared: u64) -> Result<Bytes, IntakeError> {
    let limit = usize::try_from(declared).unwrap_or(usize::MAX);
    let bytes = axum::body::to_bytes(body, limit)
        .await
        .map_err(IntakeError::Body)?;

    if bytes.len() as u64 != declared {
        return Err(IntakeError::IncompleteBody {
            expected: declared,
            received: bytes.len(),
        });
    }
    Ok(bytes)
}
