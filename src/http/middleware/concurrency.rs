//! In-flight request cap.
//!
//! Enforces `listener.max_connections` with a semaphore. When the limit is
//! reached, new requests wait for a slot instead of being refused.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Shared pool of request slots.
#[derive(Debug, Clone)]
pub struct ConcurrencyLimit {
    slots: Arc<Semaphore>,
    max: usize,
}

impl ConcurrencyLimit {
    pub fn new(max: usize) -> Self {
        Self {
            slots: Arc::new(Semaphore::new(max)),
            max,
        }
    }

    /// Get current available request slots.
    pub fn available(&self) -> usize {
        self.slots.available_permits()
    }

    /// Get configured maximum concurrent requests.
    pub fn max(&self) -> usize {
        self.max
    }
}

/// Hold a slot for the duration of the inner handler.
pub async fn concurrency_limit(
    State(limit): State<ConcurrencyLimit>,
    request: Request<Body>,
    next: Next,
) -> Response {
    // The permit is released on drop, even if the handler panics.
    let _permit = match limit.slots.clone().acquire_owned().await {
        Ok(permit) => permit,
        Err(_) => {
            return (StatusCode::SERVICE_UNAVAILABLE, "Server is shutting down").into_response();
        }
    };

    tracing::trace!(available = limit.available(), "Request slot acquired");

    next.run(request).await
}
