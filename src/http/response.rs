//! Response values for the intake endpoint.
//!
//! # Responsibilities
//! - Represent every endpoint reply as a plain status + text body
//! - Map gate, body, and store failures to HTTP status codes
//!
//! # Design Decisions
//! - Every reply is `text/plain`
//! - Storage failures are reported generically; details go to the log

use std::time::Duration;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::http::gate::GateRejection;
use crate::store::StoreError;

/// A complete endpoint reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakeReply {
    pub status: StatusCode,
    pub body: String,
}

impl IntakeReply {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn stored() -> Self {
        Self::new(StatusCode::OK, "stored")
    }
}

impl IntoResponse for IntakeReply {
    fn into_response(self) -> Response {
        (
            self.status,
            [(header::CONTENT_TYPE, "text/plain")],
            self.body,
        )
            .into_response()
    }
}

/// Everything that can stop a submission.
#[derive(Debug, Error)]
pub enum IntakeError {
    #[error(transparent)]
    Rejected(#[from] GateRejection),

    #[error("failed to read request body: {0}")]
    Body(#[source] axum::Error),

    #[error("request body ended after {received} of {expected} bytes")]
    IncompleteBody { expected: u64, received: usize },

    #[error("request body not received within {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("store task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl IntakeError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            IntakeError::Rejected(_) => StatusCode::FORBIDDEN,
            IntakeError::Body(_) | IntakeError::IncompleteBody { .. } => StatusCode::BAD_REQUEST,
            IntakeError::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
            IntakeError::Store(_) | IntakeError::Join(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label used for metrics and logs.
    pub fn outcome(&self) -> &'static str {
        match self {
            IntakeError::Rejected(GateRejection::InvalidMethod) => "invalid_method",
            IntakeError::Rejected(GateRejection::TooBig { .. }) => "too_big",
            IntakeError::Body(_) | IntakeError::IncompleteBody { .. } => "bad_body",
            IntakeError::Timeout(_) => "timeout",
            IntakeError::Store(StoreError::MissingDateField) => "missing_date",
            IntakeError::Store(StoreError::InvalidDate) => "invalid_date",
            IntakeError::Store(_) | IntakeError::Join(_) => "storage_error",
        }
    }

    /// Text sent to the client.
    pub fn public_message(&self) -> String {
        match self {
            IntakeError::Rejected(rejection) => rejection.to_string(),
            IntakeError::Body(_) | IntakeError::IncompleteBody { .. } => {
                "invalid request body".to_string()
            }
            IntakeError::Timeout(_) => "request timeout".to_string(),
            IntakeError::Store(err) if err.is_validation() => err.to_string(),
            IntakeError::Store(_) | IntakeError::Join(_) => "storage error".to_string(),
        }
    }

    pub fn reply(&self) -> IntakeReply {
        IntakeReply::new(self.status_code(), self.public_message())
    }
}

impl IntoResponse for IntakeError {
    fn into_response(self) -> Response {
        self.reply().into_response()
    }
}
