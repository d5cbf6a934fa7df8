//! Request gate.
//!
//! # Responsibilities
//! - Reject anything but POST
//! - Require a declared `Content-Length` no larger than the configured ceiling
//!
//! # Design Decisions
//! - Runs on the request head only; the body is not touched until admitted
//! - Rejections echo the declared length verbatim for diagnostics

use axum::http::{HeaderValue, Method};
use thiserror::Error;

/// Why the gate refused a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateRejection {
    #[error("Invalid request")]
    InvalidMethod,

    /// Length absent, unparsable, or over the ceiling.
    #[error("report too big{}", declared_suffix(.declared))]
    TooBig { declared: Option<String> },
}

fn declared_suffix(declared: &Option<String>) -> String {
    match declared {
        Some(length) => format!(" {length}"),
        None => String::new(),
    }
}

/// Transport-level admission policy for report submissions.
#[derive(Debug, Clone, Copy)]
pub struct RequestGate {
    max_body_size: u64,
}

impl RequestGate {
    pub fn new(max_body_size: u64) -> Self {
        Self { max_body_size }
    }

    pub fn max_body_size(&self) -> u64 {
        self.max_body_size
    }

    /// Admit a request head, returning the number of body bytes to read.
    pub fn admit(
        &self,
        method: &Method,
        content_length: Option<&HeaderValue>,
    ) -> Result<u64, GateRejection> {
        if method != Method::POST {
            return Err(GateRejection::InvalidMethod);
        }

        let Some(raw) = content_length else {
            return Err(GateRejection::TooBig { declared: None });
        };
        let declared = String::from_utf8_lossy(raw.as_bytes()).into_owned();

        match declared.trim().parse::<u64>() {
            Ok(length) if length <= self.max_body_size => Ok(length),
            _ => Err(GateRejection::TooBig {
                declared: Some(declared),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT: u64 = 524_288;

    fn admit(method: Method, length: Option<&'static str>) -> Result<u64, GateRejection> {
        let header = length.map(HeaderValue::from_static);
        RequestGate::new(LIMIT).admit(&method, header.as_ref())
    }

    #[test]
    fn non_post_is_invalid_regardless_of_length() {
        for method in [Method::GET, Method::PUT, Method::HEAD, Method::DELETE] {
            assert_eq!(admit(method, Some("10")), Err(GateRejection::InvalidMethod));
        }
        assert_eq!(
            GateRejection::InvalidMethod.to_string(),
            "Invalid request"
        );
    }

    #[test]
    fn ceiling_is_inclusive() {
        assert_eq!(admit(Method::POST, Some("524288")), Ok(LIMIT));
        assert_eq!(admit(Method::POST, Some("0")), Ok(0));

        let err = admit(Method::POST, Some("524289")).unwrap_err();
        assert_eq!(err.to_string(), "report too big 524289");
    }

    #[test]
    fn missing_length_is_rejected() {
        let err = admit(Method::POST, None).unwrap_err();
        assert_eq!(err, GateRejection::TooBig { declared: None });
        assert_eq!(err.to_string(), "report too big");
    }

    #[test]
    fn garbage_length_is_echoed() {
        let err = admit(Method::POST, Some("lots")).unwrap_err();
        assert_eq!(err.to_string(), "report too big lots");
    }
}
