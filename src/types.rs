//! Shared error and result types
//!
//! All failures are terminal for the current request: there is no retry or
//! cross-worker failover anywhere in the gateway. Each variant maps to a
//! single HTTP status so route handlers can surface errors uniformly.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use thiserror::Error;

/// Result alias for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Boxed response body
///
/// `std::io::Error` rather than `hyper::Error` because tunnel responses
/// splice an upstream byte stream into the body; unsync because that
/// stream is not `Sync`.
pub type BoxBody = http_body_util::combinators::UnsyncBoxBody<Bytes, std::io::Error>;

/// Gateway error taxonomy
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Directory endpoint unreachable (transport failure)
    #[error("directory unavailable: {0}")]
    DirectoryUnavailable(#[source] reqwest::Error),

    /// Directory replied with a non-2xx status
    #[error("directory returned status {0}")]
    DirectoryStatus(StatusCode),

    /// Directory payload could not be decoded
    #[error("directory response invalid: {0}")]
    DirectoryDecode(#[source] reqwest::Error),

    /// Eligibility filter left no instance to select from
    #[error("no eligible instances in directory")]
    NoEligibleInstances,

    /// Phase-2 identity lookup found no matching instance
    #[error("instance not found")]
    InstanceNotFound,

    /// Transport failure talking to a chosen worker
    #[error("upstream request failed: {0}")]
    Upstream(#[source] reqwest::Error),

    /// Client body unreadable or not valid JSON
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl GatewayError {
    /// HTTP status this error surfaces as
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::DirectoryUnavailable(_)
            | GatewayError::DirectoryStatus(_)
            | GatewayError::DirectoryDecode(_)
            | GatewayError::NoEligibleInstances
            | GatewayError::Upstream(_) => StatusCode::BAD_GATEWAY,
            GatewayError::InstanceNotFound => StatusCode::NOT_FOUND,
            GatewayError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            GatewayError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// JSON error message for the response body
    ///
    /// The tunnel identity miss has a fixed user-visible contract; every
    /// other variant reports its display form.
    fn message(&self) -> String {
        match self {
            GatewayError::InstanceNotFound => "Instance not found".to_string(),
            other => other.to_string(),
        }
    }

    /// Build the JSON error response for this failure
    pub fn to_response(&self) -> Response<Full<Bytes>> {
        let body = serde_json::json!({ "error": self.message() });

        Response::builder()
            .status(self.status())
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(Full::new(Bytes::from(body.to_string())))
            .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            GatewayError::NoEligibleInstances.status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            GatewayError::InstanceNotFound.status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            GatewayError::InvalidBody("nope".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_instance_not_found_contract() {
        let resp = GatewayError::InstanceNotFound.to_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        // Body wording is part of the tunnel API contract
        assert_eq!(
            GatewayError::InstanceNotFound.message(),
            "Instance not found"
        );
    }
}
