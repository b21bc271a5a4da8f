//! Proxy error types and response handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Literal body returned for an unparsable body on an augmentable route
pub(crate) const INVALID_JSON_BODY: &str = "Invalid JSON";

/// Errors that can occur during proxying
#[derive(Debug)]
pub(crate) enum ProxyError {
    /// Inbound body could not be read
    BodyRead(String),
    /// Augmentable route carried a body that is not a JSON object
    InvalidJson,
    /// Buffered call to the inference backend failed (connect, timeout, read)
    Upstream(String),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ProxyError::BodyRead(msg) => (StatusCode::BAD_REQUEST, msg),
            ProxyError::InvalidJson => (StatusCode::BAD_REQUEST, INVALID_JSON_BODY.to_string()),
            ProxyError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
        };

        if status.is_client_error() {
            tracing::warn!("Rejected request: {} - {}", status, message);
        } else {
            tracing::error!("Proxy error: {} - {}", status, message);
        }

        (status, message).into_response()
    }
}
