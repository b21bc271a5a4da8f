//! Request and response handlers for the proxy
//!
//! This module contains the main request handler (`proxy_handler`) and
//! the two forwarders: buffered (whole body relayed at once) and streaming
//! (chunks relayed as they arrive).

mod buffered;
mod request;
mod streaming;

pub use request::proxy_handler;

use std::convert::Infallible;

use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures::StreamExt;
use serde_json::Value;
use tokio_stream::wrappers::ReceiverStream;

/// Content type used when upstream omits one, and for every streamed response
pub(crate) const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Body sent upstream: exactly one of a (possibly rewritten) JSON payload or
/// the untouched inbound bytes
#[derive(Debug)]
pub(crate) enum ForwardBody {
    Json(Value),
    Raw(Bytes),
}

impl ForwardBody {
    fn attach(self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self {
            Self::Json(payload) => request.json(&payload),
            Self::Raw(bytes) => request.body(bytes),
        }
    }
}

/// Response relayed back to the caller
pub(crate) struct OutboundResponse {
    pub status: StatusCode,
    pub content_type: HeaderValue,
    pub body: OutboundBody,
}

/// Fully buffered bytes, or a lazy sequence of chunks fed by a relay task
pub(crate) enum OutboundBody {
    Buffered(Bytes),
    Streaming(ReceiverStream<Bytes>),
}

impl OutboundResponse {
    /// Streamed responses always report 200 with a JSON content type: headers
    /// are committed before the upstream call is made
    pub(crate) fn streaming(chunks: ReceiverStream<Bytes>) -> Self {
        Self {
            status: StatusCode::OK,
            content_type: HeaderValue::from_static(DEFAULT_CONTENT_TYPE),
            body: OutboundBody::Streaming(chunks),
        }
    }
}

impl IntoResponse for OutboundResponse {
    fn into_response(self) -> Response {
        let body = match self.body {
            OutboundBody::Buffered(bytes) => Body::from(bytes),
            OutboundBody::Streaming(chunks) => Body::from_stream(chunks.map(Ok::<_, Infallible>)),
        };
        (self.status, [(CONTENT_TYPE, self.content_type)], body).into_response()
    }
}
