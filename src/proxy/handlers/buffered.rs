//! Buffered forwarding: one upstream call, whole body relayed at once

use axum::http::{header::CONTENT_TYPE, HeaderMap, HeaderValue, Method};

use crate::proxy::error::ProxyError;
use crate::proxy::handlers::{ForwardBody, OutboundBody, OutboundResponse, DEFAULT_CONTENT_TYPE};
use crate::proxy::state::ProxyState;

/// Forward a request and buffer the complete upstream response
///
/// Status and body are copied verbatim, including non-2xx answers. Transport
/// failures (connect, timeout, read) are returned as `ProxyError::Upstream`.
pub(super) async fn forward_buffered(
    state: &ProxyState,
    method: Method,
    url: &str,
    headers: HeaderMap,
    body: ForwardBody,
) -> Result<OutboundResponse, ProxyError> {
    let request = state
        .client
        .request(method, url)
        .timeout(state.upstream_timeout)
        .headers(headers);

    let response = body
        .attach(request)
        .send()
        .await
        .map_err(|e| ProxyError::Upstream(e.to_string()))?;

    let status = response.status();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ProxyError::Upstream(e.to_string()))?;

    tracing::debug!("Upstream answered {} ({} bytes)", status, bytes.len());

    Ok(OutboundResponse {
        status,
        content_type,
        body: OutboundBody::Buffered(bytes),
    })
}
