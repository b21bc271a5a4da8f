//! Main proxy handler - classifies, augments and forwards every request

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::proxy::augmentation::augment;
use crate::proxy::error::ProxyError;
use crate::proxy::handlers::buffered::forward_buffered;
use crate::proxy::handlers::streaming::forward_streaming;
use crate::proxy::handlers::ForwardBody;
use crate::proxy::headers::sanitize_headers;
use crate::proxy::route::AugmentableRoute;
use crate::proxy::state::ProxyState;

/// Main proxy handler - intercepts and forwards all requests
///
/// ```text
/// Opaque route            → buffered pass-through of the raw body
/// Chat / Generate route   → parse JSON → augment → buffered or streaming
/// ```
#[tracing::instrument(
    name = "proxy",
    skip_all,
    fields(method = %req.method(), path = %req.uri().path())
)]
pub async fn proxy_handler(
    State(state): State<ProxyState>,
    req: Request<Body>,
) -> Result<Response, ProxyError> {
    let (parts, body) = req.into_parts();
    let method = parts.method;
    // Only the route root is stripped: `//api/generate` stays its own path
    let path = parts.uri.path();
    let path = path.strip_prefix('/').unwrap_or(path);

    let url = state.upstream_url(path, parts.uri.query());
    let headers = sanitize_headers(&parts.headers);
    let route = AugmentableRoute::from_request(&method, path, &parts.headers);

    let body_bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .map_err(|e| ProxyError::BodyRead(e.to_string()))?;

    tracing::debug!("Proxying {} request ({} bytes)", route.as_str(), body_bytes.len());

    if !route.is_augmentable() {
        let response =
            forward_buffered(&state, method, &url, headers, ForwardBody::Raw(body_bytes)).await?;
        return Ok(response.into_response());
    }

    // Augmentable routes need a JSON object; anything else never goes upstream
    let mut payload = match serde_json::from_slice::<Value>(&body_bytes) {
        Ok(payload @ Value::Object(_)) => payload,
        Ok(_) | Err(_) => return Err(ProxyError::InvalidJson),
    };

    let is_stream = payload.get("stream").is_some_and(is_truthy);

    augment(route, &mut payload, state.retriever()).await;

    let response = if is_stream {
        forward_streaming(&state, method, &url, headers, ForwardBody::Json(payload))
    } else {
        forward_buffered(&state, method, &url, headers, ForwardBody::Json(payload)).await?
    };

    Ok(response.into_response())
}

/// Loose truthiness for the `stream` flag: `1` or `"yes"` stream too
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
