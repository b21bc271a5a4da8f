//! Streaming forwarding: chunks relayed as they arrive
//!
//! ```text
//! upstream bytes_stream() → relay task → mpsc → ReceiverStream → caller body
//! ```
//!
//! The response head (200, application/json) goes out before upstream is
//! contacted, so failures cannot change it. Any failure while opening or
//! reading the upstream stream ends the body quietly: bytes already sent are
//! the final answer, and no error chunk is appended to a half-written stream.
//!
//! The relay task owns the upstream response. It exits, dropping the upstream
//! connection, when upstream finishes, fails, or the caller goes away.

use std::fmt::Display;

use axum::http::{HeaderMap, Method};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::proxy::handlers::{ForwardBody, OutboundResponse};
use crate::proxy::state::ProxyState;

/// Chunks buffered between the relay task and the caller's connection
const RELAY_BUFFER: usize = 32;

/// Start a streaming upstream call and return the response that drains it
///
/// No timeout: generation streams may legitimately run for a long time.
pub(super) fn forward_streaming(
    state: &ProxyState,
    method: Method,
    url: &str,
    headers: HeaderMap,
    body: ForwardBody,
) -> OutboundResponse {
    let request = body.attach(state.client.request(method, url).headers(headers));
    let (tx, rx) = mpsc::channel(RELAY_BUFFER);

    tokio::spawn(async move {
        let response = tokio::select! {
            result = request.send() => result,
            _ = tx.closed() => {
                tracing::debug!("Caller went away before upstream answered");
                return;
            }
        };

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Streaming upstream call failed, ending stream: {}", e);
                return;
            }
        };

        if !response.status().is_success() {
            tracing::debug!("Streaming upstream answered {}", response.status());
        }

        let relayed = relay_chunks(response.bytes_stream(), tx).await;
        tracing::debug!("Stream finished after {} chunk(s)", relayed);
    });

    OutboundResponse::streaming(ReceiverStream::new(rx))
}

/// Pump non-empty chunks from `upstream` into `tx` in arrival order
///
/// Stops at the end of the stream, at the first read error, or as soon as the
/// receiving side is dropped. Returns the number of chunks delivered.
pub(super) async fn relay_chunks<S, E>(upstream: S, tx: mpsc::Sender<Bytes>) -> usize
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Display,
{
    futures::pin_mut!(upstream);
    let mut relayed = 0;

    loop {
        let next = tokio::select! {
            next = upstream.next() => next,
            _ = tx.closed() => {
                tracing::debug!("Caller disconnected mid-stream, closing upstream");
                break;
            }
        };

        match next {
            Some(Ok(chunk)) => {
                if chunk.is_empty() {
                    continue;
                }
                if tx.send(chunk).await.is_err() {
                    break;
                }
                relayed += 1;
            }
            Some(Err(e)) => {
                tracing::debug!("Upstream stream ended early: {}", e);
                break;
            }
            None => break,
        }
    }

    relayed
}
