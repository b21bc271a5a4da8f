//! Request augmentation with retrieved context
//!
//! ```text
//! payload → extract_query(route) → ContextRetriever → apply_context(route) → payload'
//! ```
//!
//! - **Chat**: the last `user` message is the query; a `system` message holding
//!   the context is prepended. Existing messages are never replaced or reordered.
//! - **Generate**: `prompt` is the query; the context is prepended to it.
//! - **Opaque**: untouched, no retrieval.
//!
//! An empty context leaves the payload exactly as it was.

use serde_json::{json, Value};

use super::retrieval::ContextRetriever;
use super::route::AugmentableRoute;

/// Outcome of augmenting one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AugmentResult {
    /// Payload untouched
    Unchanged,
    /// Context injected into the payload
    Augmented {
        /// Size of the injected context block in bytes
        context_bytes: usize,
    },
}

/// Retrieve context for the payload and inject it according to `route`
pub async fn augment(
    route: AugmentableRoute,
    payload: &mut Value,
    retriever: &ContextRetriever,
) -> AugmentResult {
    if !route.is_augmentable() {
        return AugmentResult::Unchanged;
    }

    // A missing query still goes through retrieve(), which short-circuits to ""
    let query = extract_query(route, payload);
    let context = retriever.retrieve(&query).await;

    let result = apply_context(route, payload, &context);
    match result {
        AugmentResult::Augmented { context_bytes } => {
            tracing::info!(
                route = route.as_str(),
                "Augmented request with {} bytes of retrieved context",
                context_bytes
            );
        }
        AugmentResult::Unchanged => {
            tracing::debug!(route = route.as_str(), "No context retrieved, request unchanged");
        }
    }
    result
}

/// Extract the retrieval query for a route (empty when there is none)
pub(crate) fn extract_query(route: AugmentableRoute, payload: &Value) -> String {
    match route {
        AugmentableRoute::Chat => last_user_content(payload).unwrap_or_default(),
        AugmentableRoute::Generate => payload
            .get("prompt")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        AugmentableRoute::Opaque => String::new(),
    }
}

/// Content of the most recent `user` message, if it is a string
fn last_user_content(payload: &Value) -> Option<String> {
    let messages = payload.get("messages")?.as_array()?;

    let last_user = messages
        .iter()
        .rev()
        .find(|msg| msg.get("role").and_then(Value::as_str) == Some("user"))?;

    last_user
        .get("content")
        .and_then(Value::as_str)
        .map(String::from)
}

/// Inject `context` into the payload; a no-op when `context` is empty
pub(crate) fn apply_context(
    route: AugmentableRoute,
    payload: &mut Value,
    context: &str,
) -> AugmentResult {
    if context.is_empty() {
        return AugmentResult::Unchanged;
    }
    let Some(body) = payload.as_object_mut() else {
        return AugmentResult::Unchanged;
    };

    match route {
        AugmentableRoute::Chat => {
            let system = json!({"role": "system", "content": context});
            match body.get_mut("messages") {
                Some(Value::Array(messages)) => messages.insert(0, system),
                Some(Value::Null) | None => {
                    body.insert("messages".to_string(), Value::Array(vec![system]));
                }
                Some(_) => return AugmentResult::Unchanged,
            }
        }
        AugmentableRoute::Generate => {
            let prompt = body
                .get("prompt")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let augmented = format!("{}\n\n{}", context, prompt);
            body.insert("prompt".to_string(), Value::String(augmented));
        }
        AugmentableRoute::Opaque => return AugmentResult::Unchanged,
    }

    AugmentResult::Augmented {
        context_bytes: context.len(),
    }
}
