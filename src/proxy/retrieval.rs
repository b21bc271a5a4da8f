//! Context retrieval from the vector-search service
//!
//! Retrieval is a best-effort enhancement. `retrieve()` never fails: any
//! network, status or decoding problem is logged and collapses to an empty
//! context, which callers read as "no augmentation".
//!
//! # Collaborator contract
//!
//! ```text
//! POST {RAG_URL}/search  {query, domain?, top_k} -> {domain, query, results: [{text, meta}]}
//! GET  {RAG_URL}/health                          -> {ok, domains}
//! ```

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::RetrievalConfig;

/// Label that opens every non-empty context block
pub(crate) const CONTEXT_LABEL: &str = "Retrieved context:\n";

/// Separator placed between retrieved chunks
const CHUNK_SEPARATOR: &str = "\n\n";

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    domain: Option<&'a str>,
    top_k: usize,
}

/// Body returned by `POST /search`
#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    #[allow(dead_code)]
    pub domain: Option<String>,
    #[serde(default)]
    #[allow(dead_code)]
    pub query: Option<String>,
    #[serde(default)]
    pub results: Vec<SearchHit>,
}

/// One similarity-search hit
#[derive(Debug, Deserialize)]
pub(crate) struct SearchHit {
    #[serde(default)]
    pub text: Option<String>,
    /// Source metadata; carried by the service but not used for augmentation
    #[serde(default)]
    #[allow(dead_code)]
    pub meta: Option<serde_json::Value>,
}

/// Body returned by `GET /health`
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct HealthStatus {
    pub ok: bool,
    #[serde(default)]
    pub domains: Vec<String>,
}

// ============================================================================
// Errors
// ============================================================================

/// Errors talking to the retrieval service
///
/// Never crosses `retrieve()`; only `health()` hands it to callers.
#[derive(Debug)]
pub enum RetrievalError {
    /// Connection failure, timeout, or body read error
    Network(String),
    /// Non-2xx answer (unknown domain comes back as 404)
    Status { status: u16, message: String },
    /// Body was not the expected JSON shape
    Decode(String),
}

impl fmt::Display for RetrievalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "Network error: {}", msg),
            Self::Status { status, message } => {
                write!(f, "Retrieval service returned {}: {}", status, message)
            }
            Self::Decode(msg) => write!(f, "Malformed retrieval response: {}", msg),
        }
    }
}

impl std::error::Error for RetrievalError {}

// ============================================================================
// Context Retriever
// ============================================================================

/// Client for the vector-search service
#[derive(Debug, Clone)]
pub struct ContextRetriever {
    client: reqwest::Client,
    config: RetrievalConfig,
}

impl ContextRetriever {
    pub fn new(client: reqwest::Client, config: RetrievalConfig) -> Self {
        Self { client, config }
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }

    /// Fetch a formatted context block for `query`
    ///
    /// Returns an empty string for a blank query (no network call) and for
    /// any failure.
    pub async fn retrieve(&self, query: &str) -> String {
        let query = query.trim();
        if query.is_empty() {
            return String::new();
        }

        match self.search(query).await {
            Ok(chunks) => {
                tracing::debug!("Retrieved {} context chunk(s)", chunks.len());
                format_context(&chunks)
            }
            Err(e) => {
                tracing::warn!("Retrieval failed, continuing without context: {}", e);
                String::new()
            }
        }
    }

    /// Call `/search` and return the kept chunks, capped at `top_k`
    async fn search(&self, query: &str) -> Result<Vec<String>, RetrievalError> {
        let url = format!("{}/search", self.config.url);
        let request = SearchRequest {
            query,
            domain: self.config.domain.as_deref(),
            top_k: self.config.top_k,
        };

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout())
            .json(&request)
            .send()
            .await
            .map_err(|e| RetrievalError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| RetrievalError::Network(e.to_string()))?;
        let parsed: SearchResponse =
            serde_json::from_slice(&body).map_err(|e| RetrievalError::Decode(e.to_string()))?;

        // The service is asked for top_k already; cap again in case it ignores that
        Ok(collect_chunks(parsed.results, self.config.top_k))
    }

    /// Call `/health` on the retrieval service
    pub async fn health(&self) -> Result<HealthStatus, RetrievalError> {
        let url = format!("{}/health", self.config.url);
        let response = self
            .client
            .get(&url)
            .timeout(self.timeout())
            .send()
            .await
            .map_err(|e| RetrievalError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<HealthStatus>()
            .await
            .map_err(|e| RetrievalError::Decode(e.to_string()))
    }
}

// ============================================================================
// Formatting
// ============================================================================

/// Keep trimmed, non-empty hit texts in arrival order, at most `top_k` of them
pub(crate) fn collect_chunks(hits: Vec<SearchHit>, top_k: usize) -> Vec<String> {
    hits.into_iter()
        .filter_map(|hit| hit.text)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .take(top_k)
        .collect()
}

/// Join chunks into a labelled context block (empty when there are none)
pub(crate) fn format_context(chunks: &[String]) -> String {
    if chunks.is_empty() {
        return String::new();
    }
    format!("{}{}", CONTEXT_LABEL, chunks.join(CHUNK_SEPARATOR))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::test_support::{spawn_server, unused_addr};
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn hit(text: Option<&str>) -> SearchHit {
        SearchHit {
            text: text.map(String::from),
            meta: None,
        }
    }

    fn retriever_for(url: String, top_k: usize) -> ContextRetriever {
        ContextRetriever::new(
            reqwest::Client::new(),
            RetrievalConfig {
                url,
                top_k,
                domain: None,
                timeout_secs: 5,
            },
        )
    }

    // ========================================================================
    // Formatting
    // ========================================================================

    #[test]
    fn test_format_joins_with_blank_lines() {
        let context = format_context(&["A".to_string(), "B".to_string()]);
        assert_eq!(context, "Retrieved context:\nA\n\nB");
    }

    #[test]
    fn test_format_empty_is_empty() {
        assert_eq!(format_context(&[]), "");
    }

    #[test]
    fn test_collect_skips_blank_and_missing_text() {
        let hits = vec![
            hit(Some("  first  ")),
            hit(None),
            hit(Some("   ")),
            hit(Some("second")),
        ];
        assert_eq!(collect_chunks(hits, 5), vec!["first", "second"]);
    }

    #[test]
    fn test_collect_caps_at_top_k_after_filtering() {
        let hits = vec![hit(Some("")), hit(Some("a")), hit(Some("b")), hit(Some("c"))];
        assert_eq!(collect_chunks(hits, 2), vec!["a", "b"]);
    }

    #[test]
    fn test_search_response_tolerates_missing_results() {
        let parsed: SearchResponse = serde_json::from_str(r#"{"domain":"default"}"#).unwrap();
        assert!(parsed.results.is_empty());
    }

    // ========================================================================
    // Network behaviour
    // ========================================================================

    #[tokio::test]
    async fn test_blank_query_makes_no_call() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let app = Router::new().route(
            "/search",
            post(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Json(json!({"results": [{"text": "never"}]}))
                }
            }),
        );
        let addr = spawn_server(app).await;
        let retriever = retriever_for(format!("http://{}", addr), 5);

        assert_eq!(retriever.retrieve("").await, "");
        assert_eq!(retriever.retrieve("  \n\t ").await, "");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_connection_error_yields_empty_context() {
        let addr = unused_addr().await;
        let retriever = retriever_for(format!("http://{}", addr), 5);

        assert_eq!(retriever.retrieve("what is rust").await, "");
    }

    #[tokio::test]
    async fn test_successful_search_is_formatted() {
        let seen = Arc::new(std::sync::Mutex::new(None::<Value>));
        let sink = seen.clone();
        let app = Router::new().route(
            "/search",
            post(move |Json(body): Json<Value>| {
                let sink = sink.clone();
                async move {
                    *sink.lock().unwrap() = Some(body);
                    Json(json!({
                        "domain": "default",
                        "query": "q",
                        "results": [
                            {"text": "A", "meta": {"source": "a.md"}},
                            {"text": "B", "meta": {}},
                            {"text": "C", "meta": {}}
                        ]
                    }))
                }
            }),
        );
        let addr = spawn_server(app).await;
        let retriever = retriever_for(format!("http://{}", addr), 2);

        let context = retriever.retrieve("  q  ").await;

        assert_eq!(context, "Retrieved context:\nA\n\nB");
        let body = seen.lock().unwrap().clone().expect("search was called");
        assert_eq!(body, json!({"query": "q", "top_k": 2}));
    }

    #[tokio::test]
    async fn test_unknown_domain_yields_empty_context() {
        let app = Router::new().route(
            "/search",
            post(|| async { (StatusCode::NOT_FOUND, "domain 'x' not found") }),
        );
        let addr = spawn_server(app).await;
        let retriever = retriever_for(format!("http://{}", addr), 5);

        assert_eq!(retriever.retrieve("q").await, "");
    }

    #[tokio::test]
    async fn test_malformed_body_yields_empty_context() {
        let app = Router::new().route("/search", post(|| async { "not json at all" }));
        let addr = spawn_server(app).await;
        let retriever = retriever_for(format!("http://{}", addr), 5);

        assert_eq!(retriever.retrieve("q").await, "");
    }

    #[tokio::test]
    async fn test_health_reports_domains() {
        let app = Router::new().route(
            "/health",
            axum::routing::get(|| async { Json(json!({"ok": true, "domains": ["default", "hr"]})) }),
        );
        let addr = spawn_server(app).await;
        let retriever = retriever_for(format!("http://{}", addr), 5);

        let health = retriever.health().await.expect("health should succeed");
        assert!(health.ok);
        assert_eq!(health.domains, vec!["default", "hr"]);
    }
}
