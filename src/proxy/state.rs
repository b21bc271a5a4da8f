//! Proxy state shared by every request handler
//!
//! Immutable after startup. Requests share nothing mutable, only the pooled
//! HTTP client and configuration.

use std::time::Duration;

use anyhow::{Context, Result};

use crate::config::Config;

use super::retrieval::ContextRetriever;

/// Shared state for the proxy server
#[derive(Clone)]
pub struct ProxyState {
    /// HTTP client for forwarding requests (no global timeout: streams are unbounded)
    pub(super) client: reqwest::Client,
    /// Vector-search client used for augmentation
    pub(super) retriever: ContextRetriever,
    /// Inference backend base URL
    pub(super) ollama_url: String,
    /// Timeout for buffered inference calls
    pub(super) upstream_timeout: Duration,
}

impl ProxyState {
    pub fn new(config: &Config) -> Result<Self> {
        // Build the HTTP client with connection pooling. Timeouts are set per
        // request because streamed responses must not have one.
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            retriever: ContextRetriever::new(client.clone(), config.retrieval.clone()),
            client,
            ollama_url: config.ollama_url.clone(),
            upstream_timeout: Duration::from_secs(config.upstream_timeout_secs),
        })
    }

    pub fn retriever(&self) -> &ContextRetriever {
        &self.retriever
    }

    /// Map an inbound path (without leading `/`) and query onto the backend
    pub(super) fn upstream_url(&self, path: &str, query: Option<&str>) -> String {
        match query {
            Some(query) if !query.is_empty() => {
                format!("{}/{}?{}", self.ollama_url, path, query)
            }
            _ => format!("{}/{}", self.ollama_url, path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_url_maps_path_one_to_one() {
        let state = ProxyState::new(&Config::default()).unwrap();

        assert_eq!(
            state.upstream_url("api/chat", None),
            "http://ollama:11434/api/chat"
        );
        assert_eq!(
            state.upstream_url("api/tags", Some("verbose=true")),
            "http://ollama:11434/api/tags?verbose=true"
        );
        assert_eq!(state.upstream_url("", Some("")), "http://ollama:11434/");
    }
}
