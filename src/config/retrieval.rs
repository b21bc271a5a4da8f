//! Retrieval (vector-search collaborator) configuration

use anyhow::{bail, Context, Result};
use serde::Deserialize;

const DEFAULT_RAG_URL: &str = "http://rag:8000";
const DEFAULT_TOP_K: usize = 5;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Settings for the `/search` collaborator
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Base URL of the retrieval service (no trailing slash)
    pub url: String,
    /// Number of chunks asked for, and the cap applied to what comes back
    pub top_k: usize,
    /// Index domain to search; `None` lets the service pick its default
    pub domain: Option<String>,
    /// Per-call timeout in seconds
    pub timeout_secs: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_RAG_URL.to_string(),
            top_k: DEFAULT_TOP_K,
            domain: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Retrieval settings as loaded from config file
#[derive(Debug, Deserialize, Default)]
pub struct FileRetrieval {
    pub url: Option<String>,
    pub top_k: Option<usize>,
    pub domain: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl RetrievalConfig {
    /// Merge env vars (`RAG_URL`, `RAG_TOP_K`, `RAG_DOMAIN`) over the file section
    pub(super) fn resolve(
        file: Option<FileRetrieval>,
        env: &impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let file = file.unwrap_or_default();
        let defaults = Self::default();

        let url = env("RAG_URL")
            .or(file.url)
            .unwrap_or(defaults.url)
            .trim_end_matches('/')
            .to_string();

        let top_k = match env("RAG_TOP_K") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .with_context(|| format!("RAG_TOP_K must be an integer, got {:?}", raw))?,
            None => file.top_k.unwrap_or(defaults.top_k),
        };
        if top_k == 0 {
            bail!("RAG_TOP_K must be at least 1");
        }

        // Blank domain means "not set"
        let domain = env("RAG_DOMAIN")
            .or(file.domain)
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        Ok(Self {
            url,
            top_k,
            domain,
            timeout_secs: file.timeout_secs.unwrap_or(defaults.timeout_secs),
        })
    }
}
