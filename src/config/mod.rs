//! Configuration for the proxy server
//!
//! Configuration is loaded in order of precedence:
//! 1. Environment variables (highest priority)
//! 2. Config file (~/.config/rag-proxy/config.toml, or `RAG_PROXY_CONFIG`)
//! 3. Built-in defaults (lowest priority)
//!
//! Loaded once at startup and never mutated afterwards.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;

// ─────────────────────────────────────────────────────────────────────────────
// Submodules
// ─────────────────────────────────────────────────────────────────────────────

mod logging;
mod retrieval;
mod serialization;

#[cfg(test)]
mod tests;

pub use logging::{FileLogging, LogRotation, LoggingConfig};
pub use retrieval::{FileRetrieval, RetrievalConfig};

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_OLLAMA_URL: &str = "http://ollama:11434";

/// Buffered inference calls are cut off after this long (a hung backend)
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 180;

// ─────────────────────────────────────────────────────────────────────────────
// Application Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the proxy server to
    pub bind_addr: SocketAddr,

    /// Inference backend base URL (no trailing slash)
    pub ollama_url: String,

    /// Timeout for buffered inference calls, in seconds
    pub upstream_timeout_secs: u64,

    /// Vector-search collaborator settings
    pub retrieval: RetrievalConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            upstream_timeout_secs: DEFAULT_UPSTREAM_TIMEOUT_SECS,
            retrieval: RetrievalConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File Configuration (deserialization layer)
// ─────────────────────────────────────────────────────────────────────────────

/// Config file structure
#[derive(Debug, Deserialize, Default)]
pub(crate) struct FileConfig {
    pub bind_addr: Option<String>,
    pub ollama_url: Option<String>,
    pub upstream_timeout_secs: Option<u64>,

    /// Optional [retrieval] section
    pub retrieval: Option<FileRetrieval>,

    /// Optional [logging] section
    pub logging: Option<FileLogging>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration Loading
// ─────────────────────────────────────────────────────────────────────────────

impl Config {
    /// Get the config file path: `RAG_PROXY_CONFIG` or ~/.config/rag-proxy/config.toml
    pub fn config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("RAG_PROXY_CONFIG") {
            return Some(PathBuf::from(path));
        }
        dirs::home_dir().map(|p| p.join(".config").join("rag-proxy").join("config.toml"))
    }

    /// Load file config if it exists
    ///
    /// A missing file means defaults. A file that exists but cannot be read
    /// or parsed is an error: a broken config should fail fast instead of
    /// silently falling back to defaults.
    fn load_file_config() -> Result<FileConfig> {
        let Some(path) = Self::config_path() else {
            return Ok(FileConfig::default());
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FileConfig::default()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to read config file {}", path.display())),
        }
    }

    /// Load configuration: env vars -> file -> defaults
    pub fn from_env() -> Result<Self> {
        let file = Self::load_file_config()?;
        Self::from_sources(file, |key| std::env::var(key).ok())
    }

    /// Merge a parsed config file with an environment lookup
    pub(crate) fn from_sources(
        file: FileConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        // Bind address: env > file > default
        let bind_addr = env("RAG_PROXY_BIND")
            .or(file.bind_addr)
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr: SocketAddr = bind_addr
            .parse()
            .with_context(|| format!("Invalid bind address: {}", bind_addr))?;

        // Inference backend URL: env > file > default
        let ollama_url = env("OLLAMA_URL")
            .or(file.ollama_url)
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());
        let ollama_url = ollama_url.trim_end_matches('/').to_string();
        if ollama_url.is_empty() {
            bail!("OLLAMA_URL must not be empty");
        }

        // Upstream timeout: file > default
        let upstream_timeout_secs = file
            .upstream_timeout_secs
            .unwrap_or(DEFAULT_UPSTREAM_TIMEOUT_SECS);

        let retrieval = RetrievalConfig::resolve(file.retrieval, &env)?;
        let logging = LoggingConfig::from_file(file.logging);

        Ok(Self {
            bind_addr,
            ollama_url,
            upstream_timeout_secs,
            retrieval,
            logging,
        })
    }
}
