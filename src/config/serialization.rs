//! Config serialization to TOML
//!
//! Single source of truth for config file format.

use super::Config;

impl Config {
    /// Render the effective configuration as a config file
    pub fn to_toml(&self) -> String {
        let domain_line = match &self.retrieval.domain {
            Some(domain) => format!("domain = {:?}", domain),
            None => "# domain = \"default\"          # Unset: the search service picks its default".to_string(),
        };

        format!(
            r#"# rag-proxy configuration
# Environment variables override these values:
#   RAG_PROXY_BIND, OLLAMA_URL, RAG_URL, RAG_TOP_K, RAG_DOMAIN

bind_addr = {bind_addr:?}
ollama_url = {ollama_url:?}
upstream_timeout_secs = {upstream_timeout}   # Buffered inference calls only; streams are unbounded

[retrieval]
url = {rag_url:?}
top_k = {top_k}
{domain_line}
timeout_secs = {retrieval_timeout}

[logging]
level = {level:?}
file_enabled = {file_enabled}
file_dir = {file_dir:?}
file_rotation = "{file_rotation}"   # hourly | daily | never
file_prefix = {file_prefix:?}
"#,
            bind_addr = self.bind_addr.to_string(),
            ollama_url = self.ollama_url,
            upstream_timeout = self.upstream_timeout_secs,
            rag_url = self.retrieval.url,
            top_k = self.retrieval.top_k,
            domain_line = domain_line,
            retrieval_timeout = self.retrieval.timeout_secs,
            level = self.logging.level,
            file_enabled = self.logging.file_enabled,
            file_dir = self.logging.file_dir.display().to_string(),
            file_rotation = self.logging.file_rotation.as_str(),
            file_prefix = self.logging.file_prefix,
        )
    }
}
