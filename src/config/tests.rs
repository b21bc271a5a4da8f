//! Configuration tests

use super::*;
use std::collections::HashMap;

/// Build an env lookup from literal pairs so tests never touch process env
fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

// ─────────────────────────────────────────────────────────────────────────────
// Round-trip tests
// ─────────────────────────────────────────────────────────────────────────────

/// Verify that the rendered config can be parsed back.
#[test]
fn test_config_roundtrip_default() {
    let config = Config::default();
    let toml_str = config.to_toml();

    let parsed: Result<FileConfig, _> = toml::from_str(&toml_str);
    assert!(
        parsed.is_ok(),
        "Default config should round-trip.\nTOML:\n{}\nError: {:?}",
        toml_str,
        parsed.err()
    );
}

#[test]
fn test_config_roundtrip_preserves_values() {
    let mut config = Config::default();
    config.ollama_url = "http://gpu-box:11434".to_string();
    config.retrieval.top_k = 9;
    config.retrieval.domain = Some("manuals".to_string());
    config.logging.file_rotation = LogRotation::Hourly;

    let file: FileConfig = toml::from_str(&config.to_toml()).expect("should parse");
    let reloaded = Config::from_sources(file, env_of(&[])).expect("should resolve");

    assert_eq!(reloaded.ollama_url, "http://gpu-box:11434");
    assert_eq!(reloaded.retrieval.top_k, 9);
    assert_eq!(reloaded.retrieval.domain.as_deref(), Some("manuals"));
    assert_eq!(reloaded.logging.file_rotation, LogRotation::Hourly);
}

// ─────────────────────────────────────────────────────────────────────────────
// Precedence
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_defaults_without_file_or_env() {
    let config = Config::from_sources(FileConfig::default(), env_of(&[])).unwrap();

    assert_eq!(config.ollama_url, "http://ollama:11434");
    assert_eq!(config.retrieval.url, "http://rag:8000");
    assert_eq!(config.retrieval.top_k, 5);
    assert_eq!(config.retrieval.domain, None);
    assert_eq!(config.retrieval.timeout_secs, 30);
    assert_eq!(config.upstream_timeout_secs, 180);
}

#[test]
fn test_env_overrides_file() {
    let file: FileConfig = toml::from_str(
        r#"
        ollama_url = "http://from-file:11434"

        [retrieval]
        url = "http://rag-file:8000"
        top_k = 3
        "#,
    )
    .unwrap();

    let config = Config::from_sources(
        file,
        env_of(&[("OLLAMA_URL", "http://from-env:11434/"), ("RAG_TOP_K", "7")]),
    )
    .unwrap();

    // Trailing slash trimmed so "{base}/{path}" never doubles up
    assert_eq!(config.ollama_url, "http://from-env:11434");
    assert_eq!(config.retrieval.url, "http://rag-file:8000");
    assert_eq!(config.retrieval.top_k, 7);
}

#[test]
fn test_invalid_top_k_is_an_error() {
    let result = Config::from_sources(FileConfig::default(), env_of(&[("RAG_TOP_K", "many")]));
    assert!(result.is_err());

    let result = Config::from_sources(FileConfig::default(), env_of(&[("RAG_TOP_K", "0")]));
    assert!(result.is_err());
}

#[test]
fn test_invalid_bind_addr_is_an_error() {
    let result = Config::from_sources(
        FileConfig::default(),
        env_of(&[("RAG_PROXY_BIND", "not-an-address")]),
    );
    assert!(result.is_err());
}

#[test]
fn test_blank_domain_means_unset() {
    let config =
        Config::from_sources(FileConfig::default(), env_of(&[("RAG_DOMAIN", "   ")])).unwrap();
    assert_eq!(config.retrieval.domain, None);
}

#[test]
fn test_logging_section_parses() {
    let file: FileConfig = toml::from_str(
        r#"
        [logging]
        level = "debug"
        file_enabled = true
        file_rotation = "never"
        "#,
    )
    .unwrap();

    let config = Config::from_sources(file, env_of(&[])).unwrap();
    assert_eq!(config.logging.level, "debug");
    assert!(config.logging.file_enabled);
    assert_eq!(config.logging.file_rotation, LogRotation::Never);
    assert_eq!(config.logging.file_prefix, "rag-proxy");
}
