// rag-proxy - Retrieval-augmenting reverse proxy for Ollama
//
// Sits in front of an Ollama inference backend and forwards every request to
// the same path upstream. Chat and generate calls are enriched on the way
// with context from a vector-search service.
//
// Architecture:
// - Proxy server (axum): accepts requests, classifies them, forwards them
// - Retrieval client (reqwest): fetches context, fails soft to "no context"
// - Forwarders: buffered relay, or chunk-by-chunk streaming relay

mod cli;
mod config;
mod logging;
mod proxy;

use anyhow::Result;
use clap::Parser;
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse arguments before touching config so --help always works
    let args = cli::Cli::parse();

    // Configuration is read once and immutable afterwards
    let config = Config::from_env()?;

    // If a subcommand was handled, exit early
    if cli::handle_cli(args, &config).await? {
        return Ok(());
    }

    // The guard must be kept alive for the duration of the program to ensure logs flush
    let _file_guard = logging::init(&config.logging);

    tracing::info!("rag-proxy v{}", config::VERSION);

    // Create shutdown channel for graceful proxy shutdown
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    let mut proxy_handle = tokio::spawn(proxy::start_proxy(config, shutdown_rx));

    tokio::select! {
        // Server stopped on its own (e.g. could not bind)
        result = &mut proxy_handle => {
            result??;
        }
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received");
            let _ = shutdown_tx.send(());
            proxy_handle.await??;
        }
    }

    Ok(())
}

/// Resolve on Ctrl-C, or SIGTERM on Unix (container stop)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
