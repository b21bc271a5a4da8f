//! Proxy server setup and initialization

use anyhow::{Context, Result};
use axum::{
    routing::{get, MethodRouter},
    Router,
};
use tokio::net::TcpListener;

use crate::config::Config;

use super::proxy_handler;
use super::state::ProxyState;

/// Build the router: every path under `/` maps 1:1 onto the inference backend
///
/// GET also answers HEAD. Verbs outside GET/POST/PUT/DELETE/PATCH get 405.
pub fn build_router(state: ProxyState) -> Router {
    Router::new()
        .route("/", proxy_route())
        .route("/*path", proxy_route())
        .with_state(state)
}

fn proxy_route() -> MethodRouter<ProxyState> {
    get(proxy_handler)
        .post(proxy_handler)
        .put(proxy_handler)
        .delete(proxy_handler)
        .patch(proxy_handler)
}

/// Start the proxy server
pub async fn start_proxy(
    config: Config,
    shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) -> Result<()> {
    let bind_addr = config.bind_addr;
    let state = ProxyState::new(&config)?;

    tracing::info!(
        "Forwarding to {} (retrieval: {}, top_k: {})",
        config.ollama_url,
        config.retrieval.url,
        config.retrieval.top_k
    );

    // Probe the retrieval service in the background; the proxy works without it
    let retriever = state.retriever().clone();
    tokio::spawn(async move {
        match retriever.health().await {
            Ok(health) => tracing::info!(
                "Retrieval service reachable (ok: {}, domains: {:?})",
                health.ok,
                health.domains
            ),
            Err(e) => tracing::warn!(
                "Retrieval service not reachable yet, requests go out unaugmented: {}",
                e
            ),
        }
    });

    let app = build_router(state);

    tracing::info!("Starting proxy on {}", bind_addr);

    // Bind and serve
    let listener = TcpListener::bind(bind_addr)
        .await
        .context("Failed to bind to address")?;

    tracing::info!("Proxy listening on {}", bind_addr);

    // Stop accepting on shutdown, let in-flight requests finish
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_rx.await.ok();
        })
        .await
        .context("Server error")?;

    tracing::info!("Proxy server shut down gracefully");
    Ok(())
}
