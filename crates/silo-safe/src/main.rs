//! Safe server entry point.
//!
//! Generates the process root key, wires the journal and the in-memory
//! store, then starts the Axum HTTP server with graceful shutdown. The
//! root key lives only in this process; every secret operation is gated
//! on it being set.

use std::sync::Arc;

use anyhow::Context;
use axum::http::HeaderValue;
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use silo_core::identity::IdentityMatcher;
use silo_core::journal::{FileJournalSink, Journal};
use silo_core::rootkey::{RootKeyCell, RootKeyMaterial};

use silo_safe::config::ServerConfig;
use silo_safe::routes::build_router;
use silo_safe::state::AppState;

use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from environment.
    let config = ServerConfig::from_env();

    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .json()
        .init();

    info!("Safe starting");

    let state = build_app_state(&config).await?;
    let app = harden_router(build_router(Arc::clone(&state)));

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_addr))?;

    info!(addr = %config.bind_addr, "Safe listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Safe stopped");
    Ok(())
}

/// Build the shared application state: root key, journal, identity
/// matcher, store, and keystone tracker.
async fn build_app_state(config: &ServerConfig) -> anyhow::Result<Arc<AppState>> {
    // The root key exists only in process memory. A restart produces a
    // fresh key and an empty store, which is what forces Sentinel to
    // re-run its init flow.
    let root_key = Arc::new(RootKeyCell::new());
    root_key
        .init(RootKeyMaterial::generate())
        .await
        .context("initializing root key")?;
    info!("root key generated");

    let journal = Arc::new(Journal::new());
    if let Some(ref path) = config.journal_file_path {
        journal.add_sink(Arc::new(FileJournalSink::new(path))).await;
        info!(path = %path, "file journal sink registered");
    }

    let matcher = IdentityMatcher::new(
        config.sentinel_id_prefix.clone(),
        config.safe_id_prefix.clone(),
        config.workload_id_prefix.clone(),
    );

    Ok(Arc::new(AppState::new(root_key, journal, matcher)))
}

/// Wrap the application router with the outer middleware stack.
fn harden_router(app: Router) -> Router {
    app.layer(TraceLayer::new_for_http())
        .layer(tower::limit::ConcurrencyLimitLayer::new(64))
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut sig) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            sig.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received, stopping server");
}
