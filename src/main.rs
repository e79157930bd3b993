// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use url_shortener::{
    api::router,
    auth::{AuthContextBuilder, PermissionResolver, TokenVerifier},
    config::{Config, ConfigError},
    sso::{SsoClient, SsoError},
    state::AppState,
    storage::{LinkDbError, RedbLinkStore},
    telemetry::{self, TelemetryError},
};

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),

    #[error("failed to open link store: {0}")]
    Store(#[from] LinkDbError),

    #[error("failed to create authority client: {0}")]
    Sso(#[from] SsoError),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    let config = Config::from_env()?;
    telemetry::init(config.env, config.log_format)?;
    tracing::info!(config = ?config, "starting url shortener");

    let links = RedbLinkStore::open(&config.database_path, config.store_timeout)?;
    tracing::info!(path = %config.database_path.display(), "link store opened");

    let sso = Arc::new(SsoClient::new(&config.sso)?);
    // One resolver call may span every retry the client makes.
    let resolver = PermissionResolver::new(sso.clone(), sso.call_budget());
    let auth = AuthContextBuilder::new(TokenVerifier::new(config.app_secret.as_bytes()), resolver);

    let state = AppState::new(Arc::new(links), auth, sso).with_alias_policy(config.alias);
    let app = router(state);

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_signals(shutdown.clone()));

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

/// Cancels `shutdown` on Ctrl+C or SIGTERM.
async fn watch_signals(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
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
                tracing::error!(error = %e, "failed to listen for SIGTERM");
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

    tracing::info!("shutdown signal received, draining connections");
    shutdown.cancel();
}
