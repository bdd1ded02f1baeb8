use std::net::SocketAddr;
use std::path::PathBuf;

use crate::cli::commands::ServeArgs;
use crate::config::{self, AppConfig};
use crate::errors::CostIntelError;
use crate::api;
use tracing::info;

/// Config file (if any), then environment overrides, then command-line flags.
pub async fn resolve_serve_config(args: &ServeArgs) -> Result<AppConfig, CostIntelError> {
    let mut config = match &args.config {
        Some(path) => config::parse_config(&PathBuf::from(path)).await?,
        None => AppConfig::default(),
    };
    config::apply_env_overrides(&mut config);

    if let Some(host) = &args.host {
        config.server.host = host.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(db) = &args.db {
        config.database.path = db.clone();
    }
    config::validate_conflicts(&config)?;
    Ok(config)
}

pub async fn handle_serve(args: ServeArgs) -> Result<(), CostIntelError> {
    let config = resolve_serve_config(&args).await?;
    info!(host = %config.server.host, port = config.server.port, "Starting API server");

    let state = api::create_app_state(&config).await?;
    let app = api::build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    // peer addresses back the rate-limit identity when X-Forwarded-For is absent
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| CostIntelError::Internal(format!("Server error: {}", e)))?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
