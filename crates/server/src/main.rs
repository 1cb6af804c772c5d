//! Sari-sari store agent server entry point

use std::net::SocketAddr;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use sari_sari_config::{load_catalog, load_settings, Settings};
use sari_sari_core::{BusinessContext, Error, Result};
use sari_sari_server::{create_router, init_metrics, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Priority: env vars > config/{env}.yaml > config/default.yaml > defaults
    let env = std::env::var("SARI_SARI_ENV").ok();
    let config = match load_settings(env.as_deref()) {
        Ok(settings) => {
            // Tracing not yet initialized
            eprintln!(
                "Loaded configuration from files (env: {})",
                env.as_deref().unwrap_or("default")
            );
            settings
        }
        Err(e) if env.as_deref().map_or(false, is_strict_env) => {
            eprintln!("Failed to load config: {}", e);
            return Err(e.into());
        }
        Err(e) => {
            eprintln!("Warning: Failed to load config: {}. Using defaults.", e);
            Settings::default()
        }
    };

    init_tracing(&config);

    tracing::info!("Starting sari-sari agent server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        environment = ?config.environment,
        preferred_provider = ?config.router.preferred_provider,
        "Configuration loaded"
    );

    let catalog = match load_catalog(&config.catalog_path) {
        Ok(catalog) => {
            tracing::info!(
                store = %catalog.store_name,
                products = catalog.inventory.len(),
                "Loaded store catalog"
            );
            catalog
        }
        Err(e) if config.environment.is_strict() => return Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load catalog, starting with an empty store");
            BusinessContext::default()
        }
    };

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| Error::Configuration(format!("Invalid listen address: {}", e)))?;
    let metrics_enabled = config.observability.metrics_enabled;

    let mut state = AppState::from_settings(config, catalog).await;
    if metrics_enabled {
        state = state.with_prometheus(init_metrics()?);
        tracing::info!("Initialized Prometheus metrics at /metrics");
    }

    for provider in state.nlp.router().descriptors() {
        tracing::info!(
            provider = %provider.name,
            kind = %provider.kind,
            available = provider.available,
            "Registered provider"
        );
    }

    let cleanup = state.sessions.start_cleanup_task();
    let app = create_router(state);

    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Internal(format!("Failed to bind {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::Internal(format!("Server error: {}", e)))?;

    let _ = cleanup.send(true);
    tracing::info!("Server shutdown complete");
    Ok(())
}

fn is_strict_env(name: &str) -> bool {
    matches!(name, "production" | "staging")
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}

fn init_tracing(config: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &config.observability.log_level;
        format!("sari_sari={},tower_http=debug", level).into()
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = if config.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    subscriber.with(fmt_layer).init();
}
