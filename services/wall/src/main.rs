use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use wall_service::api::{start_api_server, AppState};
use wall_service::config::{Config, StoreBackend};
use wall_service::message_store::{InMemoryMessageStore, MessageStore, RedisMessageStore};
use wall_service::object_storage;
use wall_service::submission::SubmissionService;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;

    // Initialize logging
    init_tracing(&config.service.log_level, &config.service.log_format);

    info!(
        service = %config.service.name,
        version = env!("CARGO_PKG_VERSION"),
        storage = %config.storage.provider,
        "Starting Ledger Wall service"
    );

    // Initialize metrics
    if config.service.metrics_port != 0 {
        init_metrics(config.service.metrics_port)?;
    }

    // Initialize components
    let message_store: Arc<dyn MessageStore> = match config.redis.backend {
        StoreBackend::Redis => {
            let store = RedisMessageStore::new(&config.redis).context("Invalid Redis URL")?;
            // Serve anyway; the feed stays empty until Redis answers
            if let Err(e) = store.ping().await {
                warn!(error = %e, "Redis not reachable at startup");
            }
            Arc::new(store)
        }
        StoreBackend::Memory => {
            info!("Using in-memory message store; messages are lost on restart");
            Arc::new(InMemoryMessageStore::new())
        }
    };

    let storage = object_storage::from_config(&config.storage)
        .await
        .context("Failed to initialize image storage")?;

    let api_state = AppState {
        message_store: message_store.clone(),
        submissions: SubmissionService::new(message_store.clone(), storage),
    };

    // Serve until SIGINT/SIGTERM, letting in-flight requests finish
    start_api_server(api_state, &config.api, shutdown_signal()).await?;

    info!("Shutting down wall service");

    drop(message_store);

    info!("Wall service stopped");

    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str, format: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if format == "json" {
        subscriber.with(fmt::layer().json()).init();
    } else {
        subscriber.with(fmt::layer().pretty()).init();
    }
}

/// Initialize Prometheus metrics exporter
fn init_metrics(port: u16) -> Result<()> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus metrics exporter")?;

    info!(port = port, "Prometheus metrics exporter started");

    Ok(())
}

/// Wait for shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received SIGTERM signal");
        }
    }
}
