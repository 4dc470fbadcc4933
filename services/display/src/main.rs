use anyhow::{Context, Result};
use crossterm::event::{Event, EventStream, KeyCode, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;
use wall_display::{kiosk, DisplayConfig, FeedClient};

#[tokio::main]
async fn main() -> Result<()> {
    let config = DisplayConfig::load().context("Failed to load configuration")?;

    init_logging(&config.log_level);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        feed_url = %config.feed_url,
        "Starting Ledger Wall display"
    );

    let source = Arc::new(FeedClient::new(&config).context("Failed to build feed client")?);

    let mut terminal = ratatui::try_init().context("Failed to initialize terminal")?;
    let result = kiosk::run(&mut terminal, source, &config, shutdown_requested()).await;
    ratatui::restore();

    result.map(|_| ())
}

/// Log to stderr only when asked to; the kiosk owns stdout
fn init_logging(log_level: &str) {
    if std::env::var_os("RUST_LOG").is_none() {
        return;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

/// Resolve on `q`, Esc, Ctrl+C in the terminal or SIGTERM
async fn shutdown_requested() {
    let keys = async {
        let mut events = EventStream::new();
        while let Some(event) = events.next().await {
            let Ok(Event::Key(key)) = event else { continue };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            let ctrl_c = key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL);
            if ctrl_c || matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
                return;
            }
        }
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
        _ = keys => info!("Quit requested"),
        _ = terminate => info!("Received SIGTERM signal"),
    }
}
