use crate::config::DisplayConfig;
use crate::feed_client::FeedSource;
use crate::render;
use crate::rotation::Rotation;
use ratatui::{backend::Backend, Terminal};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Drive the kiosk until `shutdown` resolves
///
/// Feed refreshes and rotation run on independent timers. Fetches are
/// spawned so a slow request never holds up rotation; their results come
/// back over a channel and are applied in arrival order.
pub async fn run<B: Backend>(
    terminal: &mut Terminal<B>,
    source: Arc<dyn FeedSource>,
    config: &DisplayConfig,
    shutdown: impl Future<Output = ()>,
) -> anyhow::Result<Rotation> {
    run_with_intervals(
        terminal,
        source,
        config.refresh_interval(),
        config.rotation_interval(),
        shutdown,
    )
    .await
}

async fn run_with_intervals<B: Backend>(
    terminal: &mut Terminal<B>,
    source: Arc<dyn FeedSource>,
    refresh_every: Duration,
    rotate_every: Duration,
    shutdown: impl Future<Output = ()>,
) -> anyhow::Result<Rotation> {
    let (tx, mut rx) = mpsc::channel(8);
    let mut rotation = Rotation::new();

    // First fetch fires immediately, first rotation after one full period
    let mut refresh = interval(refresh_every);
    let mut rotate = tokio::time::interval_at(Instant::now() + rotate_every, rotate_every);
    refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);
    rotate.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tokio::pin!(shutdown);

    info!(
        refresh_secs = refresh_every.as_secs(),
        rotation_secs = rotate_every.as_secs(),
        "Kiosk started"
    );

    loop {
        terminal.draw(|frame| render::draw(frame, &rotation))?;

        tokio::select! {
            _ = &mut shutdown => break,
            _ = refresh.tick() => {
                let source = source.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let _ = tx.send(source.fetch().await).await;
                });
            }
            _ = rotate.tick() => rotation.advance(),
            Some(result) = rx.recv() => {
                rotation.apply_fetch(result);
                debug!(count = rotation.len(), "Feed applied");
            }
        }
    }

    info!("Kiosk stopped");
    Ok(rotation)
}
