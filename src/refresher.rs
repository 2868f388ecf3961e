use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::models::Story;
use crate::service::TopStories;

/// Rebuilds the top stories every `every`, starting immediately, until `shutdown` fires.
pub fn spawn_refresher(
    service: Arc<TopStories>,
    every: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // A slow build pushes the next one back instead of firing a burst
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    refresh_once(&service).await;
                }
            }
        }
        info!("stopped refreshing top stories");
    })
}

/// Runs one refresh cycle and reports whether the cache got new content.
pub async fn refresh_once(service: &TopStories) -> bool {
    match service.refresh().await {
        Ok(list) => {
            info!(
                count = list.stories.len(),
                top = ?list.stories.first().map(Story::id),
                build_ms = list.build_ms,
                "refreshed top stories"
            );
            true
        }
        Err(err) => {
            warn!(error = %err, "refresh failed, still serving the previous stories");
            false
        }
    }
}
