//! Recurring cache flush
//!
//! Bounds staleness independently of webhooks: every `period` the whole
//! cache is cleared. The first flush happens one period after spawning.

use super::CodeCache;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Handle to the background refresh loop
pub struct RefreshTask {
    stop: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl RefreshTask {
    /// Spawn the refresh loop on the current tokio runtime
    pub fn spawn(cache: Arc<CodeCache>, period: Duration) -> Self {
        let (stop, mut stopped) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!("Cache refresh scheduled every {:?}", period);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = cache.clear();
                        info!("Scheduled cache refresh removed {} entries", removed);
                    }
                    _ = &mut stopped => {
                        debug!("Cache refresh stopped");
                        break;
                    }
                }
            }
        });

        Self { stop, handle }
    }

    /// Stop the loop and wait for it to exit
    pub async fn shutdown(self) {
        // The receiver only disappears once the loop has exited.
        let _ = self.stop.send(());
        if let Err(e) = self.handle.await {
            warn!("Cache refresh task ended abnormally: {}", e);
        }
    }
}
