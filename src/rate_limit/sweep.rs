use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::clock::Clock;
use crate::rate_limit::RateLimitStore;

/// Run one eviction pass over the store
pub fn sweep_once(store: &dyn RateLimitStore, clock: &dyn Clock) -> usize {
    let removed = store.purge_expired(clock.now_ms());
    if removed > 0 {
        tracing::debug!("Evicted {} expired rate limit entries", removed);
    }
    removed
}

/// Handle to the background eviction task
pub struct SweepHandle {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Start a task that evicts expired rate limit entries every `interval`
///
/// Eviction is housekeeping only; expired entries are already ignored on
/// access.
pub fn spawn_sweeper(
    store: Arc<dyn RateLimitStore>,
    clock: Arc<dyn Clock>,
    interval: Duration,
) -> SweepHandle {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // First tick completes immediately
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => break,
                _ = ticker.tick() => {
                    sweep_once(store.as_ref(), clock.as_ref());
                }
            }
        }
        tracing::debug!("Rate limit sweeper stopped");
    });

    SweepHandle {
        shutdown_tx,
        handle,
    }
}

impl SweepHandle {
    /// Stop the sweeper and wait for it to exit
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.handle.await {
            tracing::warn!("Rate limit sweeper ended abnormally: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::models::RateLimitEntry;
    use crate::rate_limit::MemoryStore;

    #[test]
    fn test_sweep_once_removes_expired() {
        let store = MemoryStore::new();
        let clock = ManualClock::new(1_000);
        store.set("pin:a", RateLimitEntry { count: 5, reset_at: 500 });
        store.set("pin:b", RateLimitEntry { count: 1, reset_at: 5_000 });

        assert_eq!(sweep_once(&store, &clock), 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_runs_on_interval_and_stops() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(1_000));
        store.set("pin:a", RateLimitEntry { count: 5, reset_at: 500 });

        let handle = spawn_sweeper(store.clone(), clock.clone(), Duration::from_secs(60));

        // Nothing runs before the first interval elapses
        tokio::task::yield_now().await;
        assert_eq!(store.len(), 1);

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(store.is_empty());

        handle.shutdown().await;
    }
}
