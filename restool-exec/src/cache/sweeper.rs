use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::cache::TtlCache;

/// Owns the background sweep task of one cache.
pub struct SweeperHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Stops the sweep loop and waits for it to exit.
    pub async fn shutdown(self) {
        self.token.cancel();
        let _ = self.task.await;
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Periodically purges stale entries so unread keys do not pile up.
///
/// The task holds only a weak reference: it ends on `shutdown`, when `token`
/// is cancelled elsewhere, or once the cache itself has been dropped.
pub fn spawn_sweeper<K, V>(
    cache: &Arc<TtlCache<K, V>>,
    interval: Duration,
    token: CancellationToken,
) -> SweeperHandle
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    let weak = Arc::downgrade(cache);
    let stop = token.clone();
    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = stop.cancelled() => break,
                _ = ticker.tick() => {
                    let Some(cache) = weak.upgrade() else {
                        break;
                    };
                    let removed = cache.purge_expired().await;
                    if removed > 0 {
                        tracing::debug!(removed, "cache sweep removed stale entries");
                    }
                }
            }
        }
    });
    SweeperHandle { token, task }
}
