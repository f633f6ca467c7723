use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, warn};

use crate::store::PackageStore;
use crate::tracking::{TrackingService, TrackingView};

#[derive(Debug, Clone)]
pub enum RefreshUpdate {
    Fresh(Box<TrackingView>),
    Failed(String),
}

/// Live handle to a background re-fetch loop. Dropping it stops the loop.
pub struct RefreshHandle {
    updates: watch::Receiver<Option<RefreshUpdate>>,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    pub fn latest(&self) -> Option<RefreshUpdate> {
        self.updates.borrow().clone()
    }

    /// Waits for the next fetch result. `None` once the loop has stopped.
    pub async fn next(&mut self) -> Option<RefreshUpdate> {
        self.updates.changed().await.ok()?;
        self.updates.borrow_and_update().clone()
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Re-fetches the tracking view every `period`, first fetch immediately.
///
/// Fetches run one after another on the same task, so a slow store never
/// has two requests in flight; ticks missed meanwhile are skipped.
pub fn spawn_refresh<S>(
    service: TrackingService<S>,
    tracking_number: String,
    period: Duration,
) -> RefreshHandle
where
    S: PackageStore + 'static,
{
    let (updates_tx, updates) = watch::channel(None);

    let task = tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            let update = match service.track(&tracking_number).await {
                Ok(view) => RefreshUpdate::Fresh(Box::new(view)),
                Err(err) => {
                    warn!(tracking_number = %tracking_number, error = %err, "tracking refresh failed");
                    RefreshUpdate::Failed(err.to_string())
                }
            };

            if updates_tx.send(Some(update)).is_err() {
                debug!(tracking_number = %tracking_number, "refresh receiver gone; stopping");
                break;
            }
        }
    });

    RefreshHandle { updates, task }
}
