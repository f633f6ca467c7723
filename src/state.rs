use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard, broadcast};

use crate::config::Config;
use crate::editor::EditorOptions;
use crate::models::checkpoint::Checkpoint;
use crate::models::event::{TrackingEvent, TrackingEventKind};
use crate::models::package::Package;
use crate::observability::metrics::Metrics;
use crate::store::MemoryStore;
use crate::tracking::TrackingService;

pub struct AppState {
    pub store: Arc<MemoryStore>,
    pub tracking: TrackingService<MemoryStore>,
    pub events_tx: broadcast::Sender<TrackingEvent>,
    pub metrics: Metrics,
    pub editor_options: EditorOptions,
    pub tracking_prefix: String,
    pub refresh_interval: Duration,
    package_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl AppState {
    pub fn new(event_buffer_size: usize) -> Self {
        let store = Arc::new(MemoryStore::new());
        let (events_tx, _unused_rx) = broadcast::channel(event_buffer_size);

        Self {
            tracking: TrackingService::new(store.clone()),
            store,
            events_tx,
            metrics: Metrics::new(),
            editor_options: EditorOptions::default(),
            tracking_prefix: "PT".to_string(),
            refresh_interval: Duration::from_secs(30),
            package_locks: DashMap::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let mut state = Self::new(config.event_buffer_size);
        state.editor_options = EditorOptions {
            require_coordinates: config.require_coordinates,
        };
        state.tracking_prefix = config.tracking_prefix.clone();
        state.refresh_interval = config.refresh_interval;
        state
    }

    /// Broadcasts a change to live subscribers. Having none is not an error.
    pub fn publish(
        &self,
        kind: TrackingEventKind,
        package: &Package,
        checkpoint: Option<&Checkpoint>,
    ) {
        let _ = self.events_tx.send(TrackingEvent {
            tracking_number: package.tracking_number.clone(),
            kind,
            status: package.status.clone(),
            checkpoint: checkpoint.cloned(),
            at: Utc::now(),
        });
    }

    /// Serialises read-modify-write cycles on one package. Hold the guard
    /// until the write has been persisted.
    pub async fn lock_package(&self, tracking_number: &str) -> OwnedMutexGuard<()> {
        let lock = self
            .package_locks
            .entry(tracking_number.to_string())
            .or_default()
            .clone();
        lock.lock_owned().await
    }

    pub fn forget_package_lock(&self, tracking_number: &str) {
        self.package_locks.remove(tracking_number);
    }

    pub fn sync_package_gauge(&self) {
        self.metrics.packages_total.set(self.store.len() as i64);
    }
}
