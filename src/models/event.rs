use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::checkpoint::{Checkpoint, CheckpointStatus};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TrackingEventKind {
    PackageCreated,
    PackageUpdated,
    PackageDeleted,
    CheckpointAdded,
    CheckpointUpdated,
    CheckpointDeleted,
}

/// Change notification pushed to live subscribers after a successful write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingEvent {
    pub tracking_number: String,
    pub kind: TrackingEventKind,
    pub status: CheckpointStatus,
    pub checkpoint: Option<Checkpoint>,
    pub at: DateTime<Utc>,
}
