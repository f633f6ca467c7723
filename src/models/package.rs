use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::checkpoint::{Checkpoint, CheckpointStatus};
use crate::models::coordinates::Location;
use crate::timeline;

const TRACKING_SUFFIX_LEN: usize = 10;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Dimensions {
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

/// Sender or recipient contact block.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Party {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Payment {
    pub amount: f64,
    pub is_paid: bool,
    pub method: String,
    pub currency: String,
    pub is_visible: bool,
}

impl Default for Payment {
    fn default() -> Self {
        Self {
            amount: 0.0,
            is_paid: false,
            method: String::new(),
            currency: "USD".to_string(),
            is_visible: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Package {
    pub tracking_number: String,
    pub status: CheckpointStatus,
    pub description: String,
    pub weight: f64,
    pub dimensions: Dimensions,
    pub sender: Party,
    pub recipient: Party,
    pub payment: Payment,
    pub images: Vec<String>,
    pub current_location: Option<Location>,
    /// Status and location as last set through the package form. The derived
    /// fields fall back to these when the checkpoints yield nothing.
    #[serde(default)]
    pub manual_status: CheckpointStatus,
    #[serde(default)]
    pub manual_location: Option<Location>,
    /// Ascending by timestamp; the last element is the most recent event.
    pub checkpoints: Vec<Checkpoint>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Package {
    pub fn checkpoint(&self, id: Uuid) -> Option<&Checkpoint> {
        self.checkpoints.iter().find(|checkpoint| checkpoint.id == id)
    }

    pub fn checkpoint_position(&self, id: Uuid) -> Option<usize> {
        self.checkpoints
            .iter()
            .position(|checkpoint| checkpoint.id == id)
    }

    /// Re-derives `status` and `current_location` from the checkpoint list.
    ///
    /// With no checkpoints, or none carrying coordinates, the manual values
    /// from the package form apply again.
    pub fn refresh_derived(&mut self) {
        self.status = timeline::current_status(&self.checkpoints)
            .cloned()
            .unwrap_or_else(|| self.manual_status.clone());

        self.current_location = timeline::derive_current_location(&self.checkpoints)
            .or_else(|| self.manual_location.clone());

        self.updated_at = Utc::now();
    }
}

pub fn generate_tracking_number(prefix: &str) -> String {
    let suffix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(TRACKING_SUFFIX_LEN)
        .collect();

    format!("{}{}", prefix, suffix.to_uppercase())
}
