use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::coordinates::Coordinates;

/// Lifecycle state shared by packages and their checkpoints.
///
/// Values outside the closed set can still arrive from older stored records;
/// they are kept verbatim in `Other` so display code can fall back gracefully.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CheckpointStatus {
    #[default]
    Pending,
    InWarehouse,
    InTransit,
    Arrived,
    CustomsCheck,
    CustomsHold,
    PackageDeclared,
    CustomsCleared,
    Delivered,
    Exception,
    Other(String),
}

impl CheckpointStatus {
    pub const KNOWN: [CheckpointStatus; 10] = [
        CheckpointStatus::Pending,
        CheckpointStatus::InWarehouse,
        CheckpointStatus::InTransit,
        CheckpointStatus::Arrived,
        CheckpointStatus::CustomsCheck,
        CheckpointStatus::CustomsHold,
        CheckpointStatus::PackageDeclared,
        CheckpointStatus::CustomsCleared,
        CheckpointStatus::Delivered,
        CheckpointStatus::Exception,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            CheckpointStatus::Pending => "pending",
            CheckpointStatus::InWarehouse => "in_warehouse",
            CheckpointStatus::InTransit => "in_transit",
            CheckpointStatus::Arrived => "arrived",
            CheckpointStatus::CustomsCheck => "customs_check",
            CheckpointStatus::CustomsHold => "customs_hold",
            CheckpointStatus::PackageDeclared => "package_declared",
            CheckpointStatus::CustomsCleared => "customs_cleared",
            CheckpointStatus::Delivered => "delivered",
            CheckpointStatus::Exception => "exception",
            CheckpointStatus::Other(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, CheckpointStatus::Other(_))
    }

    fn parse(raw: &str) -> Option<Self> {
        Self::KNOWN
            .iter()
            .find(|status| status.as_str() == raw)
            .cloned()
    }
}

impl fmt::Display for CheckpointStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for CheckpointStatus {
    fn from(raw: String) -> Self {
        Self::parse(&raw).unwrap_or(CheckpointStatus::Other(raw))
    }
}

impl From<CheckpointStatus> for String {
    fn from(status: CheckpointStatus) -> Self {
        match status {
            CheckpointStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown status: {}", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

/// Strict parse: only the closed set is accepted.
impl FromStr for CheckpointStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s.trim()).ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Checkpoint {
    pub id: Uuid,
    pub location: String,
    pub description: String,
    pub status: CheckpointStatus,
    pub timestamp: DateTime<Utc>,
    pub coordinates: Option<Coordinates>,
}
