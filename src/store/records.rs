//! Row shapes as the backing tables store them.
//!
//! The tables keep coordinates as flat `lat`/`lng` columns while the domain
//! uses `Coordinates { latitude, longitude }`. This module is the only place
//! that converts between the two.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::checkpoint::{Checkpoint, CheckpointStatus};
use crate::models::coordinates::{Coordinates, Location};
use crate::models::package::{Dimensions, Package, Party, Payment};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl From<Coordinates> for LatLng {
    fn from(coordinates: Coordinates) -> Self {
        Self {
            lat: coordinates.latitude,
            lng: coordinates.longitude,
        }
    }
}

impl From<LatLng> for Coordinates {
    fn from(point: LatLng) -> Self {
        Coordinates::new(point.lat, point.lng)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocationRecord {
    pub lat: f64,
    pub lng: f64,
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckpointRecord {
    pub id: Uuid,
    pub location: String,
    pub description: String,
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub coordinates: Option<LatLng>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PackageRecord {
    pub tracking_number: String,
    pub status: String,
    pub description: String,
    pub weight: f64,
    pub dimensions: Dimensions,
    pub sender: Party,
    pub recipient: Party,
    pub payment: Payment,
    pub images: Vec<String>,
    pub current_location: Option<LocationRecord>,
    #[serde(default)]
    pub manual_status: String,
    #[serde(default)]
    pub manual_location: Option<LocationRecord>,
    pub checkpoints: Vec<CheckpointRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Checkpoint> for CheckpointRecord {
    fn from(checkpoint: &Checkpoint) -> Self {
        Self {
            id: checkpoint.id,
            location: checkpoint.location.clone(),
            description: checkpoint.description.clone(),
            status: checkpoint.status.to_string(),
            timestamp: checkpoint.timestamp,
            coordinates: checkpoint.coordinates.map(LatLng::from),
        }
    }
}

impl From<CheckpointRecord> for Checkpoint {
    fn from(record: CheckpointRecord) -> Self {
        Self {
            id: record.id,
            location: record.location,
            description: record.description,
            status: CheckpointStatus::from(record.status),
            timestamp: record.timestamp,
            coordinates: record.coordinates.map(Coordinates::from),
        }
    }
}

impl From<&Location> for LocationRecord {
    fn from(location: &Location) -> Self {
        Self {
            lat: location.coordinates.latitude,
            lng: location.coordinates.longitude,
            address: location.address.clone(),
        }
    }
}

impl From<LocationRecord> for Location {
    fn from(record: LocationRecord) -> Self {
        Self {
            coordinates: Coordinates::new(record.lat, record.lng),
            address: record.address,
        }
    }
}

impl From<&Package> for PackageRecord {
    fn from(package: &Package) -> Self {
        Self {
            tracking_number: package.tracking_number.clone(),
            status: package.status.to_string(),
            description: package.description.clone(),
            weight: package.weight,
            dimensions: package.dimensions.clone(),
            sender: package.sender.clone(),
            recipient: package.recipient.clone(),
            payment: package.payment.clone(),
            images: package.images.clone(),
            current_location: package.current_location.as_ref().map(LocationRecord::from),
            manual_status: package.manual_status.to_string(),
            manual_location: package.manual_location.as_ref().map(LocationRecord::from),
            checkpoints: package.checkpoints.iter().map(CheckpointRecord::from).collect(),
            created_at: package.created_at,
            updated_at: package.updated_at,
        }
    }
}

impl From<PackageRecord> for Package {
    fn from(record: PackageRecord) -> Self {
        Self {
            tracking_number: record.tracking_number,
            status: CheckpointStatus::from(record.status),
            description: record.description,
            weight: record.weight,
            dimensions: record.dimensions,
            sender: record.sender,
            recipient: record.recipient,
            payment: record.payment,
            images: record.images,
            current_location: record.current_location.map(Location::from),
            manual_status: manual_status(record.manual_status),
            manual_location: record.manual_location.map(Location::from),
            checkpoints: record.checkpoints.into_iter().map(Checkpoint::from).collect(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Rows written before the manual columns existed carry an empty status.
fn manual_status(raw: String) -> CheckpointStatus {
    if raw.is_empty() {
        CheckpointStatus::default()
    } else {
        CheckpointStatus::from(raw)
    }
}
