pub mod refresh;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::AppError;
use crate::models::checkpoint::CheckpointStatus;
use crate::models::coordinates::{Coordinates, Location, path_length_km};
use crate::models::package::{Package, Payment};
use crate::store::PackageStore;
use crate::timeline::{self, StatusColor, TimelineEntry};

pub use refresh::{RefreshHandle, RefreshUpdate, spawn_refresh};

/// Public tracking page model, derived from a package aggregate.
#[derive(Debug, Clone, Serialize)]
pub struct TrackingView {
    pub tracking_number: String,
    pub description: String,
    pub status: CheckpointStatus,
    pub status_label: String,
    pub status_color: StatusColor,
    pub progress: u8,
    pub current_location: Option<Location>,
    pub path: Vec<Coordinates>,
    pub distance_travelled_km: f64,
    /// Most recent first.
    pub timeline: Vec<TimelineEntry>,
    pub images: Vec<String>,
    pub payment: Option<Payment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TrackingView {
    pub fn from_package(package: &Package) -> Self {
        let path = timeline::build_path(&package.checkpoints, package.current_location.as_ref());

        Self {
            tracking_number: package.tracking_number.clone(),
            description: package.description.clone(),
            status: package.status.clone(),
            status_label: timeline::status_display_text(&package.status),
            status_color: timeline::status_color(&package.status),
            progress: timeline::progress_percent(&package.status),
            current_location: package.current_location.clone(),
            distance_travelled_km: path_length_km(&path),
            path,
            timeline: timeline::timeline_entries(&package.checkpoints),
            images: package.images.clone(),
            payment: package
                .payment
                .is_visible
                .then(|| package.payment.clone()),
            created_at: package.created_at,
            updated_at: package.updated_at,
        }
    }
}

/// Looks packages up by tracking number through the persistence port.
pub struct TrackingService<S> {
    store: Arc<S>,
}

impl<S> Clone for TrackingService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: PackageStore> TrackingService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Fetches the aggregate with its checkpoints in ascending order.
    pub async fn fetch_package(&self, tracking_number: &str) -> Result<Package, AppError> {
        let tracking_number = tracking_number.trim();
        if tracking_number.is_empty() {
            return Err(AppError::BadRequest(
                "tracking number cannot be empty".to_string(),
            ));
        }

        let mut package = self.store.fetch_package(tracking_number).await?;

        if !timeline::is_ascending(&package.checkpoints) {
            warn!(
                tracking_number = %tracking_number,
                "stored checkpoints out of order; sorting"
            );
            timeline::sort_ascending(&mut package.checkpoints);
        }

        debug!(
            tracking_number = %tracking_number,
            checkpoints = package.checkpoints.len(),
            "package fetched"
        );

        Ok(package)
    }

    pub async fn track(&self, tracking_number: &str) -> Result<TrackingView, AppError> {
        let package = self.fetch_package(tracking_number).await?;
        Ok(TrackingView::from_package(&package))
    }
}
