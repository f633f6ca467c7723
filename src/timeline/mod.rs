pub mod status;

use serde::Serialize;

use crate::models::checkpoint::{Checkpoint, CheckpointStatus};
use crate::models::coordinates::{Coordinates, Location};

pub use status::{StatusColor, progress_percent, status_color, status_display_text};

/// Status of the most recent checkpoint. Checkpoints are stored ascending,
/// so that is the last element.
pub fn current_status(checkpoints: &[Checkpoint]) -> Option<&CheckpointStatus> {
    checkpoints.last().map(|checkpoint| &checkpoint.status)
}

/// Latest checkpoint that carries valid coordinates, as a location.
pub fn derive_current_location(checkpoints: &[Checkpoint]) -> Option<Location> {
    checkpoints.iter().rev().find_map(|checkpoint| {
        checkpoint
            .coordinates
            .filter(Coordinates::is_valid)
            .map(|coordinates| Location {
                coordinates,
                address: checkpoint.location.clone(),
            })
    })
}

/// Polyline points in list order. Checkpoints without usable coordinates are
/// skipped; a valid `current_location` is appended last.
pub fn build_path(
    checkpoints: &[Checkpoint],
    current_location: Option<&Location>,
) -> Vec<Coordinates> {
    let mut path: Vec<Coordinates> = checkpoints
        .iter()
        .filter_map(|checkpoint| checkpoint.coordinates)
        .filter(Coordinates::is_valid)
        .collect();

    if let Some(location) = current_location {
        if location.coordinates.is_valid() {
            path.push(location.coordinates);
        }
    }

    path
}

/// Stable ascending sort by timestamp.
pub fn sort_ascending(checkpoints: &mut [Checkpoint]) {
    checkpoints.sort_by_key(|checkpoint| checkpoint.timestamp);
}

pub fn is_ascending(checkpoints: &[Checkpoint]) -> bool {
    checkpoints
        .windows(2)
        .all(|pair| pair[0].timestamp <= pair[1].timestamp)
}

/// Display view, newest first. Equal timestamps keep their relative
/// insertion order reversed, matching a plain reversal of the stored list.
pub fn most_recent_first(checkpoints: &[Checkpoint]) -> Vec<&Checkpoint> {
    let mut view: Vec<&Checkpoint> = checkpoints.iter().collect();
    view.sort_by_key(|checkpoint| checkpoint.timestamp);
    view.reverse();
    view
}

#[derive(Debug, Clone, Serialize)]
pub struct TimelineEntry {
    #[serde(flatten)]
    pub checkpoint: Checkpoint,
    pub label: String,
    pub color: StatusColor,
}

impl TimelineEntry {
    pub fn from_checkpoint(checkpoint: &Checkpoint) -> Self {
        Self {
            label: status_display_text(&checkpoint.status),
            color: status_color(&checkpoint.status),
            checkpoint: checkpoint.clone(),
        }
    }
}

/// Read-only export for timeline renderers (tracking page, receipts).
pub fn timeline_entries(checkpoints: &[Checkpoint]) -> Vec<TimelineEntry> {
    most_recent_first(checkpoints)
        .into_iter()
        .map(TimelineEntry::from_checkpoint)
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use uuid::Uuid;

    use super::*;

    fn checkpoint(status: CheckpointStatus, ts: &str, coords: Option<(f64, f64)>) -> Checkpoint {
        Checkpoint {
            id: Uuid::new_v4(),
            location: "Depot".to_string(),
            description: "scan".to_string(),
            status,
            timestamp: ts.parse::<DateTime<Utc>>().unwrap(),
            coordinates: coords.map(|(lat, lng)| Coordinates::new(lat, lng)),
        }
    }

    fn journey() -> Vec<Checkpoint> {
        vec![
            checkpoint(CheckpointStatus::Pending, "2024-01-01T00:00:00Z", Some((52.52, 13.40))),
            checkpoint(CheckpointStatus::InTransit, "2024-01-02T00:00:00Z", None),
            checkpoint(CheckpointStatus::Delivered, "2024-01-03T00:00:00Z", Some((48.85, 2.35))),
        ]
    }

    #[test]
    fn current_status_is_last_checkpoint() {
        let checkpoints = journey();
        let status = current_status(&checkpoints).unwrap();

        assert_eq!(status, &CheckpointStatus::Delivered);
        assert_eq!(progress_percent(status), 100);
    }

    #[test]
    fn current_status_of_empty_list_is_none() {
        assert!(current_status(&[]).is_none());
    }

    #[test]
    fn path_skips_checkpoints_without_coordinates() {
        let checkpoints = journey();
        let path = build_path(&checkpoints, None);

        assert_eq!(path.len(), 2);
        assert_eq!(path[0], Coordinates::new(52.52, 13.40));
        assert_eq!(path[1], Coordinates::new(48.85, 2.35));
    }

    #[test]
    fn path_skips_invalid_coordinates() {
        let mut checkpoints = journey();
        checkpoints[1].coordinates = Some(Coordinates::new(200.0, 10.0));

        assert_eq!(build_path(&checkpoints, None).len(), 2);
    }

    #[test]
    fn path_appends_valid_current_location_only() {
        let checkpoints = journey();
        let here = Location {
            coordinates: Coordinates::new(48.86, 2.36),
            address: "Paris".to_string(),
        };
        let nowhere = Location {
            coordinates: Coordinates::new(f64::NAN, 0.0),
            address: "?".to_string(),
        };

        let path = build_path(&checkpoints, Some(&here));
        assert_eq!(path.len(), 3);
        assert_eq!(path.last(), Some(&here.coordinates));

        assert_eq!(build_path(&checkpoints, Some(&nowhere)).len(), 2);
    }

    #[test]
    fn derives_location_from_latest_checkpoint_with_coordinates() {
        let mut checkpoints = journey();
        checkpoints[2].coordinates = None;
        checkpoints[0].location = "Berlin".to_string();

        let location = derive_current_location(&checkpoints).unwrap();
        assert_eq!(location.address, "Berlin");
        assert_eq!(location.coordinates, Coordinates::new(52.52, 13.40));
    }

    #[test]
    fn most_recent_first_reverses_ascending_list() {
        let checkpoints = journey();
        let view = most_recent_first(&checkpoints);

        assert_eq!(view[0].status, CheckpointStatus::Delivered);
        assert_eq!(view[2].status, CheckpointStatus::Pending);
    }

    #[test]
    fn sort_restores_ascending_order() {
        let mut checkpoints = journey();
        checkpoints.reverse();
        assert!(!is_ascending(&checkpoints));

        sort_ascending(&mut checkpoints);
        assert!(is_ascending(&checkpoints));
        assert_eq!(checkpoints[0].status, CheckpointStatus::Pending);
    }

    #[test]
    fn timeline_entries_carry_labels_and_colors() {
        let entries = timeline_entries(&journey());

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].label, "Delivered");
        assert_eq!(entries[0].color, StatusColor::Green);
        assert_eq!(entries[2].label, "Pending");
    }
}
