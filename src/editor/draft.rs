use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Field, ValidationError};
use crate::models::checkpoint::{Checkpoint, CheckpointStatus};
use crate::models::coordinates::Coordinates;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditorOptions {
    /// Map-based location entry: every checkpoint must carry coordinates.
    pub require_coordinates: bool,
}

/// Editable checkpoint fields, before an id or timestamp is assigned.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CheckpointDraft {
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: CheckpointStatus,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
}

impl CheckpointDraft {
    pub fn from_checkpoint(checkpoint: &Checkpoint) -> Self {
        Self {
            location: checkpoint.location.clone(),
            description: checkpoint.description.clone(),
            status: checkpoint.status.clone(),
            timestamp: Some(checkpoint.timestamp),
            coordinates: checkpoint.coordinates,
        }
    }

    /// Every failing field, in form order.
    pub fn field_errors(&self, options: &EditorOptions) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.location.trim().is_empty() {
            errors.push(ValidationError::required(Field::Location));
        }

        if self.description.trim().is_empty() {
            errors.push(ValidationError::required(Field::Description));
        }

        match &self.coordinates {
            None if options.require_coordinates => {
                errors.push(ValidationError::required(Field::Coordinates));
            }
            Some(coordinates) if !coordinates.is_valid() => {
                errors.push(ValidationError::invalid(Field::Coordinates));
            }
            _ => {}
        }

        if !self.status.is_known() {
            errors.push(ValidationError::invalid(Field::Status));
        }

        errors
    }

    /// First failing field, if any.
    pub fn validate(&self, options: &EditorOptions) -> Result<(), ValidationError> {
        match self.field_errors(options).into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
