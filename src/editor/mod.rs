pub mod draft;
pub mod package_form;
pub mod session;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, Field, ValidationError};
use crate::models::checkpoint::Checkpoint;
use crate::models::package::Package;
use crate::store::PackageStore;

pub use draft::{CheckpointDraft, EditorOptions};
pub use package_form::{FormSection, PackageForm};
pub use session::{CheckpointEditor, EditorMode};

/// Result of a persisted checkpoint change.
#[derive(Debug, Clone)]
pub struct CheckpointChange {
    pub package: Package,
    pub checkpoint: Checkpoint,
}

/// Validates `draft` and inserts it into `package`, keeping ascending order.
///
/// A draft without a timestamp is stamped with `now` and therefore appended.
pub fn apply_add(
    package: &mut Package,
    draft: CheckpointDraft,
    options: &EditorOptions,
    now: DateTime<Utc>,
) -> Result<Checkpoint, ValidationError> {
    draft.validate(options)?;

    let checkpoint = Checkpoint {
        id: Uuid::new_v4(),
        location: draft.location.trim().to_string(),
        description: draft.description.trim().to_string(),
        status: draft.status,
        timestamp: draft.timestamp.unwrap_or(now),
        coordinates: draft.coordinates,
    };

    let position = package
        .checkpoints
        .partition_point(|existing| existing.timestamp <= checkpoint.timestamp);
    package.checkpoints.insert(position, checkpoint.clone());
    package.refresh_derived();

    Ok(checkpoint)
}

/// Replaces the checkpoint in place. Its list position never changes, so a
/// new timestamp must still fall between its neighbours.
pub fn apply_update(
    package: &mut Package,
    checkpoint_id: Uuid,
    draft: CheckpointDraft,
    options: &EditorOptions,
) -> Result<Checkpoint, AppError> {
    draft.validate(options)?;

    let position = package.checkpoint_position(checkpoint_id).ok_or_else(|| {
        AppError::NotFound(format!("checkpoint {checkpoint_id} not found"))
    })?;

    let timestamp = draft
        .timestamp
        .unwrap_or(package.checkpoints[position].timestamp);

    let after_previous = position == 0 || package.checkpoints[position - 1].timestamp <= timestamp;
    let before_next = package
        .checkpoints
        .get(position + 1)
        .is_none_or(|next| timestamp <= next.timestamp);
    if !after_previous || !before_next {
        return Err(ValidationError::out_of_order(Field::Timestamp).into());
    }

    let checkpoint = Checkpoint {
        id: checkpoint_id,
        location: draft.location.trim().to_string(),
        description: draft.description.trim().to_string(),
        status: draft.status,
        timestamp,
        coordinates: draft.coordinates,
    };

    package.checkpoints[position] = checkpoint.clone();
    package.refresh_derived();

    Ok(checkpoint)
}

pub fn apply_delete(package: &mut Package, checkpoint_id: Uuid) -> Result<Checkpoint, AppError> {
    let position = package.checkpoint_position(checkpoint_id).ok_or_else(|| {
        AppError::NotFound(format!("checkpoint {checkpoint_id} not found"))
    })?;

    let removed = package.checkpoints.remove(position);
    package.refresh_derived();

    Ok(removed)
}

pub async fn add_checkpoint<S: PackageStore>(
    store: &S,
    tracking_number: &str,
    draft: CheckpointDraft,
    options: &EditorOptions,
) -> Result<CheckpointChange, AppError> {
    draft.validate(options)?;

    let mut package = store.fetch_package(tracking_number).await?;
    let checkpoint = apply_add(&mut package, draft, options, Utc::now())?;
    persist(store, &package).await?;

    info!(
        tracking_number = %tracking_number,
        checkpoint_id = %checkpoint.id,
        status = %checkpoint.status,
        "checkpoint added"
    );

    Ok(CheckpointChange {
        package,
        checkpoint,
    })
}

pub async fn update_checkpoint<S: PackageStore>(
    store: &S,
    tracking_number: &str,
    checkpoint_id: Uuid,
    draft: CheckpointDraft,
    options: &EditorOptions,
) -> Result<CheckpointChange, AppError> {
    draft.validate(options)?;

    let mut package = store.fetch_package(tracking_number).await?;
    let checkpoint = apply_update(&mut package, checkpoint_id, draft, options)?;
    persist(store, &package).await?;

    info!(
        tracking_number = %tracking_number,
        checkpoint_id = %checkpoint_id,
        "checkpoint updated"
    );

    Ok(CheckpointChange {
        package,
        checkpoint,
    })
}

pub async fn delete_checkpoint<S: PackageStore>(
    store: &S,
    tracking_number: &str,
    checkpoint_id: Uuid,
) -> Result<CheckpointChange, AppError> {
    let mut package = store.fetch_package(tracking_number).await?;
    let checkpoint = apply_delete(&mut package, checkpoint_id)?;
    persist(store, &package).await?;

    info!(
        tracking_number = %tracking_number,
        checkpoint_id = %checkpoint_id,
        "checkpoint deleted"
    );

    Ok(CheckpointChange {
        package,
        checkpoint,
    })
}

/// Copies an existing checkpoint into an editable draft.
pub fn load_for_edit(package: &Package, checkpoint_id: Uuid) -> Result<CheckpointDraft, AppError> {
    package
        .checkpoint(checkpoint_id)
        .map(CheckpointDraft::from_checkpoint)
        .ok_or_else(|| AppError::NotFound(format!("checkpoint {checkpoint_id} not found")))
}

async fn persist<S: PackageStore>(store: &S, package: &Package) -> Result<(), AppError> {
    store.update_package(package).await.map_err(|err| {
        warn!(
            tracking_number = %package.tracking_number,
            error = %err,
            "checkpoint change not persisted"
        );
        AppError::from(err)
    })
}
