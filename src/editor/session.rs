use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::editor::{CheckpointDraft, EditorOptions, apply_add, apply_delete, apply_update};
use crate::error::{AppError, Field, ValidationError};
use crate::models::checkpoint::Checkpoint;
use crate::models::package::Package;
use crate::store::PackageStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
    Idle,
    Creating,
    Editing(Uuid),
}

struct EditorState {
    package: Package,
    mode: EditorMode,
    field_errors: Vec<ValidationError>,
}

/// Checkpoint editing session for one package.
///
/// Holds a local copy of the package that only changes after the store has
/// accepted a write. At most one mutation may be in flight at a time.
pub struct CheckpointEditor<S> {
    store: Arc<S>,
    options: EditorOptions,
    state: Mutex<EditorState>,
    in_flight: AtomicBool,
}

struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<S: PackageStore> CheckpointEditor<S> {
    pub async fn open(
        store: Arc<S>,
        tracking_number: &str,
        options: EditorOptions,
    ) -> Result<Self, AppError> {
        let package = store.fetch_package(tracking_number).await?;

        Ok(Self {
            store,
            options,
            state: Mutex::new(EditorState {
                package,
                mode: EditorMode::Idle,
                field_errors: Vec::new(),
            }),
            in_flight: AtomicBool::new(false),
        })
    }

    pub fn mode(&self) -> EditorMode {
        self.lock().mode
    }

    pub fn package(&self) -> Package {
        self.lock().package.clone()
    }

    pub fn checkpoints(&self) -> Vec<Checkpoint> {
        self.lock().package.checkpoints.clone()
    }

    /// Fields flagged by the last rejected submit.
    pub fn field_errors(&self) -> Vec<ValidationError> {
        self.lock().field_errors.clone()
    }

    pub fn has_error(&self, field: Field) -> bool {
        self.lock().field_errors.iter().any(|err| err.field == field)
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn begin_create(&self) -> Result<(), AppError> {
        let mut state = self.lock();
        ensure_idle(state.mode)?;
        state.mode = EditorMode::Creating;
        state.field_errors.clear();
        Ok(())
    }

    pub fn begin_edit(&self, checkpoint_id: Uuid) -> Result<CheckpointDraft, AppError> {
        let mut state = self.lock();
        ensure_idle(state.mode)?;
        let draft = super::load_for_edit(&state.package, checkpoint_id)?;
        state.mode = EditorMode::Editing(checkpoint_id);
        state.field_errors.clear();
        Ok(draft)
    }

    pub fn cancel(&self) {
        let mut state = self.lock();
        state.mode = EditorMode::Idle;
        state.field_errors.clear();
    }

    pub fn load_for_edit(&self, checkpoint_id: Uuid) -> Result<CheckpointDraft, AppError> {
        super::load_for_edit(&self.lock().package, checkpoint_id)
    }

    /// Submits the draft for whatever the editor is currently doing and
    /// returns to `Idle` once it is stored.
    pub async fn submit(&self, draft: CheckpointDraft) -> Result<Checkpoint, AppError> {
        let checkpoint = match self.mode() {
            EditorMode::Creating => self.add_checkpoint(draft).await?,
            EditorMode::Editing(checkpoint_id) => {
                self.update_checkpoint(checkpoint_id, draft).await?
            }
            EditorMode::Idle => {
                return Err(AppError::BadRequest(
                    "no checkpoint is being created or edited".to_string(),
                ));
            }
        };

        self.lock().mode = EditorMode::Idle;
        Ok(checkpoint)
    }

    pub async fn add_checkpoint(&self, draft: CheckpointDraft) -> Result<Checkpoint, AppError> {
        let _guard = self.begin_mutation()?;
        if let Err(err) = self.check_draft(&draft) {
            return Err(err.into());
        }

        let mut next = self.package();
        let checkpoint = apply_add(&mut next, draft, &self.options, Utc::now())?;
        self.commit(next).await?;

        Ok(checkpoint)
    }

    pub async fn update_checkpoint(
        &self,
        checkpoint_id: Uuid,
        draft: CheckpointDraft,
    ) -> Result<Checkpoint, AppError> {
        let _guard = self.begin_mutation()?;
        if let Err(err) = self.check_draft(&draft) {
            return Err(err.into());
        }

        let mut next = self.package();
        let checkpoint = match apply_update(&mut next, checkpoint_id, draft, &self.options) {
            Ok(checkpoint) => checkpoint,
            Err(AppError::Validation(err)) => {
                self.lock().field_errors = vec![err.clone()];
                return Err(err.into());
            }
            Err(err) => return Err(err),
        };
        self.commit(next).await?;

        Ok(checkpoint)
    }

    pub async fn delete_checkpoint(&self, checkpoint_id: Uuid) -> Result<Checkpoint, AppError> {
        let _guard = self.begin_mutation()?;

        let mut next = self.package();
        let removed = apply_delete(&mut next, checkpoint_id)?;
        self.commit(next).await?;

        {
            let mut state = self.lock();
            if state.mode == EditorMode::Editing(checkpoint_id) {
                state.mode = EditorMode::Idle;
            }
        }

        Ok(removed)
    }

    fn begin_mutation(&self) -> Result<InFlight<'_>, AppError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| AppError::Busy)?;
        Ok(InFlight(&self.in_flight))
    }

    /// Records per-field flags; the mode is left as is so the form stays open.
    fn check_draft(&self, draft: &CheckpointDraft) -> Result<(), ValidationError> {
        let errors = draft.field_errors(&self.options);
        let first = errors.first().cloned();
        self.lock().field_errors = errors;

        match first {
            Some(err) => {
                debug!(code = %err.code(), "checkpoint draft rejected");
                Err(err)
            }
            None => Ok(()),
        }
    }

    async fn commit(&self, next: Package) -> Result<(), AppError> {
        if let Err(err) = self.store.update_package(&next).await {
            warn!(
                tracking_number = %next.tracking_number,
                error = %err,
                "checkpoint change not persisted"
            );
            return Err(err.into());
        }

        let mut state = self.lock();
        state.package = next;
        state.field_errors.clear();
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, EditorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn ensure_idle(mode: EditorMode) -> Result<(), AppError> {
    match mode {
        EditorMode::Idle => Ok(()),
        EditorMode::Creating => Err(AppError::Conflict(
            "a checkpoint is already being created".to_string(),
        )),
        EditorMode::Editing(id) => Err(AppError::Conflict(format!(
            "checkpoint {id} is already being edited"
        ))),
    }
}
