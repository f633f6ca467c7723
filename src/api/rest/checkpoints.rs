use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use uuid::Uuid;

use crate::editor::{self, CheckpointDraft};
use crate::error::AppError;
use crate::models::checkpoint::Checkpoint;
use crate::models::event::TrackingEventKind;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/packages/:tracking_number/checkpoints",
            post(add_checkpoint),
        )
        .route(
            "/packages/:tracking_number/checkpoints/:checkpoint_id",
            get(load_checkpoint)
                .put(update_checkpoint)
                .delete(delete_checkpoint),
        )
}

async fn add_checkpoint(
    State(state): State<Arc<AppState>>,
    Path(tracking_number): Path<String>,
    Json(draft): Json<CheckpointDraft>,
) -> Result<Json<Checkpoint>, AppError> {
    let _guard = state.lock_package(tracking_number.trim()).await;
    let result = editor::add_checkpoint(
        state.store.as_ref(),
        tracking_number.trim(),
        draft,
        &state.editor_options,
    )
    .await;
    state.metrics.record_mutation("add", &result);

    let change = result?;
    state.publish(
        TrackingEventKind::CheckpointAdded,
        &change.package,
        Some(&change.checkpoint),
    );

    Ok(Json(change.checkpoint))
}

async fn load_checkpoint(
    State(state): State<Arc<AppState>>,
    Path((tracking_number, checkpoint_id)): Path<(String, Uuid)>,
) -> Result<Json<CheckpointDraft>, AppError> {
    let package = state.tracking.fetch_package(&tracking_number).await?;
    let draft = editor::load_for_edit(&package, checkpoint_id)?;
    Ok(Json(draft))
}

async fn update_checkpoint(
    State(state): State<Arc<AppState>>,
    Path((tracking_number, checkpoint_id)): Path<(String, Uuid)>,
    Json(draft): Json<CheckpointDraft>,
) -> Result<Json<Checkpoint>, AppError> {
    let _guard = state.lock_package(tracking_number.trim()).await;
    let result = editor::update_checkpoint(
        state.store.as_ref(),
        tracking_number.trim(),
        checkpoint_id,
        draft,
        &state.editor_options,
    )
    .await;
    state.metrics.record_mutation("update", &result);

    let change = result?;
    state.publish(
        TrackingEventKind::CheckpointUpdated,
        &change.package,
        Some(&change.checkpoint),
    );

    Ok(Json(change.checkpoint))
}

async fn delete_checkpoint(
    State(state): State<Arc<AppState>>,
    Path((tracking_number, checkpoint_id)): Path<(String, Uuid)>,
) -> Result<Json<Checkpoint>, AppError> {
    let _guard = state.lock_package(tracking_number.trim()).await;
    let result =
        editor::delete_checkpoint(state.store.as_ref(), tracking_number.trim(), checkpoint_id)
            .await;
    state.metrics.record_mutation("delete", &result);

    let change = result?;
    state.publish(
        TrackingEventKind::CheckpointDeleted,
        &change.package,
        Some(&change.checkpoint),
    );

    Ok(Json(change.checkpoint))
}
