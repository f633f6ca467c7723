use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use chrono::Utc;
use tracing::info;

use crate::editor::PackageForm;
use crate::editor::package_form::PackagePayload;
use crate::error::AppError;
use crate::models::event::TrackingEventKind;
use crate::models::package::Package;
use crate::state::AppState;
use crate::store::PackageStore;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/packages", post(create_package).get(list_packages))
        .route(
            "/packages/:tracking_number",
            get(get_package).put(update_package).delete(delete_package),
        )
}

async fn create_package(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PackagePayload>,
) -> Result<Json<Package>, AppError> {
    let form = PackageForm::from_payload(payload)?;
    let package = form.into_new_package(&state.tracking_prefix, &state.editor_options, Utc::now())?;

    state.store.insert_package(&package).await?;
    state.sync_package_gauge();
    state.publish(
        TrackingEventKind::PackageCreated,
        &package,
        package.checkpoints.last(),
    );

    info!(
        tracking_number = %package.tracking_number,
        checkpoints = package.checkpoints.len(),
        "package created"
    );

    Ok(Json(package))
}

async fn list_packages(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Package>>, AppError> {
    let packages = state.store.list_packages().await?;
    Ok(Json(packages))
}

async fn get_package(
    State(state): State<Arc<AppState>>,
    Path(tracking_number): Path<String>,
) -> Result<Json<Package>, AppError> {
    let package = state.tracking.fetch_package(&tracking_number).await?;
    Ok(Json(package))
}

async fn update_package(
    State(state): State<Arc<AppState>>,
    Path(tracking_number): Path<String>,
    Json(payload): Json<PackagePayload>,
) -> Result<Json<Package>, AppError> {
    let form = PackageForm::from_payload(payload)?;
    let _guard = state.lock_package(tracking_number.trim()).await;
    let existing = state.tracking.fetch_package(&tracking_number).await?;
    let package = form.apply_to(&existing, Utc::now())?;

    state.store.update_package(&package).await?;
    state.publish(TrackingEventKind::PackageUpdated, &package, None);

    info!(tracking_number = %package.tracking_number, "package updated");

    Ok(Json(package))
}

async fn delete_package(
    State(state): State<Arc<AppState>>,
    Path(tracking_number): Path<String>,
) -> Result<Json<Package>, AppError> {
    let guard = state.lock_package(tracking_number.trim()).await;
    let removed = state.store.delete_package(tracking_number.trim()).await?;
    drop(guard);
    state.forget_package_lock(&removed.tracking_number);
    state.sync_package_gauge();
    state.publish(TrackingEventKind::PackageDeleted, &removed, None);

    info!(
        tracking_number = %removed.tracking_number,
        checkpoints = removed.checkpoints.len(),
        images = removed.images.len(),
        "package deleted"
    );

    Ok(Json(removed))
}
