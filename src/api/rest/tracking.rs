use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::get;

use crate::error::AppError;
use crate::state::AppState;
use crate::tracking::TrackingView;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/track/:tracking_number", get(track_package))
}

async fn track_package(
    State(state): State<Arc<AppState>>,
    Path(tracking_number): Path<String>,
) -> Result<Json<TrackingView>, AppError> {
    let result = state.tracking.track(&tracking_number).await;
    state.metrics.record_lookup(&result);

    Ok(Json(result?))
}
