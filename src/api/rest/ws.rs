use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use futures::SinkExt;
use futures::StreamExt;
use serde_json::json;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{info, warn};

use crate::state::AppState;
use crate::tracking::{RefreshUpdate, spawn_refresh};

pub async fn events_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_events(socket, state))
}

/// Live tracking page feed: re-fetches the package on the configured interval
/// until the client goes away.
pub async fn live_tracking_handler(
    ws: WebSocketUpgrade,
    Path(tracking_number): Path<String>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_live(socket, state, tracking_number))
}

async fn handle_events(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let mut events = BroadcastStream::new(state.events_tx.subscribe());

    info!("websocket client connected");

    let send_task = tokio::spawn(async move {
        while let Some(item) = events.next().await {
            let event = match item {
                Ok(event) => event,
                Err(err) => {
                    warn!(error = %err, "websocket subscriber lagged; events dropped");
                    continue;
                }
            };

            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(err) => {
                    warn!(error = %err, "failed to serialize tracking event for ws");
                    continue;
                }
            };

            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let recv_task = tokio::spawn(async move {
        while let Some(Ok(_msg)) = receiver.next().await {}
    });

    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    info!("websocket client disconnected");
}

async fn handle_live(socket: WebSocket, state: Arc<AppState>, tracking_number: String) {
    let (mut sender, mut receiver) = socket.split();
    let mut refresh = spawn_refresh(
        state.tracking.clone(),
        tracking_number.clone(),
        state.refresh_interval,
    );

    info!(tracking_number = %tracking_number, "live tracking client connected");

    loop {
        tokio::select! {
            update = refresh.next() => {
                let Some(update) = update else { break };
                let payload = match &update {
                    RefreshUpdate::Fresh(view) => serde_json::to_string(view),
                    RefreshUpdate::Failed(message) => serde_json::to_string(&json!({ "error": message })),
                };

                match payload {
                    Ok(json) => {
                        if sender.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(err) => warn!(error = %err, "failed to serialize tracking view for ws"),
                }
            }
            msg = receiver.next() => {
                if !matches!(msg, Some(Ok(_))) {
                    break;
                }
            }
        }
    }

    info!(tracking_number = %tracking_number, "live tracking client disconnected");
}
