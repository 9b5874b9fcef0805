use std::sync::Arc;

use axum::Router;
use axum::extract::ws::{Message as WsMessage, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use crate::services::EventBus;

#[derive(Clone)]
pub struct WsState {
    pub event_bus: Arc<EventBus>,
}

pub fn ws_router(state: WsState) -> Router {
    Router::new().route("/ws", get(ws_handler)).with_state(state)
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<WsState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
}

async fn handle_websocket(socket: WebSocket, state: WsState) {
    let client_id = Uuid::new_v4().to_string();
    let (mut sender, mut receiver) = socket.split();
    let mut events = state.event_bus.subscribe();

    tracing::info!("WebSocket client {} connected", client_id);

    let client_id_send = client_id.clone();
    let send_task = tokio::spawn(async move {
        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                // The client fell behind and the channel dropped the oldest
                // events; skip the gap and keep streaming.
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        "WebSocket client {} lagged, {} events dropped",
                        client_id_send,
                        skipped
                    );
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            let payload = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    tracing::warn!("Failed to serialize event: {}", e);
                    continue;
                }
            };

            if sender.send(WsMessage::Text(payload)).await.is_err() {
                break;
            }
        }
    });

    // Subscribers only listen; inbound frames are drained to keep the
    // connection alive and observe the close handshake.
    while let Some(result) = receiver.next().await {
        match result {
            Ok(WsMessage::Close(_)) => {
                tracing::info!("WebSocket client {} closed", client_id);
                break;
            }
            Err(e) => {
                tracing::warn!("WebSocket error for client {}: {}", client_id, e);
                break;
            }
            _ => {}
        }
    }

    send_task.abort();

    tracing::info!("WebSocket client {} disconnected", client_id);
}
