//! WebSocket stream of committed notifications

use crate::api::handlers::{ApiState, SharedService};
use crate::events::Notification;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;

/// Messages pushed to WebSocket clients
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum WsMessage {
    /// Connection established
    Connected { message: String, next_sequence: u64 },
    /// A state change was committed
    Notification(Notification),
    /// The client fell behind and missed notifications
    Lagged { skipped: u64 },
}

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<ApiState>) -> impl IntoResponse {
    let service = state.service.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, service))
}

/// Handle a WebSocket connection
async fn handle_socket(socket: WebSocket, service: SharedService) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe before reading the sequence so nothing falls in between
    let mut rx = service.subscribe();
    let next_sequence = service.next_sequence().await;

    let welcome = WsMessage::Connected {
        message: "Connected to escrow-registry notifications".to_string(),
        next_sequence,
    };
    if let Ok(json) = serde_json::to_string(&welcome) {
        let _ = sender.send(Message::Text(json.into())).await;
    }

    let mut send_task = tokio::spawn(async move {
        loop {
            let message = match rx.recv().await {
                Ok(notification) => WsMessage::Notification(notification),
                Err(RecvError::Lagged(skipped)) => WsMessage::Lagged { skipped },
                Err(RecvError::Closed) => break,
            };

            if let Ok(json) = serde_json::to_string(&message) {
                if sender.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => break,
                Ok(Message::Text(text)) => {
                    log::debug!("Received text message: {}", text);
                }
                Err(e) => {
                    log::warn!("WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
        }
        _ = &mut recv_task => {
            send_task.abort();
        }
    }

    log::info!("WebSocket connection closed");
}
