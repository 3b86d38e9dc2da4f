//! WebSocket live feed — commuter apps subscribe here and receive every
//! accepted position update as a JSON message.
//!
//! Fan-out goes through a tokio broadcast channel; a slow consumer that
//! falls behind the channel capacity just misses the lagged updates and
//! keeps receiving from the current position.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::broadcast;

use daladala_core::{RawReport, VehicleId};

use crate::web::AppState;

/// One accepted update, as pushed to live subscribers.
#[derive(Debug, Clone, Serialize)]
pub struct LiveUpdate {
    pub vehicle_id: VehicleId,
    pub lat: f64,
    pub lon: f64,
    pub heading_deg: Option<f64>,
    pub speed_kmh: Option<f64>,
    pub recorded_at: f64,
    pub received_at: f64,
    pub sequence: u64,
}

impl LiveUpdate {
    pub fn from_raw(raw: &RawReport, received_at: f64) -> Self {
        LiveUpdate {
            vehicle_id: raw.vehicle_id.clone(),
            lat: raw.lat,
            lon: raw.lon,
            heading_deg: raw.heading_deg,
            speed_kmh: raw.speed_kmh,
            recorded_at: raw.recorded_at,
            received_at,
            sequence: 0,
        }
    }

    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }
}

/// GET /ws — upgrade and stream accepted updates.
pub async fn ws_feed(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let rx = state.updates.subscribe();
    ws.on_upgrade(move |socket| stream_updates(socket, rx))
}

async fn stream_updates(socket: WebSocket, mut rx: broadcast::Receiver<LiveUpdate>) {
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            update = rx.recv() => match update {
                Ok(update) => {
                    let text = match serde_json::to_string(&update) {
                        Ok(t) => t,
                        Err(err) => {
                            tracing::warn!(error = %err, "failed to serialize live update");
                            continue;
                        }
                    };
                    if sender.send(Message::Text(text)).await.is_err() {
                        break; // client gone
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "live feed subscriber lagging");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                // Ignore anything the client sends; drop on close or error
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
}
