//! WebSocket stream of simulation events

use agentsim_core::SimulationEvent;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing::{debug, warn};

use crate::api::AppState;

/// Event categories a client can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventChannel {
    Tick,
    Alert,
    Lifecycle,
}

impl EventChannel {
    pub fn of(event: &SimulationEvent) -> Self {
        match event {
            SimulationEvent::Tick { .. } => EventChannel::Tick,
            SimulationEvent::Alert { .. } => EventChannel::Alert,
            SimulationEvent::Lifecycle { .. } => EventChannel::Lifecycle,
        }
    }
}

/// Messages a client may send over the socket
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Restrict the stream to these channels; an empty list means everything
    Subscribe { channels: Vec<EventChannel> },
}

/// WebSocket handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let rx = state.core.subscribe();
    ws.on_upgrade(move |socket| handle_socket(socket, rx))
}

fn is_wanted(filter: &HashSet<EventChannel>, event: &SimulationEvent) -> bool {
    filter.is_empty() || filter.contains(&EventChannel::of(event))
}

async fn handle_socket(socket: WebSocket, mut rx: broadcast::Receiver<SimulationEvent>) {
    let (mut sender, mut receiver) = socket.split();
    let (filter_tx, filter_rx) = watch::channel(HashSet::new());

    // Forward broadcast events to the client
    let send_task = tokio::spawn(async move {
        loop {
            let event = match rx.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "WebSocket client lagging, events dropped");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };

            if !is_wanted(&filter_rx.borrow(), &event) {
                continue;
            }
            if let Ok(json) = serde_json::to_string(&event) {
                if sender.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
        }
    });

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::Subscribe { channels }) => {
                    debug!(channels = ?channels, "WebSocket subscription updated");
                    let _ = filter_tx.send(channels.into_iter().collect());
                }
                Err(e) => debug!(error = %e, "Ignoring unrecognized WebSocket message"),
            },
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => {}
        }
    }

    send_task.abort();
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentsim_core::TickReport;

    #[test]
    fn test_empty_filter_passes_everything() {
        let event = SimulationEvent::Lifecycle { running: true };
        assert!(is_wanted(&HashSet::new(), &event));
    }

    #[test]
    fn test_filter_by_channel() {
        let filter: HashSet<_> = [EventChannel::Alert].into_iter().collect();
        let tick = SimulationEvent::Tick {
            report: TickReport::default(),
        };
        assert!(!is_wanted(&filter, &tick));
        assert!(!is_wanted(
            &filter,
            &SimulationEvent::Lifecycle { running: false }
        ));
    }

    #[test]
    fn test_parse_subscribe() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"subscribe","channels":["tick","alert"]}"#).unwrap();
        let ClientMessage::Subscribe { channels } = msg;
        assert_eq!(channels, vec![EventChannel::Tick, EventChannel::Alert]);
    }
}
