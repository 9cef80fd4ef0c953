//! WebSocket session loop.

use crate::event::Room;
use crate::hub::Hub;
use axum::extract::ws::{Message, WebSocket};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

/// Drive one websocket session until the client disconnects.
///
/// The session subscribes to the hub and forwards only envelopes whose room
/// matches one of the caller's joined rooms. Inbound messages are ignored
/// except for close frames; the channel is push-only.
pub async fn serve_socket(mut socket: WebSocket, rooms: Vec<Room>, hub: Hub) {
    let mut rx = hub.subscribe();
    debug!(
        "WebSocket session opened for rooms [{}]",
        rooms
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );

    loop {
        tokio::select! {
            received = rx.recv() => {
                match received {
                    Ok(envelope) => {
                        if !rooms.contains(&envelope.room) {
                            continue;
                        }

                        let payload = match serde_json::to_string(&envelope.event) {
                            Ok(p) => p,
                            Err(e) => {
                                warn!("Failed to serialize realtime event: {}", e);
                                continue;
                            }
                        };

                        if socket.send(Message::Text(payload.into())).await.is_err() {
                            // Client went away mid-send
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("WebSocket session lagged, skipped {} events", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            inbound = socket.recv() => {
                match inbound {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    // Push-only channel: drop anything else the client sends
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    debug!("WebSocket session closed");
}
