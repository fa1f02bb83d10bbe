//! WebSocket transport binding.
//!
//! The transport's job is deliberately thin: accept a socket, mint a
//! [`ConnectionId`], decode inbound frames into [`ClientEvent`]s for the
//! lobby, and drain the connection's [`Outbox`] back to the socket. All
//! pairing decisions live in the lobby actor.
//!
//! Each connection runs two tasks: the reader (this function's body) and
//! a spawned writer. Splitting them keeps lobby-originated sends off the
//! pairing critical path - the lobby only ever pushes into the outbox
//! channel.

use crate::actors::{LobbyHandle, Outbox};
use crate::session::{ConnectionHandle, ConnectionId};

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use duet_protocol::ClientEvent;
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, warn};

/// Outbox depth per connection.
const OUTBOX_CAPACITY: usize = 64;

/// Create the WebSocket router (`GET /ws` upgrades).
pub fn ws_router(lobby: LobbyHandle) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .with_state(lobby)
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(lobby): State<LobbyHandle>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, lobby))
}

/// Drive one client connection until it closes, then report the
/// disconnect to the lobby.
async fn handle_socket(socket: WebSocket, lobby: LobbyHandle) {
    let conn_id = ConnectionId::new();
    let (outbox, mut outbox_rx) = Outbox::new(OUTBOX_CAPACITY);
    let conn = ConnectionHandle::new(conn_id, outbox);

    debug!(target: "duet.ws", conn = %conn_id, "connection accepted");

    let (mut ws_tx, mut ws_rx) = socket.split();

    // Writer: drain the outbox to the socket. Exits when the socket or
    // the outbox closes.
    let writer = tokio::spawn(async move {
        while let Some(event) = outbox_rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(e) => {
                    warn!(target: "duet.ws", error = %e, "failed to encode outbound event");
                    continue;
                }
            };
            if ws_tx.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    // Reader: decode frames and dispatch to the lobby.
    while let Some(frame) = ws_rx.next().await {
        match frame {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => dispatch(&lobby, &conn, event).await,
                Err(e) => {
                    // Malformed input from a public endpoint: drop the
                    // frame, keep the connection
                    debug!(
                        target: "duet.ws",
                        conn = %conn_id,
                        error = %e,
                        "ignoring malformed frame"
                    );
                }
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {} // binary/ping/pong: nothing to do
            Err(e) => {
                debug!(target: "duet.ws", conn = %conn_id, error = %e, "socket error");
                break;
            }
        }
    }

    // The transport-originated disconnect; runs the same teardown as an
    // explicit leave.
    if let Err(e) = lobby.disconnect(conn_id).await {
        warn!(target: "duet.ws", conn = %conn_id, error = %e, "disconnect notification failed");
    }

    debug!(target: "duet.ws", conn = %conn_id, "connection closed");
    writer.abort();
}

/// Route one decoded client event.
async fn dispatch(lobby: &LobbyHandle, conn: &ConnectionHandle, event: ClientEvent) {
    match event {
        ClientEvent::FindPartner => {
            // Rejections (find while waiting/paired) are local misuse;
            // the protocol has no error event, so they are only logged
            if let Err(e) = lobby.find_partner(conn.clone()).await {
                warn!(
                    target: "duet.ws",
                    conn = %conn.id(),
                    error = %e,
                    "findPartner rejected"
                );
            }
        }

        ClientEvent::LeaveChat => {
            if let Err(e) = lobby.leave(conn.id()).await {
                warn!(target: "duet.ws", conn = %conn.id(), error = %e, "leave failed");
            }
        }

        content => {
            if let Some(relayed) = content.into_relayed() {
                if let Err(e) = lobby.relay(conn.id(), relayed).await {
                    warn!(target: "duet.ws", conn = %conn.id(), error = %e, "relay failed");
                }
            }
        }
    }
}
