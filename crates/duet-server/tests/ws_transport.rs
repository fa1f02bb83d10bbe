//! Transport-level tests: real sockets against the full router.
//!
//! These exercise the whole path - WebSocket upgrade, frame decoding,
//! lobby dispatch, outbox draining - with `tokio-tungstenite` clients.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use duet_protocol::{ClientEvent, ServerEvent, STATUS_LOOKING, STATUS_WAITING};
use duet_server::actors::LobbyActor;
use duet_server::observability::{health_router, HealthState};
use duet_server::ws::ws_router;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn start_server() -> SocketAddr {
    let (lobby, _task) = LobbyActor::spawn(CancellationToken::new());
    let app = ws_router(lobby).merge(health_router(Arc::new(HealthState::new())));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn connect(addr: SocketAddr) -> Ws {
    let (ws, _response) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    ws
}

async fn send(ws: &mut Ws, event: &ClientEvent) {
    let text = serde_json::to_string(event).unwrap();
    ws.send(Message::Text(text)).await.unwrap();
}

async fn next_event(ws: &mut Ws) -> ServerEvent {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for frame")
            .expect("socket closed")
            .unwrap();
        if let Message::Text(text) = frame {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

#[tokio::test]
async fn test_pair_chat_and_leave_over_websocket() {
    let addr = start_server().await;
    let mut alice = connect(addr).await;
    let mut bob = connect(addr).await;

    send(&mut alice, &ClientEvent::FindPartner).await;
    assert_eq!(next_event(&mut alice).await, ServerEvent::status(STATUS_WAITING));

    send(&mut bob, &ClientEvent::FindPartner).await;
    assert_eq!(next_event(&mut bob).await, ServerEvent::status(STATUS_LOOKING));
    assert_eq!(next_event(&mut bob).await, ServerEvent::chat_start(true));
    assert_eq!(next_event(&mut alice).await, ServerEvent::chat_start(false));

    // Chat flows one way at a time, never echoed
    send(
        &mut alice,
        &ClientEvent::SendMessage {
            message: "hi stranger".to_string(),
        },
    )
    .await;
    assert_eq!(
        next_event(&mut bob).await,
        ServerEvent::ReceiveMessage {
            message: "hi stranger".to_string()
        }
    );

    send(&mut bob, &ClientEvent::Typing).await;
    assert_eq!(next_event(&mut alice).await, ServerEvent::PartnerTyping);

    // Explicit leave ends the session for both
    send(&mut alice, &ClientEvent::LeaveChat).await;
    assert_eq!(next_event(&mut bob).await, ServerEvent::chat_end());
}

#[tokio::test]
async fn test_socket_drop_tears_session_down() {
    let addr = start_server().await;
    let mut alice = connect(addr).await;
    let mut bob = connect(addr).await;

    send(&mut alice, &ClientEvent::FindPartner).await;
    next_event(&mut alice).await; // status: waiting
    send(&mut bob, &ClientEvent::FindPartner).await;
    next_event(&mut bob).await; // status: looking
    next_event(&mut bob).await; // chatStart
    next_event(&mut alice).await; // chatStart

    // No leaveChat: the transport-level disconnect must do the teardown
    drop(alice);

    assert_eq!(next_event(&mut bob).await, ServerEvent::chat_end());
}

#[tokio::test]
async fn test_webrtc_signaling_round_trip() {
    let addr = start_server().await;
    let mut alice = connect(addr).await;
    let mut bob = connect(addr).await;

    send(&mut alice, &ClientEvent::FindPartner).await;
    next_event(&mut alice).await;
    send(&mut bob, &ClientEvent::FindPartner).await;
    next_event(&mut bob).await;
    next_event(&mut bob).await;
    next_event(&mut alice).await;

    let sdp = serde_json::json!({"type": "offer", "sdp": "v=0"});
    send(&mut bob, &ClientEvent::WebrtcOffer { sdp: sdp.clone() }).await;

    assert_eq!(next_event(&mut alice).await, ServerEvent::WebrtcOffer { sdp });
}

#[tokio::test]
async fn test_malformed_frame_does_not_kill_the_connection() {
    let addr = start_server().await;
    let mut alice = connect(addr).await;

    alice
        .send(Message::Text("this is not json".to_string()))
        .await
        .unwrap();

    // The connection survives and still works
    send(&mut alice, &ClientEvent::FindPartner).await;
    assert_eq!(next_event(&mut alice).await, ServerEvent::status(STATUS_WAITING));
}
