//! Named events exchanged between client and server.
//!
//! Events are adjacently tagged: the `event` field selects the variant and
//! the `data` field carries the payload. Payload-free events (`typing`,
//! `findPartner`, ...) omit `data` entirely.
//!
//! WebRTC signaling payloads (`sdp`, `candidate`) are opaque to the server;
//! they are carried as raw [`serde_json::Value`]s and relayed verbatim. The
//! actual media path is negotiated directly between the two peers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status text sent when a waiting peer was found and pairing is underway.
pub const STATUS_LOOKING: &str = "Looking for a stranger...";

/// Status text sent when the connection was parked in the waiting slot.
pub const STATUS_WAITING: &str = "Waiting for a stranger to connect...";

/// Greeting carried in `chatStart` to both participants.
pub const CHAT_START_MESSAGE: &str = "You are now connected to a stranger. Say hi!";

/// Farewell carried in `chatEnd` to the remaining participant.
pub const CHAT_END_MESSAGE: &str = "Your partner has disconnected. Find a new chat?";

/// Events a client sends to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    /// Request pairing with a stranger.
    #[serde(rename = "findPartner")]
    FindPartner,

    /// A chat message for the current partner.
    #[serde(rename = "sendMessage")]
    SendMessage { message: String },

    /// Transient typing indicator, no payload.
    #[serde(rename = "typing")]
    Typing,

    /// Leave the current chat (or abandon the waiting slot).
    #[serde(rename = "leaveChat")]
    LeaveChat,

    /// WebRTC session description offer, relayed verbatim.
    #[serde(rename = "webrtc-offer")]
    WebrtcOffer { sdp: Value },

    /// WebRTC session description answer, relayed verbatim.
    #[serde(rename = "webrtc-answer")]
    WebrtcAnswer { sdp: Value },

    /// WebRTC ICE candidate, relayed verbatim.
    #[serde(rename = "webrtc-ice-candidate")]
    WebrtcIceCandidate { candidate: Value },
}

impl ClientEvent {
    /// Map a content event to the server event delivered to the partner.
    ///
    /// Returns `None` for lifecycle events (`findPartner`, `leaveChat`),
    /// which are never relayed.
    #[must_use]
    pub fn into_relayed(self) -> Option<ServerEvent> {
        match self {
            ClientEvent::SendMessage { message } => Some(ServerEvent::ReceiveMessage { message }),
            ClientEvent::Typing => Some(ServerEvent::PartnerTyping),
            ClientEvent::WebrtcOffer { sdp } => Some(ServerEvent::WebrtcOffer { sdp }),
            ClientEvent::WebrtcAnswer { sdp } => Some(ServerEvent::WebrtcAnswer { sdp }),
            ClientEvent::WebrtcIceCandidate { candidate } => {
                Some(ServerEvent::WebrtcIceCandidate { candidate })
            }
            ClientEvent::FindPartner | ClientEvent::LeaveChat => None,
        }
    }
}

/// Events the server sends to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    /// Matchmaking progress report.
    #[serde(rename = "status")]
    Status { text: String },

    /// Sent to both participants when a session forms. `initiator` is true
    /// for the peer whose `findPartner` caused the match and false for the
    /// peer that was already waiting; the peers use it to decide who opens
    /// the WebRTC offer.
    #[serde(rename = "chatStart")]
    ChatStart { message: String, initiator: bool },

    /// Chat message relayed from the partner.
    #[serde(rename = "receiveMessage")]
    ReceiveMessage { message: String },

    /// The partner is typing, no payload.
    #[serde(rename = "partnerTyping")]
    PartnerTyping,

    /// Sent once to the remaining participant when the session ends.
    #[serde(rename = "chatEnd")]
    ChatEnd { message: String },

    /// WebRTC session description offer, relayed verbatim.
    #[serde(rename = "webrtc-offer")]
    WebrtcOffer { sdp: Value },

    /// WebRTC session description answer, relayed verbatim.
    #[serde(rename = "webrtc-answer")]
    WebrtcAnswer { sdp: Value },

    /// WebRTC ICE candidate, relayed verbatim.
    #[serde(rename = "webrtc-ice-candidate")]
    WebrtcIceCandidate { candidate: Value },
}

impl ServerEvent {
    /// Build a `status` event from one of the canonical status texts.
    #[must_use]
    pub fn status(text: &str) -> Self {
        ServerEvent::Status {
            text: text.to_string(),
        }
    }

    /// Build the `chatStart` event for one side of a new session.
    #[must_use]
    pub fn chat_start(initiator: bool) -> Self {
        ServerEvent::ChatStart {
            message: CHAT_START_MESSAGE.to_string(),
            initiator,
        }
    }

    /// Build the `chatEnd` event for the remaining participant.
    #[must_use]
    pub fn chat_end() -> Self {
        ServerEvent::ChatEnd {
            message: CHAT_END_MESSAGE.to_string(),
        }
    }
}
