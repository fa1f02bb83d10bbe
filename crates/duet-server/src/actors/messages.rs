//! Message types for the lobby mailbox.
//!
//! All transport tasks talk to the lobby through strongly-typed messages
//! over `tokio::sync::mpsc`. Operations with a result the caller needs
//! (`findPartner`) reply through a `tokio::sync::oneshot`; everything else
//! is fire-and-forget.

use crate::errors::DuetError;
use crate::session::{ConnectionHandle, ConnectionId, SessionId};

use duet_protocol::ServerEvent;
use tokio::sync::oneshot;

/// Messages sent to the `LobbyActor`.
#[derive(Debug)]
pub enum LobbyMessage {
    /// A connection requests pairing.
    FindPartner {
        conn: ConnectionHandle,
        /// Response channel for the pairing outcome.
        respond_to: oneshot::Sender<Result<FindOutcome, DuetError>>,
    },

    /// A connection leaves its current chat, or its transport dropped.
    /// Idempotent: a connection with no slot and no session is a no-op.
    Teardown {
        conn: ConnectionId,
        reason: TeardownReason,
    },

    /// Deliver a content event to the sender's partner, if any.
    Relay {
        sender: ConnectionId,
        event: ServerEvent,
    },

    /// Snapshot of lobby state (for diagnostics and tests).
    GetSnapshot {
        respond_to: oneshot::Sender<LobbySnapshot>,
    },
}

/// Why a teardown was requested. Affects logging only; the state machine
/// treats explicit leave and transport disconnect identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownReason {
    /// Client sent `leaveChat`.
    Leave,
    /// Transport reported the connection gone.
    Disconnect,
}

/// Outcome of a successful `findPartner`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindOutcome {
    /// The slot was empty; the connection is now waiting.
    Parked,
    /// The connection was paired with the waiting peer.
    Matched { session_id: SessionId },
}

/// Point-in-time view of the lobby.
#[derive(Debug, Clone)]
pub struct LobbySnapshot {
    /// The connection currently parked in the waiting slot, if any.
    pub waiting: Option<ConnectionId>,
    /// Number of live sessions.
    pub sessions: usize,
    /// Number of connection -> session index entries.
    pub indexed_connections: usize,
}
