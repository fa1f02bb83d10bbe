//! `LobbyActor` - the serialized owner of all pairing state.
//!
//! The lobby is the only place the waiting slot and the session store are
//! touched, so every read-modify-write of shared pairing state happens in
//! mailbox order. Two peers racing to claim the same waiting occupant are
//! just two messages, processed one after the other: the first takes the
//! occupant, the second is parked.
//!
//! Per connection the lifecycle is `Idle -> Waiting -> Paired -> Idle`.
//! A session dies the instant either member leaves or disconnects; the
//! remaining member is force-removed, notified once with `chatEnd`, and
//! must re-issue `findPartner` to be paired again.

use crate::errors::DuetError;
use crate::matchmaker::{PairOutcome, WaitingSlot};
use crate::session::{ConnectionHandle, ConnectionId, SessionStore};

use super::messages::{FindOutcome, LobbyMessage, LobbySnapshot, TeardownReason};

use duet_protocol::{ServerEvent, STATUS_LOOKING, STATUS_WAITING};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Default channel buffer size for the lobby mailbox.
const LOBBY_CHANNEL_BUFFER: usize = 1024;

/// Handle to the `LobbyActor`.
///
/// This is the public interface for transport tasks. Cloning is cheap;
/// every connection's reader task holds one.
#[derive(Debug, Clone)]
pub struct LobbyHandle {
    sender: mpsc::Sender<LobbyMessage>,
    cancel_token: CancellationToken,
}

impl LobbyHandle {
    /// Request pairing for `conn`.
    ///
    /// # Errors
    ///
    /// [`DuetError::InvalidState`] if `conn` is already waiting or paired;
    /// its state is left untouched. [`DuetError::Internal`] if the lobby
    /// is gone.
    pub async fn find_partner(&self, conn: ConnectionHandle) -> Result<FindOutcome, DuetError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(LobbyMessage::FindPartner {
                conn,
                respond_to: tx,
            })
            .await
            .map_err(|e| DuetError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| DuetError::Internal(format!("response receive failed: {e}")))?
    }

    /// Explicit `leaveChat` from a connection. Idempotent.
    pub async fn leave(&self, conn: ConnectionId) -> Result<(), DuetError> {
        self.teardown(conn, TeardownReason::Leave).await
    }

    /// Transport-level disconnect notification. Idempotent.
    pub async fn disconnect(&self, conn: ConnectionId) -> Result<(), DuetError> {
        self.teardown(conn, TeardownReason::Disconnect).await
    }

    async fn teardown(&self, conn: ConnectionId, reason: TeardownReason) -> Result<(), DuetError> {
        self.sender
            .send(LobbyMessage::Teardown { conn, reason })
            .await
            .map_err(|e| DuetError::Internal(format!("channel send failed: {e}")))
    }

    /// Relay a content event from `sender` to its partner. Dropped
    /// silently if `sender` has no active session.
    pub async fn relay(&self, sender: ConnectionId, event: ServerEvent) -> Result<(), DuetError> {
        self.sender
            .send(LobbyMessage::Relay { sender, event })
            .await
            .map_err(|e| DuetError::Internal(format!("channel send failed: {e}")))
    }

    /// Snapshot of lobby state. Because the mailbox is FIFO, the snapshot
    /// reflects every operation sent on this handle before the call.
    pub async fn snapshot(&self) -> Result<LobbySnapshot, DuetError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(LobbyMessage::GetSnapshot { respond_to: tx })
            .await
            .map_err(|e| DuetError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| DuetError::Internal(format!("response receive failed: {e}")))
    }

    /// Cancel the lobby actor.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    /// Check if the actor is cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}

/// The `LobbyActor` implementation.
pub struct LobbyActor {
    /// Message receiver.
    receiver: mpsc::Receiver<LobbyMessage>,
    /// Cancellation token (shared with the handle).
    cancel_token: CancellationToken,
    /// The single waiting slot.
    slot: WaitingSlot,
    /// Active sessions and the connection -> session index.
    sessions: SessionStore,
}

impl LobbyActor {
    /// Spawn the lobby actor.
    ///
    /// Returns a handle and the task join handle.
    #[must_use]
    pub fn spawn(cancel_token: CancellationToken) -> (LobbyHandle, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(LOBBY_CHANNEL_BUFFER);

        let actor = Self {
            receiver,
            cancel_token: cancel_token.clone(),
            slot: WaitingSlot::new(),
            sessions: SessionStore::new(),
        };

        let task_handle = tokio::spawn(actor.run());

        let handle = LobbyHandle {
            sender,
            cancel_token,
        };

        (handle, task_handle)
    }

    /// Run the actor message loop.
    #[instrument(skip_all, name = "duet.actor.lobby")]
    async fn run(mut self) {
        info!(target: "duet.actor.lobby", "LobbyActor started");

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    info!(
                        target: "duet.actor.lobby",
                        sessions = self.sessions.len(),
                        "LobbyActor received cancellation signal"
                    );
                    break;
                }

                msg = self.receiver.recv() => {
                    match msg {
                        Some(message) => self.handle_message(message),
                        None => {
                            info!(target: "duet.actor.lobby", "LobbyActor channel closed, exiting");
                            break;
                        }
                    }
                }
            }
        }

        info!(
            target: "duet.actor.lobby",
            sessions = self.sessions.len(),
            "LobbyActor stopped"
        );
    }

    /// Handle a single message.
    fn handle_message(&mut self, message: LobbyMessage) {
        match message {
            LobbyMessage::FindPartner { conn, respond_to } => {
                let result = self.handle_find(conn);
                let _ = respond_to.send(result);
            }

            LobbyMessage::Teardown { conn, reason } => {
                self.handle_teardown(conn, reason);
            }

            LobbyMessage::Relay { sender, event } => {
                self.handle_relay(sender, event);
            }

            LobbyMessage::GetSnapshot { respond_to } => {
                let _ = respond_to.send(LobbySnapshot {
                    waiting: self.slot.occupant(),
                    sessions: self.sessions.len(),
                    indexed_connections: self.sessions.indexed(),
                });
            }
        }
    }

    /// Handle `findPartner`: park the connection or pair it with the
    /// waiting peer.
    fn handle_find(&mut self, conn: ConnectionHandle) -> Result<FindOutcome, DuetError> {
        let conn_id = conn.id();

        // A paired connection must leave before searching again. Rejecting
        // here (rather than re-queueing or overwriting) keeps the slot and
        // index invariants intact no matter what the client sends.
        if self.sessions.is_member(conn_id) {
            warn!(
                target: "duet.actor.lobby",
                conn = %conn_id,
                "findPartner while paired, rejected"
            );
            return Err(DuetError::InvalidState("connection is already paired"));
        }

        match self.slot.try_pair(conn.clone()) {
            Ok(PairOutcome::Parked) => {
                conn.send(ServerEvent::status(STATUS_WAITING));
                debug!(target: "duet.actor.lobby", conn = %conn_id, "parked in waiting slot");
                Ok(FindOutcome::Parked)
            }

            Ok(PairOutcome::Matched(responder)) => {
                let responder_id = responder.id();
                let session_id = match self.sessions.create(responder.clone(), conn.clone()) {
                    Ok(id) => id,
                    Err(e) => {
                        // try_pair already emptied the slot; put the waiting
                        // peer back so a store failure cannot strand it
                        if self.slot.try_pair(responder).is_err() {
                            warn!(
                                target: "duet.actor.lobby",
                                conn = %responder_id,
                                "failed to re-park waiting connection"
                            );
                        }
                        return Err(e);
                    }
                };

                conn.send(ServerEvent::status(STATUS_LOOKING));

                // The waiting peer is the responder, the joining peer the
                // initiator; both always learn their role.
                responder.send(ServerEvent::chat_start(false));
                conn.send(ServerEvent::chat_start(true));

                info!(
                    target: "duet.actor.lobby",
                    session = %session_id,
                    initiator = %conn_id,
                    responder = %responder_id,
                    "session started"
                );
                Ok(FindOutcome::Matched { session_id })
            }

            Err(e) => {
                warn!(
                    target: "duet.actor.lobby",
                    conn = %conn_id,
                    error = %e,
                    "findPartner rejected"
                );
                Err(e)
            }
        }
    }

    /// Handle leave/disconnect. Exactly one of three cases applies:
    /// the connection was waiting (clear the slot), it was paired (tear
    /// the session down and notify the partner once), or it was idle
    /// (no-op, which also makes duplicate teardowns harmless).
    fn handle_teardown(&mut self, conn: ConnectionId, reason: TeardownReason) {
        if self.slot.clear_if(conn) {
            debug!(
                target: "duet.actor.lobby",
                conn = %conn,
                reason = ?reason,
                "waiting connection left, slot cleared"
            );
            return;
        }

        let Some(session_id) = self.sessions.lookup(conn).map(|s| s.id()) else {
            debug!(
                target: "duet.actor.lobby",
                conn = %conn,
                reason = ?reason,
                "teardown for idle connection, no-op"
            );
            return;
        };

        if let Some(session) = self.sessions.teardown(session_id) {
            if let Some(peer) = session.peer_of(conn) {
                peer.send(ServerEvent::chat_end());
            }
            info!(
                target: "duet.actor.lobby",
                session = %session_id,
                conn = %conn,
                reason = ?reason,
                lived_since = %session.created_at(),
                "session ended"
            );
        }
    }

    /// Handle a content event: deliver to the sender's partner only.
    fn handle_relay(&mut self, sender: ConnectionId, event: ServerEvent) {
        match self.sessions.lookup(sender) {
            Some(session) => {
                if let Some(peer) = session.peer_of(sender) {
                    peer.send(event);
                }
            }
            None => {
                // Expected after teardown races; not surfaced to the sender
                debug!(
                    target: "duet.actor.lobby",
                    conn = %sender,
                    "content event with no active session, dropped"
                );
            }
        }
    }
}
