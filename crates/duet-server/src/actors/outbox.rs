//! Per-connection send capability.

use duet_protocol::ServerEvent;
use tokio::sync::mpsc;
use tracing::debug;

/// Non-blocking, best-effort sender for one connection.
///
/// The lobby actor pushes events here; the connection's writer task drains
/// the paired receiver to the socket. `send` never blocks and never fails
/// loudly - delivery is at-most-once, and a peer that has stopped reading
/// (or already disconnected) simply loses events until its disconnect
/// notification tears the session down.
#[derive(Debug, Clone)]
pub struct Outbox {
    sender: mpsc::Sender<ServerEvent>,
}

impl Outbox {
    /// Create an outbox and the receiver its writer task drains.
    #[must_use]
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<ServerEvent>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, receiver)
    }

    /// Queue an event for delivery. Drops the event if the outbox is full
    /// or the connection is gone.
    pub fn send(&self, event: ServerEvent) {
        if let Err(e) = self.sender.try_send(event) {
            debug!(
                target: "duet.outbox",
                error = %e,
                "dropping outbound event"
            );
        }
    }
}
