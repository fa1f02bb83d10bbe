//! Actor model for the pairing core.
//!
//! A single [`LobbyActor`] owns the waiting slot and the session store;
//! every pairing, relay, and teardown operation is a message through its
//! mailbox. Per-connection [`Outbox`]es decouple delivery from the lobby:
//! the lobby pushes events into an outbox without blocking, and each
//! connection's writer task drains its outbox to the socket.

mod lobby;
mod messages;
mod outbox;

pub use lobby::{LobbyActor, LobbyHandle};
pub use messages::{FindOutcome, LobbyMessage, LobbySnapshot, TeardownReason};
pub use outbox::Outbox;
