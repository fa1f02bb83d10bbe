//! Duet server library.
//!
//! Duet pairs anonymous peers arriving on independent WebSocket connections
//! into two-party sessions, then relays chat and call-signaling events
//! exclusively between the two paired peers until either leaves.
//!
//! # Architecture
//!
//! All mutable pairing state is owned by a single actor:
//!
//! ```text
//! LobbyActor (singleton)
//! ├── WaitingSlot        (at most one parked peer)
//! └── SessionStore       (active sessions + connection -> session index)
//! ```
//!
//! Each WebSocket connection gets two tasks: a reader that decodes inbound
//! frames and forwards them to the lobby mailbox, and a writer that drains
//! the connection's [`actors::Outbox`] to the socket. Because every
//! read-modify-write of the waiting slot and the session index goes through
//! the lobby mailbox, pairing, session creation, and teardown are each
//! observed as atomic by all connections - two peers racing to claim the
//! same waiting slot is resolved by mailbox order.
//!
//! # Key design decisions
//!
//! - **Connection identity is server-assigned**: a fresh UUIDv4 per
//!   accepted socket, never reused for the process lifetime.
//! - **Sessions are first-class values**: a session holds both member
//!   handles directly; membership is never derived from composite keys.
//! - **Relay is fire-and-forget**: delivery into an outbox never blocks
//!   the lobby; a full or closed outbox drops the event, and the eventual
//!   disconnect notification runs teardown.
//!
//! # Modules
//!
//! - [`actors`] - the lobby actor and per-connection outboxes
//! - [`matchmaker`] - the single waiting slot
//! - [`session`] - session store and connection -> session index
//! - [`ws`] - WebSocket transport binding
//! - [`config`] - service configuration from environment
//! - [`errors`] - error types
//! - [`observability`] - health endpoints

#![warn(clippy::pedantic)]

pub mod actors;
pub mod config;
pub mod errors;
pub mod matchmaker;
pub mod observability;
pub mod session;
pub mod ws;
