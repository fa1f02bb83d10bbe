//! Wire protocol for Duet.
//!
//! Every frame on the wire is a JSON object with an `event` name and an
//! optional `data` payload:
//!
//! ```text
//! {"event": "sendMessage", "data": {"message": "hi"}}
//! {"event": "typing"}
//! ```
//!
//! The protocol is deliberately transport-agnostic: it only assumes an
//! ordered, bidirectional channel that delivers whole text frames. The
//! server speaks it over WebSocket.

#![warn(clippy::pedantic)]

pub mod events;

pub use events::{ClientEvent, ServerEvent};
pub use events::{CHAT_END_MESSAGE, CHAT_START_MESSAGE, STATUS_LOOKING, STATUS_WAITING};
