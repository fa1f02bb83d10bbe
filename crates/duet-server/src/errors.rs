//! Duet server error types.
//!
//! The error surface is deliberately small. Two conditions the pairing
//! design names are *not* errors and never reach this enum:
//!
//! - a content event from a connection with no active session is silently
//!   dropped (expected after teardown races), and
//! - a duplicate leave/disconnect is an idempotent no-op (must not emit a
//!   second `chatEnd`).
//!
//! Errors are local to the offending connection; none is fatal to the
//! process.

use thiserror::Error;

/// Duet server error type.
#[derive(Debug, Error)]
pub enum DuetError {
    /// Caller issued an operation its lifecycle state does not allow,
    /// e.g. `findPartner` while already Waiting or Paired. The caller's
    /// state is left untouched.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// A session-store precondition was violated. This is a programming
    /// error, not a recoverable user error.
    #[error("session store corruption: {0}")]
    SessionStore(&'static str),

    /// Internal error (actor mailbox closed, reply channel dropped).
    #[error("internal error: {0}")]
    Internal(String),
}
