//! The single-capacity waiting slot.
//!
//! At most one connection is ever parked here, and a parked connection is
//! never simultaneously a session member (the lobby checks the session
//! index before calling [`WaitingSlot::try_pair`]).
//!
//! The slot itself is plain data. Atomicity of the check-and-clear - the
//! one true race in the system - comes from the lobby actor being the
//! slot's sole owner: all `findPartner` requests are serialized through
//! its mailbox, so two peers can never both observe the same non-empty
//! slot.

use crate::errors::DuetError;
use crate::session::{ConnectionHandle, ConnectionId};

/// Result of a pairing attempt.
#[derive(Debug)]
pub enum PairOutcome {
    /// The slot was empty; the caller is now parked in it.
    Parked,
    /// The slot held a peer; it has been cleared and the caller must
    /// immediately create the session with the returned occupant.
    Matched(ConnectionHandle),
}

/// The single waiting slot.
#[derive(Debug, Default)]
pub struct WaitingSlot {
    occupant: Option<ConnectionHandle>,
}

impl WaitingSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently parked connection, if any.
    #[must_use]
    pub fn occupant(&self) -> Option<ConnectionId> {
        self.occupant.as_ref().map(ConnectionHandle::id)
    }

    /// Park `conn` if the slot is empty, otherwise take the occupant.
    ///
    /// # Errors
    ///
    /// Rejects with [`DuetError::InvalidState`] if `conn` is already the
    /// occupant - re-parking would silently drop the send capability the
    /// slot already holds.
    pub fn try_pair(&mut self, conn: ConnectionHandle) -> Result<PairOutcome, DuetError> {
        if self.occupant() == Some(conn.id()) {
            return Err(DuetError::InvalidState("connection is already waiting"));
        }

        match self.occupant.take() {
            Some(other) => Ok(PairOutcome::Matched(other)),
            None => {
                self.occupant = Some(conn);
                Ok(PairOutcome::Parked)
            }
        }
    }

    /// Clear the slot if `conn` occupies it. Returns whether it did.
    pub fn clear_if(&mut self, conn: ConnectionId) -> bool {
        if self.occupant() == Some(conn) {
            self.occupant = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::actors::Outbox;

    fn handle() -> ConnectionHandle {
        let (outbox, _rx) = Outbox::new(8);
        ConnectionHandle::new(ConnectionId::new(), outbox)
    }

    #[test]
    fn test_first_caller_is_parked() {
        let mut slot = WaitingSlot::new();
        let a = handle();
        let a_id = a.id();

        assert!(matches!(slot.try_pair(a), Ok(PairOutcome::Parked)));
        assert_eq!(slot.occupant(), Some(a_id));
    }

    #[test]
    fn test_second_caller_takes_the_occupant() {
        let mut slot = WaitingSlot::new();
        let a = handle();
        let a_id = a.id();
        slot.try_pair(a).unwrap();

        match slot.try_pair(handle()).unwrap() {
            PairOutcome::Matched(other) => assert_eq!(other.id(), a_id),
            PairOutcome::Parked => panic!("expected a match"),
        }
        // check-and-clear is one step: the slot is empty again
        assert_eq!(slot.occupant(), None);
    }

    #[test]
    fn test_reparking_the_occupant_is_rejected() {
        let mut slot = WaitingSlot::new();
        let a = handle();
        let a_id = a.id();
        let a_again = a.clone();
        slot.try_pair(a).unwrap();

        let result = slot.try_pair(a_again);
        assert!(matches!(result, Err(DuetError::InvalidState(_))));
        // Rejection leaves the slot untouched
        assert_eq!(slot.occupant(), Some(a_id));
    }

    #[test]
    fn test_clear_if_only_clears_the_occupant() {
        let mut slot = WaitingSlot::new();
        let a = handle();
        let a_id = a.id();
        slot.try_pair(a).unwrap();

        assert!(!slot.clear_if(ConnectionId::new()));
        assert_eq!(slot.occupant(), Some(a_id));

        assert!(slot.clear_if(a_id));
        assert_eq!(slot.occupant(), None);

        // Clearing an empty slot is a no-op
        assert!(!slot.clear_if(a_id));
    }
}
