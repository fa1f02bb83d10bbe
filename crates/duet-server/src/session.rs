//! Sessions and the connection -> session index.
//!
//! A [`Session`] is the two-party pairing context scoping all relayed
//! content. It holds both member handles directly; there is no composite
//! room key to parse and no transport-level group membership to consult.
//!
//! Invariants maintained by [`SessionStore`]:
//!
//! - every live session has exactly two distinct members,
//! - a connection is a member of at most one live session,
//! - the index has an entry for a connection iff that connection is a
//!   member of a live session.
//!
//! The store is plain data with no interior locking; the lobby actor is
//! its sole owner, which makes `create` and `teardown` atomic with respect
//! to all connections.

use crate::actors::Outbox;
use crate::errors::DuetError;

use chrono::{DateTime, Utc};
use duet_protocol::ServerEvent;
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Server-assigned connection identity.
///
/// Fresh UUIDv4 per accepted socket, unique for the process lifetime and
/// never reused after disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Session identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One peer: identity plus send capability.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    outbox: Outbox,
}

impl ConnectionHandle {
    #[must_use]
    pub fn new(id: ConnectionId, outbox: Outbox) -> Self {
        Self { id, outbox }
    }

    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Best-effort, non-blocking send to this peer. Failures (peer already
    /// gone, outbox full) are swallowed; the eventual disconnect
    /// notification runs its own teardown.
    pub fn send(&self, event: ServerEvent) {
        self.outbox.send(event);
    }
}

/// A two-party session.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    members: [ConnectionHandle; 2],
    created_at: DateTime<Utc>,
}

impl Session {
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Creation timestamp, for diagnostics only.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The other member of the session, or `None` if `conn` is not a
    /// member at all.
    #[must_use]
    pub fn peer_of(&self, conn: ConnectionId) -> Option<&ConnectionHandle> {
        let [a, b] = &self.members;
        if a.id() == conn {
            Some(b)
        } else if b.id() == conn {
            Some(a)
        } else {
            None
        }
    }

    #[must_use]
    pub fn member_ids(&self) -> [ConnectionId; 2] {
        let [a, b] = &self.members;
        [a.id(), b.id()]
    }
}

/// Active sessions plus the reverse map from connection to its session.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<SessionId, Session>,
    index: HashMap<ConnectionId, SessionId>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session for two idle connections and index both members.
    ///
    /// # Errors
    ///
    /// Fails fast with [`DuetError::SessionStore`] if `a == b` or either
    /// connection is already indexed - both indicate a caller bug, and
    /// failing is preferable to corrupting the index.
    pub fn create(
        &mut self,
        a: ConnectionHandle,
        b: ConnectionHandle,
    ) -> Result<SessionId, DuetError> {
        if a.id() == b.id() {
            return Err(DuetError::SessionStore(
                "cannot pair a connection with itself",
            ));
        }
        if self.index.contains_key(&a.id()) || self.index.contains_key(&b.id()) {
            return Err(DuetError::SessionStore(
                "connection is already a member of a session",
            ));
        }

        let session = Session {
            id: SessionId::new(),
            members: [a, b],
            created_at: Utc::now(),
        };
        let session_id = session.id();

        for member in session.member_ids() {
            self.index.insert(member, session_id);
        }
        self.sessions.insert(session_id, session);

        Ok(session_id)
    }

    /// Resolve a connection's current session. Absent for idle and waiting
    /// connections.
    #[must_use]
    pub fn lookup(&self, conn: ConnectionId) -> Option<&Session> {
        self.index.get(&conn).and_then(|id| self.sessions.get(id))
    }

    /// Whether the connection is currently a session member.
    #[must_use]
    pub fn is_member(&self, conn: ConnectionId) -> bool {
        self.index.contains_key(&conn)
    }

    /// Remove a session and both index entries in one step, so a
    /// subsequent content event from either member cannot resolve a stale
    /// session. Returns the removed session, or `None` if it was already
    /// gone.
    pub fn teardown(&mut self, session_id: SessionId) -> Option<Session> {
        let session = self.sessions.remove(&session_id)?;
        for member in session.member_ids() {
            self.index.remove(&member);
        }
        Some(session)
    }

    /// Number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Number of index entries. Always `2 * len()` unless the store is
    /// corrupted.
    #[must_use]
    pub fn indexed(&self) -> usize {
        self.index.len()
    }
}
