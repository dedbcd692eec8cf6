//! The session manager: the registry of every live session.
//!
//! # Concurrency note
//!
//! `SessionManager` is NOT thread-safe by itself. It is owned by the
//! server's event loop, which is the only code that ever touches it, so
//! each loop step sees and leaves it in a consistent state.

use std::collections::BTreeMap;

use throwdown_protocol::SessionId;

use crate::{Session, SessionError, SessionState};

/// Tracks all live sessions, ordered by id (which is connect order).
pub struct SessionManager {
    sessions: BTreeMap<SessionId, Session>,
    next_id: u64,
}

impl SessionManager {
    /// Creates a new, empty session manager.
    pub fn new() -> Self {
        Self {
            sessions: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Creates a session for a freshly accepted connection.
    pub fn create(&mut self) -> SessionId {
        let id = SessionId(self.next_id);
        self.next_id += 1;
        self.sessions.insert(id, Session::new(id));
        tracing::info!(session = %id, "session created");
        id
    }

    /// Destroys a session and returns its final state.
    ///
    /// # Errors
    /// Returns [`SessionError::NotFound`] if no such session is live.
    pub fn remove(&mut self, id: SessionId) -> Result<Session, SessionError> {
        let session = self
            .sessions
            .remove(&id)
            .ok_or(SessionError::NotFound(id))?;
        tracing::info!(session = %id, "session removed");
        Ok(session)
    }

    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    pub fn get_mut(&mut self, id: SessionId) -> Option<&mut Session> {
        self.sessions.get_mut(&id)
    }

    /// Buffers a line for one session. Unknown ids are ignored: the
    /// session may have disconnected earlier in the same step.
    pub fn enqueue(&mut self, id: SessionId, text: &str) {
        if let Some(session) = self.sessions.get_mut(&id) {
            session.enqueue(text);
        }
    }

    /// All live sessions, in connect order.
    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    /// Named sessions sitting in the lobby, in connect order, excluding
    /// `except`. These are the audience for lobby announcements.
    pub fn idle(&self, except: Option<SessionId>) -> Vec<SessionId> {
        self.sessions
            .values()
            .filter(|s| s.state() == SessionState::Lobby)
            .filter(|s| Some(s.id()) != except)
            .map(Session::id)
            .collect()
    }

    /// Ids of sessions with buffered output.
    pub fn with_output(&self) -> Vec<SessionId> {
        self.sessions
            .values()
            .filter(|s| s.has_output())
            .map(Session::id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(mgr: &mut SessionManager, name: &str) -> SessionId {
        let id = mgr.create();
        mgr.get_mut(id).unwrap().assign_name(name).unwrap();
        id
    }

    #[test]
    fn test_create_assigns_increasing_ids() {
        let mut mgr = SessionManager::new();
        let a = mgr.create();
        let b = mgr.create();
        assert!(a < b);
        assert_eq!(mgr.len(), 2);
    }

    #[test]
    fn test_remove_unknown_returns_not_found() {
        let mut mgr = SessionManager::new();
        assert_eq!(
            mgr.remove(SessionId(9)).map(|s| s.id()),
            Err(SessionError::NotFound(SessionId(9)))
        );
    }

    #[test]
    fn test_remove_returns_session_and_ids_are_not_reused() {
        let mut mgr = SessionManager::new();
        let a = mgr.create();
        let removed = mgr.remove(a).unwrap();
        assert_eq!(removed.id(), a);
        assert!(mgr.is_empty());
        assert_ne!(mgr.create(), a);
    }

    #[test]
    fn test_duplicate_display_names_are_allowed() {
        let mut mgr = SessionManager::new();
        let a = named(&mut mgr, "alice");
        let b = named(&mut mgr, "alice");
        assert_ne!(a, b);
        assert_eq!(mgr.get(b).unwrap().name(), Some("alice"));
    }

    #[test]
    fn test_idle_excludes_unnamed_in_match_and_origin() {
        let mut mgr = SessionManager::new();
        let _unnamed = mgr.create();
        let alice = named(&mut mgr, "alice");
        let bob = named(&mut mgr, "bob");
        let carol = named(&mut mgr, "carol");
        mgr.get_mut(bob).unwrap().enter_match("arena").unwrap();

        assert_eq!(mgr.idle(None), vec![alice, carol]);
        assert_eq!(mgr.idle(Some(alice)), vec![carol]);
    }

    #[test]
    fn test_enqueue_and_with_output() {
        let mut mgr = SessionManager::new();
        let a = mgr.create();
        let b = mgr.create();
        mgr.enqueue(b, "hi");
        mgr.enqueue(SessionId(99), "nobody");
        assert_eq!(mgr.with_output(), vec![b]);
        assert_eq!(mgr.get_mut(b).unwrap().flush().as_deref(), Some("hi\n"));
        assert!(!mgr.get(a).unwrap().has_output());
    }
}
