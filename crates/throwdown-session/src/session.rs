//! Session types: the server's record of one connected client.
//!
//! A session tracks:
//! - WHO the client is (a display name, once given)
//! - WHERE it is (the lobby, or a match referred to by name)
//! - WHAT it still has to be told (a buffer of outgoing text)

use throwdown_protocol::{LineCodec, SessionId};

use crate::SessionError;

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Where a session is in its lifecycle.
///
/// ```text
///   Unnamed ──(assign_name)──→ Lobby ──(enter_match)──→ InMatch
///                                ↑                          │
///                                └──────(leave_match)───────┘
/// ```
///
/// Derived from the session's fields rather than stored, so it can never
/// disagree with them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Connected, waiting for the client to send a name.
    Unnamed,
    /// Named and not attached to a match; lines are lobby commands.
    Lobby,
    /// Attached to a match; lines are move attempts.
    InMatch,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A single client's session on the server.
///
/// Created on accept, destroyed when the transport closes. Display names
/// are not unique across sessions; two clients may both call themselves
/// "alice".
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    name: Option<String>,

    /// Key of the match this session plays in. The lobby owns the match;
    /// this is only a lookup handle.
    current_match: Option<String>,

    /// Text waiting for the transport, in order.
    outbox: String,

    /// The last thing sent was a prompt and the client has not answered it.
    at_prompt: bool,
}

impl Session {
    /// Creates an unnamed session with an empty outbox.
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            name: None,
            current_match: None,
            outbox: String::new(),
            at_prompt: false,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// The display name, if one has been assigned.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The display name, or the session id when still unnamed.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self.id.to_string(),
        }
    }

    pub fn state(&self) -> SessionState {
        match (&self.name, &self.current_match) {
            (None, _) => SessionState::Unnamed,
            (Some(_), None) => SessionState::Lobby,
            (Some(_), Some(_)) => SessionState::InMatch,
        }
    }

    /// Assigns the display name. Surrounding whitespace is dropped.
    ///
    /// # Errors
    /// - [`SessionError::EmptyName`] if `text` is blank
    /// - [`SessionError::AlreadyNamed`] if a name was assigned before
    pub fn assign_name(&mut self, text: &str) -> Result<(), SessionError> {
        if let Some(existing) = &self.name {
            return Err(SessionError::AlreadyNamed(existing.clone()));
        }
        let name = text.trim();
        if name.is_empty() {
            return Err(SessionError::EmptyName);
        }
        self.name = Some(name.to_string());
        tracing::info!(session = %self.id, name, "session named");
        Ok(())
    }

    /// Name of the match this session is attached to.
    pub fn current_match(&self) -> Option<&str> {
        self.current_match.as_deref()
    }

    /// Attaches the session to a match.
    ///
    /// # Errors
    /// Returns [`SessionError::AlreadyInMatch`] if already attached.
    pub fn enter_match(
        &mut self,
        match_name: &str,
    ) -> Result<(), SessionError> {
        if let Some(current) = &self.current_match {
            return Err(SessionError::AlreadyInMatch(current.clone()));
        }
        self.current_match = Some(match_name.to_string());
        Ok(())
    }

    /// Detaches the session, returning the match it was in.
    pub fn leave_match(&mut self) -> Option<String> {
        self.current_match.take()
    }

    /// Buffers one line of text; a trailing newline is added if missing.
    ///
    /// If the client is sitting at an unanswered prompt, the text starts on
    /// a fresh line.
    pub fn enqueue(&mut self, text: &str) {
        if std::mem::take(&mut self.at_prompt) {
            self.outbox.push('\n');
        }
        self.outbox.push_str(&LineCodec::frame(text));
    }

    /// Buffers a prompt verbatim. Prompts end without a newline.
    pub fn enqueue_prompt(&mut self, text: &str) {
        self.outbox.push_str(text);
        self.at_prompt = true;
    }

    /// Records that the client sent a line, so its cursor is back at the
    /// start of a line.
    pub fn input_received(&mut self) {
        self.at_prompt = false;
    }

    pub fn has_output(&self) -> bool {
        !self.outbox.is_empty()
    }

    /// Takes everything buffered so far, leaving the outbox empty.
    pub fn flush(&mut self) -> Option<String> {
        if self.outbox.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.outbox))
        }
    }
}
