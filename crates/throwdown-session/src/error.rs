//! Error types for the session layer.

use throwdown_protocol::SessionId;

/// Errors that can occur during session management.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The proposed name was empty or only whitespace.
    #[error("name must not be empty")]
    EmptyName,

    /// The session already has a name; names are assigned once.
    #[error("session is already named {0}")]
    AlreadyNamed(String),

    /// No live session has this id (it disconnected, or never existed).
    #[error("session {0} not found")]
    NotFound(SessionId),

    /// The session is already attached to a match.
    #[error("already in match {0}")]
    AlreadyInMatch(String),
}
