//! Error types for the lobby layer.

use throwdown_protocol::SessionId;

/// Errors that can occur during lobby and match operations.
///
/// All of them are answered with a message to the requesting session;
/// none changes any state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LobbyError {
    /// A match with this name is already registered.
    #[error("name \"{0}\" taken")]
    NameTaken(String),

    /// The match already has two players.
    #[error("match \"{0}\" is full")]
    MatchFull(String),

    /// No match with this name is registered.
    #[error("no match \"{0}\"")]
    MatchNotFound(String),

    /// A move or leave came from a session that isn't seated.
    #[error("{0} is not playing in this match")]
    NotAParticipant(SessionId),

    /// The match has a winner or was abandoned.
    #[error("match \"{0}\" is already over")]
    AlreadyFinished(String),

    /// The session is already seated in this match.
    #[error("{0} is already in match \"{1}\"")]
    AlreadyInMatch(SessionId, String),
}
