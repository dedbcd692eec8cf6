//! Unified error type for the Throwdown server.

use throwdown_lobby::LobbyError;
use throwdown_protocol::ProtocolError;
use throwdown_session::SessionError;
use throwdown_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates the `From` impl, so
/// `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum ThrowdownError {
    /// A transport-level error (bind, accept, poll, read, write).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (bad move, overlong line, missing argument).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (naming, attachment).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A lobby-level error (name taken, full, not found).
    #[error(transparent)]
    Lobby(#[from] LobbyError),

    /// The configured host/port did not resolve to a socket address.
    #[error("invalid listen address {addr}: {reason}")]
    InvalidAddress { addr: String, reason: String },
}
