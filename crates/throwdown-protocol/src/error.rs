//! Error types for the protocol layer.

/// Errors that can occur while interpreting client input.
///
/// None of these are fatal to a connection: the server turns each one
/// into a message for the client that sent the offending line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// The token is not one of `r`, `rock`, `p`, `paper`, `s`, `scissors`.
    #[error("invalid move: \"{0}\"")]
    InvalidMove(String),

    /// A line grew past the configured limit without a newline.
    #[error("line too long: {len} bytes (limit {max})")]
    LineTooLong { len: usize, max: usize },

    /// A lobby command that needs an argument was sent without one.
    #[error("missing argument for `{0}`")]
    MissingArgument(&'static str),
}
