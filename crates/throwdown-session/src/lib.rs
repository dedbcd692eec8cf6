//! Player session management for Throwdown.
//!
//! This crate handles the lifecycle of a client connection as the server
//! sees it:
//!
//! 1. **Identity**: an unnamed session takes the first non-empty line it
//!    sends as its display name ([`Session::assign_name`]).
//! 2. **Attachment**: a session refers to at most one match, by name. The
//!    lobby owns matches; a session only holds the key.
//! 3. **Output**: text for the client is buffered per session and handed
//!    to the transport when the socket is writable.
//!
//! # How it fits in the stack
//!
//! ```text
//! Lobby Layer (beside)  ← matches refer to sessions by SessionId
//!     ↕
//! Session Layer (this crate)  ← identity, current match, outbox
//!     ↕
//! Protocol Layer (below)  ← SessionId, line framing
//! ```

mod error;
mod manager;
mod session;

pub use error::SessionError;
pub use manager::SessionManager;
pub use session::{Session, SessionState};
