//! Text protocol for Throwdown.
//!
//! This crate defines the "language" clients and the server speak over a
//! plain line-oriented TCP connection:
//!
//! - **Types** ([`Move`], [`SessionId`]): the values that the rest of
//!   the server reasons about.
//! - **Commands** ([`Command`], [`tokenize`]): how a lobby line is
//!   turned into a request.
//! - **Codec** ([`LineCodec`]): how a byte stream is cut into lines and
//!   how outgoing text is framed.
//! - **Errors** ([`ProtocolError`]): what can go wrong while parsing.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw bytes) and the session
//! and lobby layers. It doesn't know about sockets or matches.
//!
//! ```text
//! Transport (bytes) → Protocol (lines, commands, moves) → Session / Lobby
//! ```

mod codec;
mod command;
mod error;
mod types;

pub use codec::{DEFAULT_MAX_LINE_LEN, LineCodec};
pub use command::{Command, tokenize};
pub use error::ProtocolError;
pub use types::{Move, SessionId};
