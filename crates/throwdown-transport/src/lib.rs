//! Transport layer for Throwdown.
//!
//! Provides a non-blocking TCP listener ([`TcpTransport`]) and connection
//! ([`TcpConnection`]) meant to be driven from a single `mio` poll loop.
//! Nothing here blocks: each read returns at most one chunk, and writes go
//! through a per-connection buffer that is flushed as far as the kernel
//! allows.

mod error;
mod tcp;

pub use error::TransportError;
pub use tcp::{DEFAULT_READ_CHUNK, ReadOutcome, TcpConnection, TcpTransport};

/// Re-exported so callers can build a poll loop without naming `mio`.
pub use mio::{Events, Interest, Poll, Registry, Token, Waker};
