//! TCP listener and connection over `mio`.
//!
//! Both types are non-blocking: every call returns as soon as the socket
//! would block. The event loop learns when to call them again from the
//! readiness events it receives for the registered [`Token`].

use std::io::{self, Read, Write};
use std::net::SocketAddr;

use mio::net::{TcpListener, TcpStream};
use mio::{Interest, Registry, Token};

use crate::TransportError;

/// Default size of a single read from a connection, in bytes.
pub const DEFAULT_READ_CHUNK: usize = 1024;

// ---------------------------------------------------------------------------
// TcpTransport
// ---------------------------------------------------------------------------

/// The listening socket.
pub struct TcpTransport {
    listener: TcpListener,
}

impl TcpTransport {
    /// Binds a new listener to `addr`.
    pub fn bind(addr: SocketAddr) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .map_err(|source| TransportError::BindFailed { addr, source })?;
        tracing::info!(%addr, "TCP transport listening");
        Ok(Self { listener })
    }

    /// Returns the address the listener is actually bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Registers the listener for read readiness.
    pub fn register(
        &mut self,
        registry: &Registry,
        token: Token,
    ) -> Result<(), TransportError> {
        registry
            .register(&mut self.listener, token, Interest::READABLE)
            .map_err(TransportError::PollFailed)
    }

    /// Accepts one pending connection.
    ///
    /// Returns `Ok(None)` once the accept queue is drained.
    pub fn accept(
        &self,
    ) -> Result<Option<TcpConnection>, TransportError> {
        loop {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    tracing::debug!(%peer, "accepted TCP connection");
                    return Ok(Some(TcpConnection::new(stream, peer)));
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    return Ok(None);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(TransportError::AcceptFailed(e)),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// TcpConnection
// ---------------------------------------------------------------------------

/// What a single read from a connection produced.
#[derive(Debug, PartialEq, Eq)]
pub enum ReadOutcome {
    /// At most `read_chunk` bytes.
    Data(Vec<u8>),
    /// The socket would block; wait for the next readable event.
    Drained,
    /// The peer closed its side; no more data will follow.
    Closed,
}

/// One accepted client connection with an outbound byte buffer.
///
/// Outgoing bytes are appended with [`queue`](Self::queue) and written by
/// [`flush`](Self::flush) only as far as the socket accepts them. Whatever
/// is left waits for the next writable event, so a slow reader never
/// stalls the loop.
pub struct TcpConnection {
    stream: TcpStream,
    peer: SocketAddr,
    outbound: Vec<u8>,
    read_chunk: usize,
}

impl TcpConnection {
    fn new(stream: TcpStream, peer: SocketAddr) -> Self {
        Self {
            stream,
            peer,
            outbound: Vec::new(),
            read_chunk: DEFAULT_READ_CHUNK,
        }
    }

    /// Overrides the size of a single read.
    pub fn with_read_chunk(mut self, read_chunk: usize) -> Self {
        self.read_chunk = read_chunk.max(1);
        self
    }

    /// The remote address.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Registers for both read and write readiness.
    pub fn register(
        &mut self,
        registry: &Registry,
        token: Token,
    ) -> Result<(), TransportError> {
        registry
            .register(
                &mut self.stream,
                token,
                Interest::READABLE | Interest::WRITABLE,
            )
            .map_err(TransportError::PollFailed)
    }

    /// Removes the stream from the poll instance.
    pub fn deregister(
        &mut self,
        registry: &Registry,
    ) -> Result<(), TransportError> {
        registry
            .deregister(&mut self.stream)
            .map_err(TransportError::PollFailed)
    }

    /// Reads one chunk of at most `read_chunk` bytes.
    ///
    /// Readiness events are edge-triggered: the caller keeps calling this
    /// until it returns [`ReadOutcome::Drained`] or [`ReadOutcome::Closed`],
    /// or must come back to the connection later without waiting for a
    /// new event.
    pub fn read(&mut self) -> Result<ReadOutcome, TransportError> {
        let mut chunk = vec![0u8; self.read_chunk];
        loop {
            match self.stream.read(&mut chunk) {
                Ok(0) => return Ok(ReadOutcome::Closed),
                Ok(n) => {
                    chunk.truncate(n);
                    return Ok(ReadOutcome::Data(chunk));
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    return Ok(ReadOutcome::Drained);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(TransportError::ReceiveFailed(e)),
            }
        }
    }

    /// Appends bytes to the outbound buffer without touching the socket.
    pub fn queue(&mut self, bytes: &[u8]) {
        self.outbound.extend_from_slice(bytes);
    }

    /// Number of bytes still waiting to be written.
    pub fn pending_output(&self) -> usize {
        self.outbound.len()
    }

    /// Writes buffered bytes until the buffer is empty or the socket
    /// would block.
    pub fn flush(&mut self) -> Result<(), TransportError> {
        while !self.outbound.is_empty() {
            match self.stream.write(&self.outbound) {
                Ok(0) => {
                    return Err(TransportError::SendFailed(
                        io::ErrorKind::WriteZero.into(),
                    ));
                }
                Ok(n) => {
                    self.outbound.drain(..n);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(TransportError::SendFailed(e)),
            }
        }
        Ok(())
    }
}
