//! `ThrowdownServer` builder and event loop.
//!
//! This is the entry point for running a Throwdown server. It ties
//! together all the layers: transport → protocol → session → lobby.
//!
//! Everything runs on the calling thread. One `mio::Poll` reports
//! readiness for the listener, every client socket and a [`Waker`] used
//! to stop the loop; no state is shared across threads.

use std::collections::{BTreeSet, HashMap};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use throwdown_lobby::MatchConfig;
use throwdown_protocol::{LineCodec, SessionId};
use throwdown_transport::{
    Events, Poll, ReadOutcome, TcpConnection, TcpTransport, Token,
    TransportError, Waker,
};

use crate::handler::Hub;
use crate::{ServerConfig, ThrowdownError};

const LISTENER: Token = Token(0);
const WAKER: Token = Token(1);

/// Chunks read from one client before the loop moves on to the others.
const READS_PER_TURN: usize = 16;

/// Session ids start at 1, so client tokens start right after the waker.
fn token_for(id: SessionId) -> Token {
    Token(id.0 as usize + WAKER.0)
}

fn session_for(token: Token) -> SessionId {
    SessionId((token.0 - WAKER.0) as u64)
}

/// Builder for configuring and starting a Throwdown server.
///
/// # Example
///
/// ```rust,no_run
/// use throwdown::prelude::*;
///
/// # fn main() -> Result<(), ThrowdownError> {
/// let server = ThrowdownServer::builder()
///     .host("127.0.0.1")
///     .port(1338)
///     .build()?;
/// server.run()
/// # }
/// ```
pub struct ThrowdownServerBuilder {
    config: ServerConfig,
}

impl ThrowdownServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn host(mut self, host: &str) -> Self {
        self.config.host = host.to_string();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Sets the match settings used for every new match.
    pub fn match_config(mut self, config: MatchConfig) -> Self {
        self.config.matches = config;
        self
    }

    /// Binds the listener and sets up the poll instance.
    ///
    /// # Errors
    /// Fails if the address does not resolve, the bind fails, or the poll
    /// instance cannot be created.
    pub fn build(self) -> Result<ThrowdownServer, ThrowdownError> {
        let addr = self.config.socket_addr()?;
        let mut transport = TcpTransport::bind(addr)?;
        let poll = Poll::new().map_err(TransportError::PollFailed)?;
        transport.register(poll.registry(), LISTENER)?;
        let waker = Waker::new(poll.registry(), WAKER)
            .map_err(TransportError::PollFailed)?;

        Ok(ThrowdownServer {
            hub: Hub::new(self.config.matches.clone()),
            config: self.config,
            poll,
            transport,
            waker: Arc::new(waker),
            links: HashMap::new(),
            backlog: BTreeSet::new(),
        })
    }
}

impl Default for ThrowdownServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Stops a running server from another thread.
#[derive(Clone)]
pub struct ServerHandle {
    waker: Arc<Waker>,
}

impl ServerHandle {
    /// Wakes the event loop and makes [`ThrowdownServer::run`] return.
    pub fn stop(&self) -> Result<(), ThrowdownError> {
        self.waker.wake().map_err(TransportError::PollFailed)?;
        Ok(())
    }
}

/// A connected client: its socket plus the bytes of an unfinished line.
struct Link {
    conn: TcpConnection,
    codec: LineCodec,
}

/// A bound Throwdown server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct ThrowdownServer {
    config: ServerConfig,
    poll: Poll,
    transport: TcpTransport,
    waker: Arc<Waker>,
    links: HashMap<SessionId, Link>,
    /// Clients whose socket still held data when their read turn ended.
    backlog: BTreeSet<SessionId>,
    hub: Hub,
}

impl ThrowdownServer {
    /// Creates a new builder.
    pub fn builder() -> ThrowdownServerBuilder {
        ThrowdownServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            waker: Arc::clone(&self.waker),
        }
    }

    /// Runs the event loop until [`ServerHandle::stop`] is called.
    ///
    /// Each step handles, in order: buffered writes for writable clients,
    /// new connections, then input from readable clients. A client gets at
    /// most [`READS_PER_TURN`] chunks per step; if it has more, the next
    /// poll does not block so it is served again right after the others.
    /// Output produced by the step (including lobby announcements) is
    /// flushed before polling again.
    ///
    /// # Errors
    /// Only a failure of the poll itself ends the loop with an error;
    /// per-client failures disconnect that client.
    pub fn run(mut self) -> Result<(), ThrowdownError> {
        tracing::info!(addr = ?self.local_addr().ok(), "Throwdown server running");
        let mut events = Events::with_capacity(1024);

        loop {
            let timeout = if self.backlog.is_empty() {
                None
            } else {
                Some(Duration::ZERO)
            };
            if let Err(e) = self.poll.poll(&mut events, timeout) {
                if e.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(TransportError::PollFailed(e).into());
            }

            let mut accept = false;
            let mut readable = std::mem::take(&mut self.backlog);
            for event in events.iter() {
                match event.token() {
                    WAKER => {
                        tracing::info!(
                            sessions = self.links.len(),
                            "stop requested, shutting down"
                        );
                        return Ok(());
                    }
                    LISTENER => accept = true,
                    token => {
                        let id = session_for(token);
                        if event.is_writable() {
                            self.flush(id);
                        }
                        if event.is_readable()
                            || event.is_read_closed()
                            || event.is_error()
                        {
                            readable.insert(id);
                        }
                    }
                }
            }

            if accept {
                self.accept_all();
            }
            for id in readable {
                self.receive(id);
            }
            self.flush_all();
        }
    }

    fn accept_all(&mut self) {
        loop {
            let conn = match self.transport.accept() {
                Ok(Some(conn)) => conn,
                Ok(None) => break,
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                    break;
                }
            };

            let id = self.hub.connect();
            let mut conn = conn.with_read_chunk(self.config.read_chunk);
            if let Err(e) = conn.register(self.poll.registry(), token_for(id)) {
                tracing::warn!(session = %id, error = %e, "register failed");
                self.hub.disconnect(id);
                continue;
            }
            tracing::info!(session = %id, peer = %conn.peer_addr(), "client connected");
            self.links.insert(
                id,
                Link {
                    conn,
                    codec: LineCodec::new(self.config.max_line_len),
                },
            );
        }
    }

    /// Reads up to [`READS_PER_TURN`] chunks from a client, handing every
    /// complete line to the hub as each chunk arrives.
    fn receive(&mut self, id: SessionId) {
        for _ in 0..READS_PER_TURN {
            let Some(link) = self.links.get_mut(&id) else {
                return;
            };
            let lines = match link.conn.read() {
                Ok(ReadOutcome::Data(bytes)) => link.codec.decode(&bytes),
                Ok(ReadOutcome::Drained) => return,
                Ok(ReadOutcome::Closed) => {
                    tracing::info!(session = %id, "client closed connection");
                    self.drop_link(id);
                    return;
                }
                Err(e) => {
                    tracing::warn!(session = %id, error = %e, "read failed");
                    self.drop_link(id);
                    return;
                }
            };
            for line in lines {
                match line {
                    Ok(line) => self.hub.handle_line(id, &line),
                    Err(e) => self.hub.reject_line(id, &e),
                }
            }
        }
        tracing::trace!(session = %id, "read turn used up, client backlogged");
        self.backlog.insert(id);
    }

    /// Moves the session's pending text into the socket buffer and writes
    /// as much as the socket takes. Returns `false` if the client was
    /// dropped.
    fn flush(&mut self, id: SessionId) -> bool {
        let Some(link) = self.links.get_mut(&id) else {
            return true;
        };
        if let Some(text) = self.hub.take_output(id) {
            link.conn.queue(text.as_bytes());
        }
        if link.conn.pending_output() == 0 {
            return true;
        }
        match link.conn.flush() {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(session = %id, error = %e, "write failed");
                self.drop_link(id);
                false
            }
        }
    }

    /// Flushes every client. Dropping a client can produce output for
    /// others (an abandoned match, a departure), so repeat until a pass
    /// drops nobody.
    fn flush_all(&mut self) {
        loop {
            self.hub.fan_out();
            let ids: Vec<SessionId> = self.links.keys().copied().collect();
            let mut dropped = false;
            for id in ids {
                dropped |= !self.flush(id);
            }
            if !dropped {
                break;
            }
        }
    }

    fn drop_link(&mut self, id: SessionId) {
        self.backlog.remove(&id);
        if let Some(mut link) = self.links.remove(&id) {
            if let Err(e) = link.conn.deregister(self.poll.registry()) {
                tracing::debug!(session = %id, error = %e, "deregister failed");
            }
        }
        self.hub.disconnect(id);
    }
}
