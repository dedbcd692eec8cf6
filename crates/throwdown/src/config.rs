//! Server configuration.

use std::net::{SocketAddr, ToSocketAddrs};

use serde::{Deserialize, Serialize};
use throwdown_lobby::MatchConfig;
use throwdown_protocol::DEFAULT_MAX_LINE_LEN;
use throwdown_transport::DEFAULT_READ_CHUNK;

use crate::ThrowdownError;

/// Everything the server needs to start listening.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Longest accepted input line, in bytes.
    pub max_line_len: usize,
    /// Size of each read from a client socket.
    pub read_chunk: usize,
    pub matches: MatchConfig,
}

impl ServerConfig {
    /// Resolves `host:port` to the first matching socket address.
    ///
    /// # Errors
    /// Returns [`ThrowdownError::InvalidAddress`] if the host does not
    /// resolve.
    pub fn socket_addr(&self) -> Result<SocketAddr, ThrowdownError> {
        let addr = format!("{}:{}", self.host, self.port);
        let invalid = |reason: String| ThrowdownError::InvalidAddress {
            addr: addr.clone(),
            reason,
        };
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| invalid(e.to_string()))?
            .next()
            .ok_or_else(|| invalid("no addresses found".into()))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 1338,
            max_line_len: DEFAULT_MAX_LINE_LEN,
            read_chunk: DEFAULT_READ_CHUNK,
            matches: MatchConfig::default(),
        }
    }
}
