/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Binding the listening socket failed.
    #[error("bind to {addr} failed: {source}")]
    BindFailed {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Accepting a connection failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    /// Reading from a connection failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// Writing to a connection failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Registering with, or waiting on, the poll instance failed.
    #[error("poll failed: {0}")]
    PollFailed(#[source] std::io::Error),
}
