//! # Throwdown
//!
//! A rock/paper/scissors lobby server for plain TCP clients (`telnet`,
//! `nc`). Players name themselves, open or join two-seat matches, and
//! play best-of rounds by typing `r`, `p` or `s`.
//!
//! The server is single-threaded: one `mio` poll loop drives every
//! socket, and a [`Hub`] holds all sessions and matches.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use throwdown::prelude::*;
//!
//! # fn main() -> Result<(), ThrowdownError> {
//! let server = ThrowdownServer::builder()
//!     .host("0.0.0.0")
//!     .port(1338)
//!     .build()?;
//! server.run()
//! # }
//! ```

mod config;
mod error;
mod handler;
pub mod logging;
mod render;
mod server;

pub use config::ServerConfig;
pub use error::ThrowdownError;
pub use handler::Hub;
pub use server::{ServerHandle, ThrowdownServer, ThrowdownServerBuilder};

pub mod prelude {
    pub use crate::{
        ServerConfig, ServerHandle, ThrowdownError, ThrowdownServer,
        ThrowdownServerBuilder,
    };
    pub use throwdown_lobby::MatchConfig;
}
