//! Matches and the lobby for Throwdown.
//!
//! A [`Match`] is one two-seat rock/paper/scissors contest. The [`Lobby`]
//! owns every open match, keyed by a unique name, and removes a match as
//! soon as it is won, abandoned, or left empty.
//!
//! Matches never hold sessions. They refer to players by
//! [`SessionId`](throwdown_protocol::SessionId) and report what each
//! player should be told as a list of [`Delivery`] values; the server
//! turns those into text.
//!
//! # Key types
//!
//! - [`Match`]: the round/score state machine
//! - [`Lobby`]: name registry and routing of joins, moves, and leaves
//! - [`Notice`]: structured events for the render layer
//! - [`MatchConfig`] / [`MatchState`]: settings and lifecycle

mod config;
mod error;
mod game;
mod lobby;

pub use config::{MatchConfig, MatchState};
pub use error::LobbyError;
pub use game::{Delivery, Match, Notice, Score};
pub use lobby::{Closure, ClosureReason, Lobby, LobbyUpdate, MatchInfo};
