//! The lobby: registers matches by name and routes players to them.
//!
//! The lobby is the only owner of [`Match`] values. It is also where a
//! match's end is turned into removal: as soon as an operation leaves a
//! match `Finished` (or empty), the lobby drops it and reports a
//! [`Closure`] so the caller can detach the players and free the name.

use throwdown_protocol::{Move, SessionId};

use crate::game::SEATS;
use crate::{Delivery, LobbyError, Match, MatchConfig, MatchState};

/// A row of the lobby listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchInfo {
    pub name: String,
    /// Seats taken.
    pub players: usize,
    /// Seats in total.
    pub capacity: usize,
    pub state: MatchState,
}

impl MatchInfo {
    pub fn is_full(&self) -> bool {
        self.players >= self.capacity
    }
}

/// Why a match left the lobby.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClosureReason {
    /// A player reached the winning score.
    Won { winner: String },
    /// A player left (or disconnected) mid-round.
    Abandoned { by: String },
    /// The last seated player left between rounds.
    Emptied,
}

/// A match that was just removed from the lobby.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Closure {
    pub name: String,
    pub reason: ClosureReason,
    /// Sessions still seated at the end; their current-match reference
    /// must be cleared.
    pub released: Vec<SessionId>,
}

/// Result of a lobby operation that may end a match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LobbyUpdate {
    pub deliveries: Vec<Delivery>,
    pub closure: Option<Closure>,
}

/// Insertion-ordered registry of open matches.
///
/// Match names are unique while registered. Lookups are linear; a lobby
/// holds a handful of matches at a time.
pub struct Lobby {
    matches: Vec<Match>,
    config: MatchConfig,
}

impl Lobby {
    /// Creates an empty lobby whose matches use `config`.
    pub fn new(config: MatchConfig) -> Self {
        Self {
            matches: Vec::new(),
            config,
        }
    }

    /// Registers a new, empty match.
    ///
    /// # Errors
    /// Returns [`LobbyError::NameTaken`] if a match with this name is
    /// registered; the existing match is left untouched.
    pub fn create(&mut self, name: &str) -> Result<&mut Match, LobbyError> {
        if self.position(name).is_some() {
            return Err(LobbyError::NameTaken(name.to_string()));
        }
        self.matches.push(Match::new(name, self.config.clone()));
        tracing::info!(match_name = name, "match created");
        let index = self.matches.len() - 1;
        Ok(&mut self.matches[index])
    }

    pub fn get(&self, name: &str) -> Option<&Match> {
        self.matches.iter().find(|m| m.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Match> {
        self.matches.iter_mut().find(|m| m.name() == name)
    }

    /// Unregisters a match. A no-op if the name is unknown.
    pub fn remove(&mut self, name: &str) -> Option<Match> {
        let index = self.position(name)?;
        let removed = self.matches.remove(index);
        tracing::info!(match_name = name, "match removed");
        Some(removed)
    }

    /// Every registered match, in creation order.
    pub fn list(&self) -> Vec<MatchInfo> {
        self.matches
            .iter()
            .map(|m| MatchInfo {
                name: m.name().to_string(),
                players: m.participants().len(),
                capacity: SEATS,
                state: m.state(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    // -----------------------------------------------------------------------
    // Routing
    // -----------------------------------------------------------------------

    /// Seats a player in an existing match.
    ///
    /// # Errors
    /// [`LobbyError::MatchNotFound`], or whatever
    /// [`Match::add_participant`] rejects with.
    pub fn join(
        &mut self,
        name: &str,
        id: SessionId,
        player_name: &str,
    ) -> Result<Vec<Delivery>, LobbyError> {
        self.get_mut(name)
            .ok_or_else(|| LobbyError::MatchNotFound(name.to_string()))?
            .add_participant(id, player_name)
    }

    /// Creates a match and seats its creator in it.
    ///
    /// # Errors
    /// Returns [`LobbyError::NameTaken`] if the name is registered.
    pub fn create_and_join(
        &mut self,
        name: &str,
        id: SessionId,
        player_name: &str,
    ) -> Result<Vec<Delivery>, LobbyError> {
        self.create(name)?.add_participant(id, player_name)
    }

    /// Routes a throw to a match, removing the match if it ends.
    pub fn submit_move(
        &mut self,
        name: &str,
        id: SessionId,
        mv: Move,
    ) -> Result<LobbyUpdate, LobbyError> {
        let game = self
            .get_mut(name)
            .ok_or_else(|| LobbyError::MatchNotFound(name.to_string()))?;
        let deliveries = game.submit_move(id, mv)?;

        let winner = game
            .winner()
            .and_then(|w| game.player_name(w))
            .map(str::to_string);
        let closure = match winner {
            Some(winner) => self.close(name, ClosureReason::Won { winner }),
            None => None,
        };
        Ok(LobbyUpdate { deliveries, closure })
    }

    /// Unseats a player, removing the match if that ends or empties it.
    pub fn leave(
        &mut self,
        name: &str,
        id: SessionId,
    ) -> Result<LobbyUpdate, LobbyError> {
        let game = self
            .get_mut(name)
            .ok_or_else(|| LobbyError::MatchNotFound(name.to_string()))?;
        let leaver = game
            .player_name(id)
            .ok_or(LobbyError::NotAParticipant(id))?
            .to_string();
        let deliveries = game.remove_participant(id)?;

        let reason = if game.state().is_terminal() {
            Some(ClosureReason::Abandoned { by: leaver })
        } else if game.is_empty() {
            Some(ClosureReason::Emptied)
        } else {
            None
        };
        let closure = reason.and_then(|reason| self.close(name, reason));
        Ok(LobbyUpdate { deliveries, closure })
    }

    fn close(&mut self, name: &str, reason: ClosureReason) -> Option<Closure> {
        let game = self.remove(name)?;
        Some(Closure {
            name: name.to_string(),
            reason,
            released: game.participants(),
        })
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.matches.iter().position(|m| m.name() == name)
    }
}

impl Default for Lobby {
    fn default() -> Self {
        Self::new(MatchConfig::default())
    }
}
