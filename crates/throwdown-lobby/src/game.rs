//! The match: two seats, one round at a time, first to the winning score.
//!
//! A `Match` owns no sessions. Players are seated by [`SessionId`] with a
//! copy of their display name, and every operation returns the
//! [`Delivery`] list telling the caller who must hear what. The caller
//! (the server's dispatch hub) renders and queues the text.

use std::cmp::Ordering;

use throwdown_protocol::{Move, SessionId};

use crate::{LobbyError, MatchConfig, MatchState};

/// Seats per match.
pub const SEATS: usize = 2;

/// One row of a score table: display name and round wins.
pub type Score = (String, u32);

// ---------------------------------------------------------------------------
// Notices
// ---------------------------------------------------------------------------

/// Something a player should be told, before any phrasing is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// You sat down in an empty match.
    WaitingForOpponent,
    /// You sat down opposite `opponent`.
    Joined { opponent: String },
    /// `opponent` sat down opposite you.
    OpponentJoined { opponent: String },
    /// A round is open and you have not thrown yet.
    MakeYourMove,
    /// You threw before anyone sat opposite; the move is held.
    MoveHeld,
    /// You threw; `opponent` hasn't yet.
    WaitingForMove { opponent: String },
    /// Both throws of the round, in seat order.
    Throws { throws: Vec<(String, Move)> },
    /// The round was a tie.
    RoundTie { scores: Vec<Score> },
    /// `winner` took the round; nobody has reached the threshold.
    RoundWon { winner: String, scores: Vec<Score> },
    /// `winner` reached the threshold; the match is over.
    MatchWon { winner: String, scores: Vec<Score> },
    /// `opponent` left between rounds; you keep your seat.
    OpponentLeft { opponent: String },
    /// `by` left mid-round; the match is over with no winner.
    Abandoned { by: String },
}

/// A notice addressed to one seated player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub to: SessionId,
    pub notice: Notice,
}

/// Who should receive a notice.
enum Recipient {
    All,
    Player(SessionId),
}

// ---------------------------------------------------------------------------
// Match
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Seat {
    id: SessionId,
    name: String,
    score: u32,
    pending: Option<Move>,
}

/// A two-player rock/paper/scissors match.
#[derive(Debug, Clone)]
pub struct Match {
    name: String,
    config: MatchConfig,
    state: MatchState,
    seats: Vec<Seat>,
    /// Set exactly once, when a player reaches the winning score.
    winner: Option<SessionId>,
    rounds: u32,
}

impl Match {
    /// Creates an empty match in the `Forming` state.
    pub fn new(name: impl Into<String>, config: MatchConfig) -> Self {
        Self {
            name: name.into(),
            config,
            state: MatchState::Forming,
            seats: Vec::with_capacity(SEATS),
            winner: None,
            rounds: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> MatchState {
        self.state
    }

    /// The session that won, once the match is finished by a win.
    pub fn winner(&self) -> Option<SessionId> {
        self.winner
    }

    /// Number of resolved rounds (ties included).
    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    pub fn is_full(&self) -> bool {
        self.seats.len() >= SEATS
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    /// Seated players, in seat order.
    pub fn participants(&self) -> Vec<SessionId> {
        self.seats.iter().map(|s| s.id).collect()
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.seats.iter().any(|s| s.id == id)
    }

    /// Display name of a seated player.
    pub fn player_name(&self, id: SessionId) -> Option<&str> {
        self.seat(id).map(|s| s.name.as_str())
    }

    /// Display name of the player seated opposite `id`.
    pub fn opponent_of(&self, id: SessionId) -> Option<&str> {
        self.seats
            .iter()
            .find(|s| s.id != id)
            .map(|s| s.name.as_str())
    }

    /// Whether `id` has already thrown in the current round.
    pub fn has_moved(&self, id: SessionId) -> bool {
        self.seat(id).is_some_and(|s| s.pending.is_some())
    }

    /// A round is in flight once anyone has thrown.
    pub fn round_in_flight(&self) -> bool {
        self.seats.iter().any(|s| s.pending.is_some())
    }

    /// Current score table, in seat order.
    pub fn scores(&self) -> Vec<Score> {
        self.seats.iter().map(|s| (s.name.clone(), s.score)).collect()
    }

    /// Score of one seated player.
    pub fn score_of(&self, id: SessionId) -> Option<u32> {
        self.seat(id).map(|s| s.score)
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Seats a player.
    ///
    /// When this fills the match, both players are told who they face and
    /// asked to move (a player holding a move is told to wait instead).
    ///
    /// # Errors
    /// - [`LobbyError::AlreadyFinished`] if the match is over
    /// - [`LobbyError::AlreadyInMatch`] if `id` is already seated
    /// - [`LobbyError::MatchFull`] if both seats are taken
    pub fn add_participant(
        &mut self,
        id: SessionId,
        name: &str,
    ) -> Result<Vec<Delivery>, LobbyError> {
        if self.state.is_terminal() {
            return Err(LobbyError::AlreadyFinished(self.name.clone()));
        }
        if self.contains(id) {
            return Err(LobbyError::AlreadyInMatch(id, self.name.clone()));
        }
        if !self.state.is_joinable() || self.is_full() {
            return Err(LobbyError::MatchFull(self.name.clone()));
        }

        self.seats.push(Seat {
            id,
            name: name.to_string(),
            score: 0,
            pending: None,
        });
        tracing::info!(
            match_name = %self.name,
            session = %id,
            players = self.seats.len(),
            "player seated"
        );

        let mut out = Vec::new();
        if !self.is_full() {
            push(&mut out, &self.seats, Recipient::Player(id), Notice::WaitingForOpponent);
            return Ok(out);
        }

        self.state = MatchState::Ready;
        for seat in &self.seats {
            let opponent = self.opponent_of(seat.id).unwrap_or_default().to_string();
            let notice = if seat.id == id {
                Notice::Joined { opponent }
            } else {
                Notice::OpponentJoined { opponent }
            };
            push(&mut out, &self.seats, Recipient::Player(seat.id), notice);
        }
        self.prompt_pending(&mut out);
        Ok(out)
    }

    /// Unseats a player.
    ///
    /// If a round is in flight the match ends as abandoned: the remaining
    /// player is told and the match becomes `Finished` with no winner.
    /// Otherwise the remaining player keeps the seat, the score table is
    /// reset and the match goes back to `Forming`.
    ///
    /// # Errors
    /// - [`LobbyError::AlreadyFinished`] if the match is over
    /// - [`LobbyError::NotAParticipant`] if `id` isn't seated
    pub fn remove_participant(
        &mut self,
        id: SessionId,
    ) -> Result<Vec<Delivery>, LobbyError> {
        if self.state.is_terminal() {
            return Err(LobbyError::AlreadyFinished(self.name.clone()));
        }
        let index = self
            .seats
            .iter()
            .position(|s| s.id == id)
            .ok_or(LobbyError::NotAParticipant(id))?;

        let abandoned = self.round_in_flight();
        let leaver = self.seats.remove(index);
        let mut out = Vec::new();

        if abandoned {
            self.state = MatchState::Finished;
            push(
                &mut out,
                &self.seats,
                Recipient::All,
                Notice::Abandoned { by: leaver.name.clone() },
            );
            tracing::info!(
                match_name = %self.name,
                session = %id,
                "match abandoned mid-round"
            );
        } else {
            self.state = MatchState::Forming;
            // The next opponent starts a fresh match.
            self.rounds = 0;
            for seat in &mut self.seats {
                seat.score = 0;
            }
            push(
                &mut out,
                &self.seats,
                Recipient::All,
                Notice::OpponentLeft { opponent: leaver.name.clone() },
            );
            push(&mut out, &self.seats, Recipient::All, Notice::WaitingForOpponent);
            tracing::info!(
                match_name = %self.name,
                session = %id,
                players = self.seats.len(),
                "player left between rounds"
            );
        }
        Ok(out)
    }

    /// Records a throw.
    ///
    /// Before the match is full the throw is held. Throwing again before
    /// the opponent does replaces the earlier throw. The second throw of a
    /// round resolves it, in this order: both throws are announced, the
    /// winner's score is bumped, the threshold is checked, the round or
    /// match result is announced, the round is cleared, and then either
    /// the match finishes or both players are asked for the next move.
    ///
    /// # Errors
    /// - [`LobbyError::AlreadyFinished`] if the match is over
    /// - [`LobbyError::NotAParticipant`] if `id` isn't seated
    pub fn submit_move(
        &mut self,
        id: SessionId,
        mv: Move,
    ) -> Result<Vec<Delivery>, LobbyError> {
        if self.state.is_terminal() {
            return Err(LobbyError::AlreadyFinished(self.name.clone()));
        }
        let seat = self
            .seat_mut(id)
            .ok_or(LobbyError::NotAParticipant(id))?;
        let replaced = seat.pending.replace(mv).is_some();
        tracing::debug!(match_name = %self.name, session = %id, replaced, "move received");

        let mut out = Vec::new();
        if !self.is_full() {
            push(&mut out, &self.seats, Recipient::Player(id), Notice::MoveHeld);
            return Ok(out);
        }

        let moves: Vec<Move> = self.seats.iter().filter_map(|s| s.pending).collect();
        if moves.len() < SEATS {
            let opponent = self.opponent_of(id).unwrap_or_default().to_string();
            push(
                &mut out,
                &self.seats,
                Recipient::Player(id),
                Notice::WaitingForMove { opponent },
            );
            return Ok(out);
        }

        self.resolve(moves[0], moves[1], &mut out);
        Ok(out)
    }

    fn resolve(&mut self, first: Move, second: Move, out: &mut Vec<Delivery>) {
        self.state = MatchState::Resolving;
        self.rounds += 1;

        let throws = self
            .seats
            .iter()
            .zip([first, second])
            .map(|(s, m)| (s.name.clone(), m))
            .collect();
        push(out, &self.seats, Recipient::All, Notice::Throws { throws });

        let round_winner = match first.compare(second) {
            Ordering::Greater => Some(0),
            Ordering::Less => Some(1),
            Ordering::Equal => None,
        };

        let notice = match round_winner {
            None => Notice::RoundTie { scores: self.scores() },
            Some(index) => {
                let seat = &mut self.seats[index];
                seat.score += 1;
                let (id, winner, score) = (seat.id, seat.name.clone(), seat.score);
                if score >= self.config.threshold() {
                    self.winner = Some(id);
                    Notice::MatchWon { winner, scores: self.scores() }
                } else {
                    Notice::RoundWon { winner, scores: self.scores() }
                }
            }
        };
        push(out, &self.seats, Recipient::All, notice);

        for seat in &mut self.seats {
            seat.pending = None;
        }

        if let Some(winner) = self.winner {
            self.state = MatchState::Finished;
            tracing::info!(
                match_name = %self.name,
                %winner,
                rounds = self.rounds,
                "match won"
            );
        } else {
            self.state = MatchState::Ready;
            self.prompt_pending(out);
        }
    }

    /// Asks every seated player who hasn't thrown to move; tells a player
    /// holding a throw to wait for the opponent.
    fn prompt_pending(&self, out: &mut Vec<Delivery>) {
        for seat in &self.seats {
            let notice = match seat.pending {
                None => Notice::MakeYourMove,
                Some(_) => Notice::WaitingForMove {
                    opponent: self.opponent_of(seat.id).unwrap_or_default().to_string(),
                },
            };
            push(out, &self.seats, Recipient::Player(seat.id), notice);
        }
    }

    fn seat(&self, id: SessionId) -> Option<&Seat> {
        self.seats.iter().find(|s| s.id == id)
    }

    fn seat_mut(&mut self, id: SessionId) -> Option<&mut Seat> {
        self.seats.iter_mut().find(|s| s.id == id)
    }
}

/// Resolves a recipient against the current seats.
fn push(out: &mut Vec<Delivery>, seats: &[Seat], to: Recipient, notice: Notice) {
    match to {
        Recipient::All => {
            for seat in seats {
                out.push(Delivery { to: seat.id, notice: notice.clone() });
            }
        }
        Recipient::Player(id) => out.push(Delivery { to: id, notice }),
    }
}
