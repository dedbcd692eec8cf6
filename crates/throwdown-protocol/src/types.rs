//! Core protocol types: session identity and the three moves.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for one live connection.
///
/// Newtype over `u64` so a session id can't be confused with a byte count
/// or an index. Ids are handed out in connect order and never reused while
/// the server runs, which is what lets `who` list sessions deterministically.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Move
// ---------------------------------------------------------------------------

/// One throw in a round of rock/paper/scissors.
///
/// The discriminants are laid out so that each variant is beaten by its
/// successor modulo 3: Rock(0) < Paper(1) < Scissors(2) < Rock(0).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Move {
    Rock = 0,
    Paper = 1,
    Scissors = 2,
}

impl Move {
    /// Every move, in cycle order.
    pub const ALL: [Move; 3] = [Move::Rock, Move::Paper, Move::Scissors];

    /// Compares two throws under the cyclic dominance relation.
    ///
    /// `Greater` means `self` beats `other`, `Less` means `other` beats
    /// `self`, `Equal` is a tie. This is deliberately *not* an `Ord` impl:
    /// the relation is not transitive.
    pub fn compare(self, other: Move) -> Ordering {
        match (self as u8 + 3 - other as u8) % 3 {
            0 => Ordering::Equal,
            1 => Ordering::Greater,
            _ => Ordering::Less,
        }
    }

    /// Returns `true` if `self` beats `other`.
    pub fn beats(self, other: Move) -> bool {
        self.compare(other) == Ordering::Greater
    }

    /// Lowercase full name, as echoed back to players.
    pub fn name(self) -> &'static str {
        match self {
            Move::Rock => "rock",
            Move::Paper => "paper",
            Move::Scissors => "scissors",
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parses `r`/`rock`, `p`/`paper`, `s`/`scissors`, ignoring ASCII case and
/// surrounding whitespace.
impl FromStr for Move {
    type Err = ProtocolError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token.trim().to_ascii_lowercase().as_str() {
            "r" | "rock" => Ok(Move::Rock),
            "p" | "paper" => Ok(Move::Paper),
            "s" | "scissors" => Ok(Move::Scissors),
            _ => Err(ProtocolError::InvalidMove(token.trim().to_string())),
        }
    }
}
