//! Match configuration and state machine.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// MatchConfig
// ---------------------------------------------------------------------------

/// Settings shared by every match the lobby creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Round wins needed to take the match.
    pub winning_score: u32,
}

impl MatchConfig {
    /// The effective threshold; a configured 0 would end every match
    /// before it started, so it counts as 1.
    pub fn threshold(&self) -> u32 {
        self.winning_score.max(1)
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self { winning_score: 3 }
    }
}

// ---------------------------------------------------------------------------
// MatchState
// ---------------------------------------------------------------------------

/// The lifecycle state of a match.
///
/// ```text
/// Forming ──(2nd player)──→ Ready ──(2nd move)──→ Resolving ──→ Ready
///    ↑                        │                       │
///    └───(leave, no moves)────┘                       └──→ Finished
/// ```
///
/// - **Forming**: zero or one player seated. Joinable.
/// - **Ready**: both seats taken, a round is open with 0 or 1 moves in.
/// - **Resolving**: both moves are in; only visible inside a single
///   `submit_move` call.
/// - **Finished**: someone reached the winning score, or a player left
///   mid-round. Terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchState {
    Forming,
    Ready,
    Resolving,
    Finished,
}

impl MatchState {
    /// Returns `true` if the match is accepting new players.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Forming)
    }

    /// Returns `true` once the match can no longer change.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished)
    }
}

impl std::fmt::Display for MatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Forming => write!(f, "Forming"),
            Self::Ready => write!(f, "Ready"),
            Self::Resolving => write!(f, "Resolving"),
            Self::Finished => write!(f, "Finished"),
        }
    }
}
