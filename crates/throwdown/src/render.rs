//! Text rendering: turns lobby events and command results into the lines
//! a client sees.

use throwdown_lobby::{ClosureReason, MatchInfo, Notice, Score};
use throwdown_protocol::Move;

pub const NAME_PROMPT: &str = "What's your name? ";
pub const LOBBY_PROMPT: &str = "> ";

pub fn welcome() -> String {
    "Welcome to Rock Paper Scissors! Type \"?\" for help once you're in.".into()
}

pub fn greeting(name: &str) -> String {
    format!("Hi {name}! Type \"?\" for help.")
}

pub fn match_prompt(match_name: &str, opponent: &str) -> String {
    format!("playing {match_name} against {opponent} > ")
}

pub fn help() -> String {
    [
        "Commands:",
        "  ?                 show this help",
        "  l, list           list matches",
        "  who               list players",
        "  c, create <name>  create a match and wait for an opponent",
        "  j, join <name>    join a match",
        "In a match, type r, p or s (or rock, paper, scissors).",
    ]
    .join("\n")
}

pub fn list(matches: &[MatchInfo]) -> String {
    if matches.is_empty() {
        return "No matches".into();
    }
    matches
        .iter()
        .map(|m| {
            let status = if m.is_full() { "full" } else { "open" };
            format!("- {} ({status})", m.name)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// One line per player; `players` pairs a name with its current match.
pub fn who<'a>(players: impl IntoIterator<Item = (&'a str, Option<&'a str>)>) -> String {
    players
        .into_iter()
        .map(|(name, current)| match current {
            Some(m) => format!("- {name} (in {m})"),
            None => format!("- {name}"),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn scores(scores: &[Score]) -> String {
    scores
        .iter()
        .map(|(name, score)| format!("{name} {score}"))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn notice(notice: &Notice) -> String {
    match notice {
        Notice::WaitingForOpponent => "Waiting for an opponent...".into(),
        Notice::Joined { opponent } => format!("You are playing against {opponent}"),
        Notice::OpponentJoined { opponent } => format!("{opponent} joined, game on!"),
        Notice::MakeYourMove => "Make your move: (r)ock, (p)aper or (s)cissors".into(),
        Notice::MoveHeld => "Move noted, waiting for an opponent to join".into(),
        Notice::WaitingForMove { opponent } => format!("Waiting for {opponent} to move..."),
        Notice::Throws { throws } => throws
            .iter()
            .map(|(name, mv)| format!("{name} threw {mv}"))
            .collect::<Vec<_>>()
            .join(", "),
        Notice::RoundTie { scores: s } => format!("Tie!\nScore: {}", scores(s)),
        Notice::RoundWon { winner, scores: s } => {
            format!("{winner} wins the round!\nScore: {}", scores(s))
        }
        Notice::MatchWon { winner, scores: s } => {
            format!("{winner} wins the match!\nFinal score: {}", scores(s))
        }
        Notice::OpponentLeft { opponent } => format!("{opponent} left the match"),
        Notice::Abandoned { by } => format!("{by} left mid-round, the match is over"),
    }
}

pub fn invalid_move(text: &str) -> String {
    let choices = Move::ALL
        .iter()
        .map(|m| m.name())
        .collect::<Vec<_>>()
        .join(", ");
    format!("Invalid move \"{text}\". Choose one of: {choices}")
}

pub fn unrecognized(text: &str) -> String {
    format!("Unrecognized command: {text}. Type \"?\" for help.")
}

pub fn usage(verb: &str) -> String {
    format!("Usage: {verb} <match name>")
}

pub fn line_too_long(max: usize) -> String {
    format!("Line too long (limit {max} bytes), ignored")
}

/// Capitalizes the first letter of an error message for display.
pub fn error(err: &impl std::fmt::Display) -> String {
    let text = err.to_string();
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => text,
    }
}

// ---------------------------------------------------------------------------
// Lobby announcements
// ---------------------------------------------------------------------------

pub fn joined_server(name: &str) -> String {
    format!("{name} joined the server")
}

pub fn left_server(name: &str) -> String {
    format!("{name} left the server")
}

pub fn opened(name: &str, match_name: &str) -> String {
    format!("{name} opened match {match_name}")
}

/// Announcement for a closed match; an emptied match closes silently.
pub fn closed(match_name: &str, reason: &ClosureReason) -> Option<String> {
    match reason {
        ClosureReason::Won { winner } => Some(format!("{winner} won match {match_name}")),
        ClosureReason::Abandoned { .. } => Some(format!("match {match_name} was abandoned")),
        ClosureReason::Emptied => None,
    }
}
