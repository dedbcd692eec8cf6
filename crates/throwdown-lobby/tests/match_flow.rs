//! Integration tests for the lobby: whole matches played through the
//! public API only.

use throwdown_lobby::{
    ClosureReason, Delivery, Lobby, LobbyError, MatchConfig, MatchState,
    Notice,
};
use throwdown_protocol::{Move, SessionId};

// =========================================================================
// Helpers
// =========================================================================

const ALICE: SessionId = SessionId(1);
const BOB: SessionId = SessionId(2);
const CAROL: SessionId = SessionId(3);

/// A lobby with one full match called "arena" (alice vs bob).
fn lobby_with_full_match() -> Lobby {
    let mut lobby = Lobby::new(MatchConfig::default());
    lobby.create_and_join("arena", ALICE, "alice").unwrap();
    lobby.join("arena", BOB, "bob").unwrap();
    lobby
}

fn for_player(deliveries: &[Delivery], id: SessionId) -> Vec<&Notice> {
    deliveries
        .iter()
        .filter(|d| d.to == id)
        .map(|d| &d.notice)
        .collect()
}

// =========================================================================
// Tests
// =========================================================================

#[test]
fn test_full_match_to_three_wins() {
    let mut lobby = lobby_with_full_match();
    let rounds = [
        (Move::Rock, Move::Scissors),  // alice 1-0
        (Move::Paper, Move::Scissors), // bob 1-1
        (Move::Paper, Move::Paper),    // tie
        (Move::Scissors, Move::Paper), // alice 2-1
    ];
    for (a, b) in rounds {
        lobby.submit_move("arena", ALICE, a).unwrap();
        let update = lobby.submit_move("arena", BOB, b).unwrap();
        assert!(update.closure.is_none());
    }
    let game = lobby.get("arena").unwrap();
    assert_eq!(game.score_of(ALICE), Some(2));
    assert_eq!(game.score_of(BOB), Some(1));
    assert_eq!(game.rounds(), 4);

    lobby.submit_move("arena", BOB, Move::Rock).unwrap();
    let update = lobby.submit_move("arena", ALICE, Move::Paper).unwrap();

    let closure = update.closure.expect("alice reached three");
    assert_eq!(closure.reason, ClosureReason::Won { winner: "alice".into() });
    assert_eq!(closure.released, vec![ALICE, BOB]);
    assert!(lobby.get("arena").is_none());

    // Both players saw the final result.
    for id in [ALICE, BOB] {
        assert!(for_player(&update.deliveries, id).iter().any(|n| matches!(
            n,
            Notice::MatchWon { winner, .. } if winner == "alice"
        )));
    }
}

#[test]
fn test_results_broadcast_before_next_prompt() {
    let mut lobby = lobby_with_full_match();
    lobby.submit_move("arena", ALICE, Move::Scissors).unwrap();
    let update = lobby.submit_move("arena", BOB, Move::Rock).unwrap();

    for id in [ALICE, BOB] {
        let notices = for_player(&update.deliveries, id);
        assert!(matches!(notices[0], Notice::Throws { .. }));
        assert!(matches!(
            notices[1],
            Notice::RoundWon { winner, .. } if winner == "bob"
        ));
        assert_eq!(notices[2], &Notice::MakeYourMove);
        assert_eq!(notices.len(), 3);
    }
}

#[test]
fn test_third_player_cannot_join() {
    let mut lobby = lobby_with_full_match();
    assert_eq!(
        lobby.join("arena", CAROL, "carol"),
        Err(LobbyError::MatchFull("arena".into()))
    );
}

#[test]
fn test_disconnect_mid_round_frees_name() {
    let mut lobby = lobby_with_full_match();
    lobby.submit_move("arena", BOB, Move::Rock).unwrap();

    let update = lobby.leave("arena", BOB).unwrap();

    assert_eq!(
        for_player(&update.deliveries, ALICE),
        vec![&Notice::Abandoned { by: "bob".into() }]
    );
    let closure = update.closure.unwrap();
    assert_eq!(closure.released, vec![ALICE]);
    assert!(lobby.get("arena").is_none());
    lobby.create_and_join("arena", CAROL, "carol").unwrap();
    assert_eq!(lobby.get("arena").unwrap().state(), MatchState::Forming);
}

#[test]
fn test_listing_order_survives_removals() {
    let mut lobby = Lobby::default();
    lobby.create_and_join("first", ALICE, "alice").unwrap();
    lobby.create_and_join("second", BOB, "bob").unwrap();
    lobby.create_and_join("third", CAROL, "carol").unwrap();

    lobby.leave("second", BOB).unwrap();

    let names: Vec<_> = lobby.list().into_iter().map(|i| i.name).collect();
    assert_eq!(names, vec!["first", "third"]);
}
