//! Line handler: turns one decoded input line into state changes and
//! outgoing text.
//!
//! The [`Hub`] owns every session and the lobby. The server feeds it
//! lines and lifecycle events; it never touches a socket, so the whole
//! command flow can be driven from tests.
//!
//! Each step follows the same pattern:
//!   1. Route the line by the session's state (unnamed, lobby, in match)
//!   2. Render lobby [`Delivery`]s into the recipients' outboxes
//!   3. Queue lobby announcements for [`Hub::fan_out`]
//!   4. Append exactly one prompt to every session that was written to

use std::collections::{BTreeSet, VecDeque};

use throwdown_lobby::{
    Closure, Delivery, Lobby, LobbyError, LobbyUpdate, MatchConfig,
};
use throwdown_protocol::{Command, Move, ProtocolError, SessionId};
use throwdown_session::{SessionError, SessionManager, SessionState};

use crate::render;

/// A lobby-wide message waiting to be merged into idle sessions' output.
struct Announcement {
    text: String,
    /// Sessions that already know; usually the one that caused it.
    except: Vec<SessionId>,
}

/// Dispatch engine shared by every connection.
pub struct Hub {
    sessions: SessionManager,
    lobby: Lobby,
    announcements: VecDeque<Announcement>,
    /// Sessions written to during the current step; each gets one prompt.
    touched: BTreeSet<SessionId>,
}

impl Hub {
    pub fn new(config: MatchConfig) -> Self {
        Self {
            sessions: SessionManager::new(),
            lobby: Lobby::new(config),
            announcements: VecDeque::new(),
            touched: BTreeSet::new(),
        }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn lobby(&self) -> &Lobby {
        &self.lobby
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Registers a new connection and greets it with the name prompt.
    pub fn connect(&mut self) -> SessionId {
        let id = self.sessions.create();
        self.say(id, &render::welcome());
        self.finish_step();
        id
    }

    /// Tears a session down: leaves its match (possibly ending it for the
    /// opponent) and tells the lobby. Unknown ids are ignored.
    pub fn disconnect(&mut self, id: SessionId) {
        let Ok(session) = self.sessions.remove(id) else {
            return;
        };

        if let Some(match_name) = session.current_match() {
            match self.lobby.leave(match_name, id) {
                Ok(update) => self.apply(update),
                Err(e) => {
                    tracing::warn!(
                        session = %id, match_name, error = %e,
                        "disconnecting session was not seated"
                    );
                }
            }
        }
        if let Some(name) = session.name() {
            self.announce(render::left_server(name), vec![id]);
        }
        self.finish_step();
    }

    // -----------------------------------------------------------------------
    // Input
    // -----------------------------------------------------------------------

    /// Handles one complete line from a session.
    pub fn handle_line(&mut self, id: SessionId, line: &str) {
        let Some(session) = self.sessions.get_mut(id) else {
            return;
        };
        session.input_received();
        let state = session.state();
        let current = session.current_match().map(str::to_string);
        tracing::debug!(session = %id, ?state, line, "line received");

        self.touch(id);
        match (state, current) {
            (SessionState::InMatch, Some(match_name)) => {
                self.play(id, &match_name, line);
            }
            (SessionState::Unnamed, _) => self.name_session(id, line),
            _ => self.command(id, line),
        }
        self.finish_step();
    }

    /// Reports a line the codec rejected. The connection stays open.
    pub fn reject_line(&mut self, id: SessionId, err: &ProtocolError) {
        tracing::debug!(session = %id, error = %err, "line rejected");
        if let Some(session) = self.sessions.get_mut(id) {
            session.input_received();
        }
        let text = match err {
            ProtocolError::LineTooLong { max, .. } => render::line_too_long(*max),
            other => render::error(other),
        };
        self.say(id, &text);
        self.finish_step();
    }

    // -----------------------------------------------------------------------
    // Output
    // -----------------------------------------------------------------------

    /// Merges queued announcements into every named session sitting in the
    /// lobby, each followed by a prompt. Text that arrives while the client
    /// sits at a prompt starts on a fresh line. Call once per loop step,
    /// before flushing.
    pub fn fan_out(&mut self) {
        while let Some(announcement) = self.announcements.pop_front() {
            for id in self.sessions.idle(None) {
                if announcement.except.contains(&id) {
                    continue;
                }
                self.say(id, &announcement.text);
            }
        }
        self.finish_step();
    }

    /// Takes the text buffered for a session.
    pub fn take_output(&mut self, id: SessionId) -> Option<String> {
        self.sessions.get_mut(id)?.flush()
    }

    // -----------------------------------------------------------------------
    // Routing
    // -----------------------------------------------------------------------

    fn name_session(&mut self, id: SessionId, line: &str) {
        let Some(session) = self.sessions.get_mut(id) else {
            return;
        };
        match session.assign_name(line) {
            Ok(()) => {
                let name = session.label();
                self.say(id, &render::greeting(&name));
                self.announce(render::joined_server(&name), vec![id]);
            }
            // The name prompt is repeated by finish_step.
            Err(SessionError::EmptyName) => {}
            Err(e) => self.refuse(id, &e),
        }
    }

    fn command(&mut self, id: SessionId, line: &str) {
        match Command::parse(line) {
            Ok(Command::Help) => self.say(id, &render::help()),
            Ok(Command::List) => {
                let text = render::list(&self.lobby.list());
                self.say(id, &text);
            }
            Ok(Command::Who) => {
                let text = render::who(
                    self.sessions
                        .iter()
                        .filter_map(|s| Some((s.name()?, s.current_match()))),
                );
                self.say(id, &text);
            }
            Ok(Command::Create(name)) => self.create(id, &name),
            Ok(Command::Join(name)) => self.join(id, &name),
            Ok(Command::Blank) => {}
            Ok(Command::Unknown(text)) => self.say(id, &render::unrecognized(&text)),
            Err(ProtocolError::MissingArgument(verb)) => {
                self.say(id, &render::usage(verb));
            }
            Err(e) => self.refuse(id, &e),
        }
    }

    fn create(&mut self, id: SessionId, match_name: &str) {
        let player = self.player_name(id);
        match self.lobby.create_and_join(match_name, id, &player) {
            Ok(deliveries) => {
                self.seat(id, match_name);
                self.deliver(deliveries);
                self.announce(render::opened(&player, match_name), vec![id]);
            }
            Err(e) => self.refuse(id, &e),
        }
    }

    fn join(&mut self, id: SessionId, match_name: &str) {
        let player = self.player_name(id);
        match self.lobby.join(match_name, id, &player) {
            Ok(deliveries) => {
                self.seat(id, match_name);
                self.deliver(deliveries);
            }
            Err(e) => self.refuse(id, &e),
        }
    }

    fn play(&mut self, id: SessionId, match_name: &str, line: &str) {
        let mv = match line.parse::<Move>() {
            Ok(mv) => mv,
            Err(e) => {
                tracing::debug!(session = %id, error = %e, "invalid move");
                self.say(id, &render::invalid_move(line.trim()));
                return;
            }
        };
        match self.lobby.submit_move(match_name, id, mv) {
            Ok(update) => self.apply(update),
            Err(LobbyError::MatchNotFound(_)) => {
                // Stale reference; put the session back in the lobby.
                tracing::warn!(session = %id, match_name, "match vanished");
                if let Some(session) = self.sessions.get_mut(id) {
                    session.leave_match();
                }
            }
            Err(e) => self.refuse(id, &e),
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn player_name(&self, id: SessionId) -> String {
        self.sessions
            .get(id)
            .map(|s| s.label())
            .unwrap_or_else(|| id.to_string())
    }

    fn seat(&mut self, id: SessionId, match_name: &str) {
        if let Some(session) = self.sessions.get_mut(id) {
            if let Err(e) = session.enter_match(match_name) {
                tracing::warn!(session = %id, error = %e, "seat mismatch");
            }
        }
    }

    fn apply(&mut self, update: LobbyUpdate) {
        self.deliver(update.deliveries);
        if let Some(closure) = update.closure {
            self.release(closure);
        }
    }

    fn deliver(&mut self, deliveries: Vec<Delivery>) {
        for delivery in deliveries {
            self.say(delivery.to, &render::notice(&delivery.notice));
        }
    }

    /// Detaches the players of a closed match and tells the lobby.
    fn release(&mut self, closure: Closure) {
        for id in &closure.released {
            if let Some(session) = self.sessions.get_mut(*id) {
                session.leave_match();
                self.touched.insert(*id);
            }
        }
        if let Some(text) = render::closed(&closure.name, &closure.reason) {
            self.announce(text, closure.released);
        }
    }

    fn refuse(&mut self, id: SessionId, err: &impl std::fmt::Display) {
        tracing::debug!(session = %id, error = %err, "request refused");
        self.say(id, &render::error(err));
    }

    fn say(&mut self, id: SessionId, text: &str) {
        self.sessions.enqueue(id, text);
        self.touch(id);
    }

    fn touch(&mut self, id: SessionId) {
        self.touched.insert(id);
    }

    fn announce(&mut self, text: String, except: Vec<SessionId>) {
        tracing::debug!(text, "announcement queued");
        self.announcements.push_back(Announcement { text, except });
    }

    /// Appends the prompt for every session written to in this step.
    fn finish_step(&mut self) {
        for id in std::mem::take(&mut self.touched) {
            if let Some(prompt) = self.prompt(id) {
                if let Some(session) = self.sessions.get_mut(id) {
                    session.enqueue_prompt(&prompt);
                }
            }
        }
    }

    /// What the session should see at the end of its output, if anything.
    ///
    /// A seated player gets no prompt while waiting for an opponent to
    /// join or to move.
    fn prompt(&self, id: SessionId) -> Option<String> {
        let session = self.sessions.get(id)?;
        match session.state() {
            SessionState::Unnamed => Some(render::NAME_PROMPT.into()),
            SessionState::Lobby => Some(render::LOBBY_PROMPT.into()),
            SessionState::InMatch => {
                let game = self.lobby.get(session.current_match()?)?;
                if !game.is_full() || game.has_moved(id) {
                    return None;
                }
                Some(render::match_prompt(game.name(), game.opponent_of(id)?))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hub() -> Hub {
        Hub::new(MatchConfig::default())
    }

    fn output(hub: &mut Hub, id: SessionId) -> String {
        hub.take_output(id).unwrap_or_default()
    }

    /// Connects and names a session, discarding the greeting.
    fn player(hub: &mut Hub, name: &str) -> SessionId {
        let id = hub.connect();
        hub.handle_line(id, name);
        hub.fan_out();
        output(hub, id);
        id
    }

    /// Two players seated in `arena`, outputs drained.
    fn seated_pair(hub: &mut Hub) -> (SessionId, SessionId) {
        let alice = player(hub, "alice");
        let bob = player(hub, "bob");
        hub.handle_line(alice, "c arena");
        hub.handle_line(bob, "j arena");
        hub.fan_out();
        output(hub, alice);
        output(hub, bob);
        (alice, bob)
    }

    // -----------------------------------------------------------------------
    // Naming
    // -----------------------------------------------------------------------

    #[test]
    fn test_connect_sends_welcome_and_name_prompt() {
        let mut hub = hub();
        let id = hub.connect();
        let out = output(&mut hub, id);
        assert!(out.starts_with(&render::welcome()));
        assert!(out.ends_with(render::NAME_PROMPT));
    }

    #[test]
    fn test_first_line_names_session() {
        let mut hub = hub();
        let id = hub.connect();
        output(&mut hub, id);

        hub.handle_line(id, "alice");

        assert_eq!(hub.sessions().get(id).unwrap().name(), Some("alice"));
        let out = output(&mut hub, id);
        assert!(out.contains("Hi alice!"));
        assert!(out.ends_with(render::LOBBY_PROMPT));
    }

    #[test]
    fn test_blank_name_reprompts() {
        let mut hub = hub();
        let id = hub.connect();
        output(&mut hub, id);

        hub.handle_line(id, "   ");

        assert_eq!(hub.sessions().get(id).unwrap().name(), None);
        assert_eq!(output(&mut hub, id), render::NAME_PROMPT);
    }

    #[test]
    fn test_join_is_announced_to_idle_players_only() {
        let mut hub = hub();
        let alice = player(&mut hub, "alice");
        let unnamed = hub.connect();
        output(&mut hub, unnamed);

        let bob = hub.connect();
        hub.handle_line(bob, "bob");
        hub.fan_out();

        assert_eq!(output(&mut hub, alice), "\nbob joined the server\n> ");
        assert_eq!(output(&mut hub, unnamed), "");
        assert!(!output(&mut hub, bob).contains("joined the server"));
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    #[test]
    fn test_help_and_unknown() {
        let mut hub = hub();
        let id = player(&mut hub, "alice");

        hub.handle_line(id, "?");
        assert!(output(&mut hub, id).contains("create <name>"));

        hub.handle_line(id, "dance");
        assert_eq!(
            output(&mut hub, id),
            "Unrecognized command: dance. Type \"?\" for help.\n> "
        );
    }

    #[test]
    fn test_blank_line_in_lobby_only_prompts() {
        let mut hub = hub();
        let id = player(&mut hub, "alice");
        hub.handle_line(id, "");
        assert_eq!(output(&mut hub, id), "> ");
    }

    #[test]
    fn test_list_shows_matches_in_creation_order() {
        let mut hub = hub();
        let alice = player(&mut hub, "alice");
        let bob = player(&mut hub, "bob");
        let carol = player(&mut hub, "carol");

        hub.handle_line(carol, "l");
        assert_eq!(output(&mut hub, carol), "No matches\n> ");

        hub.handle_line(alice, "c zeta");
        hub.handle_line(bob, "create alpha");
        hub.handle_line(carol, "join zeta");
        output(&mut hub, carol);

        let dave = player(&mut hub, "dave");
        hub.handle_line(dave, "list");
        assert_eq!(
            output(&mut hub, dave),
            "- zeta (full)\n- alpha (open)\n> "
        );
    }

    #[test]
    fn test_who_lists_named_players() {
        let mut hub = hub();
        let alice = player(&mut hub, "alice");
        let _unnamed = hub.connect();
        let bob = player(&mut hub, "bob");
        hub.handle_line(alice, "c arena");

        hub.handle_line(bob, "who");
        assert_eq!(
            output(&mut hub, bob),
            "- alice (in arena)\n- bob\n> "
        );
    }

    #[test]
    fn test_create_without_argument_shows_usage() {
        let mut hub = hub();
        let id = player(&mut hub, "alice");
        hub.handle_line(id, "c");
        assert_eq!(output(&mut hub, id), "Usage: create <match name>\n> ");
        assert!(hub.lobby().is_empty());
    }

    #[test]
    fn test_create_seats_creator_and_waits() {
        let mut hub = hub();
        let alice = player(&mut hub, "alice");
        let bob = player(&mut hub, "bob");

        hub.handle_line(alice, "c \"the arena\"");
        hub.fan_out();

        let session = hub.sessions().get(alice).unwrap();
        assert_eq!(session.current_match(), Some("the arena"));
        // Waiting for an opponent: no prompt.
        assert_eq!(output(&mut hub, alice), "Waiting for an opponent...\n");
        assert_eq!(output(&mut hub, bob), "\nalice opened match the arena\n> ");
    }

    #[test]
    fn test_create_taken_name_leaves_state_unchanged() {
        let mut hub = hub();
        let alice = player(&mut hub, "alice");
        let bob = player(&mut hub, "bob");
        hub.handle_line(alice, "c arena");

        hub.handle_line(bob, "c arena");

        assert_eq!(output(&mut hub, bob), "Name \"arena\" taken\n> ");
        assert_eq!(hub.sessions().get(bob).unwrap().current_match(), None);
        assert_eq!(hub.lobby().get("arena").unwrap().participants(), vec![alice]);
    }

    #[test]
    fn test_join_full_and_missing_matches() {
        let mut hub = hub();
        seated_pair(&mut hub);
        let carol = player(&mut hub, "carol");

        hub.handle_line(carol, "j arena");
        assert_eq!(output(&mut hub, carol), "Match \"arena\" is full\n> ");

        hub.handle_line(carol, "j nowhere");
        assert_eq!(output(&mut hub, carol), "No match \"nowhere\"\n> ");
        assert_eq!(hub.sessions().get(carol).unwrap().current_match(), None);
    }

    #[test]
    fn test_join_prompts_both_players() {
        let mut hub = hub();
        let alice = player(&mut hub, "alice");
        let bob = player(&mut hub, "bob");
        hub.handle_line(alice, "c arena");
        output(&mut hub, alice);

        hub.handle_line(bob, "j arena");

        let alice_out = output(&mut hub, alice);
        let bob_out = output(&mut hub, bob);
        assert!(alice_out.contains("bob joined, game on!"));
        assert!(alice_out.ends_with("playing arena against bob > "));
        assert!(bob_out.contains("You are playing against alice"));
        assert!(bob_out.ends_with("playing arena against alice > "));
    }

    // -----------------------------------------------------------------------
    // Play
    // -----------------------------------------------------------------------

    #[test]
    fn test_invalid_move_reprompts() {
        let mut hub = hub();
        let (alice, _) = seated_pair(&mut hub);

        hub.handle_line(alice, "lizard");

        assert_eq!(
            output(&mut hub, alice),
            "Invalid move \"lizard\". Choose one of: rock, paper, scissors\n\
             playing arena against bob > "
        );
    }

    #[test]
    fn test_first_move_waits_without_prompt() {
        let mut hub = hub();
        let (alice, bob) = seated_pair(&mut hub);

        hub.handle_line(alice, "r");

        assert_eq!(output(&mut hub, alice), "Waiting for bob to move...\n");
        assert_eq!(output(&mut hub, bob), "");
    }

    #[test]
    fn test_changed_move_is_the_one_resolved() {
        let mut hub = hub();
        let (alice, bob) = seated_pair(&mut hub);
        hub.handle_line(alice, "r");
        output(&mut hub, alice);

        hub.handle_line(alice, "p");
        assert_eq!(output(&mut hub, alice), "Waiting for bob to move...\n");

        hub.handle_line(bob, "s");
        let out = output(&mut hub, alice);
        assert!(out.contains("alice threw paper, bob threw scissors"));
        assert!(out.contains("bob wins the round!"));
    }

    #[test]
    fn test_round_is_broadcast_and_reprompted() {
        let mut hub = hub();
        let (alice, bob) = seated_pair(&mut hub);

        hub.handle_line(alice, "rock");
        output(&mut hub, alice);
        hub.handle_line(bob, "S");

        for id in [alice, bob] {
            let out = output(&mut hub, id);
            assert!(out.contains("alice threw rock, bob threw scissors"));
            assert!(out.contains("alice wins the round!\nScore: alice 1, bob 0"));
            assert!(out.contains("Make your move"));
            assert_eq!(out.matches(" > ").count(), 1, "one prompt: {out:?}");
        }
    }

    #[test]
    fn test_match_win_returns_players_to_lobby() {
        let mut hub = hub();
        let (alice, bob) = seated_pair(&mut hub);
        let carol = player(&mut hub, "carol");

        for _ in 0..3 {
            hub.handle_line(alice, "p");
            hub.handle_line(bob, "r");
        }
        hub.fan_out();

        let alice_out = output(&mut hub, alice);
        assert!(alice_out.contains("alice wins the match!\nFinal score: alice 3, bob 0"));
        assert!(alice_out.ends_with(render::LOBBY_PROMPT));
        assert!(!alice_out.contains("won match"));
        assert_eq!(hub.sessions().get(bob).unwrap().current_match(), None);
        assert!(hub.lobby().get("arena").is_none());
        assert_eq!(output(&mut hub, carol), "\nalice won match arena\n> ");
    }

    #[test]
    fn test_move_before_opponent_is_held() {
        let mut hub = hub();
        let alice = player(&mut hub, "alice");
        let bob = player(&mut hub, "bob");
        hub.handle_line(alice, "c arena");
        hub.handle_line(alice, "s");
        assert!(output(&mut hub, alice).contains("Move noted"));

        hub.handle_line(bob, "j arena");
        hub.handle_line(bob, "p");

        let alice_out = output(&mut hub, alice);
        assert!(alice_out.contains("alice threw scissors, bob threw paper"));
        assert_eq!(hub.lobby().get("arena").unwrap().score_of(alice), Some(1));
    }

    // -----------------------------------------------------------------------
    // Disconnects
    // -----------------------------------------------------------------------

    #[test]
    fn test_disconnect_mid_round_abandons_match() {
        let mut hub = hub();
        let (alice, bob) = seated_pair(&mut hub);
        let carol = player(&mut hub, "carol");
        hub.handle_line(alice, "r");

        hub.disconnect(alice);
        hub.fan_out();

        let bob_out = output(&mut hub, bob);
        assert!(bob_out.contains("alice left mid-round, the match is over"));
        assert!(bob_out.ends_with(render::LOBBY_PROMPT));
        assert!(hub.lobby().get("arena").is_none());
        assert_eq!(hub.sessions().get(bob).unwrap().current_match(), None);

        let carol_out = output(&mut hub, carol);
        assert!(carol_out.contains("match arena was abandoned"));
        assert!(carol_out.contains("alice left the server"));
    }

    #[test]
    fn test_disconnect_between_rounds_keeps_opponent_seated() {
        let mut hub = hub();
        let (alice, bob) = seated_pair(&mut hub);

        hub.disconnect(bob);

        assert_eq!(
            output(&mut hub, alice),
            "\nbob left the match\nWaiting for an opponent...\n"
        );
        assert_eq!(hub.sessions().get(alice).unwrap().current_match(), Some("arena"));
        assert!(hub.lobby().get("arena").is_some());
    }

    #[test]
    fn test_last_player_leaving_removes_match() {
        let mut hub = hub();
        let alice = player(&mut hub, "alice");
        hub.handle_line(alice, "c arena");

        hub.disconnect(alice);

        assert!(hub.lobby().is_empty());
        assert!(hub.sessions().is_empty());
    }

    #[test]
    fn test_disconnect_unknown_session_is_ignored() {
        let mut hub = hub();
        hub.disconnect(SessionId(42));
        assert!(hub.sessions().is_empty());
    }

    #[test]
    fn test_overlong_line_is_reported() {
        let mut hub = hub();
        let id = player(&mut hub, "alice");
        hub.reject_line(id, &ProtocolError::LineTooLong { len: 2000, max: 1024 });
        assert_eq!(
            output(&mut hub, id),
            "Line too long (limit 1024 bytes), ignored\n> "
        );
    }
}
