//! Game sessions
//!
//! A [`Session`] is one match: a board, two seats, whose turn it is, and
//! whether the game is over. It notifies a [`SessionListener`] exactly once
//! when it finishes.

mod slot;
mod state;

pub use slot::{ConnectionHandle, Player, Seat};
pub use state::{
    GraceTicket, IgnoreReason, MoveOutcome, Reconnected, Session, SessionEnv, SessionState,
};

use std::time::Duration;

use crate::protocol::FinishReason;
use crate::types::SessionId;

/// Final result of a session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOutcome {
    pub session_id: SessionId,
    pub player1: String,
    pub player2: String,
    /// Username of the winner, or the draw marker
    pub winner: String,
    pub reason: FinishReason,
    /// Time from start to finish
    pub duration: Duration,
}

/// Told when a session reaches its terminal state
///
/// Called after the session lock is released, so implementations may take
/// their own locks.
pub trait SessionListener: Send + Sync {
    fn session_finished(&self, outcome: SessionOutcome);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MoveError;
    use crate::game::board::tests::DRAW_SEQUENCE;
    use crate::game::{Board, MoveStrategy, ROWS, Symbol};
    use crate::protocol::{DRAW_MARKER, ServerMessage};
    use crate::scheduler::Scheduler;
    use std::sync::{Arc, Mutex, Weak};
    use tokio::sync::mpsc::UnboundedReceiver;

    #[derive(Default)]
    struct RecordingListener {
        outcomes: Mutex<Vec<SessionOutcome>>,
    }

    impl RecordingListener {
        fn outcomes(&self) -> Vec<SessionOutcome> {
            self.outcomes.lock().unwrap().clone()
        }
    }

    impl SessionListener for RecordingListener {
        fn session_finished(&self, outcome: SessionOutcome) {
            self.outcomes.lock().unwrap().push(outcome);
        }
    }

    /// Always plays the lowest open column
    struct LeftmostStrategy;

    impl MoveStrategy for LeftmostStrategy {
        fn choose_move(&self, board: &Board, _symbol: Symbol) -> Option<usize> {
            board.legal_columns().next()
        }
    }

    struct Fixture {
        session: Arc<Session>,
        listener: Arc<RecordingListener>,
        alice: ConnectionHandle,
        alice_rx: UnboundedReceiver<ServerMessage>,
        bob_rx: Option<UnboundedReceiver<ServerMessage>>,
    }

    fn env(listener: &Arc<RecordingListener>) -> SessionEnv {
        let weak: Weak<RecordingListener> = Arc::downgrade(listener);
        let listener: Weak<dyn SessionListener> = weak;
        SessionEnv {
            bot_think_delay: Duration::from_millis(500),
            strategy: Arc::new(LeftmostStrategy),
            scheduler: Scheduler::new(),
            listener,
        }
    }

    fn human_game() -> Fixture {
        let listener = Arc::new(RecordingListener::default());
        let (alice, alice_rx) = ConnectionHandle::channel();
        let (bob, bob_rx) = ConnectionHandle::channel();
        let session = Session::new(
            SessionId::new(),
            Seat::human("alice", alice.clone()),
            Seat::human("bob", bob),
            env(&listener),
        );
        session.start();
        Fixture {
            session,
            listener,
            alice,
            alice_rx,
            bob_rx: Some(bob_rx),
        }
    }

    fn bot_game() -> Fixture {
        let listener = Arc::new(RecordingListener::default());
        let (alice, alice_rx) = ConnectionHandle::channel();
        let session = Session::new(
            SessionId::new(),
            Seat::human("alice", alice.clone()),
            Seat::bot("Bot"),
            env(&listener),
        );
        session.start();
        Fixture {
            session,
            listener,
            alice,
            alice_rx,
            bob_rx: None,
        }
    }

    fn drain(rx: &mut UnboundedReceiver<ServerMessage>) -> Vec<ServerMessage> {
        let mut messages = Vec::new();
        while let Ok(message) = rx.try_recv() {
            messages.push(message);
        }
        messages
    }

    fn play(session: &Session, columns: &[usize]) {
        let mut symbol = Symbol::One;
        for &column in columns {
            assert!(!matches!(
                session.apply_move(symbol, column as i64),
                MoveOutcome::Ignored(_)
            ));
            symbol = symbol.opponent();
        }
    }

    #[test]
    fn start_sends_symbols_and_turns() {
        let mut game = human_game();
        let id = game.session.id();

        assert_eq!(
            drain(&mut game.alice_rx),
            vec![ServerMessage::Start {
                game_id: id,
                opponent: "bob".into(),
                symbol: Symbol::One,
                is_turn: true,
            }]
        );
        assert_eq!(
            drain(game.bob_rx.as_mut().unwrap()),
            vec![ServerMessage::Start {
                game_id: id,
                opponent: "alice".into(),
                symbol: Symbol::Two,
                is_turn: false,
            }]
        );
    }

    #[test]
    fn start_is_sent_once() {
        let mut game = human_game();
        game.session.start();
        assert_eq!(drain(&mut game.alice_rx).len(), 1);
    }

    #[test]
    fn accepted_moves_alternate_turns_and_fill_cells() {
        let game = human_game();
        let columns = [0, 1, 2, 0, 1, 2, 6];

        for (n, &column) in columns.iter().enumerate() {
            let symbol = if n % 2 == 0 { Symbol::One } else { Symbol::Two };
            let outcome = game.session.apply_move(symbol, column as i64);
            assert!(matches!(outcome, MoveOutcome::Placed { .. }));

            let accepted = n + 1;
            assert_eq!(game.session.board().occupied(), accepted);
            assert_eq!(game.session.moves(), accepted);
            let expected_turn = if accepted % 2 == 0 {
                Symbol::One
            } else {
                Symbol::Two
            };
            assert_eq!(game.session.turn(), expected_turn);
        }
    }

    #[test]
    fn update_is_personalized() {
        let mut game = human_game();
        drain(&mut game.alice_rx);
        let bob_rx = game.bob_rx.as_mut().unwrap();
        drain(bob_rx);

        game.session.apply_move(Symbol::One, 3);

        let alice_msgs = drain(&mut game.alice_rx);
        let bob_msgs = drain(bob_rx);
        match (&alice_msgs[..], &bob_msgs[..]) {
            (
                [ServerMessage::Update {
                    board,
                    turn,
                    is_your_turn: false,
                }],
                [ServerMessage::Update {
                    is_your_turn: true, ..
                }],
            ) => {
                assert_eq!(*turn, Symbol::Two);
                assert_eq!(board[ROWS - 1][3], 1);
            }
            other => panic!("unexpected messages: {other:?}"),
        }
    }

    #[test]
    fn out_of_turn_and_invalid_moves_are_ignored() {
        let game = human_game();

        assert_eq!(
            game.session.apply_move(Symbol::Two, 3),
            MoveOutcome::Ignored(IgnoreReason::OutOfTurn)
        );
        assert_eq!(
            game.session.apply_move(Symbol::One, 7),
            MoveOutcome::Ignored(IgnoreReason::Invalid(MoveError::ColumnOutOfRange(7)))
        );
        assert_eq!(
            game.session.apply_move(Symbol::One, -1),
            MoveOutcome::Ignored(IgnoreReason::Invalid(MoveError::ColumnOutOfRange(-1)))
        );

        play(&game.session, &[0, 0, 0, 0, 0, 0]);
        assert_eq!(
            game.session.apply_move(Symbol::One, 0),
            MoveOutcome::Ignored(IgnoreReason::Invalid(MoveError::ColumnFull(0)))
        );
        assert_eq!(game.session.turn(), Symbol::One);
        assert_eq!(game.session.moves(), 6);
    }

    #[test]
    fn submit_move_resolves_seat_by_connection() {
        let game = human_game();

        assert!(matches!(
            game.session.submit_move(game.alice.id(), 3),
            MoveOutcome::Placed { row: 5, column: 3 }
        ));
        assert_eq!(
            game.session.submit_move(game.alice.id(), 3),
            MoveOutcome::Ignored(IgnoreReason::OutOfTurn)
        );
        assert_eq!(
            game.session.submit_move(crate::types::ConnectionId::new(), 3),
            MoveOutcome::Ignored(IgnoreReason::UnknownConnection)
        );
    }

    #[test]
    fn win_sends_final_board_then_game_over() {
        let mut game = human_game();
        drain(&mut game.alice_rx);

        play(&game.session, &[3, 0, 3, 0, 3, 0]);
        drain(&mut game.alice_rx);

        assert_eq!(
            game.session.apply_move(Symbol::One, 3),
            MoveOutcome::Finished(FinishReason::Win)
        );

        let messages = drain(&mut game.alice_rx);
        assert_eq!(messages.len(), 2);
        assert!(matches!(
            messages[0],
            ServerMessage::Update {
                is_your_turn: false,
                ..
            }
        ));
        assert_eq!(
            messages[1],
            ServerMessage::GameOver {
                winner: "alice".into(),
                reason: FinishReason::Win,
            }
        );

        let outcomes = game.listener.outcomes();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].winner, "alice");
        assert_eq!(outcomes[0].player1, "alice");
        assert_eq!(outcomes[0].player2, "bob");
        assert_eq!(
            game.session.state(),
            SessionState::Finished {
                winner: "alice".into(),
                reason: FinishReason::Win
            }
        );

        assert_eq!(
            game.session.apply_move(Symbol::Two, 1),
            MoveOutcome::Ignored(IgnoreReason::NotPlaying)
        );
        assert_eq!(game.listener.outcomes().len(), 1);
    }

    #[test]
    fn full_board_without_winner_is_a_draw() {
        let game = human_game();

        let (last, rest) = DRAW_SEQUENCE.split_last().unwrap();
        play(&game.session, rest);
        assert!(game.session.is_playing());

        assert_eq!(
            game.session.apply_move(Symbol::Two, *last as i64),
            MoveOutcome::Finished(FinishReason::Draw)
        );
        let outcomes = game.listener.outcomes();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].winner, DRAW_MARKER);
        assert_eq!(outcomes[0].reason, FinishReason::Draw);
        assert_eq!(game.session.moves(), 42);
    }

    #[test]
    fn forfeit_is_only_applied_once() {
        let game = human_game();

        assert!(game.session.mark_forfeit(Symbol::One));
        assert!(!game.session.mark_forfeit(Symbol::Two));

        let outcomes = game.listener.outcomes();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].winner, "bob");
        assert_eq!(outcomes[0].reason, FinishReason::Forfeit);
    }

    #[test]
    fn racing_win_and_forfeit_finish_once() {
        for _ in 0..50 {
            let game = human_game();
            play(&game.session, &[3, 0, 3, 0, 3, 0]);

            let mover = Arc::clone(&game.session);
            let forfeiter = Arc::clone(&game.session);
            let a = std::thread::spawn(move || mover.apply_move(Symbol::One, 3));
            let b = std::thread::spawn(move || forfeiter.mark_forfeit(Symbol::One));
            let moved = a.join().unwrap();
            let forfeited = b.join().unwrap();

            let outcomes = game.listener.outcomes();
            assert_eq!(outcomes.len(), 1);
            match outcomes[0].reason {
                FinishReason::Win => {
                    assert_eq!(moved, MoveOutcome::Finished(FinishReason::Win));
                    assert!(!forfeited);
                    assert_eq!(outcomes[0].winner, "alice");
                }
                FinishReason::Forfeit => {
                    assert!(forfeited);
                    assert_eq!(moved, MoveOutcome::Ignored(IgnoreReason::NotPlaying));
                    assert_eq!(outcomes[0].winner, "bob");
                }
                FinishReason::Draw => panic!("unexpected draw"),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn reconnect_before_grace_keeps_game() {
        let mut game = human_game();
        play(&game.session, &[3, 4]);
        let board_before = game.session.board();

        let session = Arc::clone(&game.session);
        let ticket = game
            .session
            .detach(game.alice.id(), Duration::from_secs(30), move |ticket| {
                async move {
                    session.expire_grace(ticket);
                }
            })
            .unwrap();
        assert_eq!(ticket.symbol(), Symbol::One);
        assert!(!game.session.is_connected(Symbol::One));
        assert!(game.session.has_pending_forfeit(Symbol::One));

        tokio::time::sleep(Duration::from_secs(10)).await;

        drain(&mut game.alice_rx);
        let (fresh, mut fresh_rx) = ConnectionHandle::channel();
        let reconnected = game.session.reconnect("alice", fresh.clone()).unwrap();
        assert_eq!(reconnected.symbol, Symbol::One);
        assert_eq!(reconnected.replaced, None);
        assert!(reconnected.cancelled_forfeit);

        let messages = drain(&mut fresh_rx);
        assert!(matches!(
            messages[..],
            [
                ServerMessage::Start {
                    symbol: Symbol::One,
                    is_turn: true,
                    ..
                },
                ServerMessage::Update {
                    is_your_turn: true,
                    ..
                }
            ]
        ));

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(game.session.is_playing());
        assert_eq!(game.session.board(), board_before);
        assert_eq!(game.session.turn(), Symbol::One);
        assert!(game.listener.outcomes().is_empty());

        assert!(matches!(
            game.session.submit_move(fresh.id(), 3),
            MoveOutcome::Placed { .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn grace_expiry_forfeits_disconnected_player() {
        let game = human_game();
        let session = Arc::clone(&game.session);
        game.session
            .detach(game.alice.id(), Duration::from_secs(30), move |ticket| {
                async move {
                    session.expire_grace(ticket);
                }
            })
            .unwrap();

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert!(game.session.is_playing());

        tokio::time::sleep(Duration::from_secs(2)).await;
        let outcomes = game.listener.outcomes();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].winner, "bob");
        assert_eq!(outcomes[0].reason, FinishReason::Forfeit);
        assert!(!game.session.has_pending_forfeit(Symbol::One));
    }

    #[tokio::test(start_paused = true)]
    async fn timer_from_earlier_disconnect_is_stale() {
        let game = human_game();
        let first = game
            .session
            .detach(game.alice.id(), Duration::from_secs(30), |_| async {})
            .unwrap();
        let (back, _back_rx) = ConnectionHandle::channel();
        game.session.reconnect("alice", back.clone()).unwrap();
        let second = game
            .session
            .detach(back.id(), Duration::from_secs(30), |_| async {})
            .unwrap();
        assert_ne!(first, second);

        assert!(!game.session.expire_grace(first));
        assert!(game.session.is_playing());
        assert!(game.session.has_pending_forfeit(Symbol::One));

        assert!(game.session.expire_grace(second));
        let outcomes = game.listener.outcomes();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].winner, "bob");
    }

    #[tokio::test(start_paused = true)]
    async fn finishing_cancels_both_forfeit_timers() {
        let game = human_game();
        let ids = game.session.connection_ids();
        let bob_id = *ids.iter().find(|id| **id != game.alice.id()).unwrap();

        for id in [game.alice.id(), bob_id] {
            let session = Arc::clone(&game.session);
            game.session
                .detach(id, Duration::from_secs(30), move |ticket| async move {
                    session.expire_grace(ticket);
                })
                .unwrap();
        }
        assert!(game.session.has_pending_forfeit(Symbol::One));
        assert!(game.session.has_pending_forfeit(Symbol::Two));

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(game.listener.outcomes().len(), 1);
        assert!(!game.session.has_pending_forfeit(Symbol::One));
        assert!(!game.session.has_pending_forfeit(Symbol::Two));
    }

    #[tokio::test(start_paused = true)]
    async fn detach_unknown_connection_does_nothing() {
        let game = human_game();
        let ticket = game.session.detach(
            crate::types::ConnectionId::new(),
            Duration::from_secs(30),
            |_| async {},
        );
        assert_eq!(ticket, None);
        assert!(game.session.is_connected(Symbol::One));
    }

    #[tokio::test(start_paused = true)]
    async fn bot_replies_after_think_delay() {
        let mut game = bot_game();
        drain(&mut game.alice_rx);

        game.session.apply_move(Symbol::One, 3);
        assert_eq!(game.session.turn(), Symbol::Two);

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(game.session.moves(), 1);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(game.session.moves(), 2);
        assert_eq!(game.session.turn(), Symbol::One);
        assert_eq!(
            game.session.board().cell(ROWS - 1, 0),
            Some(Symbol::Two)
        );

        let messages = drain(&mut game.alice_rx);
        assert!(matches!(
            messages.last(),
            Some(ServerMessage::Update {
                is_your_turn: true,
                ..
            })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn bot_move_after_game_end_is_dropped() {
        let game = bot_game();
        game.session.apply_move(Symbol::One, 3);
        game.session.mark_forfeit(Symbol::One);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(game.session.moves(), 1);
        assert_eq!(game.listener.outcomes().len(), 1);
        assert_eq!(game.listener.outcomes()[0].winner, "Bot");
    }

    #[test]
    fn reconnect_ignores_bot_seat() {
        let game = bot_game();
        let (handle, _rx) = ConnectionHandle::channel();
        assert!(game.session.reconnect("Bot", handle).is_none());
        assert_eq!(game.session.human_symbol("alice"), Some(Symbol::One));
    }
}
