//! Session struct and state machine
//!
//! A session owns one board and two seats. All mutation (human moves, bot
//! moves, disconnects, reconnects, forfeits) goes through a single mutex, so
//! concurrent attempts are strictly ordered and whichever loses the race sees
//! the terminal state and does nothing.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::slot::{ConnectionHandle, Player, Seat, SlotState};
use super::{SessionListener, SessionOutcome};
use crate::error::MoveError;
use crate::game::{Board, MoveStrategy, Symbol};
use crate::protocol::{DRAW_MARKER, FinishReason, ServerMessage};
use crate::scheduler::Scheduler;
use crate::types::{ConnectionId, SessionId};

/// Lifecycle of a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Playing,
    Finished { winner: String, reason: FinishReason },
}

/// Result of a move attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Disc placed, game continues
    Placed { row: usize, column: usize },
    /// Disc placed and the game ended
    Finished(FinishReason),
    /// Nothing changed
    Ignored(IgnoreReason),
}

/// Why a move was discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    NotPlaying,
    OutOfTurn,
    Invalid(MoveError),
    UnknownConnection,
}

/// Result of a successful reconnect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconnected {
    pub symbol: Symbol,
    /// Connection previously bound to the seat, if it was still attached
    pub replaced: Option<ConnectionId>,
    /// Whether a pending forfeit timer was cancelled
    pub cancelled_forfeit: bool,
}

/// Identifies one armed forfeit timer
///
/// Handed to the timer's task and checked when it fires. A ticket goes stale
/// once its seat reconnects or is detached again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraceTicket {
    symbol: Symbol,
    generation: u64,
}

impl GraceTicket {
    /// Seat the timer belongs to
    pub fn symbol(&self) -> Symbol {
        self.symbol
    }
}

/// Shared dependencies handed to every session by the hub
#[derive(Clone)]
pub struct SessionEnv {
    pub bot_think_delay: Duration,
    pub strategy: Arc<dyn MoveStrategy>,
    pub scheduler: Scheduler,
    pub listener: Weak<dyn SessionListener>,
}

struct SessionInner {
    board: Board,
    slots: [SlotState; 2],
    turn: Symbol,
    state: SessionState,
    started_at: Option<Instant>,
    moves: usize,
}

impl SessionInner {
    fn is_playing(&self) -> bool {
        self.state == SessionState::Playing
    }

    fn symbol_for(&self, connection: ConnectionId) -> Option<Symbol> {
        [Symbol::One, Symbol::Two]
            .into_iter()
            .find(|s| self.slots[s.index()].is_bound_to(connection))
    }

    fn update_for(&self, symbol: Symbol) -> ServerMessage {
        ServerMessage::Update {
            board: self.board.snapshot(),
            turn: self.turn,
            is_your_turn: self.is_playing() && self.turn == symbol,
        }
    }

    fn broadcast_update(&self) {
        for symbol in [Symbol::One, Symbol::Two] {
            self.slots[symbol.index()].send(self.update_for(symbol));
        }
    }
}

/// Everything `apply_locked` decided, acted on after the lock is released
struct Applied {
    outcome: MoveOutcome,
    finished: Option<SessionOutcome>,
    bot_next: bool,
}

impl Applied {
    fn ignored(reason: IgnoreReason) -> Self {
        Self {
            outcome: MoveOutcome::Ignored(reason),
            finished: None,
            bot_next: false,
        }
    }
}

/// One match between two seats
pub struct Session {
    id: SessionId,
    players: [Player; 2],
    created_at: DateTime<Utc>,
    env: SessionEnv,
    self_ref: Weak<Session>,
    inner: Mutex<SessionInner>,
}

impl Session {
    /// Create a session in the `Playing` state. Nothing is sent until [`start`](Self::start).
    ///
    /// `first` takes [`Symbol::One`] and moves first.
    pub fn new(id: SessionId, first: Seat, second: Seat, env: SessionEnv) -> Arc<Self> {
        let Seat {
            player: player1,
            connection: connection1,
        } = first;
        let Seat {
            player: player2,
            connection: connection2,
        } = second;

        Arc::new_cyclic(|self_ref| Self {
            id,
            players: [player1, player2],
            created_at: Utc::now(),
            env,
            self_ref: self_ref.clone(),
            inner: Mutex::new(SessionInner {
                board: Board::new(),
                slots: [
                    SlotState {
                        connection: connection1,
                        ..SlotState::default()
                    },
                    SlotState {
                        connection: connection2,
                        ..SlotState::default()
                    },
                ],
                turn: Symbol::One,
                state: SessionState::Playing,
                started_at: None,
                moves: 0,
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn player(&self, symbol: Symbol) -> &Player {
        &self.players[symbol.index()]
    }

    /// Symbol of the human seat owned by `username`
    pub fn human_symbol(&self, username: &str) -> Option<Symbol> {
        [Symbol::One, Symbol::Two].into_iter().find(|s| {
            let player = self.player(*s);
            !player.is_bot && player.username == username
        })
    }

    pub fn board(&self) -> Board {
        self.lock().board
    }

    pub fn turn(&self) -> Symbol {
        self.lock().turn
    }

    pub fn state(&self) -> SessionState {
        self.lock().state.clone()
    }

    pub fn is_playing(&self) -> bool {
        self.lock().is_playing()
    }

    /// Number of discs placed so far
    pub fn moves(&self) -> usize {
        self.lock().moves
    }

    pub fn is_connected(&self, symbol: Symbol) -> bool {
        self.lock().slots[symbol.index()].connection.is_some()
    }

    pub fn has_pending_forfeit(&self, symbol: Symbol) -> bool {
        self.lock().slots[symbol.index()].forfeit_timer.is_some()
    }

    /// Connections currently bound to human seats
    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.lock()
            .slots
            .iter()
            .filter_map(|slot| slot.connection.as_ref().map(|c| c.id()))
            .collect()
    }

    /// Send START to each connected seat and begin timing the match
    ///
    /// Schedules the bot if it moves first.
    pub fn start(&self) {
        let bot_first = {
            let mut inner = self.lock();
            if !inner.is_playing() || inner.started_at.is_some() {
                return;
            }
            inner.started_at = Some(Instant::now());

            for symbol in [Symbol::One, Symbol::Two] {
                inner.slots[symbol.index()].send(self.start_message(symbol, inner.turn));
            }

            self.player(inner.turn).is_bot
        };

        info!(
            session_id = %self.id,
            player1 = %self.players[0].username,
            player2 = %self.players[1].username,
            "Game started"
        );

        if bot_first {
            self.schedule_bot_turn();
        }
    }

    fn start_message(&self, symbol: Symbol, turn: Symbol) -> ServerMessage {
        ServerMessage::Start {
            game_id: self.id,
            opponent: self.player(symbol.opponent()).username.clone(),
            symbol,
            is_turn: turn == symbol,
        }
    }

    /// Drop a disc for `symbol`
    ///
    /// Out-of-turn, invalid, and post-game moves are ignored without error.
    pub fn apply_move(&self, symbol: Symbol, column: i64) -> MoveOutcome {
        let applied = {
            let mut inner = self.lock();
            self.apply_locked(&mut inner, symbol, column)
        };
        self.after_apply(applied)
    }

    /// Apply a move on behalf of whichever seat `connection` is bound to
    pub fn submit_move(&self, connection: ConnectionId, column: i64) -> MoveOutcome {
        let applied = {
            let mut inner = self.lock();
            match inner.symbol_for(connection) {
                Some(symbol) => self.apply_locked(&mut inner, symbol, column),
                None => Applied::ignored(IgnoreReason::UnknownConnection),
            }
        };
        self.after_apply(applied)
    }

    /// Let the bot move if it is the bot's turn
    pub fn play_bot_turn(&self) -> MoveOutcome {
        let applied = {
            let mut inner = self.lock();
            if !inner.is_playing() {
                return MoveOutcome::Ignored(IgnoreReason::NotPlaying);
            }
            let symbol = inner.turn;
            if !self.player(symbol).is_bot {
                return MoveOutcome::Ignored(IgnoreReason::OutOfTurn);
            }

            match self.env.strategy.choose_move(&inner.board, symbol) {
                Some(column) => self.apply_locked(&mut inner, symbol, column as i64),
                None => {
                    warn!(session_id = %self.id, "Bot found no legal column");
                    return MoveOutcome::Ignored(IgnoreReason::NotPlaying);
                }
            }
        };
        self.after_apply(applied)
    }

    fn apply_locked(&self, inner: &mut SessionInner, symbol: Symbol, column: i64) -> Applied {
        if !inner.is_playing() {
            return Applied::ignored(IgnoreReason::NotPlaying);
        }
        if inner.turn != symbol {
            return Applied::ignored(IgnoreReason::OutOfTurn);
        }

        let placed = usize::try_from(column)
            .map_err(|_| MoveError::ColumnOutOfRange(column))
            .and_then(|col| inner.board.drop_disc(col, symbol).map(|row| (row, col)));
        let (row, col) = match placed {
            Ok(placed) => placed,
            Err(err) => return Applied::ignored(IgnoreReason::Invalid(err)),
        };
        inner.moves += 1;

        if inner.board.check_win(row, col, symbol) {
            let winner = self.player(symbol).username.clone();
            let finished = self.finish_locked(inner, winner, FinishReason::Win);
            return Applied {
                outcome: MoveOutcome::Finished(FinishReason::Win),
                finished: Some(finished),
                bot_next: false,
            };
        }

        if inner.board.is_full() {
            let finished = self.finish_locked(inner, DRAW_MARKER.to_string(), FinishReason::Draw);
            return Applied {
                outcome: MoveOutcome::Finished(FinishReason::Draw),
                finished: Some(finished),
                bot_next: false,
            };
        }

        inner.turn = symbol.opponent();
        inner.broadcast_update();

        Applied {
            outcome: MoveOutcome::Placed { row, column: col },
            finished: None,
            bot_next: self.player(inner.turn).is_bot,
        }
    }

    fn after_apply(&self, applied: Applied) -> MoveOutcome {
        if let MoveOutcome::Ignored(reason) = applied.outcome {
            debug!(session_id = %self.id, ?reason, "Move ignored");
        }
        if let Some(outcome) = applied.finished {
            self.notify_finished(outcome);
        }
        if applied.bot_next {
            self.schedule_bot_turn();
        }
        applied.outcome
    }

    fn schedule_bot_turn(&self) {
        let session = self.self_ref.clone();
        self.env
            .scheduler
            .schedule(self.env.bot_think_delay, async move {
                if let Some(session) = session.upgrade() {
                    session.play_bot_turn();
                }
            });
    }

    /// Declare the opponent of `symbol` the winner
    ///
    /// Returns false if the game had already ended.
    pub fn mark_forfeit(&self, symbol: Symbol) -> bool {
        let finished = {
            let mut inner = self.lock();
            if !inner.is_playing() {
                return false;
            }
            let winner = self.player(symbol.opponent()).username.clone();
            self.finish_locked(&mut inner, winner, FinishReason::Forfeit)
        };
        self.notify_finished(finished);
        true
    }

    /// Forfeit the ticket's seat if its grace period ran out while still
    /// disconnected
    ///
    /// Called when a forfeit timer fires. Does nothing if the ticket is stale,
    /// the seat reconnected, or the game already ended.
    pub fn expire_grace(&self, ticket: GraceTicket) -> bool {
        let symbol = ticket.symbol;
        let finished = {
            let mut inner = self.lock();
            let slot = &mut inner.slots[symbol.index()];
            if slot.grace_generation != ticket.generation {
                debug!(session_id = %self.id, %symbol, "Stale forfeit timer ignored");
                return false;
            }
            // The timer calling us is finishing on its own
            slot.forfeit_timer.take();
            if !inner.is_playing() || inner.slots[symbol.index()].connection.is_some() {
                return false;
            }
            let winner = self.player(symbol.opponent()).username.clone();
            self.finish_locked(&mut inner, winner, FinishReason::Forfeit)
        };
        info!(session_id = %self.id, %symbol, "Grace period expired, game forfeited");
        self.notify_finished(finished);
        true
    }

    /// Unbind `connection` from its seat and start the forfeit timer
    ///
    /// `on_expire` builds the task run after `grace` and should hand the
    /// ticket back to [`expire_grace`](Self::expire_grace). Returns the
    /// ticket, or `None` if the connection is not bound or the game is over.
    pub fn detach<F, Fut>(
        &self,
        connection: ConnectionId,
        grace: Duration,
        on_expire: F,
    ) -> Option<GraceTicket>
    where
        F: FnOnce(GraceTicket) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut inner = self.lock();
        if !inner.is_playing() {
            return None;
        }
        let symbol = inner.symbol_for(connection)?;

        let slot = &mut inner.slots[symbol.index()];
        slot.connection = None;
        slot.cancel_timer();
        let ticket = GraceTicket {
            symbol,
            generation: slot.grace_generation,
        };
        slot.forfeit_timer = Some(self.env.scheduler.schedule(grace, on_expire(ticket)));

        info!(
            session_id = %self.id,
            username = %self.player(symbol).username,
            grace_secs = grace.as_secs(),
            "Player disconnected, grace period started"
        );
        Some(ticket)
    }

    /// Rebind the seat owned by `username` to a new connection
    ///
    /// Cancels any pending forfeit and sends START followed by the current
    /// board so the client can resume.
    pub fn reconnect(&self, username: &str, connection: ConnectionHandle) -> Option<Reconnected> {
        let symbol = self.human_symbol(username)?;

        let mut inner = self.lock();
        if !inner.is_playing() {
            return None;
        }
        let turn = inner.turn;
        let update = inner.update_for(symbol);

        let slot = &mut inner.slots[symbol.index()];
        let cancelled_forfeit = slot.cancel_timer();
        let replaced = slot
            .connection
            .replace(connection)
            .map(|previous| previous.id());

        slot.send(self.start_message(symbol, turn));
        slot.send(update);

        info!(session_id = %self.id, %username, cancelled_forfeit, "Player reconnected");
        Some(Reconnected {
            symbol,
            replaced,
            cancelled_forfeit,
        })
    }

    /// Transition to `Finished`, notify both seats, and cancel timers
    ///
    /// Only reachable while `Playing`, so each session produces exactly one outcome.
    fn finish_locked(
        &self,
        inner: &mut SessionInner,
        winner: String,
        reason: FinishReason,
    ) -> SessionOutcome {
        inner.state = SessionState::Finished {
            winner: winner.clone(),
            reason,
        };

        inner.broadcast_update();
        for slot in &mut inner.slots {
            slot.send(ServerMessage::GameOver {
                winner: winner.clone(),
                reason,
            });
            slot.cancel_timer();
        }

        let duration = inner
            .started_at
            .map(|started| started.elapsed())
            .unwrap_or_default();

        SessionOutcome {
            session_id: self.id,
            player1: self.players[0].username.clone(),
            player2: self.players[1].username.clone(),
            winner,
            reason,
            duration,
        }
    }

    fn notify_finished(&self, outcome: SessionOutcome) {
        info!(
            session_id = %outcome.session_id,
            winner = %outcome.winner,
            reason = %outcome.reason,
            duration_secs = outcome.duration.as_secs_f64(),
            "Game over"
        );
        if let Some(listener) = self.env.listener.upgrade() {
            listener.session_finished(outcome);
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("players", &self.players)
            .finish_non_exhaustive()
    }
}
