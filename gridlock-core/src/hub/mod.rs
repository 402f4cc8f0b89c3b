//! Hub: the single entry point for the transport layer
//!
//! The hub owns the waiting list and the session registry behind one mutex
//! and routes joins, moves, and disconnects to them. Each session has its own
//! lock; the hub never holds its registry lock while calling into a session
//! that could finish, because finishing calls back into the hub.

mod registry;

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::analytics::{AnalyticsSink, GameOverEvent};
use crate::config::GameConfig;
use crate::game::MoveStrategy;
use crate::matchmaking::{Enqueued, Matchmaker, Pairing};
use crate::protocol::DRAW_MARKER;
use crate::scheduler::Scheduler;
use crate::session::{
    ConnectionHandle, GraceTicket, IgnoreReason, MoveOutcome, Seat, Session, SessionEnv,
    SessionListener, SessionOutcome,
};
use crate::store::{GameRecord, ResultStore};
use crate::types::{ConnectionId, SessionId};

use registry::Registry;

/// Result of [`Hub::add_player`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Resumed a game in progress
    Reconnected(SessionId),
    /// Added to the waiting list
    Queued,
    /// Already waiting under this name; the entry now uses the new connection
    Rebound,
    /// Connection already waiting or playing, or the name was empty
    Ignored,
    /// The name belongs to the bot or is the draw marker
    ReservedName,
}

/// Result of [`Hub::handle_disconnect`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectOutcome {
    /// Player was still waiting and has been removed
    LeftQueue,
    /// Player was mid-game; the forfeit timer is running
    GraceStarted {
        session_id: SessionId,
        ticket: GraceTicket,
    },
    /// Connection was not bound to anything
    Unknown,
}

/// Matchmaking and session orchestration
pub struct Hub {
    config: GameConfig,
    store: Arc<dyn ResultStore>,
    analytics: Arc<dyn AnalyticsSink>,
    strategy: Arc<dyn MoveStrategy>,
    scheduler: Scheduler,
    registry: Mutex<Registry>,
    self_ref: Weak<Hub>,
}

impl Hub {
    pub fn new(
        config: GameConfig,
        store: Arc<dyn ResultStore>,
        analytics: Arc<dyn AnalyticsSink>,
        strategy: Arc<dyn MoveStrategy>,
    ) -> Arc<Self> {
        let matchmaker = Matchmaker::new(config.bot_wait_threshold);
        Arc::new_cyclic(|self_ref| Self {
            config,
            store,
            analytics,
            strategy,
            scheduler: Scheduler::new(),
            registry: Mutex::new(Registry::new(matchmaker)),
            self_ref: self_ref.clone(),
        })
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        match self.registry.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn ResultStore> {
        &self.store
    }

    /// A player sent JOIN
    ///
    /// Resuming an existing game takes priority over queueing. The lookup and
    /// the enqueue happen under one registry lock, so a matchmaking pass
    /// cannot slip in between them.
    pub fn add_player(&self, connection: ConnectionHandle, username: &str) -> JoinOutcome {
        if username.is_empty() {
            return JoinOutcome::Ignored;
        }
        if self.is_reserved_name(username) {
            debug!(%username, "Join with reserved name rejected");
            return JoinOutcome::ReservedName;
        }

        let connection_id = connection.id();
        let mut registry = self.registry();
        if registry.is_bound(connection_id) || registry.matchmaker.contains_connection(connection_id)
        {
            debug!(%connection_id, %username, "Join from already bound connection ignored");
            return JoinOutcome::Ignored;
        }

        // Session locks may be taken under the registry lock, never the reverse
        if let Some(session) = registry.session_for_identity(username) {
            if let Some(reconnected) = session.reconnect(username, connection.clone()) {
                registry.bind(connection_id, session.id());
                if let Some(previous) = reconnected.replaced {
                    registry.unbind(previous);
                }
                return JoinOutcome::Reconnected(session.id());
            }
            debug!(session_id = %session.id(), %username, "Game ended before rejoin, queueing instead");
        }

        match registry
            .matchmaker
            .enqueue(username, connection, Instant::now())
        {
            Enqueued::Queued => {
                info!(%username, waiting = registry.matchmaker.len(), "Player queued");
                JoinOutcome::Queued
            }
            Enqueued::Rebound { previous } => {
                info!(%username, previous_connection = %previous, "Waiting player rebound to new connection");
                JoinOutcome::Rebound
            }
        }
    }

    fn is_reserved_name(&self, username: &str) -> bool {
        [self.config.bot_name.as_str(), DRAW_MARKER]
            .iter()
            .any(|reserved| reserved.eq_ignore_ascii_case(username))
    }

    /// A player sent MOVE
    pub fn handle_move(&self, connection: ConnectionId, column: i64) -> MoveOutcome {
        let session = self.registry().session_for(connection);
        match session {
            Some(session) => session.submit_move(connection, column),
            None => {
                debug!(%connection, "Move from unknown connection ignored");
                MoveOutcome::Ignored(IgnoreReason::UnknownConnection)
            }
        }
    }

    /// A connection closed
    pub fn handle_disconnect(&self, connection: ConnectionId) -> DisconnectOutcome {
        let session = {
            let mut registry = self.registry();
            if let Some(entry) = registry.matchmaker.remove_connection(connection) {
                info!(username = %entry.username, "Waiting player left");
                return DisconnectOutcome::LeftQueue;
            }
            registry
                .unbind(connection)
                .and_then(|id| registry.session(id))
        };

        let Some(session) = session else {
            return DisconnectOutcome::Unknown;
        };

        let session_id = session.id();
        let hub = self.self_ref.clone();
        let detached = session.detach(connection, self.config.forfeit_grace, move |ticket| {
            async move {
                if let Some(hub) = hub.upgrade() {
                    hub.expire_grace(session_id, ticket);
                }
            }
        });

        match detached {
            Some(ticket) => DisconnectOutcome::GraceStarted { session_id, ticket },
            None => DisconnectOutcome::Unknown,
        }
    }

    /// Forfeit timer identified by `ticket` fired in `session_id`
    ///
    /// Returns true if this finished the game.
    pub fn expire_grace(&self, session_id: SessionId, ticket: GraceTicket) -> bool {
        let session = self.registry().session(session_id);
        match session {
            Some(session) => session.expire_grace(ticket),
            None => {
                debug!(%session_id, "Forfeit timer fired for removed session");
                false
            }
        }
    }

    /// Run one matchmaking pass and start the sessions it forms
    ///
    /// Returns the ids of the new sessions.
    pub fn reconcile(&self) -> Vec<SessionId> {
        let created: Vec<Arc<Session>> = {
            let mut registry = self.registry();
            let pairings = registry.matchmaker.reconcile(Instant::now());
            pairings
                .into_iter()
                .map(|pairing| {
                    let session = self.create_session(pairing);
                    registry.insert_session(Arc::clone(&session));
                    session
                })
                .collect()
        };

        for session in &created {
            session.start();
        }
        created.iter().map(|s| s.id()).collect()
    }

    fn create_session(&self, pairing: Pairing) -> Arc<Session> {
        let (first, second) = match pairing {
            Pairing::Humans(a, b) => {
                info!(player1 = %a.username, player2 = %b.username, "Match formed");
                (
                    Seat::human(a.username, a.connection),
                    Seat::human(b.username, b.connection),
                )
            }
            Pairing::Bot(a) => {
                info!(player = %a.username, bot = %self.config.bot_name, "No opponent found, matched with bot");
                (
                    Seat::human(a.username, a.connection),
                    Seat::bot(self.config.bot_name.clone()),
                )
            }
        };

        Session::new(SessionId::new(), first, second, self.session_env())
    }

    fn session_env(&self) -> SessionEnv {
        let listener: Weak<dyn SessionListener> = self.self_ref.clone();
        SessionEnv {
            bot_think_delay: self.config.bot_think_delay,
            strategy: Arc::clone(&self.strategy),
            scheduler: self.scheduler.clone(),
            listener,
        }
    }

    /// Run [`reconcile`](Self::reconcile) every tick until the hub is dropped
    pub fn spawn_matchmaker(self: &Arc<Self>) -> JoinHandle<()> {
        let hub = Arc::downgrade(self);
        let period = self.config.tick_interval;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let Some(hub) = hub.upgrade() else {
                    break;
                };
                hub.reconcile();
            }
        })
    }

    pub fn active_sessions(&self) -> usize {
        self.registry().session_count()
    }

    pub fn waiting_players(&self) -> usize {
        self.registry().matchmaker.len()
    }

    pub fn session(&self, id: SessionId) -> Option<Arc<Session>> {
        self.registry().session(id)
    }

    pub fn session_for(&self, connection: ConnectionId) -> Option<Arc<Session>> {
        self.registry().session_for(connection)
    }

    pub fn is_waiting(&self, username: &str) -> bool {
        self.registry().matchmaker.contains_username(username)
    }
}

impl SessionListener for Hub {
    fn session_finished(&self, outcome: SessionOutcome) {
        self.registry().remove_session(outcome.session_id);

        let finished_at = Utc::now();
        let duration_seconds = outcome.duration.as_secs_f64();

        let record = GameRecord {
            session_id: outcome.session_id,
            player1: outcome.player1,
            player2: outcome.player2,
            winner: outcome.winner.clone(),
            reason: outcome.reason,
            duration_seconds,
            finished_at,
        };
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            if let Err(e) = store.record_result(&record).await {
                warn!(session_id = %record.session_id, error = %e, "Failed to record game result");
            }
        });

        let event = GameOverEvent {
            session_id: outcome.session_id,
            winner: outcome.winner,
            duration_seconds,
            finished_at,
        };
        let analytics = Arc::clone(&self.analytics);
        tokio::spawn(async move {
            let session_id = event.session_id;
            if let Err(e) = analytics.publish_game_over(event).await {
                warn!(%session_id, error = %e, "Failed to publish game over event");
            }
        });
    }
}
