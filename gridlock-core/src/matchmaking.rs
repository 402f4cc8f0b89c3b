//! Waiting list and pairing
//!
//! Joins only append to the queue. Pairing happens in [`Matchmaker::reconcile`],
//! which the hub calls once per tick, so every pairing decision is made by a
//! single writer.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;

use crate::session::ConnectionHandle;
use crate::types::ConnectionId;

/// A player waiting for an opponent
#[derive(Debug, Clone)]
pub struct WaitingEntry {
    pub username: String,
    pub connection: ConnectionHandle,
    pub enqueued_at: Instant,
}

/// A match formed by one reconciliation pass
#[derive(Debug)]
pub enum Pairing {
    /// Two humans; the first entry moves first
    Humans(WaitingEntry, WaitingEntry),
    /// One human against the bot; the human moves first
    Bot(WaitingEntry),
}

/// Result of [`Matchmaker::enqueue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueued {
    /// New entry at the back of the queue
    Queued,
    /// The name was already waiting; its entry now points at the new connection
    Rebound { previous: ConnectionId },
}

/// FIFO waiting list
#[derive(Debug)]
pub struct Matchmaker {
    waiting: VecDeque<WaitingEntry>,
    bot_wait_threshold: Duration,
}

impl Matchmaker {
    pub fn new(bot_wait_threshold: Duration) -> Self {
        Self {
            waiting: VecDeque::new(),
            bot_wait_threshold,
        }
    }

    /// Add a player, or rebind the existing entry for the same name
    ///
    /// A rebound entry keeps its place and original enqueue time.
    pub fn enqueue(
        &mut self,
        username: impl Into<String>,
        connection: ConnectionHandle,
        now: Instant,
    ) -> Enqueued {
        let username = username.into();
        if let Some(entry) = self.waiting.iter_mut().find(|e| e.username == username) {
            let previous = std::mem::replace(&mut entry.connection, connection).id();
            return Enqueued::Rebound { previous };
        }

        self.waiting.push_back(WaitingEntry {
            username,
            connection,
            enqueued_at: now,
        });
        Enqueued::Queued
    }

    /// Drop the entry bound to `connection`
    pub fn remove_connection(&mut self, connection: ConnectionId) -> Option<WaitingEntry> {
        let index = self
            .waiting
            .iter()
            .position(|e| e.connection.id() == connection)?;
        self.waiting.remove(index)
    }

    pub fn contains_connection(&self, connection: ConnectionId) -> bool {
        self.waiting.iter().any(|e| e.connection.id() == connection)
    }

    pub fn contains_username(&self, username: &str) -> bool {
        self.waiting.iter().any(|e| e.username == username)
    }

    pub fn len(&self) -> usize {
        self.waiting.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waiting.is_empty()
    }

    /// Names in queue order
    pub fn usernames(&self) -> Vec<String> {
        self.waiting.iter().map(|e| e.username.clone()).collect()
    }

    /// Pair waiting players in arrival order, then send anyone who has
    /// waited longer than the threshold to a bot match
    pub fn reconcile(&mut self, now: Instant) -> Vec<Pairing> {
        let mut pairings = Vec::new();

        while self.waiting.len() >= 2 {
            let (Some(first), Some(second)) = (self.waiting.pop_front(), self.waiting.pop_front())
            else {
                break;
            };
            pairings.push(Pairing::Humans(first, second));
        }

        let threshold = self.bot_wait_threshold;
        let (expired, waiting): (VecDeque<_>, VecDeque<_>) = self
            .waiting
            .drain(..)
            .partition(|e| now.saturating_duration_since(e.enqueued_at) > threshold);
        self.waiting = waiting;
        pairings.extend(expired.into_iter().map(Pairing::Bot));

        pairings
    }
}
