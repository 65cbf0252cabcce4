//! Pairing queue: connections wait here until an opponent arrives

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::game::state::MAX_COMBATANTS;
use crate::game::PlayerId;

/// Player waiting for an opponent
#[derive(Debug, Clone)]
pub struct QueuedPlayer {
    pub player_id: PlayerId,
    pub queued_at: Instant,
}

impl QueuedPlayer {
    pub fn new(player_id: PlayerId) -> Self {
        Self {
            player_id,
            queued_at: Instant::now(),
        }
    }

    /// How long this player has been waiting
    pub fn wait_time(&self) -> Duration {
        self.queued_at.elapsed()
    }
}

/// FIFO queue that hands out players in arrival order
#[derive(Debug, Default)]
pub struct PairingQueue {
    queue: VecDeque<QueuedPlayer>,
}

impl PairingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a player to the queue. Returns false if already waiting.
    pub fn enqueue(&mut self, player: QueuedPlayer) -> bool {
        if self.contains(player.player_id) {
            return false;
        }
        self.queue.push_back(player);
        true
    }

    /// Remove a player from the queue
    pub fn dequeue(&mut self, player_id: PlayerId) -> Option<QueuedPlayer> {
        let pos = self.queue.iter().position(|p| p.player_id == player_id)?;
        self.queue.remove(pos)
    }

    pub fn contains(&self, player_id: PlayerId) -> bool {
        self.queue.iter().any(|p| p.player_id == player_id)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Take the two longest-waiting players; the earlier arrival gets slot 0
    pub fn try_pair(&mut self) -> Option<[QueuedPlayer; MAX_COMBATANTS]> {
        if self.queue.len() < MAX_COMBATANTS {
            return None;
        }
        let first = self.queue.pop_front()?;
        let second = self.queue.pop_front()?;
        Some([first, second])
    }
}
