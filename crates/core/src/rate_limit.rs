//! Per-player minimum-interval throttle on claim invocations.
//!
//! Independent of kit cooldowns: it only bounds how often a player may
//! hit the claim entry point at all. Entries are dropped when the player
//! disconnects; an absent entry always allows.

use std::collections::HashMap;

use crate::types::{PlayerId, Timestamp};

#[derive(Debug)]
pub struct RateLimiter {
    min_interval: chrono::Duration,
    last_invocation: HashMap<PlayerId, Timestamp>,
}

impl RateLimiter {
    pub fn new(min_interval: chrono::Duration) -> Self {
        Self {
            min_interval,
            last_invocation: HashMap::new(),
        }
    }

    /// Check whether `player` may invoke now, and record the invocation if so.
    ///
    /// A rejected call does not move the window.
    pub fn allow(&mut self, player: PlayerId, now: Timestamp) -> bool {
        if let Some(last) = self.last_invocation.get(&player) {
            if now.signed_duration_since(*last) < self.min_interval {
                return false;
            }
        }
        self.last_invocation.insert(player, now);
        true
    }

    /// Drop the entry for a disconnected player.
    pub fn forget(&mut self, player: PlayerId) {
        self.last_invocation.remove(&player);
    }

    /// Number of players currently tracked.
    pub fn tracked(&self) -> usize {
        self.last_invocation.len()
    }
}
