//! Global per-kit lock that applies for a while after each wipe.
//!
//! Unlike per-player cooldowns this schedule is keyed only by kit name and
//! a single shared "last wipe" timestamp, so every player sees the same
//! unlock time.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::kit::kit_key;
use crate::types::UnixSeconds;

/// Persisted form of the shared wipe baseline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WipeState {
    /// When the last wipe happened; `0` if never recorded.
    pub last_wipe: UnixSeconds,
}

#[derive(Debug, Clone, Default)]
pub struct WipeCooldowns {
    per_kit: HashMap<String, u64>,
    state: WipeState,
}

impl WipeCooldowns {
    pub fn new<I, S>(per_kit: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: AsRef<str>,
    {
        Self {
            per_kit: per_kit
                .into_iter()
                .map(|(name, secs)| (kit_key(name.as_ref()), secs))
                .collect(),
            state: WipeState::default(),
        }
    }

    pub fn with_state(mut self, state: WipeState) -> Self {
        self.state = state;
        self
    }

    pub fn state(&self) -> WipeState {
        self.state
    }

    /// Record a new wipe at `now`.
    pub fn reset(&mut self, now: UnixSeconds) {
        self.state.last_wipe = now;
    }

    /// Seconds until `kit_name` unlocks, or `None` when it is claimable.
    ///
    /// No lock applies until a wipe baseline has been recorded.
    pub fn remaining(&self, kit_name: &str, now: UnixSeconds) -> Option<i64> {
        if self.state.last_wipe <= 0 {
            return None;
        }
        let lock_secs = *self.per_kit.get(&kit_key(kit_name))?;
        let unlock_at = self.state.last_wipe.saturating_add(lock_secs as i64);
        (now < unlock_at).then(|| unlock_at - now)
    }

    /// Parse a `kit=seconds,kit2=seconds` list.
    pub fn parse_list(raw: &str) -> Result<Vec<(String, u64)>, CoreError> {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|pair| {
                let (name, secs) = pair.split_once('=').ok_or_else(|| {
                    CoreError::Validation(format!("Expected kit=seconds, got \"{pair}\""))
                })?;
                let name = name.trim();
                if name.is_empty() {
                    return Err(CoreError::Validation(format!(
                        "Missing kit name in \"{pair}\""
                    )));
                }
                let secs = secs.trim().parse::<u64>().map_err(|_| {
                    CoreError::Validation(format!("Invalid seconds in \"{pair}\""))
                })?;
                Ok((name.to_string(), secs))
            })
            .collect()
    }
}
