use std::collections::BTreeMap;

use kitforge_core::kit::kit_key;
use kitforge_core::types::UnixSeconds;
use serde::{Deserialize, Serialize};

/// Usage of one kit by one player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KitUsage {
    #[serde(default)]
    pub total_uses: u32,
    /// When the per-player cooldown ends; `0` if never set.
    #[serde(default)]
    pub cooldown_expiry: UnixSeconds,
}

impl KitUsage {
    /// Seconds left on the cooldown at `now`, never negative.
    pub fn cooldown_remaining(&self, now: UnixSeconds) -> i64 {
        (self.cooldown_expiry - now).max(0)
    }
}

fn default_true() -> bool {
    true
}

/// Everything the ledger knows about one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlayerUsageRecord {
    /// Whether the player wants auto-kits on respawn.
    #[serde(default = "default_true")]
    pub auto_kits: bool,
    /// Last time the player was seen active; `0` if never.
    #[serde(default)]
    pub last_activity: UnixSeconds,
    /// Usage keyed by lowercase kit name.
    #[serde(default)]
    pub kits: BTreeMap<String, KitUsage>,
}

impl Default for PlayerUsageRecord {
    fn default() -> Self {
        Self {
            auto_kits: true,
            last_activity: 0,
            kits: BTreeMap::new(),
        }
    }
}

impl PlayerUsageRecord {
    pub fn usage(&self, kit_name: &str) -> KitUsage {
        self.kits.get(&kit_key(kit_name)).copied().unwrap_or_default()
    }

    pub fn usage_mut(&mut self, kit_name: &str) -> &mut KitUsage {
        self.kits.entry(kit_key(kit_name)).or_default()
    }
}
