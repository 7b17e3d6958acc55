//! In-memory usage ledger with dirty tracking.
//!
//! The ledger is dirty exactly when a record has been created or mutated
//! since the last successful save. Saves always serialize the whole
//! ledger; the set of modified player ids only decides whose
//! last-activity timestamp is refreshed at save time.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use kitforge_core::types::{PlayerId, UnixSeconds};

use crate::record::{KitUsage, PlayerUsageRecord};
use crate::store::{LedgerStore, LedgerStoreError};

/// Result of a save trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Nothing changed since the last save.
    Clean,
    /// The full ledger was written.
    Written { players: usize },
}

#[derive(Debug, Default)]
pub struct UsageLedger {
    records: HashMap<PlayerId, PlayerUsageRecord>,
    dirty: bool,
    modified: HashSet<PlayerId>,
    loaded: bool,
}

impl UsageLedger {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- state flags ----

    /// Whether the startup load has completed.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn mark_loaded(&mut self) {
        self.loaded = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &HashMap<PlayerId, PlayerUsageRecord> {
        &self.records
    }

    fn touch(&mut self, player: PlayerId) {
        self.dirty = true;
        self.modified.insert(player);
    }

    // ---- reads ----

    /// Look up a record without creating it.
    pub fn get(&self, player: PlayerId) -> Option<&PlayerUsageRecord> {
        self.records.get(&player)
    }

    /// Look up a record, creating an empty one if absent. Never fails.
    pub fn get_or_create(&mut self, player: PlayerId) -> &mut PlayerUsageRecord {
        self.touch(player);
        self.records.entry(player).or_default()
    }

    pub fn usage(&self, player: PlayerId, kit_name: &str) -> KitUsage {
        self.get(player)
            .map(|r| r.usage(kit_name))
            .unwrap_or_default()
    }

    pub fn cooldown_remaining(&self, player: PlayerId, kit_name: &str, now: UnixSeconds) -> i64 {
        self.usage(player, kit_name).cooldown_remaining(now)
    }

    /// Auto-kit opt-in; players without a record are opted in.
    pub fn auto_kits_enabled(&self, player: PlayerId) -> bool {
        self.get(player).map_or(true, |r| r.auto_kits)
    }

    // ---- mutations ----

    /// Record a successful claim. The cooldown expiry is only set when the
    /// kit has a cooldown.
    pub fn record_claim(
        &mut self,
        player: PlayerId,
        kit_name: &str,
        cooldown_secs: u64,
        now: UnixSeconds,
    ) -> KitUsage {
        let usage = self.get_or_create(player).usage_mut(kit_name);
        usage.total_uses = usage.total_uses.saturating_add(1);
        if cooldown_secs > 0 {
            usage.cooldown_expiry = now.saturating_add(cooldown_secs as i64);
        }
        *usage
    }

    /// Administrative override of the use counter. Does nothing (and
    /// returns `false`) when the player has no record.
    pub fn set_usage_count(&mut self, player: PlayerId, kit_name: &str, count: u32) -> bool {
        let Some(record) = self.records.get_mut(&player) else {
            return false;
        };
        record.usage_mut(kit_name).total_uses = count;
        self.touch(player);
        true
    }

    /// Administrative override of the remaining cooldown. A non-positive
    /// value clears it. Does nothing when the player has no record.
    pub fn set_cooldown_remaining(
        &mut self,
        player: PlayerId,
        kit_name: &str,
        remaining_secs: i64,
        now: UnixSeconds,
    ) -> bool {
        let Some(record) = self.records.get_mut(&player) else {
            return false;
        };
        record.usage_mut(kit_name).cooldown_expiry = if remaining_secs > 0 {
            now.saturating_add(remaining_secs)
        } else {
            0
        };
        self.touch(player);
        true
    }

    /// Flip the auto-kit opt-in and return the new value.
    pub fn toggle_auto_kits(&mut self, player: PlayerId) -> bool {
        let record = self.get_or_create(player);
        record.auto_kits = !record.auto_kits;
        record.auto_kits
    }

    /// Mark an existing player as active so their last-activity is
    /// refreshed on the next save.
    pub fn mark_active(&mut self, player: PlayerId) -> bool {
        if !self.records.contains_key(&player) {
            return false;
        }
        self.touch(player);
        true
    }

    /// Insert a record read from disk. Does not dirty the ledger and never
    /// replaces a record already held in memory; returns `false` then.
    pub(crate) fn insert_loaded(&mut self, player: PlayerId, record: PlayerUsageRecord) -> bool {
        match self.records.entry(player) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(record);
                true
            }
        }
    }

    /// Remove offline players whose last activity is older than
    /// `threshold_secs`. Online players and never-active players are kept.
    pub fn sweep(
        &mut self,
        online: &HashSet<PlayerId>,
        threshold_secs: i64,
        now: UnixSeconds,
    ) -> usize {
        let cutoff = now.saturating_sub(threshold_secs);
        let before = self.records.len();
        self.records.retain(|player, record| {
            online.contains(player) || record.last_activity <= 0 || record.last_activity >= cutoff
        });
        let removed = before - self.records.len();

        if removed > 0 {
            let records = &self.records;
            self.modified.retain(|player| records.contains_key(player));
            self.dirty = true;
        }
        removed
    }

    /// Drop every record (new wipe). The empty ledger is dirty so it is
    /// written back on the next save.
    pub fn wipe(&mut self) -> usize {
        let removed = self.records.len();
        self.records.clear();
        self.modified.clear();
        self.dirty = true;
        removed
    }

    // ---- persistence ----

    /// Refresh last-activity for every player touched since the last save.
    fn refresh_activity(&mut self, now: UnixSeconds) {
        for player in &self.modified {
            if let Some(record) = self.records.get_mut(player) {
                record.last_activity = now;
            }
        }
    }

    /// Persist the full ledger if dirty.
    ///
    /// The dirty flag and modified set are only cleared after the write
    /// succeeds; a failed write is retried in full by the next trigger.
    pub fn save(
        &mut self,
        store: &LedgerStore,
        now: UnixSeconds,
    ) -> Result<SaveOutcome, LedgerStoreError> {
        if !self.dirty {
            return Ok(SaveOutcome::Clean);
        }

        self.refresh_activity(now);
        store.write(&self.records)?;

        self.dirty = false;
        self.modified.clear();
        Ok(SaveOutcome::Written {
            players: self.records.len(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: UnixSeconds = 1_750_000_000;
    const HOUR: i64 = 3_600;

    fn with_activity(entries: &[(PlayerId, UnixSeconds)]) -> UsageLedger {
        let mut ledger = UsageLedger::new();
        for &(player, last_activity) in entries {
            ledger.insert_loaded(
                player,
                PlayerUsageRecord {
                    last_activity,
                    ..Default::default()
                },
            );
        }
        ledger
    }

    // -- get / create ---------------------------------------------------------

    #[test]
    fn new_ledger_is_clean_and_unloaded() {
        let ledger = UsageLedger::new();
        assert!(!ledger.is_dirty());
        assert!(!ledger.is_loaded());
    }

    #[test]
    fn get_or_create_dirties() {
        let mut ledger = UsageLedger::new();
        ledger.get_or_create(1);
        assert!(ledger.is_dirty());
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn get_does_not_create() {
        let ledger = UsageLedger::new();
        assert!(ledger.get(1).is_none());
        assert_eq!(ledger.usage(1, "medic"), KitUsage::default());
        assert!(!ledger.is_dirty());
    }

    // -- record_claim ---------------------------------------------------------

    #[test]
    fn claim_with_cooldown_sets_expiry() {
        let mut ledger = UsageLedger::new();
        let usage = ledger.record_claim(1, "Medic", 3_600, NOW);
        assert_eq!(usage.total_uses, 1);
        assert_eq!(usage.cooldown_expiry, NOW + 3_600);
        assert_eq!(ledger.cooldown_remaining(1, "medic", NOW + 3_599), 1);
        assert_eq!(ledger.cooldown_remaining(1, "medic", NOW + 3_600), 0);
    }

    #[test]
    fn claim_without_cooldown_leaves_expiry_alone() {
        let mut ledger = UsageLedger::new();
        ledger.record_claim(1, "Starter", 0, NOW);
        let usage = ledger.record_claim(1, "Starter", 0, NOW + 5);
        assert_eq!(usage.total_uses, 2);
        assert_eq!(usage.cooldown_expiry, 0);
    }

    // -- admin overrides ------------------------------------------------------

    #[test]
    fn set_operations_are_noops_for_unknown_players() {
        let mut ledger = UsageLedger::new();
        assert!(!ledger.set_usage_count(9, "medic", 4));
        assert!(!ledger.set_cooldown_remaining(9, "medic", 60, NOW));
        assert!(ledger.is_empty());
        assert!(!ledger.is_dirty());
    }

    #[test]
    fn set_operations_update_existing_players() {
        let mut ledger = with_activity(&[(9, NOW)]);
        assert!(ledger.set_usage_count(9, "Medic", 4));
        assert!(ledger.set_cooldown_remaining(9, "medic", 60, NOW));
        assert!(ledger.is_dirty());
        assert_eq!(ledger.usage(9, "MEDIC").total_uses, 4);
        assert_eq!(ledger.cooldown_remaining(9, "medic", NOW), 60);

        assert!(ledger.set_cooldown_remaining(9, "medic", 0, NOW));
        assert_eq!(ledger.usage(9, "medic").cooldown_expiry, 0);
    }

    #[test]
    fn toggle_auto_kits_flips_and_creates() {
        let mut ledger = UsageLedger::new();
        assert!(ledger.auto_kits_enabled(3));
        assert!(!ledger.toggle_auto_kits(3));
        assert!(!ledger.auto_kits_enabled(3));
        assert!(ledger.toggle_auto_kits(3));
    }

    #[test]
    fn mark_active_requires_record() {
        let mut ledger = with_activity(&[(1, NOW)]);
        assert!(!ledger.mark_active(2));
        assert!(!ledger.is_dirty());
        assert!(ledger.mark_active(1));
        assert!(ledger.is_dirty());
    }

    // -- sweep ----------------------------------------------------------------

    #[test]
    fn sweep_removes_only_stale_offline_players() {
        let (a, b, c, d) = (1, 2, 3, 4);
        let mut ledger = with_activity(&[
            (a, NOW - 100 * HOUR),
            (b, NOW - 30 * HOUR),
            (c, NOW - 10 * HOUR),
            (d, 0),
        ]);
        let online = HashSet::from([a]);

        let removed = ledger.sweep(&online, 24 * HOUR, NOW);

        assert_eq!(removed, 1);
        assert!(ledger.get(a).is_some(), "online player must be kept");
        assert!(ledger.get(b).is_none(), "stale offline player must go");
        assert!(ledger.get(c).is_some(), "recent player must be kept");
        assert!(ledger.get(d).is_some(), "never-active player is exempt");
        assert!(ledger.is_dirty());
    }

    #[test]
    fn sweep_without_removals_stays_clean() {
        let mut ledger = with_activity(&[(1, NOW)]);
        assert_eq!(ledger.sweep(&HashSet::new(), 24 * HOUR, NOW), 0);
        assert!(!ledger.is_dirty());
    }

    // -- wipe -----------------------------------------------------------------

    #[test]
    fn wipe_clears_everything_and_dirties() {
        let mut ledger = with_activity(&[(1, NOW), (2, NOW)]);
        assert_eq!(ledger.wipe(), 2);
        assert!(ledger.is_empty());
        assert!(ledger.is_dirty());
    }

    // -- save -----------------------------------------------------------------

    #[test]
    fn save_is_noop_when_clean() {
        let dir = tempfile::tempdir().unwrap();
        let store = LedgerStore::in_dir(dir.path());
        let mut ledger = UsageLedger::new();

        assert_eq!(ledger.save(&store, NOW).unwrap(), SaveOutcome::Clean);
        assert!(!store.path().exists());
    }

    #[test]
    fn save_refreshes_activity_of_modified_players_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = LedgerStore::in_dir(dir.path());
        let mut ledger = with_activity(&[(1, NOW - HOUR), (2, NOW - HOUR)]);
        ledger.record_claim(1, "medic", 0, NOW);

        assert_eq!(
            ledger.save(&store, NOW).unwrap(),
            SaveOutcome::Written { players: 2 }
        );
        assert_eq!(ledger.get(1).unwrap().last_activity, NOW);
        assert_eq!(ledger.get(2).unwrap().last_activity, NOW - HOUR);
        assert!(!ledger.is_dirty());
    }

    #[test]
    fn failed_save_stays_dirty() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be makes the final rename fail.
        let blocked = dir.path().join("blocked.json");
        std::fs::create_dir(&blocked).unwrap();
        std::fs::write(blocked.join("occupant"), b"x").unwrap();
        let store = LedgerStore::new(blocked);

        let mut ledger = UsageLedger::new();
        ledger.record_claim(1, "medic", 0, NOW);

        assert!(ledger.save(&store, NOW).is_err());
        assert!(ledger.is_dirty());
    }
}
