//! The kit service: sole owner of catalog, ledger and claim state.
//!
//! Every mutation goes through one [`KitService`] behind a
//! [`tokio::sync::Mutex`], which is the single logical mutation thread.
//! Network fetches and file reads happen outside the lock; their results
//! are applied here.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use kitforge_catalog::{
    CatalogFetchError, CatalogStatus, CatalogSynchronizer, KitCatalog, ParsedCatalog, SyncOutcome,
};
use kitforge_claims::{
    ClaimDenial, ClaimGrant, ClaimMode, ClaimPipeline, ClaimRequest, ClaimTarget, ClaimVeto,
    InventoryHost, PermissionRegistry, PlayerHost, RegisteredPermissions,
};
use kitforge_core::error::CoreError;
use kitforge_core::kit::{ItemSummary, KitDefinition};
use kitforge_core::rate_limit::RateLimiter;
use kitforge_core::types::{PlayerId, Timestamp, UnixSeconds};
use kitforge_core::wipe::{WipeCooldowns, WipeState};
use kitforge_ledger::{
    load_wipe_state, save_wipe_state, LedgerLoader, LedgerStore, LoadStep, SaveOutcome,
    UsageLedger,
};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::config::ServiceConfig;

/// Handle shared by handlers and background tasks.
pub type SharedService = Arc<Mutex<KitService>>;

#[derive(Debug, Clone, Serialize)]
pub struct LedgerStatus {
    pub loaded: bool,
    pub dirty: bool,
    pub players: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub catalog: CatalogStatus,
    pub ledger: LedgerStatus,
    pub online_players: usize,
    pub rate_limited_players: usize,
    pub registered_permissions: usize,
    pub last_wipe: UnixSeconds,
}

pub struct KitService {
    sync: CatalogSynchronizer,
    ledger: UsageLedger,
    store: LedgerStore,
    wipe_path: PathBuf,
    wipe: WipeCooldowns,
    pipeline: ClaimPipeline,
    rate_limiter: RateLimiter,
    permissions: RegisteredPermissions,
    online: HashSet<PlayerId>,
    autokits: Vec<String>,
    sweep_threshold_secs: i64,
}

impl KitService {
    /// Build the service. Reads the persisted wipe baseline.
    pub fn new(config: &ServiceConfig) -> Self {
        let wipe_path = config.wipe_state_path();
        let wipe = WipeCooldowns::new(config.wipe_cooldowns.iter().map(|(k, s)| (k.as_str(), *s)))
            .with_state(load_wipe_state(&wipe_path));

        Self {
            sync: CatalogSynchronizer::new(config.retry_policy(), config.serve_stale),
            ledger: UsageLedger::new(),
            store: LedgerStore::new(config.ledger_path()),
            wipe_path,
            wipe,
            pipeline: ClaimPipeline::new(),
            rate_limiter: RateLimiter::new(config.claim_min_interval()),
            permissions: RegisteredPermissions::new(),
            online: HashSet::new(),
            autokits: config.autokits.clone(),
            sweep_threshold_secs: config.sweep_threshold_secs(),
        }
    }

    pub fn shared(self) -> SharedService {
        Arc::new(Mutex::new(self))
    }

    pub fn register_veto(&mut self, veto: Arc<dyn ClaimVeto>) {
        self.pipeline.register_veto(veto);
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    // ---- catalog ----

    pub fn catalog_ready(&self) -> bool {
        self.sync.is_ready()
    }

    pub fn catalog_status(&self) -> CatalogStatus {
        self.sync.status()
    }

    pub fn begin_manual_sync(&mut self) {
        self.sync.begin_manual_sync();
    }

    /// Apply one fetch result and register the permissions of a new
    /// snapshot.
    pub fn apply_catalog_fetch(
        &mut self,
        result: Result<ParsedCatalog, CatalogFetchError>,
        now: Timestamp,
    ) -> SyncOutcome {
        let outcome = self.sync.apply(result, now);
        if let SyncOutcome::Updated { .. } = outcome {
            for permission in self.sync.catalog().required_permissions() {
                self.permissions.register_permission(&permission);
            }
        }
        outcome
    }

    fn ready_catalog(&self) -> Result<Arc<KitCatalog>, CoreError> {
        if !self.sync.is_ready() {
            return Err(CoreError::Unavailable(
                "Kit catalog is loading, try again shortly".into(),
            ));
        }
        Ok(self.sync.catalog())
    }

    pub fn kit_exists(&self, name: &str) -> Result<bool, CoreError> {
        Ok(self.ready_catalog()?.contains(name))
    }

    pub fn kit_names(&self, include_hidden: bool) -> Result<Vec<String>, CoreError> {
        Ok(self.ready_catalog()?.names(include_hidden))
    }

    pub fn kit_definition(&self, name: &str) -> Result<Arc<KitDefinition>, CoreError> {
        self.ready_catalog()?
            .get(name)
            .cloned()
            .ok_or_else(|| CoreError::NotFound {
                entity: "Kit",
                id: name.to_string(),
            })
    }

    pub fn kit_contents(&self, name: &str) -> Result<Vec<ItemSummary>, CoreError> {
        Ok(self.kit_definition(name)?.contents_summary())
    }

    pub fn permissions(&self) -> Vec<String> {
        self.permissions.iter().map(str::to_string).collect()
    }

    // ---- ledger load / persistence ----

    pub fn ledger_loaded(&self) -> bool {
        self.ledger.is_loaded()
    }

    /// Apply the loader's next batch.
    pub fn apply_load_step(&mut self, loader: &mut LedgerLoader) -> LoadStep {
        loader.step(&mut self.ledger)
    }

    /// Save the ledger if dirty. Skipped until the startup load completes
    /// so a partial ledger never overwrites the document.
    pub fn save(&mut self, now: Timestamp) -> Result<SaveOutcome, CoreError> {
        if !self.ledger.is_loaded() {
            tracing::debug!("Ledger not loaded, skipping save");
            return Ok(SaveOutcome::Clean);
        }
        self.ledger
            .save(&self.store, now.timestamp())
            .map_err(|e| CoreError::Internal(format!("Failed to save ledger: {e}")))
    }

    /// Remove stale offline players.
    pub fn sweep(&mut self, now: Timestamp) -> usize {
        if !self.ledger.is_loaded() {
            return 0;
        }
        let removed = self
            .ledger
            .sweep(&self.online, self.sweep_threshold_secs, now.timestamp());
        if removed > 0 {
            tracing::info!(removed, remaining = self.ledger.len(), "Swept stale ledger entries");
        }
        removed
    }

    /// Start a new wipe: persist the new post-wipe baseline, then clear all
    /// usage and save. Nothing changes in memory if the baseline cannot be
    /// written.
    pub fn new_wipe(&mut self, now: Timestamp) -> Result<usize, CoreError> {
        self.require_loaded()?;
        let state = WipeState {
            last_wipe: now.timestamp(),
        };
        save_wipe_state(&self.wipe_path, &state)
            .map_err(|e| CoreError::Internal(format!("Failed to save wipe state: {e}")))?;

        let cleared = self.ledger.wipe();
        self.wipe.reset(state.last_wipe);
        self.save(now)?;
        tracing::info!(cleared, last_wipe = now.timestamp(), "New wipe started");
        Ok(cleared)
    }

    // ---- presence ----

    pub fn player_connected(&mut self, player: PlayerId) {
        self.online.insert(player);
        self.ledger.mark_active(player);
    }

    pub fn player_disconnected(&mut self, player: PlayerId) {
        self.online.remove(&player);
        self.rate_limiter.forget(player);
        self.ledger.mark_active(player);
    }

    // ---- claims ----

    fn run_claim<H>(
        &mut self,
        host: &mut H,
        player: PlayerId,
        kit_name: &str,
        mode: ClaimMode,
        now: Timestamp,
    ) -> Result<ClaimGrant, ClaimDenial>
    where
        H: PlayerHost + InventoryHost,
    {
        let catalog = self.sync.catalog();
        self.pipeline.claim(
            ClaimTarget {
                catalog: &catalog,
                catalog_ready: self.sync.is_ready(),
                ledger: &mut self.ledger,
                wipe: &self.wipe,
            },
            host,
            ClaimRequest {
                player,
                kit_name,
                mode,
            },
            now.timestamp(),
        )
    }

    /// Player-initiated claim, subject to the rate limiter.
    pub fn claim_kit<H>(
        &mut self,
        host: &mut H,
        player: PlayerId,
        kit_name: &str,
        now: Timestamp,
    ) -> Result<ClaimGrant, ClaimDenial>
    where
        H: PlayerHost + InventoryHost,
    {
        if !self.rate_limiter.allow(player, now) {
            return Err(ClaimDenial::RateLimited);
        }
        self.run_claim(host, player, kit_name, ClaimMode::Manual, now)
    }

    /// Administrative give.
    pub fn give_kit<H>(
        &mut self,
        host: &mut H,
        player: PlayerId,
        kit_name: &str,
        now: Timestamp,
    ) -> Result<ClaimGrant, ClaimDenial>
    where
        H: PlayerHost + InventoryHost,
    {
        self.run_claim(host, player, kit_name, ClaimMode::Administrative, now)
    }

    /// Grant the first configured auto-kit the player qualifies for.
    pub fn on_respawn<H>(&mut self, host: &mut H, player: PlayerId, now: Timestamp) -> Option<ClaimGrant>
    where
        H: PlayerHost + InventoryHost,
    {
        if !self.ledger.auto_kits_enabled(player) {
            return None;
        }
        let autokits = self.autokits.clone();
        for kit_name in &autokits {
            match self.run_claim(host, player, kit_name, ClaimMode::Automatic, now) {
                Ok(grant) => return Some(grant),
                Err(denial) => {
                    tracing::debug!(player, kit = %kit_name, reason = %denial, "Auto-kit skipped");
                }
            }
        }
        None
    }

    /// Flip the auto-kit opt-in. Refused until the ledger is loaded so the
    /// stored record cannot replace the change.
    pub fn toggle_auto_kits(&mut self, player: PlayerId) -> Result<bool, CoreError> {
        self.require_loaded()?;
        Ok(self.ledger.toggle_auto_kits(player))
    }

    // ---- admin ledger access ----

    fn require_loaded(&self) -> Result<(), CoreError> {
        if self.ledger.is_loaded() {
            Ok(())
        } else {
            Err(CoreError::Unavailable("Player data is still loading".into()))
        }
    }

    pub fn usage_count(&self, player: PlayerId, kit_name: &str) -> Result<u32, CoreError> {
        self.require_loaded()?;
        Ok(self.ledger.usage(player, kit_name).total_uses)
    }

    pub fn cooldown_remaining(
        &self,
        player: PlayerId,
        kit_name: &str,
        now: Timestamp,
    ) -> Result<i64, CoreError> {
        self.require_loaded()?;
        Ok(self.ledger.cooldown_remaining(player, kit_name, now.timestamp()))
    }

    /// Fails with `NotFound` when the player has no record.
    pub fn set_usage_count(
        &mut self,
        player: PlayerId,
        kit_name: &str,
        count: u32,
    ) -> Result<(), CoreError> {
        self.require_loaded()?;
        if self.ledger.set_usage_count(player, kit_name, count) {
            Ok(())
        } else {
            Err(player_not_found(player))
        }
    }

    /// Fails with `NotFound` when the player has no record.
    pub fn set_cooldown_remaining(
        &mut self,
        player: PlayerId,
        kit_name: &str,
        remaining_secs: i64,
        now: Timestamp,
    ) -> Result<(), CoreError> {
        self.require_loaded()?;
        if self
            .ledger
            .set_cooldown_remaining(player, kit_name, remaining_secs, now.timestamp())
        {
            Ok(())
        } else {
            Err(player_not_found(player))
        }
    }

    pub fn status(&self) -> ServiceStatus {
        ServiceStatus {
            catalog: self.sync.status(),
            ledger: LedgerStatus {
                loaded: self.ledger.is_loaded(),
                dirty: self.ledger.is_dirty(),
                players: self.ledger.len(),
            },
            online_players: self.online.len(),
            rate_limited_players: self.rate_limiter.tracked(),
            registered_permissions: self.permissions.len(),
            last_wipe: self.wipe.state().last_wipe,
        }
    }
}

fn player_not_found(player: PlayerId) -> CoreError {
    CoreError::NotFound {
        entity: "Player",
        id: player.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
