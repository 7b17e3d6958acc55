//! Ordered claim authorization.
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. registered vetoes
//! 2. player alive
//! 3. catalog ready
//! 4. ledger loaded
//! 5. kit name non-empty
//! 6. kit exists (case-insensitive)
//! 7. auth level (manual claims only)
//! 8. permission
//! 9. post-wipe lock
//! 10. per-player cooldown
//! 11. inventory space
//!
//! Administrative claims skip 7 to 10. A denial never mutates the ledger.

use std::sync::Arc;

use kitforge_catalog::KitCatalog;
use kitforge_core::kit::KitDefinition;
use kitforge_core::types::{PlayerId, UnixSeconds};
use kitforge_core::wipe::WipeCooldowns;
use kitforge_ledger::UsageLedger;

use crate::decision::{ClaimDenial, ClaimGrant, ClaimMode};
use crate::host::{ClaimVeto, InventoryHost, PlayerHost};

#[derive(Debug, Clone, Copy)]
pub struct ClaimRequest<'a> {
    pub player: PlayerId,
    pub kit_name: &'a str,
    pub mode: ClaimMode,
}

/// Read-only view of the state a decision depends on.
#[derive(Clone, Copy)]
pub struct ClaimState<'a> {
    pub catalog: &'a KitCatalog,
    pub catalog_ready: bool,
    pub ledger: &'a UsageLedger,
    pub wipe: &'a WipeCooldowns,
    pub now: UnixSeconds,
}

/// The state a granted claim writes to.
pub struct ClaimTarget<'a> {
    pub catalog: &'a KitCatalog,
    pub catalog_ready: bool,
    pub ledger: &'a mut UsageLedger,
    pub wipe: &'a WipeCooldowns,
}

#[derive(Default)]
pub struct ClaimPipeline {
    vetoes: Vec<Arc<dyn ClaimVeto>>,
}

impl ClaimPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_veto(&mut self, veto: Arc<dyn ClaimVeto>) {
        self.vetoes.push(veto);
    }

    pub fn with_veto(mut self, veto: Arc<dyn ClaimVeto>) -> Self {
        self.register_veto(veto);
        self
    }

    /// Run every check without side effects.
    pub fn evaluate<H>(
        &self,
        state: ClaimState<'_>,
        host: &H,
        request: ClaimRequest<'_>,
    ) -> Result<Arc<KitDefinition>, ClaimDenial>
    where
        H: PlayerHost + InventoryHost,
    {
        let ClaimRequest {
            player,
            kit_name,
            mode,
        } = request;

        for veto in &self.vetoes {
            veto.check(player, kit_name).map_err(ClaimDenial::Vetoed)?;
        }

        if !host.is_alive(player) {
            return Err(ClaimDenial::SubjectDead);
        }
        if !state.catalog_ready {
            return Err(ClaimDenial::CatalogLoading);
        }
        if !state.ledger.is_loaded() {
            return Err(ClaimDenial::LedgerLoading);
        }

        let kit_name = kit_name.trim();
        if kit_name.is_empty() {
            return Err(ClaimDenial::EmptyKitName);
        }
        let kit = state
            .catalog
            .get(kit_name)
            .cloned()
            .ok_or_else(|| ClaimDenial::UnknownKit(kit_name.to_string()))?;

        if mode.checks_auth_level() && host.auth_level(player) < kit.required_auth_level {
            return Err(ClaimDenial::InsufficientAuthLevel {
                kit: kit.name.clone(),
                required: kit.required_auth_level,
            });
        }

        if mode.checks_entitlement() {
            if let Some(permission) = kit.required_permission() {
                if !host.has_permission(player, permission) {
                    return Err(ClaimDenial::MissingPermission {
                        kit: kit.name.clone(),
                        permission: permission.to_string(),
                    });
                }
            }

            if let Some(remaining) = state.wipe.remaining(&kit.name, state.now) {
                return Err(ClaimDenial::WipeLocked {
                    kit: kit.name.clone(),
                    remaining,
                });
            }

            if kit.cooldown > 0 {
                if let Some(record) = state.ledger.get(player) {
                    let remaining = record.usage(&kit.name).cooldown_remaining(state.now);
                    if remaining > 0 {
                        return Err(ClaimDenial::Cooldown {
                            kit: kit.name.clone(),
                            remaining,
                        });
                    }
                }
            }
        }

        if !host.has_space_for(player, &kit) {
            return Err(ClaimDenial::NoInventorySpace(kit.name.clone()));
        }

        Ok(kit)
    }

    /// Evaluate, then place the items and record the claim.
    pub fn claim<H>(
        &self,
        target: ClaimTarget<'_>,
        host: &mut H,
        request: ClaimRequest<'_>,
        now: UnixSeconds,
    ) -> Result<ClaimGrant, ClaimDenial>
    where
        H: PlayerHost + InventoryHost,
    {
        let ClaimTarget {
            catalog,
            catalog_ready,
            ledger,
            wipe,
        } = target;
        let state = ClaimState {
            catalog,
            catalog_ready,
            ledger: &*ledger,
            wipe,
            now,
        };
        let kit = match self.evaluate(state, host, request) {
            Ok(kit) => kit,
            Err(denial) => {
                tracing::debug!(
                    player = request.player,
                    kit = request.kit_name,
                    mode = ?request.mode,
                    code = denial.code(),
                    "Claim denied",
                );
                return Err(denial);
            }
        };

        host.place_items(request.player, &kit);
        let usage = ledger.record_claim(request.player, &kit.name, kit.cooldown, now);
        tracing::debug!(
            player = request.player,
            kit = %kit.name,
            mode = ?request.mode,
            total_uses = usage.total_uses,
            "Claim granted",
        );
        Ok(ClaimGrant { kit, usage })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
