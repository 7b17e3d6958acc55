use std::sync::Arc;

use kitforge_core::duration::format_duration;
use kitforge_core::kit::KitDefinition;
use kitforge_ledger::KitUsage;
use serde::{Deserialize, Serialize};

/// How a claim was initiated. Decides which checks apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimMode {
    /// Player asked for the kit.
    Manual,
    /// Granted passively (respawn). Skips the auth-level check.
    Automatic,
    /// Operator give. Skips auth level, permission and both cooldowns.
    Administrative,
}

impl ClaimMode {
    pub fn checks_auth_level(self) -> bool {
        matches!(self, ClaimMode::Manual)
    }

    pub fn checks_entitlement(self) -> bool {
        !matches!(self, ClaimMode::Administrative)
    }
}

/// Broad class of a denial, used to pick a transport status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialClass {
    /// Try again shortly.
    NotReady,
    RateLimited,
    /// The player or kit does not qualify.
    Ineligible,
}

fn remaining_text(secs: &i64) -> String {
    format_duration(*secs)
}

/// Why a claim was refused. `Display` is the player-facing text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClaimDenial {
    #[error("You are doing that too often, slow down")]
    RateLimited,

    #[error("{0}")]
    Vetoed(String),

    #[error("You cannot claim kits while dead")]
    SubjectDead,

    #[error("Kits are still loading, try again shortly")]
    CatalogLoading,

    #[error("Player data is still loading, try again shortly")]
    LedgerLoading,

    #[error("No kit name given")]
    EmptyKitName,

    #[error("Kit \"{0}\" does not exist")]
    UnknownKit(String),

    #[error("Kit \"{kit}\" requires auth level {required}")]
    InsufficientAuthLevel { kit: String, required: u32 },

    #[error("You do not have permission to use kit \"{kit}\"")]
    MissingPermission { kit: String, permission: String },

    #[error("Kit \"{kit}\" unlocks {} after the wipe", remaining_text(.remaining))]
    WipeLocked { kit: String, remaining: i64 },

    #[error("Kit \"{kit}\" is on cooldown for {}", remaining_text(.remaining))]
    Cooldown { kit: String, remaining: i64 },

    #[error("Not enough inventory space for kit \"{0}\"")]
    NoInventorySpace(String),
}

impl ClaimDenial {
    pub fn class(&self) -> DenialClass {
        match self {
            ClaimDenial::CatalogLoading | ClaimDenial::LedgerLoading => DenialClass::NotReady,
            ClaimDenial::RateLimited => DenialClass::RateLimited,
            _ => DenialClass::Ineligible,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ClaimDenial::RateLimited => "RATE_LIMITED",
            ClaimDenial::Vetoed(_) => "VETOED",
            ClaimDenial::SubjectDead => "SUBJECT_DEAD",
            ClaimDenial::CatalogLoading => "CATALOG_LOADING",
            ClaimDenial::LedgerLoading => "LEDGER_LOADING",
            ClaimDenial::EmptyKitName => "EMPTY_KIT_NAME",
            ClaimDenial::UnknownKit(_) => "UNKNOWN_KIT",
            ClaimDenial::InsufficientAuthLevel { .. } => "INSUFFICIENT_AUTH_LEVEL",
            ClaimDenial::MissingPermission { .. } => "MISSING_PERMISSION",
            ClaimDenial::WipeLocked { .. } => "WIPE_LOCKED",
            ClaimDenial::Cooldown { .. } => "COOLDOWN",
            ClaimDenial::NoInventorySpace(_) => "NO_INVENTORY_SPACE",
        }
    }

    /// Seconds until the kit can be claimed, for time-based denials.
    pub fn remaining_secs(&self) -> Option<i64> {
        match self {
            ClaimDenial::WipeLocked { remaining, .. } | ClaimDenial::Cooldown { remaining, .. } => {
                Some(*remaining)
            }
            _ => None,
        }
    }
}

/// A granted claim.
#[derive(Debug, Clone)]
pub struct ClaimGrant {
    pub kit: Arc<KitDefinition>,
    /// Usage after the claim was recorded.
    pub usage: KitUsage,
}

impl ClaimGrant {
    pub fn message(&self) -> String {
        format!("You received kit \"{}\"", self.kit.name)
    }
}
