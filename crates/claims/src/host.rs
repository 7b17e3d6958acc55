//! Collaborator interfaces the claim pipeline depends on.
//!
//! The game host owns player state and item instantiation; the pipeline
//! only asks questions through these traits and never touches inventory
//! itself.

use std::collections::BTreeSet;

use kitforge_core::kit::KitDefinition;
use kitforge_core::types::PlayerId;

/// Player facts the host can answer.
pub trait PlayerHost {
    fn is_alive(&self, player: PlayerId) -> bool;
    fn auth_level(&self, player: PlayerId) -> u32;
    fn has_permission(&self, player: PlayerId, permission: &str) -> bool;
}

/// Item placement owned by the host.
pub trait InventoryHost {
    fn has_space_for(&self, player: PlayerId, kit: &KitDefinition) -> bool;

    /// Best effort. Overflow handling is up to the host.
    fn place_items(&mut self, player: PlayerId, kit: &KitDefinition);
}

pub trait PermissionRegistry {
    fn register_permission(&mut self, permission: &str);
}

/// In-process permission registry: the set of every permission string
/// kits have required since startup.
#[derive(Debug, Default, Clone)]
pub struct RegisteredPermissions {
    permissions: BTreeSet<String>,
}

impl RegisteredPermissions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.permissions.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }
}

impl PermissionRegistry for RegisteredPermissions {
    fn register_permission(&mut self, permission: &str) {
        if self.permissions.insert(permission.to_string()) {
            tracing::debug!(permission, "Registered kit permission");
        }
    }
}

/// Extension point that may refuse any claim before other checks run.
///
/// `Err` carries the reason shown to the player.
pub trait ClaimVeto: Send + Sync {
    fn check(&self, player: PlayerId, kit_name: &str) -> Result<(), String>;
}

impl<F> ClaimVeto for F
where
    F: Fn(PlayerId, &str) -> Result<(), String> + Send + Sync,
{
    fn check(&self, player: PlayerId, kit_name: &str) -> Result<(), String> {
        self(player, kit_name)
    }
}
