//! HTTP form of the game-host collaborators.
//!
//! The host posts a [`PlayerContext`] snapshot with each claim. A
//! [`HostBridge`] answers the pipeline's player and inventory questions
//! from that snapshot and collects the items it was asked to place, which
//! are returned to the host as [`Placement`]s.

use std::collections::HashSet;

use kitforge_claims::{InventoryHost, PlayerHost};
use kitforge_core::kit::{ItemContainer, ItemDescriptor, KitDefinition};
use kitforge_core::types::PlayerId;
use serde::{Deserialize, Serialize};

fn default_alive() -> bool {
    true
}

/// Free slots per player container.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct FreeSlots {
    #[serde(default)]
    pub main: usize,
    #[serde(default)]
    pub wear: usize,
    #[serde(default)]
    pub belt: usize,
}

impl FreeSlots {
    fn get(&self, container: ItemContainer) -> usize {
        match container {
            ItemContainer::Main => self.main,
            ItemContainer::Wear => self.wear,
            ItemContainer::Belt => self.belt,
        }
    }
}

/// Player state as reported by the game host.
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerContext {
    #[serde(default = "default_alive")]
    pub alive: bool,
    #[serde(default)]
    pub auth_level: u32,
    #[serde(default)]
    pub permissions: HashSet<String>,
    /// Unknown space is treated as enough.
    #[serde(default)]
    pub free_slots: Option<FreeSlots>,
}

impl Default for PlayerContext {
    fn default() -> Self {
        Self {
            alive: true,
            auth_level: 0,
            permissions: HashSet::new(),
            free_slots: None,
        }
    }
}

/// Items the host should put into one container.
#[derive(Debug, Clone, Serialize)]
pub struct Placement {
    pub container: ItemContainer,
    pub items: Vec<ItemDescriptor>,
}

pub struct HostBridge {
    player: PlayerId,
    context: PlayerContext,
    placements: Vec<Placement>,
}

impl HostBridge {
    pub fn new(player: PlayerId, context: PlayerContext) -> Self {
        Self {
            player,
            context,
            placements: Vec::new(),
        }
    }

    pub fn into_placements(self) -> Vec<Placement> {
        self.placements
    }
}

impl PlayerHost for HostBridge {
    fn is_alive(&self, player: PlayerId) -> bool {
        player == self.player && self.context.alive
    }

    fn auth_level(&self, player: PlayerId) -> u32 {
        if player == self.player {
            self.context.auth_level
        } else {
            0
        }
    }

    fn has_permission(&self, player: PlayerId, permission: &str) -> bool {
        player == self.player && self.context.permissions.contains(permission)
    }
}

impl InventoryHost for HostBridge {
    fn has_space_for(&self, player: PlayerId, kit: &KitDefinition) -> bool {
        if player != self.player {
            return false;
        }
        let Some(free) = self.context.free_slots else {
            return true;
        };
        ItemContainer::ALL
            .into_iter()
            .all(|container| kit.slots_needed(container) <= free.get(container))
    }

    fn place_items(&mut self, _player: PlayerId, kit: &KitDefinition) {
        self.placements.extend(
            ItemContainer::ALL
                .into_iter()
                .filter(|&container| !kit.items(container).is_empty())
                .map(|container| Placement {
                    container,
                    items: kit.items(container).to_vec(),
                }),
        );
    }
}
