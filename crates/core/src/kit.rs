//! Kit and item descriptor data model.
//!
//! A [`KitDefinition`] is a named loadout made of three ordered item
//! lists (main inventory, worn clothing, hotbar belt). Items are
//! [`ItemDescriptor`]s, a recursive value: a container item may carry
//! nested contents and an optional [`ContainerDescriptor`].
//!
//! Field names follow the PascalCase wire format produced by the kit
//! authoring tool. Explicit `null`s in the payload are read as the
//! field's default.

use serde::{Deserialize, Deserializer, Serialize};

/// Default stack size when the payload omits `Amount`.
const DEFAULT_AMOUNT: u32 = 1;

/// `Position` value meaning "first free slot".
pub const ANY_POSITION: i32 = -1;

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// Case-insensitive lookup key for a kit name, surrounding whitespace
/// ignored.
pub fn kit_key(name: &str) -> String {
    name.trim().to_lowercase()
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn default_amount() -> u32 {
    DEFAULT_AMOUNT
}

fn default_position() -> i32 {
    ANY_POSITION
}

// ---------------------------------------------------------------------------
// Item descriptors
// ---------------------------------------------------------------------------

/// The player container an item list is placed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemContainer {
    Main,
    Wear,
    Belt,
}

impl ItemContainer {
    pub const ALL: [ItemContainer; 3] = [ItemContainer::Main, ItemContainer::Wear, ItemContainer::Belt];
}

/// One item of a kit loadout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ItemDescriptor {
    /// Item shortname (e.g. `rifle.ak`). May be empty when only the
    /// numeric id is known.
    #[serde(default, deserialize_with = "null_as_default")]
    pub shortname: String,
    /// Resolved numeric item id, `0` when unresolved.
    #[serde(default)]
    pub item_id: i64,
    #[serde(default = "default_amount")]
    pub amount: u32,
    #[serde(default)]
    pub skin_id: u64,
    #[serde(default)]
    pub condition: f32,
    #[serde(default)]
    pub max_condition: f32,
    /// Slot index inside the target container, [`ANY_POSITION`] for none.
    #[serde(default = "default_position")]
    pub position: i32,
    /// Nested items (attachments, ammunition, container contents).
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub contents: Vec<ItemDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<ContainerDescriptor>,
}

/// Structured description of an item that is itself a container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerDescriptor {
    #[serde(default)]
    pub slots: u32,
    /// Shortnames the container accepts; empty accepts anything.
    #[serde(default, deserialize_with = "null_as_default")]
    pub item_filters: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub contents: Vec<ItemDescriptor>,
}

impl ItemDescriptor {
    /// Shortname when known, otherwise `#<item_id>`.
    pub fn display_name(&self) -> String {
        if self.shortname.is_empty() {
            format!("#{}", self.item_id)
        } else {
            self.shortname.clone()
        }
    }

    /// Iterate the direct children: loose `contents` first, then the
    /// contents of the structured container descriptor.
    pub fn children(&self) -> impl Iterator<Item = &ItemDescriptor> {
        self.contents
            .iter()
            .chain(self.container.iter().flat_map(|c| c.contents.iter()))
    }
}

// ---------------------------------------------------------------------------
// Kit definitions
// ---------------------------------------------------------------------------

/// A named, predefined item loadout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KitDefinition {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default)]
    pub required_permission: Option<String>,
    /// Minimum auth level; `0` means no requirement.
    #[serde(default, alias = "RequiredAuth")]
    pub required_auth_level: u32,
    /// Per-player cooldown in seconds; `0` means none.
    #[serde(default)]
    pub cooldown: u64,
    #[serde(default)]
    pub is_hidden: bool,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub main_items: Vec<ItemDescriptor>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub wear_items: Vec<ItemDescriptor>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub belt_items: Vec<ItemDescriptor>,
}

/// One line of a flattened kit content listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemSummary {
    pub container: ItemContainer,
    pub item: String,
    pub amount: u32,
    /// Nesting depth, `0` for top-level items.
    pub depth: u32,
}

impl KitDefinition {
    /// Case-insensitive lookup key.
    pub fn key(&self) -> String {
        kit_key(&self.name)
    }

    /// Whether the definition has a usable name.
    pub fn has_name(&self) -> bool {
        !self.name.trim().is_empty()
    }

    /// The required permission, treating an empty string as none.
    pub fn required_permission(&self) -> Option<&str> {
        self.required_permission
            .as_deref()
            .filter(|p| !p.trim().is_empty())
    }

    pub fn items(&self, container: ItemContainer) -> &[ItemDescriptor] {
        match container {
            ItemContainer::Main => &self.main_items,
            ItemContainer::Wear => &self.wear_items,
            ItemContainer::Belt => &self.belt_items,
        }
    }

    /// Number of top-level items destined for `container`.
    pub fn slots_needed(&self, container: ItemContainer) -> usize {
        self.items(container).len()
    }

    /// Flatten every item, including nested contents, into a listing.
    pub fn contents_summary(&self) -> Vec<ItemSummary> {
        let mut out = Vec::new();
        for container in ItemContainer::ALL {
            for item in self.items(container) {
                flatten_into(item, container, 0, &mut out);
            }
        }
        out
    }
}

fn flatten_into(item: &ItemDescriptor, container: ItemContainer, depth: u32, out: &mut Vec<ItemSummary>) {
    out.push(ItemSummary {
        container,
        item: item.display_name(),
        amount: item.amount,
        depth,
    });
    for child in item.children() {
        flatten_into(child, container, depth + 1, out);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn item(shortname: &str, amount: u32) -> ItemDescriptor {
        ItemDescriptor {
            shortname: shortname.to_string(),
            item_id: 0,
            amount,
            skin_id: 0,
            condition: 0.0,
            max_condition: 0.0,
            position: ANY_POSITION,
            contents: Vec::new(),
            container: None,
        }
    }

    #[test]
    fn kit_key_is_case_insensitive() {
        assert_eq!(kit_key("Medic"), kit_key("mEDIC"));
    }

    #[test]
    fn kit_key_ignores_surrounding_whitespace() {
        assert_eq!(kit_key(" Medic  "), "medic");
    }

    #[test]
    fn deserializes_pascal_case_payload() {
        let json = r#"{
            "Name": "Raider",
            "Description": null,
            "RequiredPermission": "kits.raider",
            "RequiredAuth": 1,
            "Cooldown": 3600,
            "MainItems": [{"Shortname": "explosive.timed", "Amount": 2}],
            "WearItems": null
        }"#;
        let kit: KitDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(kit.name, "Raider");
        assert_eq!(kit.description, "");
        assert_eq!(kit.required_auth_level, 1);
        assert_eq!(kit.cooldown, 3600);
        assert_eq!(kit.required_permission(), Some("kits.raider"));
        assert_eq!(kit.main_items[0].amount, 2);
        assert_eq!(kit.main_items[0].position, ANY_POSITION);
        assert!(kit.wear_items.is_empty());
    }

    #[test]
    fn missing_amount_defaults_to_one() {
        let item: ItemDescriptor = serde_json::from_str(r#"{"Shortname": "bandage"}"#).unwrap();
        assert_eq!(item.amount, 1);
    }

    #[test]
    fn blank_permission_is_none() {
        let kit: KitDefinition =
            serde_json::from_str(r#"{"Name": "Starter", "RequiredPermission": "  "}"#).unwrap();
        assert_eq!(kit.required_permission(), None);
    }

    #[test]
    fn whitespace_name_is_not_a_name() {
        let kit: KitDefinition = serde_json::from_str(r#"{"Name": "   "}"#).unwrap();
        assert!(!kit.has_name());
    }

    #[test]
    fn summary_flattens_nested_contents_depth_first() {
        let mut backpack = item("smallbackpack", 1);
        backpack.container = Some(ContainerDescriptor {
            slots: 6,
            item_filters: Vec::new(),
            contents: vec![item("bandage", 3)],
        });
        let mut rifle = item("rifle.ak", 1);
        rifle.contents = vec![item("weapon.mod.holosight", 1)];

        let kit = KitDefinition {
            name: "Medic".into(),
            description: String::new(),
            required_permission: None,
            required_auth_level: 0,
            cooldown: 0,
            is_hidden: false,
            category: None,
            subcategory: None,
            main_items: vec![backpack],
            wear_items: vec![],
            belt_items: vec![rifle],
        };

        let summary = kit.contents_summary();
        let names: Vec<_> = summary.iter().map(|s| (s.item.as_str(), s.depth)).collect();
        assert_eq!(
            names,
            vec![
                ("smallbackpack", 0),
                ("bandage", 1),
                ("rifle.ak", 0),
                ("weapon.mod.holosight", 1),
            ]
        );
        assert_eq!(summary[2].container, ItemContainer::Belt);
    }

    #[test]
    fn display_name_falls_back_to_id() {
        let mut unnamed = item("", 1);
        unnamed.item_id = -1211166256;
        assert_eq!(unnamed.display_name(), "#-1211166256");
    }
}
