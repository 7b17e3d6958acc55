//! Immutable catalog snapshot.
//!
//! A [`KitCatalog`] is built once from a validated kit list and never
//! mutated afterwards; a newer fetch produces a new snapshot that
//! replaces the old one wholesale behind an `Arc`.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use kitforge_core::kit::{kit_key, KitDefinition};

#[derive(Debug, Default)]
pub struct KitCatalog {
    /// Keyed by lowercase name, so iteration order is stable.
    kits: BTreeMap<String, Arc<KitDefinition>>,
}

impl KitCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a snapshot. Names are expected to be non-empty; when two
    /// definitions share a name case-insensitively the later one wins.
    pub fn from_definitions(definitions: Vec<KitDefinition>) -> Self {
        let mut kits = BTreeMap::new();
        for definition in definitions {
            let key = definition.key();
            if let Some(previous) = kits.insert(key, Arc::new(definition)) {
                tracing::warn!(kit = %previous.name, "Duplicate kit name in catalog, keeping the later entry");
            }
        }
        Self { kits }
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<&Arc<KitDefinition>> {
        self.kits.get(&kit_key(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.kits.contains_key(&kit_key(name))
    }

    pub fn len(&self) -> usize {
        self.kits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kits.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<KitDefinition>> {
        self.kits.values()
    }

    /// Kit names as authored, ordered case-insensitively.
    pub fn names(&self, include_hidden: bool) -> Vec<String> {
        self.iter()
            .filter(|kit| include_hidden || !kit.is_hidden)
            .map(|kit| kit.name.clone())
            .collect()
    }

    /// Distinct non-empty permissions required by any kit.
    pub fn required_permissions(&self) -> BTreeSet<String> {
        self.iter()
            .filter_map(|kit| kit.required_permission())
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kit(name: &str) -> KitDefinition {
        serde_json::from_value(serde_json::json!({ "Name": name })).unwrap()
    }

    #[test]
    fn lookup_ignores_case() {
        let catalog = KitCatalog::from_definitions(vec![kit("Medic")]);
        for name in ["Medic", "medic", "MEDIC", "mEdIc"] {
            assert_eq!(catalog.get(name).map(|k| k.name.as_str()), Some("Medic"));
            assert!(catalog.contains(name));
        }
        assert!(!catalog.contains("Raider"));
    }

    #[test]
    fn later_duplicate_wins() {
        let mut second = kit("MEDIC");
        second.cooldown = 60;
        let catalog = KitCatalog::from_definitions(vec![kit("Medic"), second]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("medic").unwrap().cooldown, 60);
    }

    #[test]
    fn names_are_ordered_and_hidden_filtered() {
        let mut hidden = kit("admin");
        hidden.is_hidden = true;
        let catalog = KitCatalog::from_definitions(vec![kit("Raider"), hidden, kit("Medic")]);
        assert_eq!(catalog.names(false), vec!["Medic", "Raider"]);
        assert_eq!(catalog.names(true), vec!["admin", "Medic", "Raider"]);
    }

    #[test]
    fn required_permissions_are_distinct() {
        let mut a = kit("A");
        a.required_permission = Some("kits.vip".into());
        let mut b = kit("B");
        b.required_permission = Some("kits.vip".into());
        let catalog = KitCatalog::from_definitions(vec![a, b, kit("C")]);
        assert_eq!(
            catalog.required_permissions().into_iter().collect::<Vec<_>>(),
            vec!["kits.vip".to_string()]
        );
    }
}
