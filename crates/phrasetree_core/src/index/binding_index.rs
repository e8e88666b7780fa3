//! Uniqueness index for abbreviations and hotkeys.
//!
//! # Responsibility
//! - Answer "which phrase already owns this binding?" for the whole tree.
//! - Report stored data that breaks the uniqueness invariant.
//!
//! # Invariants
//! - Lookups never mutate the tree and are safe to repeat.
//! - Abbreviations compare by exact string equality.
//! - Hotkeys compare by modifier set equality plus exact key symbol.
//!
//! The search is a full traversal over `ConfigManager::all_items`, so it can
//! never drift from the tree it describes.

use crate::config::ConfigManager;
use crate::model::{Hotkey, Phrase, PhraseId};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

/// One trigger binding claimed by a phrase.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Binding {
    Abbreviation(String),
    Hotkey(Hotkey),
}

impl Display for Binding {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Abbreviation(value) => write!(f, "abbreviation \"{value}\""),
            Self::Hotkey(hotkey) => write!(f, "hotkey {hotkey}"),
        }
    }
}

/// Two phrases claiming the same binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateBinding {
    pub binding: Binding,
    /// Owner met first in traversal order.
    pub first: PhraseId,
    pub second: PhraseId,
}

/// Returns the first phrase whose abbreviations contain `candidate`.
pub fn find_by_abbreviation<'a>(config: &'a ConfigManager, candidate: &str) -> Option<&'a Phrase> {
    config
        .all_items()
        .into_iter()
        .find(|phrase| phrase.abbreviations.contains(candidate))
}

/// Returns the first phrase bound to `candidate`.
pub fn find_by_hotkey<'a>(config: &'a ConfigManager, candidate: &Hotkey) -> Option<&'a Phrase> {
    config
        .all_items()
        .into_iter()
        .find(|phrase| phrase.hotkey.as_ref() == Some(candidate))
}

/// Lists every binding claimed by more than one phrase.
pub fn find_duplicate_bindings(config: &ConfigManager) -> Vec<DuplicateBinding> {
    let mut abbreviation_owners: HashMap<&str, PhraseId> = HashMap::new();
    let mut hotkey_owners: HashMap<&Hotkey, PhraseId> = HashMap::new();
    let mut duplicates = Vec::new();

    for phrase in config.all_items() {
        if !phrase.has_bindings() {
            continue;
        }
        for abbreviation in phrase.abbreviations.iter() {
            if let Some(first) = abbreviation_owners.get(abbreviation) {
                duplicates.push(DuplicateBinding {
                    binding: Binding::Abbreviation(abbreviation.to_string()),
                    first: *first,
                    second: phrase.id,
                });
            } else {
                abbreviation_owners.insert(abbreviation, phrase.id);
            }
        }
        if let Some(hotkey) = phrase.hotkey.as_ref() {
            if let Some(first) = hotkey_owners.get(hotkey) {
                duplicates.push(DuplicateBinding {
                    binding: Binding::Hotkey(hotkey.clone()),
                    first: *first,
                    second: phrase.id,
                });
            } else {
                hotkey_owners.insert(hotkey, phrase.id);
            }
        }
    }

    duplicates
}

#[cfg(test)]
mod tests {
    use super::{find_by_abbreviation, find_by_hotkey, find_duplicate_bindings, Binding};
    use crate::config::ConfigManager;
    use crate::model::{Abbreviations, Folder, HotkeyArg, Phrase};

    fn tree_with(phrases: Vec<(&str, Vec<&str>, Option<HotkeyArg>)>) -> ConfigManager {
        let mut root = Folder::new("Root", None);
        let mut child = Folder::new("Child", Some(root.id));
        for (index, (title, abbreviations, hotkey)) in phrases.into_iter().enumerate() {
            let target = if index % 2 == 0 { &mut child } else { &mut root };
            let mut phrase = Phrase::new(target.id, title, "body");
            phrase.abbreviations = Abbreviations::from_strings(abbreviations).unwrap();
            phrase.hotkey = hotkey.map(|arg| arg.validate().unwrap());
            target.items.push(phrase);
        }
        root.folders.push(child);
        let mut manager = ConfigManager::new();
        manager.add_root_folder(root);
        manager
    }

    #[test]
    fn finds_abbreviation_in_nested_folder() {
        let manager = tree_with(vec![("Nested", vec!["sig", "brb"], None)]);
        let owner = find_by_abbreviation(&manager, "brb").unwrap();
        assert_eq!(owner.title, "Nested");
        assert!(find_by_abbreviation(&manager, "BRB").is_none());
    }

    #[test]
    fn hotkey_lookup_ignores_modifier_order() {
        let manager = tree_with(vec![(
            "Bound",
            vec![],
            Some(HotkeyArg::new(["<ctrl>", "<alt>"], "k")),
        )]);
        let candidate = HotkeyArg::new(["<alt>", "<ctrl>"], "k").validate().unwrap();
        assert_eq!(find_by_hotkey(&manager, &candidate).unwrap().title, "Bound");

        let other_key = HotkeyArg::new(["<alt>", "<ctrl>"], "j").validate().unwrap();
        assert!(find_by_hotkey(&manager, &other_key).is_none());
    }

    #[test]
    fn repeated_lookup_returns_same_owner() {
        let manager = tree_with(vec![("A", vec!["x"], None), ("B", vec!["y"], None)]);
        let first = find_by_abbreviation(&manager, "y").map(|phrase| phrase.id);
        let second = find_by_abbreviation(&manager, "y").map(|phrase| phrase.id);
        assert_eq!(first, second);
        assert!(first.is_some());
    }

    #[test]
    fn reports_duplicates_from_unchecked_data() {
        let manager = tree_with(vec![
            ("A", vec!["dup"], Some(HotkeyArg::new(["<ctrl>"], "a"))),
            ("B", vec!["dup", "own"], Some(HotkeyArg::new(["<ctrl>"], "a"))),
        ]);
        let duplicates = find_duplicate_bindings(&manager);
        assert_eq!(duplicates.len(), 2);
        assert!(duplicates
            .iter()
            .any(|duplicate| duplicate.binding == Binding::Abbreviation("dup".to_string())));
        assert!(duplicates
            .iter()
            .any(|duplicate| matches!(duplicate.binding, Binding::Hotkey(_))));
    }

    #[test]
    fn clean_tree_has_no_duplicates() {
        let manager = tree_with(vec![("A", vec!["a"], None), ("B", vec!["b"], None)]);
        assert!(find_duplicate_bindings(&manager).is_empty());
    }
}
