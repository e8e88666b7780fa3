//! Session-scoped owner of the folder tree.
//!
//! # Responsibility
//! - Hold root folders and derive `all_folders` / `all_items` views.
//! - Apply structural mutations requested by the engine.
//! - Notify subscribed listeners after every structural change.
//!
//! # Invariants
//! - Mutation entry points are crate-private; outside callers only read.
//! - `revision` increases by one per `config_altered` call.
//! - Traversal order is depth-first pre-order over `folders`, then `items`.

use crate::index::binding_index::find_duplicate_bindings;
use crate::model::{Folder, FolderId, Hotkey, Phrase, PhraseId};
use crate::repo::item_repo::{ItemRepoResult, ItemStore};
use log::{info, warn};
use std::fmt::{Debug, Formatter};

/// Structural change reported through `config_altered`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigChange {
    FolderCreated {
        folder: FolderId,
        parent: Option<FolderId>,
    },
    PhraseCreated {
        phrase: PhraseId,
        folder: FolderId,
    },
    /// A hotkey moved from one phrase to a newly created one.
    HotkeyReassigned {
        hotkey: Hotkey,
        from: PhraseId,
        to: PhraseId,
    },
    TemporaryRemoved {
        scope: Option<FolderId>,
        removed: usize,
    },
}

type Listener = Box<dyn FnMut(u64, &ConfigChange)>;

/// Owner of the root folder list.
pub struct ConfigManager {
    folders: Vec<Folder>,
    revision: u64,
    listeners: Vec<Listener>,
}

impl Debug for ConfigManager {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigManager")
            .field("folders", &self.folders)
            .field("revision", &self.revision)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self {
            folders: Vec::new(),
            revision: 0,
            listeners: Vec::new(),
        }
    }

    /// Loads the persisted tree from `store`.
    ///
    /// Duplicate bindings found in stored data are logged, not rejected, so a
    /// damaged store stays readable.
    pub fn load<S: ItemStore>(store: &S) -> ItemRepoResult<Self> {
        let folders = store.load_folders()?;
        let manager = Self {
            folders,
            revision: 0,
            listeners: Vec::new(),
        };

        for duplicate in find_duplicate_bindings(&manager) {
            warn!(
                "event=store_load module=config status=duplicate_binding binding={} first_uuid={} second_uuid={}",
                duplicate.binding, duplicate.first, duplicate.second
            );
        }
        info!(
            "event=store_load module=config status=ok folders={} phrases={}",
            manager.all_folders().len(),
            manager.all_items().len()
        );
        Ok(manager)
    }

    /// Root folders in registration order.
    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    /// Every folder in the tree, depth-first pre-order.
    pub fn all_folders(&self) -> Vec<&Folder> {
        let mut out = Vec::new();
        collect_folders(&self.folders, &mut out);
        out
    }

    /// Every phrase in the tree, in folder traversal order.
    pub fn all_items(&self) -> Vec<&Phrase> {
        self.all_folders()
            .into_iter()
            .flat_map(|folder| folder.items.iter())
            .collect()
    }

    pub fn folder(&self, id: FolderId) -> Option<&Folder> {
        find_folder(&self.folders, id)
    }

    pub fn phrase(&self, id: PhraseId) -> Option<&Phrase> {
        self.all_items().into_iter().find(|phrase| phrase.id == id)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Registers a listener called with `(revision, change)` after every
    /// structural change.
    pub fn subscribe(&mut self, listener: impl FnMut(u64, &ConfigChange) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Records one structural change and notifies listeners.
    pub fn config_altered(&mut self, change: ConfigChange) {
        self.revision += 1;
        info!(
            "event=config_altered module=config status=ok revision={} change={:?}",
            self.revision, change
        );
        let revision = self.revision;
        for listener in &mut self.listeners {
            listener(revision, &change);
        }
    }

    pub(crate) fn add_root_folder(&mut self, folder: Folder) {
        self.folders.push(folder);
    }

    pub(crate) fn folder_mut(&mut self, id: FolderId) -> Option<&mut Folder> {
        find_folder_mut(&mut self.folders, id)
    }

    pub(crate) fn phrase_mut(&mut self, id: PhraseId) -> Option<&mut Phrase> {
        find_phrase_mut(&mut self.folders, id)
    }

    /// Removes temporary phrases and folders beneath `scope`, or everywhere.
    ///
    /// Returns `None` when `scope` names an unknown folder, otherwise the
    /// number of removed folders plus phrases (subtrees included).
    pub(crate) fn remove_temporary(&mut self, scope: Option<FolderId>) -> Option<usize> {
        match scope {
            None => Some(prune_temporary(&mut self.folders)),
            Some(id) => {
                let folder = self.folder_mut(id)?;
                let before = folder.items.len();
                folder.items.retain(|phrase| !phrase.temporary);
                let removed_items = before - folder.items.len();
                Some(removed_items + prune_temporary(&mut folder.folders))
            }
        }
    }
}

fn collect_folders<'a>(folders: &'a [Folder], out: &mut Vec<&'a Folder>) {
    for folder in folders {
        out.push(folder);
        collect_folders(&folder.folders, out);
    }
}

fn find_folder(folders: &[Folder], id: FolderId) -> Option<&Folder> {
    for folder in folders {
        if folder.id == id {
            return Some(folder);
        }
        if let Some(found) = find_folder(&folder.folders, id) {
            return Some(found);
        }
    }
    None
}

fn find_folder_mut(folders: &mut [Folder], id: FolderId) -> Option<&mut Folder> {
    for folder in folders.iter_mut() {
        if folder.id == id {
            return Some(folder);
        }
        if let Some(found) = find_folder_mut(&mut folder.folders, id) {
            return Some(found);
        }
    }
    None
}

fn find_phrase_mut(folders: &mut [Folder], id: PhraseId) -> Option<&mut Phrase> {
    for folder in folders.iter_mut() {
        if let Some(phrase) = folder.items.iter_mut().find(|phrase| phrase.id == id) {
            return Some(phrase);
        }
        if let Some(found) = find_phrase_mut(&mut folder.folders, id) {
            return Some(found);
        }
    }
    None
}

fn subtree_size(folder: &Folder) -> usize {
    1 + folder.items.len() + folder.folders.iter().map(subtree_size).sum::<usize>()
}

fn prune_temporary(folders: &mut Vec<Folder>) -> usize {
    let mut removed = 0;
    folders.retain(|folder| {
        if folder.temporary {
            removed += subtree_size(folder);
            false
        } else {
            true
        }
    });
    for folder in folders.iter_mut() {
        let before = folder.items.len();
        folder.items.retain(|phrase| !phrase.temporary);
        removed += before - folder.items.len();
        removed += prune_temporary(&mut folder.folders);
    }
    removed
}
