#![allow(dead_code)]

use phrasetree_core::{
    ConfigManager, Engine, Folder, FolderId, ItemRepoError, ItemRepoResult, ItemStore, Phrase,
    PhraseId,
};
use std::cell::{Cell, RefCell};

/// Store double that records every persistence call.
#[derive(Default)]
pub struct RecordingStore {
    pub folders: RefCell<Vec<FolderId>>,
    pub phrases: RefCell<Vec<Phrase>>,
    pub fail_phrases: Cell<bool>,
}

impl RecordingStore {
    pub fn phrase_ids(&self) -> Vec<PhraseId> {
        self.phrases.borrow().iter().map(|phrase| phrase.id).collect()
    }

    pub fn call_count(&self) -> usize {
        self.folders.borrow().len() + self.phrases.borrow().len()
    }
}

impl ItemStore for RecordingStore {
    fn persist_folder(&self, folder: &Folder) -> ItemRepoResult<()> {
        self.folders.borrow_mut().push(folder.id);
        Ok(())
    }

    fn persist_phrase(&self, phrase: &Phrase) -> ItemRepoResult<()> {
        if self.fail_phrases.get() {
            return Err(ItemRepoError::InvalidData("disk full".to_string()));
        }
        self.phrases.borrow_mut().push(phrase.clone());
        Ok(())
    }

    fn load_folders(&self) -> ItemRepoResult<Vec<Folder>> {
        Ok(Vec::new())
    }
}

/// Engine over an empty tree plus one persisted root folder.
pub fn create_engine() -> (Engine<RecordingStore>, FolderId) {
    let mut engine = Engine::new(ConfigManager::new(), RecordingStore::default());
    let folder = engine.create_folder("Test folder", None, false).unwrap();
    (engine, folder.id)
}

pub fn folder_items(engine: &Engine<RecordingStore>, folder: FolderId) -> Vec<Phrase> {
    engine
        .config_manager()
        .folder(folder)
        .unwrap()
        .items
        .clone()
}
