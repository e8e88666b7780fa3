//! Scripting engine facade over the configuration tree.
//!
//! # Responsibility
//! - Create folders and phrases on behalf of scripting callers.
//! - Enforce global uniqueness of abbreviations and hotkeys.
//! - Notify config listeners and trigger persistence after each mutation.
//!
//! # Invariants
//! - Every check runs before the new item is constructed or linked; a failed
//!   call leaves the tree, the revision counter and the store untouched.
//! - No two phrases in the tree share an abbreviation or a hotkey.
//! - Items created under a temporary folder are temporary and never persisted.
//! - Persistence runs after linking. A persistence failure is returned to the
//!   caller and the linked item stays in the tree.

use crate::config::{ConfigChange, ConfigManager};
use crate::index::binding_index::{find_by_abbreviation, find_by_hotkey, Binding};
use crate::model::{
    Abbreviations, ArgumentError, Folder, FolderId, HotkeyArg, Phrase, PhraseId, ScriptValue,
    SendMode,
};
use crate::repo::item_repo::{ItemRepoError, ItemStore};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type used by engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors from engine operations.
#[derive(Debug)]
pub enum EngineError {
    /// Malformed abbreviation or hotkey argument.
    InvalidArgument(ArgumentError),
    /// Requested binding is already owned by another phrase.
    BindingConflict {
        binding: Binding,
        owner: PhraseId,
        owner_title: String,
    },
    /// Target or parent folder is not part of the tree.
    FolderNotFound(FolderId),
    /// Persistence collaborator failure, passed through unchanged.
    Store(ItemRepoError),
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArgument(err) => write!(f, "{err}"),
            Self::BindingConflict {
                binding,
                owner,
                owner_title,
            } => write!(
                f,
                "{binding} is already bound to phrase \"{owner_title}\" ({owner})"
            ),
            Self::FolderNotFound(id) => write!(f, "folder not found: {id}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for EngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidArgument(err) => Some(err),
            Self::BindingConflict { .. } => None,
            Self::FolderNotFound(_) => None,
            Self::Store(err) => Some(err),
        }
    }
}

impl From<ArgumentError> for EngineError {
    fn from(value: ArgumentError) -> Self {
        Self::InvalidArgument(value)
    }
}

impl From<ItemRepoError> for EngineError {
    fn from(value: ItemRepoError) -> Self {
        Self::Store(value)
    }
}

/// Request model for `Engine::create_phrase`.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatePhraseRequest {
    pub title: String,
    pub content: String,
    /// A single string or a list of strings. `Null` means no abbreviation.
    pub abbreviations: ScriptValue,
    pub hotkey: Option<HotkeyArg>,
    pub always_prompt: bool,
    pub show_in_system_tray: bool,
    pub send_mode: SendMode,
    /// Skip persistence for this phrase.
    pub temporary: bool,
    /// Take the hotkey away from its current owner instead of failing.
    pub replace_existing_hotkey: bool,
}

impl CreatePhraseRequest {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            abbreviations: ScriptValue::Null,
            hotkey: None,
            always_prompt: false,
            show_in_system_tray: false,
            send_mode: SendMode::default(),
            temporary: false,
            replace_existing_hotkey: false,
        }
    }
}

/// Engine facade generic over the persistence collaborator.
pub struct Engine<S: ItemStore> {
    config: ConfigManager,
    store: S,
}

impl<S: ItemStore> Engine<S> {
    /// Creates an engine over an already loaded tree.
    pub fn new(config: ConfigManager, store: S) -> Self {
        Self { config, store }
    }

    /// Loads the tree from `store` and wraps both in an engine.
    pub fn load(store: S) -> EngineResult<Self> {
        let config = ConfigManager::load(&store)?;
        Ok(Self::new(config, store))
    }

    pub fn config_manager(&self) -> &ConfigManager {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Registers a config change listener.
    pub fn subscribe(&mut self, listener: impl FnMut(u64, &ConfigChange) + 'static) {
        self.config.subscribe(listener);
    }

    /// Creates a phrase inside `folder_id`.
    ///
    /// # Contract
    /// - Validates folder, abbreviation shape, hotkey shape, abbreviation
    ///   uniqueness and hotkey uniqueness, in that order.
    /// - On success the phrase is linked at the end of the folder's items,
    ///   `config_altered` fires, and the phrase is persisted unless temporary.
    ///
    /// # Errors
    /// - `FolderNotFound`, `InvalidArgument`, `BindingConflict`: nothing changed.
    /// - `Store`: the phrase is linked but its persistence failed.
    pub fn create_phrase(
        &mut self,
        folder_id: FolderId,
        request: CreatePhraseRequest,
    ) -> EngineResult<Phrase> {
        let CreatePhraseRequest {
            title,
            content,
            abbreviations,
            hotkey,
            always_prompt,
            show_in_system_tray,
            send_mode,
            temporary,
            replace_existing_hotkey,
        } = request;

        let folder_temporary = self
            .config
            .folder(folder_id)
            .ok_or(EngineError::FolderNotFound(folder_id))?
            .temporary;

        let abbreviations = Abbreviations::from_value(abbreviations)
            .map_err(|err| reject_argument("phrase_create", folder_id, err))?;
        let hotkey = hotkey
            .as_ref()
            .map(HotkeyArg::validate)
            .transpose()
            .map_err(|err| reject_argument("phrase_create", folder_id, err))?;

        for abbreviation in abbreviations.iter() {
            if let Some(owner) = find_by_abbreviation(&self.config, abbreviation) {
                return Err(reject_conflict(
                    Binding::Abbreviation(abbreviation.to_string()),
                    owner,
                ));
            }
        }

        let mut displaced = None;
        if let Some(candidate) = hotkey.as_ref() {
            if let Some(owner) = find_by_hotkey(&self.config, candidate) {
                if !replace_existing_hotkey {
                    return Err(reject_conflict(Binding::Hotkey(candidate.clone()), owner));
                }
                displaced = Some(owner.id);
            }
        }

        let mut phrase = Phrase::new(folder_id, title, content);
        phrase.abbreviations = abbreviations;
        phrase.hotkey = hotkey;
        phrase.prompt = always_prompt;
        phrase.show_in_tray_menu = show_in_system_tray;
        phrase.send_mode = send_mode;
        phrase.temporary = temporary || folder_temporary;
        let created = phrase.clone();

        self.config
            .folder_mut(folder_id)
            .ok_or(EngineError::FolderNotFound(folder_id))?
            .items
            .push(phrase);

        let previous_owner = displaced.and_then(|owner_id| {
            let owner = self.config.phrase_mut(owner_id)?;
            owner.hotkey = None;
            Some(owner.clone())
        });

        if let (Some(owner), Some(hotkey)) = (previous_owner.as_ref(), created.hotkey.as_ref()) {
            info!(
                "event=hotkey_reassign module=engine status=ok hotkey={} from_uuid={} to_uuid={}",
                hotkey, owner.id, created.id
            );
            self.config.config_altered(ConfigChange::HotkeyReassigned {
                hotkey: hotkey.clone(),
                from: owner.id,
                to: created.id,
            });
        }
        info!(
            "event=phrase_create module=engine status=ok phrase_uuid={} folder_uuid={} abbreviations={} has_hotkey={} temporary={}",
            created.id,
            folder_id,
            created.abbreviations.len(),
            created.hotkey.is_some(),
            created.temporary
        );
        self.config.config_altered(ConfigChange::PhraseCreated {
            phrase: created.id,
            folder: folder_id,
        });

        if let Some(owner) = previous_owner.as_ref().filter(|owner| !owner.temporary) {
            self.persist_phrase(owner)?;
        }
        if !created.temporary {
            self.persist_phrase(&created)?;
        }
        Ok(created)
    }

    /// Creates an empty folder under `parent`, or as a new root folder.
    ///
    /// # Errors
    /// - `FolderNotFound` when `parent` is not part of the tree.
    /// - `Store` when persisting the linked folder fails.
    pub fn create_folder(
        &mut self,
        title: impl Into<String>,
        parent: Option<FolderId>,
        temporary: bool,
    ) -> EngineResult<Folder> {
        let parent_temporary = match parent {
            Some(parent_id) => {
                self.config
                    .folder(parent_id)
                    .ok_or(EngineError::FolderNotFound(parent_id))?
                    .temporary
            }
            None => false,
        };

        let mut folder = Folder::new(title, parent);
        folder.temporary = temporary || parent_temporary;
        let created = folder.clone();

        match parent {
            Some(parent_id) => self
                .config
                .folder_mut(parent_id)
                .ok_or(EngineError::FolderNotFound(parent_id))?
                .folders
                .push(folder),
            None => self.config.add_root_folder(folder),
        }

        info!(
            "event=folder_create module=engine status=ok folder_uuid={} root={} temporary={}",
            created.id,
            created.is_root(),
            created.temporary
        );
        self.config.config_altered(ConfigChange::FolderCreated {
            folder: created.id,
            parent,
        });

        if !created.temporary {
            if let Err(err) = self.store.persist_folder(&created) {
                error!(
                    "event=folder_create module=engine status=error folder_uuid={} error_code=persist_failed",
                    created.id
                );
                return Err(err.into());
            }
        }
        Ok(created)
    }

    /// Returns the first folder, in tree order, titled exactly `title`.
    pub fn get_folder(&self, title: &str) -> Option<&Folder> {
        self.config
            .all_folders()
            .into_iter()
            .find(|folder| folder.title == title)
    }

    /// Returns the phrase owning `abbreviation`, if any.
    pub fn find_phrase_by_abbreviation(&self, abbreviation: &str) -> Option<&Phrase> {
        find_by_abbreviation(&self.config, abbreviation)
    }

    /// Returns the phrase owning the hotkey described by `hotkey`, if any.
    ///
    /// # Errors
    /// - `InvalidArgument` when the descriptor is malformed.
    pub fn find_phrase_by_hotkey(&self, hotkey: &HotkeyArg) -> EngineResult<Option<&Phrase>> {
        let hotkey = hotkey.validate()?;
        Ok(find_by_hotkey(&self.config, &hotkey))
    }

    /// Removes temporary folders and phrases below `folder`, or everywhere.
    ///
    /// Returns how many folders plus phrases were dropped. Nothing is written
    /// to the store since temporary items were never persisted.
    pub fn remove_all_temporary(&mut self, folder: Option<FolderId>) -> EngineResult<usize> {
        let removed = self
            .config
            .remove_temporary(folder)
            .ok_or_else(|| EngineError::FolderNotFound(folder.unwrap_or_default()))?;
        info!(
            "event=temporary_remove module=engine status=ok scope={} removed={removed}",
            folder.map_or_else(|| "all".to_string(), |id| id.to_string())
        );
        if removed > 0 {
            self.config.config_altered(ConfigChange::TemporaryRemoved {
                scope: folder,
                removed,
            });
        }
        Ok(removed)
    }

    fn persist_phrase(&self, phrase: &Phrase) -> EngineResult<()> {
        self.store.persist_phrase(phrase).map_err(|err| {
            error!(
                "event=phrase_create module=engine status=error phrase_uuid={} error_code=persist_failed",
                phrase.id
            );
            EngineError::Store(err)
        })
    }
}

fn reject_argument(event: &'static str, folder_id: FolderId, err: ArgumentError) -> EngineError {
    warn!(
        "event={event} module=engine status=rejected folder_uuid={folder_id} error_code=invalid_argument error={err}"
    );
    EngineError::InvalidArgument(err)
}

fn reject_conflict(binding: Binding, owner: &Phrase) -> EngineError {
    warn!(
        "event=binding_conflict module=engine status=rejected binding={binding} owner_uuid={}",
        owner.id
    );
    EngineError::BindingConflict {
        binding,
        owner: owner.id,
        owner_title: owner.title.clone(),
    }
}
