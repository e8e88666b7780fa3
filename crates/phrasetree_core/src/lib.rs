//! Core domain logic for phrasetree.
//!
//! A scripting facade over a folder tree of text-expansion phrases. The
//! engine is the single place that enforces trigger uniqueness: no two
//! phrases may share an abbreviation or a hotkey anywhere in the tree.

pub mod config;
pub mod db;
pub mod index;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigChange, ConfigManager};
pub use index::{find_by_abbreviation, find_by_hotkey, Binding, DuplicateBinding};
pub use logging::{default_log_level, init_logging, logging_status, LogSettings, LoggingError};
pub use model::{
    Abbreviations, ArgumentError, Folder, FolderId, Hotkey, HotkeyArg, Modifier, Phrase,
    PhraseId, ScriptValue, SendMode,
};
pub use repo::item_repo::{ItemRepoError, ItemRepoResult, ItemStore, SqliteItemStore};
pub use service::engine::{CreatePhraseRequest, Engine, EngineError, EngineResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
