//! Configuration tree domain model.
//!
//! # Responsibility
//! - Define folders, phrases and their trigger bindings.
//! - Normalize loosely typed scripting arguments into fixed internal types.
//!
//! # Invariants
//! - Every folder and phrase is identified by a stable v4 UUID.
//! - A phrase is owned by exactly one folder; parent links are ids, never owners.
//! - Binding values (`Abbreviations`, `Hotkey`) are only built through
//!   validating constructors.

pub mod argument;
pub mod hotkey;
pub mod item;

pub use argument::{Abbreviations, ArgumentError, ScriptValue};
pub use hotkey::{Hotkey, HotkeyArg, Modifier};
pub use item::{Folder, FolderId, Phrase, PhraseId, SendMode};
