//! Folder and phrase entities.
//!
//! # Responsibility
//! - Define the owned folder tree and the phrases stored in it.
//! - Keep parent relations as plain ids so ownership stays one-directional.
//!
//! # Invariants
//! - `Folder::folders` and `Folder::items` are ordered by insertion.
//! - `Phrase::parent` names the folder whose `items` contains the phrase.

use crate::model::argument::{Abbreviations, ArgumentError};
use crate::model::hotkey::Hotkey;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Stable folder identifier.
pub type FolderId = Uuid;

/// Stable phrase identifier.
pub type PhraseId = Uuid;

/// How expanded text is injected into the focused application.
///
/// Stored only; the sending back end interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendMode {
    #[serde(rename = "kb")]
    Keyboard,
    #[serde(rename = "cb_ctrl_v")]
    ClipboardCtrlV,
    #[serde(rename = "cb_ctrl_shift_v")]
    ClipboardCtrlShiftV,
    #[serde(rename = "cb_shift_insert")]
    ClipboardShiftInsert,
    Selection,
}

impl SendMode {
    pub const ALL: [SendMode; 5] = [
        SendMode::Keyboard,
        SendMode::ClipboardCtrlV,
        SendMode::ClipboardCtrlShiftV,
        SendMode::ClipboardShiftInsert,
        SendMode::Selection,
    ];

    /// Stable storage code.
    pub fn code(self) -> &'static str {
        match self {
            Self::Keyboard => "kb",
            Self::ClipboardCtrlV => "cb_ctrl_v",
            Self::ClipboardCtrlShiftV => "cb_ctrl_shift_v",
            Self::ClipboardShiftInsert => "cb_shift_insert",
            Self::Selection => "selection",
        }
    }
}

impl Default for SendMode {
    fn default() -> Self {
        Self::Keyboard
    }
}

impl Display for SendMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for SendMode {
    type Err = ArgumentError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.code() == value)
            .ok_or_else(|| ArgumentError::new(format!("unknown send mode `{value}`")))
    }
}

/// Folder node of the configuration tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Folder {
    pub id: FolderId,
    pub title: String,
    /// Containing folder. `None` means root folder.
    pub parent: Option<FolderId>,
    pub folders: Vec<Folder>,
    pub items: Vec<Phrase>,
    /// Temporary folders are never persisted.
    pub temporary: bool,
}

impl Folder {
    /// Creates an empty folder with a generated id.
    pub fn new(title: impl Into<String>, parent: Option<FolderId>) -> Self {
        Self::with_id(Uuid::new_v4(), title, parent)
    }

    /// Creates an empty folder with a caller-provided id.
    ///
    /// Used by the load path where identity already exists in storage.
    pub fn with_id(id: FolderId, title: impl Into<String>, parent: Option<FolderId>) -> Self {
        Self {
            id,
            title: title.into(),
            parent,
            folders: Vec::new(),
            items: Vec::new(),
            temporary: false,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Text-expansion item and the only trigger-bearing entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Phrase {
    pub id: PhraseId,
    /// Folder whose `items` owns this phrase.
    pub parent: FolderId,
    pub title: String,
    pub content: String,
    pub abbreviations: Abbreviations,
    pub hotkey: Option<Hotkey>,
    /// Always ask for confirmation before expanding.
    pub prompt: bool,
    pub show_in_tray_menu: bool,
    pub send_mode: SendMode,
    pub temporary: bool,
}

impl Phrase {
    /// Creates a phrase without bindings and with default flags.
    pub fn new(parent: FolderId, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), parent, title, content)
    }

    pub fn with_id(
        id: PhraseId,
        parent: FolderId,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id,
            parent,
            title: title.into(),
            content: content.into(),
            abbreviations: Abbreviations::default(),
            hotkey: None,
            prompt: false,
            show_in_tray_menu: false,
            send_mode: SendMode::default(),
            temporary: false,
        }
    }

    /// Whether the phrase claims any binding at all.
    pub fn has_bindings(&self) -> bool {
        !self.abbreviations.is_empty() || self.hotkey.is_some()
    }
}
