//! Item store contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist folders and phrases with upsert semantics.
//! - Rebuild the owned folder tree from storage.
//!
//! # Invariants
//! - Sibling order is stable: `sort_order ASC, uuid ASC`.
//! - A new row is appended after its existing siblings; updates keep order.
//! - A phrase's abbreviation rows are replaced atomically with the phrase row.
//! - Loading fails when any folder or phrase row cannot be reached from a root.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::{Abbreviations, Folder, FolderId, Hotkey, Modifier, Phrase, PhraseId, SendMode};
use log::{error, info};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Result type used by item store operations.
pub type ItemRepoResult<T> = Result<T, ItemRepoError>;

/// Errors from item store operations.
#[derive(Debug)]
pub enum ItemRepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Hotkey modifier list could not be encoded or decoded.
    Serialization(serde_json::Error),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Persisted data cannot be converted to a valid model.
    InvalidData(String),
}

impl Display for ItemRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Serialization(err) => write!(f, "hotkey encoding failed: {err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "item store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "item store requires table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid item data: {message}"),
        }
    }
}

impl Error for ItemRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::UninitializedConnection { .. } => None,
            Self::MissingRequiredTable(_) => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for ItemRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for ItemRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for ItemRepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Persistence capability for configuration items.
pub trait ItemStore {
    /// Inserts or updates one folder row. Children are not written.
    fn persist_folder(&self, folder: &Folder) -> ItemRepoResult<()>;
    /// Inserts or updates one phrase row with its abbreviations.
    fn persist_phrase(&self, phrase: &Phrase) -> ItemRepoResult<()>;
    /// Loads every stored root folder with its full subtree.
    fn load_folders(&self) -> ItemRepoResult<Vec<Folder>>;
}

/// SQLite-backed item store.
pub struct SqliteItemStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteItemStore<'conn> {
    /// Creates a store from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> ItemRepoResult<Self> {
        ensure_item_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ItemStore for SqliteItemStore<'_> {
    fn persist_folder(&self, folder: &Folder) -> ItemRepoResult<()> {
        let result = self.conn.execute(
            "INSERT INTO folders (folder_uuid, parent_uuid, title, sort_order)
             VALUES (
                ?1,
                ?2,
                ?3,
                (SELECT COALESCE(MAX(sort_order), -1) + 1 FROM folders WHERE parent_uuid IS ?2)
             )
             ON CONFLICT (folder_uuid) DO UPDATE SET
                parent_uuid = excluded.parent_uuid,
                title = excluded.title,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![
                folder.id.to_string(),
                folder.parent.map(|value| value.to_string()),
                folder.title,
            ],
        );
        match result {
            Ok(_) => {
                info!(
                    "event=store_persist module=repo status=ok kind=folder folder_uuid={}",
                    folder.id
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=store_persist module=repo status=error kind=folder folder_uuid={} error={err}",
                    folder.id
                );
                Err(err.into())
            }
        }
    }

    fn persist_phrase(&self, phrase: &Phrase) -> ItemRepoResult<()> {
        match write_phrase(self.conn, phrase) {
            Ok(()) => {
                info!(
                    "event=store_persist module=repo status=ok kind=phrase phrase_uuid={} abbreviations={} has_hotkey={}",
                    phrase.id,
                    phrase.abbreviations.len(),
                    phrase.hotkey.is_some()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=store_persist module=repo status=error kind=phrase phrase_uuid={} error={err}",
                    phrase.id
                );
                Err(err)
            }
        }
    }

    fn load_folders(&self) -> ItemRepoResult<Vec<Folder>> {
        let mut children = load_folder_rows(self.conn)?;
        let mut abbreviations = load_abbreviation_rows(self.conn)?;
        let mut phrases = load_phrase_rows(self.conn, &mut abbreviations)?;
        let roots = assemble_level(None, &mut children, &mut phrases);
        ensure_all_rows_attached(&children, &phrases)?;
        Ok(roots)
    }
}

fn write_phrase(conn: &Connection, phrase: &Phrase) -> ItemRepoResult<()> {
    let (hotkey_modifiers, hotkey_key) = match phrase.hotkey.as_ref() {
        Some(hotkey) => (
            Some(serde_json::to_string(hotkey.modifiers())?),
            Some(hotkey.key().to_string()),
        ),
        None => (None, None),
    };

    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    tx.execute(
        "INSERT INTO phrases (
            phrase_uuid,
            folder_uuid,
            title,
            content,
            hotkey_modifiers,
            hotkey_key,
            prompt,
            show_in_tray_menu,
            send_mode,
            sort_order
         ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9,
            (SELECT COALESCE(MAX(sort_order), -1) + 1 FROM phrases WHERE folder_uuid = ?2)
         )
         ON CONFLICT (phrase_uuid) DO UPDATE SET
            folder_uuid = excluded.folder_uuid,
            title = excluded.title,
            content = excluded.content,
            hotkey_modifiers = excluded.hotkey_modifiers,
            hotkey_key = excluded.hotkey_key,
            prompt = excluded.prompt,
            show_in_tray_menu = excluded.show_in_tray_menu,
            send_mode = excluded.send_mode,
            updated_at = (strftime('%s', 'now') * 1000);",
        params![
            phrase.id.to_string(),
            phrase.parent.to_string(),
            phrase.title,
            phrase.content,
            hotkey_modifiers,
            hotkey_key,
            phrase.prompt,
            phrase.show_in_tray_menu,
            phrase.send_mode.code(),
        ],
    )?;
    tx.execute(
        "DELETE FROM phrase_abbreviations WHERE phrase_uuid = ?1;",
        [phrase.id.to_string()],
    )?;
    for abbreviation in phrase.abbreviations.iter() {
        tx.execute(
            "INSERT INTO phrase_abbreviations (phrase_uuid, abbreviation) VALUES (?1, ?2);",
            params![phrase.id.to_string(), abbreviation],
        )?;
    }
    tx.commit()?;
    Ok(())
}

fn load_folder_rows(conn: &Connection) -> ItemRepoResult<HashMap<Option<FolderId>, Vec<Folder>>> {
    let mut stmt = conn.prepare(
        "SELECT folder_uuid, parent_uuid, title
         FROM folders
         ORDER BY sort_order ASC, folder_uuid ASC;",
    )?;
    let mut rows = stmt.query([])?;
    let mut children: HashMap<Option<FolderId>, Vec<Folder>> = HashMap::new();
    while let Some(row) = rows.next()? {
        let id = parse_uuid(&row.get::<_, String>("folder_uuid")?, "folders.folder_uuid")?;
        let parent = row
            .get::<_, Option<String>>("parent_uuid")?
            .map(|value| parse_uuid(&value, "folders.parent_uuid"))
            .transpose()?;
        let title: String = row.get("title")?;
        children
            .entry(parent)
            .or_default()
            .push(Folder::with_id(id, title, parent));
    }
    Ok(children)
}

fn load_abbreviation_rows(conn: &Connection) -> ItemRepoResult<HashMap<PhraseId, Vec<String>>> {
    let mut stmt = conn.prepare(
        "SELECT phrase_uuid, abbreviation
         FROM phrase_abbreviations
         ORDER BY phrase_uuid ASC, abbreviation ASC;",
    )?;
    let mut rows = stmt.query([])?;
    let mut abbreviations: HashMap<PhraseId, Vec<String>> = HashMap::new();
    while let Some(row) = rows.next()? {
        let id = parse_uuid(
            &row.get::<_, String>("phrase_uuid")?,
            "phrase_abbreviations.phrase_uuid",
        )?;
        abbreviations
            .entry(id)
            .or_default()
            .push(row.get("abbreviation")?);
    }
    Ok(abbreviations)
}

fn load_phrase_rows(
    conn: &Connection,
    abbreviations: &mut HashMap<PhraseId, Vec<String>>,
) -> ItemRepoResult<HashMap<FolderId, Vec<Phrase>>> {
    let mut stmt = conn.prepare(
        "SELECT
            phrase_uuid,
            folder_uuid,
            title,
            content,
            hotkey_modifiers,
            hotkey_key,
            prompt,
            show_in_tray_menu,
            send_mode
         FROM phrases
         ORDER BY sort_order ASC, phrase_uuid ASC;",
    )?;
    let mut rows = stmt.query([])?;
    let mut phrases: HashMap<FolderId, Vec<Phrase>> = HashMap::new();
    while let Some(row) = rows.next()? {
        let mut phrase = parse_phrase_row(row)?;
        if let Some(values) = abbreviations.remove(&phrase.id) {
            phrase.abbreviations = Abbreviations::from_strings(values).map_err(|err| {
                ItemRepoError::InvalidData(format!(
                    "phrase {} abbreviations: {}",
                    phrase.id,
                    err.message()
                ))
            })?;
        }
        phrases.entry(phrase.parent).or_default().push(phrase);
    }
    Ok(phrases)
}

fn parse_phrase_row(row: &Row<'_>) -> ItemRepoResult<Phrase> {
    let id = parse_uuid(&row.get::<_, String>("phrase_uuid")?, "phrases.phrase_uuid")?;
    let parent = parse_uuid(&row.get::<_, String>("folder_uuid")?, "phrases.folder_uuid")?;
    let mut phrase = Phrase::with_id(
        id,
        parent,
        row.get::<_, String>("title")?,
        row.get::<_, String>("content")?,
    );

    let modifiers: Option<String> = row.get("hotkey_modifiers")?;
    let key: Option<String> = row.get("hotkey_key")?;
    phrase.hotkey = match (modifiers, key) {
        (Some(modifiers), Some(key)) => {
            let modifiers: Vec<Modifier> = serde_json::from_str(&modifiers)?;
            let hotkey = Hotkey::new(modifiers, key).map_err(|err| {
                ItemRepoError::InvalidData(format!("phrase {id} hotkey: {}", err.message()))
            })?;
            Some(hotkey)
        }
        (None, None) => None,
        _ => {
            return Err(ItemRepoError::InvalidData(format!(
                "phrase {id} has a partial hotkey"
            )));
        }
    };

    phrase.prompt = parse_flag(row, "prompt")?;
    phrase.show_in_tray_menu = parse_flag(row, "show_in_tray_menu")?;
    let send_mode: String = row.get("send_mode")?;
    phrase.send_mode = send_mode.parse::<SendMode>().map_err(|_| {
        ItemRepoError::InvalidData(format!(
            "invalid send mode `{send_mode}` in phrases.send_mode"
        ))
    })?;
    Ok(phrase)
}

fn assemble_level(
    parent: Option<FolderId>,
    children: &mut HashMap<Option<FolderId>, Vec<Folder>>,
    phrases: &mut HashMap<FolderId, Vec<Phrase>>,
) -> Vec<Folder> {
    let mut level = children.remove(&parent).unwrap_or_default();
    for folder in &mut level {
        folder.items = phrases.remove(&folder.id).unwrap_or_default();
        folder.folders = assemble_level(Some(folder.id), children, phrases);
    }
    level
}

/// Rows left over after assembly sit under a parent cycle or a self-parented
/// folder and would be invisible to the uniqueness index.
fn ensure_all_rows_attached(
    children: &HashMap<Option<FolderId>, Vec<Folder>>,
    phrases: &HashMap<FolderId, Vec<Phrase>>,
) -> ItemRepoResult<()> {
    if let Some(folder) = children.values().flatten().next() {
        error!(
            "event=store_load module=repo status=error folder_uuid={} error_code=unreachable_folder",
            folder.id
        );
        return Err(ItemRepoError::InvalidData(format!(
            "folder {} is not reachable from any root folder",
            folder.id
        )));
    }
    if let Some(phrase) = phrases.values().flatten().next() {
        error!(
            "event=store_load module=repo status=error phrase_uuid={} error_code=unreachable_phrase",
            phrase.id
        );
        return Err(ItemRepoError::InvalidData(format!(
            "phrase {} belongs to unreachable folder {}",
            phrase.id, phrase.parent
        )));
    }
    Ok(())
}

fn parse_flag(row: &Row<'_>, column: &'static str) -> ItemRepoResult<bool> {
    match row.get::<_, i64>(column)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(ItemRepoError::InvalidData(format!(
            "invalid flag value `{other}` in phrases.{column}"
        ))),
    }
}

fn parse_uuid(value: &str, column: &'static str) -> ItemRepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| ItemRepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

fn ensure_item_connection_ready(conn: &Connection) -> ItemRepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(ItemRepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in ["folders", "phrases", "phrase_abbreviations"] {
        if !table_exists(conn, table)? {
            return Err(ItemRepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> ItemRepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
