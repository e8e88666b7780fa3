use phrasetree_core::db::{open_db, open_db_in_memory};
use phrasetree_core::{
    find_by_abbreviation, find_by_hotkey, ConfigManager, CreatePhraseRequest, Engine, Hotkey,
    HotkeyArg, ItemRepoError, ItemStore, Modifier, SendMode, SqliteItemStore,
};

fn setup() -> rusqlite::Connection {
    open_db_in_memory().unwrap()
}

#[test]
fn created_items_survive_reload() {
    let conn = setup();
    let mut engine = Engine::load(SqliteItemStore::try_new(&conn).unwrap()).unwrap();
    let root = engine.create_folder("Root", None, false).unwrap();
    let nested = engine.create_folder("Nested", Some(root.id), false).unwrap();
    let phrase = engine
        .create_phrase(
            nested.id,
            CreatePhraseRequest {
                abbreviations: vec!["sig", "Sig"].into(),
                hotkey: Some(HotkeyArg::new(["<ctrl>", "<alt>"], "s")),
                always_prompt: true,
                show_in_system_tray: true,
                send_mode: SendMode::ClipboardShiftInsert,
                ..CreatePhraseRequest::new("Signature", "Regards,\nMe")
            },
        )
        .unwrap();

    let reloaded = Engine::load(SqliteItemStore::try_new(&conn).unwrap()).unwrap();

    let folders: Vec<_> = reloaded
        .config_manager()
        .all_folders()
        .into_iter()
        .map(|folder| (folder.id, folder.parent))
        .collect();
    assert_eq!(folders, vec![(root.id, None), (nested.id, Some(root.id))]);
    assert_eq!(reloaded.config_manager().phrase(phrase.id), Some(&phrase));
    assert_eq!(
        reloaded
            .find_phrase_by_hotkey(&HotkeyArg::new(["<alt>", "<ctrl>"], "s"))
            .unwrap()
            .map(|found| found.id),
        Some(phrase.id)
    );
}

#[test]
fn reload_keeps_creation_order() {
    let conn = setup();
    let mut engine = Engine::load(SqliteItemStore::try_new(&conn).unwrap()).unwrap();
    let root = engine.create_folder("Root", None, false).unwrap();
    for title in ["zeta", "alpha", "mu"] {
        engine
            .create_phrase(root.id, CreatePhraseRequest::new(title, "body"))
            .unwrap();
    }
    engine.create_folder("Second", None, false).unwrap();

    let reloaded = ConfigManager::load(&SqliteItemStore::try_new(&conn).unwrap()).unwrap();

    let roots: Vec<_> = reloaded
        .folders()
        .iter()
        .map(|folder| folder.title.as_str())
        .collect();
    assert_eq!(roots, vec!["Root", "Second"]);
    let titles: Vec<_> = reloaded
        .all_items()
        .into_iter()
        .map(|phrase| phrase.title.as_str())
        .collect();
    assert_eq!(titles, vec!["zeta", "alpha", "mu"]);
}

#[test]
fn temporary_items_are_not_reloaded() {
    let conn = setup();
    let mut engine = Engine::load(SqliteItemStore::try_new(&conn).unwrap()).unwrap();
    let root = engine.create_folder("Root", None, false).unwrap();
    engine.create_folder("Scratch", None, true).unwrap();
    engine
        .create_phrase(
            root.id,
            CreatePhraseRequest {
                temporary: true,
                ..CreatePhraseRequest::new("Temp", "t")
            },
        )
        .unwrap();

    let reloaded = ConfigManager::load(&SqliteItemStore::try_new(&conn).unwrap()).unwrap();
    assert_eq!(reloaded.all_folders().len(), 1);
    assert!(reloaded.all_items().is_empty());
}

#[test]
fn persisting_phrase_again_updates_in_place() {
    let conn = setup();
    let store = SqliteItemStore::try_new(&conn).unwrap();
    let mut engine = Engine::new(ConfigManager::new(), store);
    let root = engine.create_folder("Root", None, false).unwrap();
    let mut phrase = engine
        .create_phrase(
            root.id,
            CreatePhraseRequest {
                abbreviations: "old".into(),
                hotkey: Some(HotkeyArg::new(["<ctrl>"], "o")),
                ..CreatePhraseRequest::new("Phrase", "before")
            },
        )
        .unwrap();
    engine
        .create_phrase(root.id, CreatePhraseRequest::new("After", "after"))
        .unwrap();

    phrase.content = "after edit".to_string();
    phrase.hotkey = None;
    phrase.abbreviations = phrasetree_core::Abbreviations::from_strings(["new"]).unwrap();
    engine.store().persist_phrase(&phrase).unwrap();

    let reloaded = ConfigManager::load(engine.store()).unwrap();
    let items = reloaded.all_items();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0], &phrase);
    assert_eq!(items[1].title, "After");
}

#[test]
fn hotkey_reassignment_is_persisted_for_previous_owner() {
    let conn = setup();
    let mut engine = Engine::load(SqliteItemStore::try_new(&conn).unwrap()).unwrap();
    let root = engine.create_folder("Root", None, false).unwrap();
    let old = engine
        .create_phrase(
            root.id,
            CreatePhraseRequest {
                hotkey: Some(HotkeyArg::new(["<super>"], "<f5>")),
                ..CreatePhraseRequest::new("Old", "o")
            },
        )
        .unwrap();
    engine
        .create_phrase(
            root.id,
            CreatePhraseRequest {
                hotkey: Some(HotkeyArg::new(["<super>"], "<f5>")),
                replace_existing_hotkey: true,
                ..CreatePhraseRequest::new("New", "n")
            },
        )
        .unwrap();

    let reloaded = ConfigManager::load(&SqliteItemStore::try_new(&conn).unwrap()).unwrap();
    assert!(reloaded.phrase(old.id).unwrap().hotkey.is_none());
}

#[test]
fn file_backed_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("phrasetree.db");

    let phrase_id = {
        let conn = open_db(&path).unwrap();
        let mut engine = Engine::load(SqliteItemStore::try_new(&conn).unwrap()).unwrap();
        let root = engine.create_folder("Root", None, false).unwrap();
        let phrase = engine
            .create_phrase(
                root.id,
                CreatePhraseRequest {
                    abbreviations: "addr".into(),
                    ..CreatePhraseRequest::new("Address", "1 Main St")
                },
            )
            .unwrap();
        phrase.id
    };

    let conn = open_db(&path).unwrap();
    let engine = Engine::load(SqliteItemStore::try_new(&conn).unwrap()).unwrap();
    assert_eq!(
        engine.find_phrase_by_abbreviation("addr").map(|p| p.id),
        Some(phrase_id)
    );
}

#[test]
fn try_new_rejects_unmigrated_connection() {
    let conn = rusqlite::Connection::open_in_memory().unwrap();

    let err = match SqliteItemStore::try_new(&conn) {
        Ok(_) => panic!("expected unmigrated connection to be rejected"),
        Err(err) => err,
    };

    assert!(matches!(
        err,
        ItemRepoError::UninitializedConnection {
            actual_version: 0,
            ..
        }
    ));
}

#[test]
fn try_new_rejects_missing_table() {
    let conn = setup();
    conn.execute_batch("DROP TABLE phrase_abbreviations;").unwrap();

    assert!(matches!(
        SqliteItemStore::try_new(&conn),
        Err(ItemRepoError::MissingRequiredTable("phrase_abbreviations"))
    ));
}

#[test]
fn corrupt_send_mode_is_reported_as_invalid_data() {
    let conn = setup();
    let mut engine = Engine::load(SqliteItemStore::try_new(&conn).unwrap()).unwrap();
    let root = engine.create_folder("Root", None, false).unwrap();
    engine
        .create_phrase(root.id, CreatePhraseRequest::new("Phrase", "body"))
        .unwrap();
    conn.execute("UPDATE phrases SET send_mode = 'telepathy';", [])
        .unwrap();

    let err = ConfigManager::load(&SqliteItemStore::try_new(&conn).unwrap()).unwrap_err();
    assert!(matches!(err, ItemRepoError::InvalidData(_)));
}

const ROOT_UUID: &str = "00000000-0000-4000-8000-000000000001";
const LOOP_UUID: &str = "11111111-1111-4111-8111-111111111111";
const FIRST_UUID: &str = "22222222-2222-4222-8222-222222222222";
const SECOND_UUID: &str = "33333333-3333-4333-8333-333333333333";

fn insert_phrase_row(
    conn: &rusqlite::Connection,
    phrase: &str,
    folder: &str,
    title: &str,
    order: i64,
) {
    conn.execute(
        "INSERT INTO phrases (
            phrase_uuid, folder_uuid, title, content, hotkey_modifiers, hotkey_key, sort_order
         ) VALUES (?1, ?2, ?3, 'body', '[\"<ctrl>\"]', 'd', ?4);",
        rusqlite::params![phrase, folder, title, order],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO phrase_abbreviations (phrase_uuid, abbreviation) VALUES (?1, 'dup');",
        [phrase],
    )
    .unwrap();
}

#[test]
fn self_parented_folder_fails_load() {
    let conn = setup();
    conn.execute(
        "INSERT INTO folders (folder_uuid, parent_uuid, title) VALUES (?1, ?1, 'Loop');",
        [LOOP_UUID],
    )
    .unwrap();
    insert_phrase_row(&conn, FIRST_UUID, LOOP_UUID, "Hidden", 0);

    let err = match Engine::load(SqliteItemStore::try_new(&conn).unwrap()) {
        Ok(_) => panic!("expected unreachable folder to be rejected"),
        Err(err) => err,
    };

    assert!(err.to_string().contains(LOOP_UUID), "unexpected error: {err}");
    assert!(matches!(
        ConfigManager::load(&SqliteItemStore::try_new(&conn).unwrap()),
        Err(ItemRepoError::InvalidData(_))
    ));
}

#[test]
fn folder_cycle_fails_load() {
    let conn = setup();
    conn.execute_batch(&format!(
        "PRAGMA foreign_keys = OFF;
         INSERT INTO folders (folder_uuid, parent_uuid, title) VALUES ('{LOOP_UUID}', '{ROOT_UUID}', 'A');
         INSERT INTO folders (folder_uuid, parent_uuid, title) VALUES ('{ROOT_UUID}', '{LOOP_UUID}', 'B');
         PRAGMA foreign_keys = ON;"
    ))
    .unwrap();

    let result = ConfigManager::load(&SqliteItemStore::try_new(&conn).unwrap());
    assert!(matches!(result, Err(ItemRepoError::InvalidData(_))));
}

#[test]
fn stored_duplicate_bindings_load_with_first_owner_winning() {
    let conn = setup();
    conn.execute(
        "INSERT INTO folders (folder_uuid, title) VALUES (?1, 'Root');",
        [ROOT_UUID],
    )
    .unwrap();
    insert_phrase_row(&conn, FIRST_UUID, ROOT_UUID, "First", 0);
    insert_phrase_row(&conn, SECOND_UUID, ROOT_UUID, "Second", 1);

    let manager = ConfigManager::load(&SqliteItemStore::try_new(&conn).unwrap()).unwrap();

    let titles: Vec<_> = manager
        .all_items()
        .into_iter()
        .map(|phrase| phrase.title.as_str())
        .collect();
    assert_eq!(titles, vec!["First", "Second"]);
    assert_eq!(
        find_by_abbreviation(&manager, "dup").map(|phrase| phrase.title.as_str()),
        Some("First")
    );
    let hotkey = Hotkey::new([Modifier::Control], "d").unwrap();
    assert_eq!(
        find_by_hotkey(&manager, &hotkey).map(|phrase| phrase.title.as_str()),
        Some("First")
    );
}
