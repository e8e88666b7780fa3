//! Command-line driver over the phrasetree engine.
//!
//! # Responsibility
//! - Map subcommands onto engine operations against a SQLite item store.
//! - Print results as JSON; errors go to stderr with a non-zero exit code.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use log::{error, info};
use phrasetree_core::db::open_db;
use phrasetree_core::{
    init_logging, CreatePhraseRequest, Engine, HotkeyArg, LogSettings, ScriptValue,
    SqliteItemStore,
};
use serde_json::json;
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Some(log_dir) = cli.log_dir.as_deref() {
        start_logging(log_dir, cli.log_level.as_deref())?;
    }

    let command = cli.command.name();
    info!("event=cli_run module=cli status=start command={command}");
    match run(cli) {
        Ok(()) => {
            info!("event=cli_run module=cli status=ok command={command}");
            Ok(())
        }
        Err(err) => {
            error!("event=cli_run module=cli status=error command={command} error={err}");
            Err(err)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let conn = open_db(&cli.db)
        .with_context(|| format!("failed to open item store `{}`", cli.db.display()))?;
    let mut engine = Engine::load(SqliteItemStore::try_new(&conn)?)?;

    let output = match cli.command {
        Commands::Folder {
            title,
            parent,
            temporary,
        } => serde_json::to_value(engine.create_folder(title, parent, temporary)?)?,
        Commands::Phrase {
            folder,
            title,
            content,
            abbreviations,
            hotkey,
            prompt,
            tray,
            send_mode,
            replace_hotkey,
        } => {
            let request = CreatePhraseRequest {
                abbreviations: if abbreviations.is_empty() {
                    ScriptValue::Null
                } else {
                    abbreviations.into()
                },
                hotkey: hotkey.as_deref().map(HotkeyArg::parse_combo).transpose()?,
                always_prompt: prompt,
                show_in_system_tray: tray,
                send_mode,
                replace_existing_hotkey: replace_hotkey,
                ..CreatePhraseRequest::new(title, content)
            };
            serde_json::to_value(engine.create_phrase(folder, request)?)?
        }
        Commands::Tree => serde_json::to_value(engine.config_manager().folders())?,
        Commands::Find { abbr, hotkey } => {
            let found = match (abbr, hotkey) {
                (Some(abbreviation), _) => engine.find_phrase_by_abbreviation(&abbreviation),
                (None, Some(combo)) => {
                    engine.find_phrase_by_hotkey(&HotkeyArg::parse_combo(&combo)?)?
                }
                (None, None) => None,
            };
            json!({ "phrase": found })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn start_logging(log_dir: &Path, level: Option<&str>) -> Result<()> {
    let log_dir = if log_dir.is_absolute() {
        log_dir.to_path_buf()
    } else {
        std::env::current_dir()?.join(log_dir)
    };
    let settings = match level {
        Some(level) => LogSettings::new(level, log_dir)?,
        None => LogSettings::with_default_level(log_dir)?,
    };
    init_logging(&settings)?;
    Ok(())
}
