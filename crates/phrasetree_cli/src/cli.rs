use clap::{ArgGroup, Parser, Subcommand};
use phrasetree_core::SendMode;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(
    version = env!("CARGO_PKG_VERSION"),
    about = "phrasetree - script the phrase and folder tree"
)]
pub struct Cli {
    /// SQLite item store to open or create
    #[arg(long, env = "PHRASETREE_DB", default_value = "phrasetree.db")]
    pub db: PathBuf,

    /// Directory for rolling log files; logging stays off when unset
    #[arg(long, env = "PHRASETREE_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// trace, debug, info, warn or error; only valid together with --log-dir
    #[arg(long, env = "PHRASETREE_LOG_LEVEL", requires = "log_dir")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a folder
    Folder {
        title: String,

        #[arg(long, help = "Parent folder uuid; omitted for a root folder")]
        parent: Option<Uuid>,

        #[arg(long, help = "Keep the folder in memory only")]
        temporary: bool,
    },
    /// Create a phrase inside a folder
    Phrase {
        folder: Uuid,
        title: String,
        content: String,

        #[arg(long = "abbr", help = "Abbreviation; repeat for several")]
        abbreviations: Vec<String>,

        #[arg(long, help = "Hotkey combo such as <ctrl>+<alt>+a")]
        hotkey: Option<String>,

        #[arg(long, help = "Always prompt before expanding")]
        prompt: bool,

        #[arg(long, help = "Show in the tray menu")]
        tray: bool,

        #[arg(long, default_value_t = SendMode::Keyboard, value_parser = parse_send_mode)]
        send_mode: SendMode,

        #[arg(long, help = "Take the hotkey away from its current owner")]
        replace_hotkey: bool,
    },
    /// Print the whole tree as JSON
    Tree,
    /// Look up the phrase owning a binding
    #[command(group(ArgGroup::new("binding").required(true).args(["abbr", "hotkey"])))]
    Find {
        #[arg(long)]
        abbr: Option<String>,

        #[arg(long)]
        hotkey: Option<String>,
    },
}

impl Commands {
    /// Subcommand name used in log events.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Folder { .. } => "folder",
            Self::Phrase { .. } => "phrase",
            Self::Tree => "tree",
            Self::Find { .. } => "find",
        }
    }
}

fn parse_send_mode(value: &str) -> Result<SendMode, String> {
    value.parse::<SendMode>().map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::{Cli, Commands};
    use clap::Parser;
    use phrasetree_core::SendMode;

    #[test]
    fn log_level_without_log_dir_is_rejected() {
        let result = Cli::try_parse_from(["phrasetree", "--log-level", "debug", "tree"]);
        assert!(result.is_err());
    }

    #[test]
    fn log_level_with_log_dir_is_accepted() {
        let cli = Cli::try_parse_from([
            "phrasetree",
            "--log-dir",
            "/tmp/phrasetree-logs",
            "--log-level",
            "debug",
            "tree",
        ])
        .unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.command.name(), "tree");
    }

    #[test]
    fn phrase_arguments_map_to_fields() {
        let folder = uuid::Uuid::new_v4().to_string();
        let cli = Cli::try_parse_from([
            "phrasetree",
            "phrase",
            folder.as_str(),
            "Sig",
            "Regards",
            "--abbr",
            "sig",
            "--abbr",
            "rg",
            "--hotkey",
            "<ctrl>+s",
            "--send-mode",
            "cb_ctrl_v",
        ])
        .unwrap();
        match cli.command {
            Commands::Phrase {
                abbreviations,
                hotkey,
                send_mode,
                ..
            } => {
                assert_eq!(abbreviations, vec!["sig", "rg"]);
                assert_eq!(hotkey.as_deref(), Some("<ctrl>+s"));
                assert_eq!(send_mode, SendMode::ClipboardCtrlV);
            }
            _ => panic!("expected phrase command"),
        }
    }

    #[test]
    fn find_requires_a_binding() {
        assert!(Cli::try_parse_from(["phrasetree", "find"]).is_err());
        let cli = Cli::try_parse_from(["phrasetree", "find", "--abbr", "sig"]).unwrap();
        assert_eq!(cli.command.name(), "find");
    }
}
