use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use crate::app::App;
use crate::config::{ConfigLoader, PathOverrides};
use crate::storage;
use crate::store::NoteStore;

pub mod commands;

use self::commands::{DeleteArgs, EditArgs, ListArgs, NewArgs};

const LOG_FILE: &str = "notedown.log";

#[derive(Parser, Debug)]
#[command(
    name = "notedown",
    version,
    about = "Keyboard-first two-pane notes with a local store"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the config file location (takes precedence over NOTEDOWN_CONFIG)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the data directory (takes precedence over NOTEDOWN_DATA)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Minimum log level (trace, debug, info, warn, error) or an EnvFilter directive
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the interactive two-pane view (default)
    Tui,
    /// Create a note
    New(NewArgs),
    /// Print notes, numbered, optionally filtered
    List(ListArgs),
    /// Change the title and/or description of a note
    Edit(EditArgs),
    /// Permanently delete a note
    Delete(DeleteArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let loader = ConfigLoader::discover(PathOverrides {
        config: cli.config.clone(),
        data_dir: cli.data_dir.clone(),
    })?;
    loader.paths().ensure_directories()?;

    let command = cli.command.unwrap_or(Commands::Tui);
    // The terminal view owns the screen, so its logs go to a file.
    let log_target = match command {
        Commands::Tui => LogTarget::File(loader.paths().log_dir.join(LOG_FILE)),
        _ => LogTarget::Stderr,
    };
    init_tracing(&cli.log_level, &log_target)
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;

    let config = loader.load_or_init()?;
    let backend = storage::init(&config.storage)?;
    let mut store = NoteStore::open(backend)?;

    match command {
        Commands::Tui => App::new(&config, store).run(),
        Commands::New(args) => emit(commands::new_note(&mut store, args)),
        Commands::List(args) => emit(commands::list_notes(&store, args, config.list_order)),
        Commands::Edit(args) => emit(commands::edit_note(&mut store, args)),
        Commands::Delete(args) => emit(commands::delete_note(&mut store, args)),
    }
}

fn emit(output: Result<String>) -> Result<()> {
    print!("{}", output?);
    Ok(())
}

enum LogTarget {
    Stderr,
    File(PathBuf),
}

fn init_tracing(level: &str, target: &LogTarget) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| -> Result<()> {
        let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
        let builder = fmt().with_env_filter(env_filter);
        let installed = match target {
            LogTarget::Stderr => builder.with_writer(std::io::stderr).try_init(),
            LogTarget::File(path) => {
                let file = open_log_file(path)?;
                builder
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .try_init()
            }
        };
        installed.map_err(|err| anyhow!("installing tracing subscriber: {err}"))
    })
    .map(|_| ())
}

fn open_log_file(path: &Path) -> Result<std::fs::File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_means_tui() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from(["notedown"])?;
        assert!(cli.command.is_none());
        assert_eq!(cli.log_level, "info");
        Ok(())
    }

    #[test]
    fn global_flags_follow_subcommands() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from([
            "notedown",
            "list",
            "cat",
            "--data-dir",
            "/tmp/notes",
            "--log-level",
            "debug",
        ])?;
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/notes")));
        assert_eq!(cli.log_level, "debug");
        assert!(matches!(cli.command, Some(Commands::List(ref args)) if args.filter.as_deref() == Some("cat")));
        Ok(())
    }
}
