//! Command-line access to a sticky store.
//!
//! Reads and edits the slots a file-backed store keeps on disk, and drives
//! the counter reducer against a slot for quick manual checks.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use sticky::{Backend, FileStorage, Hydration, Storage, StickyReducer, StorageConfig, codec};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid configuration: {0}")]
    Config(#[from] sticky::ConfigError),
    #[error("storage error: {0}")]
    Storage(#[from] sticky::StorageError),
    #[error("invalid JSON: {0}")]
    Codec(#[from] sticky::CodecError),
    #[error("render failed: {0}")]
    Render(#[from] serde_json::Error),
    #[error("no value stored at {0:?}")]
    NotFound(String),
    #[error("`list` requires the file backend")]
    ListUnsupported,
}

#[derive(Parser, Debug)]
#[command(name = "sticky", about = "Inspect and edit sticky state slots")]
struct Cli {
    /// Store directory. Overrides STICKY_DIR and forces the file backend.
    #[arg(long)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the decoded value at a key.
    Get { key: String },
    /// Store a JSON value at a key.
    Set { key: String, json: String },
    /// Clear a key.
    Remove { key: String },
    /// List stored keys.
    List,
    /// Apply a counter action to the integer at a key.
    Dispatch { key: String, action: CounterAction },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CounterAction {
    Inc,
    Dec,
    Reset,
}

fn counter(state: &i64, action: CounterAction) -> i64 {
    match action {
        CounterAction::Inc => state.saturating_add(1),
        CounterAction::Dec => state.saturating_sub(1),
        CounterAction::Reset => 0,
    }
}

fn main() -> Result<(), CliError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let mut config = StorageConfig::from_env()?;
    if let Some(dir) = cli.dir {
        config.backend = Backend::File;
        config.dir = dir;
    }
    tracing::debug!(backend = ?config.backend, dir = %config.dir.display(), "store configured");

    match cli.command {
        Command::Get { key } => run_get(&config, &key),
        Command::Set { key, json } => run_set(&config, &key, &json),
        Command::Remove { key } => {
            config.open()?.remove(&key)?;
            Ok(())
        }
        Command::List => run_list(&config),
        Command::Dispatch { key, action } => run_dispatch(&config, key, action),
    }
}

fn run_get(config: &StorageConfig, key: &str) -> Result<(), CliError> {
    let raw = config.open()?.get(key)?.ok_or_else(|| CliError::NotFound(key.to_owned()))?;
    let value: Value = codec::decode(&raw)?;
    print_json(&value)
}

fn run_set(config: &StorageConfig, key: &str, json: &str) -> Result<(), CliError> {
    let value: Value = codec::decode(json)?;
    config.open()?.set(key, &codec::encode(&value)?)?;
    Ok(())
}

fn run_list(config: &StorageConfig) -> Result<(), CliError> {
    if config.backend != Backend::File {
        return Err(CliError::ListUnsupported);
    }
    for key in FileStorage::open(&config.dir)?.keys()? {
        println!("{key}");
    }
    Ok(())
}

fn run_dispatch(config: &StorageConfig, key: String, action: CounterAction) -> Result<(), CliError> {
    let mut counter_cell = StickyReducer::open(counter, Some(config.open()?), key, 0);
    if counter_cell.hydration() == Hydration::Recovered {
        tracing::warn!(key = counter_cell.cell().key(), "slot was unreadable; counter restarted from 0");
    }
    counter_cell.dispatch(action);
    println!("{}", counter_cell.get());
    Ok(())
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
