//! Command-line interface - argument parsing and dispatch into the core.
//!
//! Each command runs one core operation. Writes go through the configured [`RetryPolicy`] so a
//! transient conflict is retried instead of surfacing straight away.

/// Account subcommands
pub mod account;
/// Entry subcommands
pub mod entry;

use crate::{core::retry::RetryPolicy, errors::Result};
use clap::{Parser, Subcommand};
use sea_orm::DatabaseConnection;
use std::path::PathBuf;

pub use account::AccountCommand;
pub use entry::EntryCommand;

/// Per-account balance ledger.
#[derive(Parser, Debug)]
#[command(name = "balance-ledger", version, about = "Per-account balance ledger")]
pub struct Cli {
    /// Path to a TOML settings file (defaults to ./ledger.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// What to do
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level command groups.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create, inspect and maintain accounts
    #[command(subcommand)]
    Account(AccountCommand),
    /// Record, amend, remove and list ledger entries
    #[command(subcommand)]
    Entry(EntryCommand),
}

/// Executes a parsed command and returns the text to print.
pub async fn run(db: &DatabaseConnection, policy: RetryPolicy, command: Command) -> Result<String> {
    match command {
        Command::Account(command) => account::handle(db, policy, command).await,
        Command::Entry(command) => entry::handle(db, policy, command).await,
    }
}
