//! Conciliador CLI - manual bank reconciliation in your terminal

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use conciliador_core::services::is_unauthorized;

mod commands;
mod output;
mod view;

use commands::{
    auth, config, delete, finish, logs, match_cmd, matches, process, reconcile, show, unmatch,
};

/// Conciliador - pair bank and ledger movements of a reconciliation
#[derive(Parser)]
#[command(name = "conciliador", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a reconciliation with its pending movements
    Show {
        /// Reconciliation ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Pick bank and ledger movements interactively and reconcile them
    Reconcile {
        /// Reconciliation ID
        id: i64,
    },

    /// Reconcile the given movements without prompting
    Match {
        /// Reconciliation ID
        id: i64,
        /// Bank movement IDs
        #[arg(long, value_delimiter = ',', required = true)]
        bank: Vec<i64>,
        /// Ledger movement IDs
        #[arg(long, value_delimiter = ',', required = true)]
        ledger: Vec<i64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run automatic matching on the server
    Process {
        /// Reconciliation ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Mark a reconciliation as finished
    Finish {
        /// Reconciliation ID
        id: i64,
        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a reconciliation
    Delete {
        /// Reconciliation ID
        id: i64,
        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List automatic matches and manual reconciliations
    Matches {
        /// Reconciliation ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Undo an automatic match
    Unmatch {
        /// Match ID
        match_id: i64,
        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage the API token
    Auth {
        #[command(subcommand)]
        command: auth::AuthCommands,
    },

    /// View and manage the event log
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },

    /// View and change settings
    Config {
        #[command(subcommand)]
        command: config::ConfigCommands,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Show { .. } => "show",
            Commands::Reconcile { .. } => "reconcile",
            Commands::Match { .. } => "match",
            Commands::Process { .. } => "process",
            Commands::Finish { .. } => "finish",
            Commands::Delete { .. } => "delete",
            Commands::Matches { .. } => "matches",
            Commands::Unmatch { .. } => "unmatch",
            Commands::Auth { .. } => "auth",
            Commands::Logs { .. } => "logs",
            Commands::Config { .. } => "config",
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let logger = commands::get_logger();
    if let Some(l) = &logger {
        let _ = l.log_command(cli.command.name());
    }
    drop(logger);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if is_unauthorized(&e) {
                eprintln!(
                    "{}",
                    "Your session has expired. Run 'conciliador auth set-token' to log in again."
                        .red()
                );
            } else {
                eprintln!("{}", format!("{:#}", e).red());
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Show { id, json } => show::run(id, json),
        Commands::Reconcile { id } => reconcile::run(id),
        Commands::Match {
            id,
            bank,
            ledger,
            json,
        } => match_cmd::run(id, bank, ledger, json),
        Commands::Process { id, json } => process::run(id, json),
        Commands::Finish { id, force, json } => finish::run(id, force, json),
        Commands::Delete { id, force, json } => delete::run(id, force, json),
        Commands::Matches { id, json } => matches::run(id, json),
        Commands::Unmatch {
            match_id,
            force,
            json,
        } => unmatch::run(match_id, force, json),
        Commands::Auth { command } => auth::run(command),
        Commands::Logs { command } => logs::run(command),
        Commands::Config { command } => config::run(command),
    }
}
