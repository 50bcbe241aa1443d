//! Config commands - view and change settings.json

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use conciliador_core::config::{Config, API_URL_ENV};

use super::get_data_dir;
use crate::output;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change a setting (api.baseUrl, api.timeoutSeconds, auth.tokenTtlMinutes)
    Set { key: String, value: String },
}

pub fn run(command: ConfigCommands) -> Result<()> {
    let data_dir = get_data_dir()?;

    match command {
        ConfigCommands::Show { json } => {
            let config = Config::load(&data_dir)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
                return Ok(());
            }

            let mut table = output::create_table();
            table.add_row(vec!["api.baseUrl".to_string(), config.base_url.clone()]);
            table.add_row(vec![
                "api.timeoutSeconds".to_string(),
                config.timeout_seconds.to_string(),
            ]);
            table.add_row(vec![
                "auth.tokenTtlMinutes".to_string(),
                config.token_ttl_minutes.to_string(),
            ]);
            println!("{}", table);
            println!(
                "{}",
                format!("Settings file: {}", data_dir.join("settings.json").display()).dimmed()
            );
            if std::env::var(API_URL_ENV).is_ok() {
                println!("{}", format!("api.baseUrl overridden by {}", API_URL_ENV).dimmed());
            }
        }
        ConfigCommands::Set { key, value } => {
            // Start from the file alone so an env override is not persisted
            let mut config = Config::load_with_override(&data_dir, None)?;
            config.set(&key, &value)?;
            config.save(&data_dir)?;
            output::success(&format!("✓ {} = {}", key, value.trim()));
        }
    }

    Ok(())
}
