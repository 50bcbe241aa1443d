//! Auth commands - manage the stored bearer token

use std::io::BufRead;

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use conciliador_core::adapters::auth::{jwt_expiry, token_fingerprint, TokenStore};
use conciliador_core::config::Config;
use dialoguer::Password;

use super::get_data_dir;
use crate::output;

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Store the bearer token used for API requests
    SetToken {
        /// Token (read from stdin or prompted when omitted)
        token: Option<String>,
        /// Token lifetime in minutes (defaults to auth.tokenTtlMinutes)
        #[arg(long)]
        ttl_minutes: Option<i64>,
    },
    /// Show whether a valid token is stored
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Forget the stored token
    Logout,
}

fn read_token(token: Option<String>) -> Result<String> {
    if let Some(t) = token {
        return Ok(t);
    }
    if atty::isnt(atty::Stream::Stdin) {
        let mut line = String::new();
        std::io::stdin()
            .lock()
            .read_line(&mut line)
            .context("Failed to read token from stdin")?;
        return Ok(line.trim().to_string());
    }
    let t = Password::new().with_prompt("API token").interact()?;
    Ok(t)
}

pub fn run(command: AuthCommands) -> Result<()> {
    let data_dir = get_data_dir()?;
    let store = TokenStore::new(&data_dir);

    match command {
        AuthCommands::SetToken { token, ttl_minutes } => {
            let config = Config::load(&data_dir)?;
            let ttl = ttl_minutes.unwrap_or(config.token_ttl_minutes);
            let token = read_token(token)?;
            store.set(&token, ttl)?;
            output::success(&format!("✓ Token stored (valid for {} minutes)", ttl));
        }
        AuthCommands::Status { json } => {
            let token = store.get()?;
            let expires_at = store.expires_at()?;

            if json {
                println!(
                    "{}",
                    serde_json::json!({
                        "authenticated": token.is_some(),
                        "fingerprint": token.as_deref().map(token_fingerprint),
                        "expires_at": expires_at,
                        "jwt_expires_at": token.as_deref().and_then(jwt_expiry),
                        "token_file": store.path().to_string_lossy(),
                    })
                );
                return Ok(());
            }

            match token {
                Some(token) => {
                    println!("{}", "Authenticated".green().bold());
                    println!("  Fingerprint: {}", token_fingerprint(&token));
                    if let Some(expires) = expires_at {
                        println!("  Stored until: {}", expires.format("%Y-%m-%d %H:%M:%S UTC"));
                    }
                    if let Some(exp) = jwt_expiry(&token) {
                        println!("  Token expires: {}", exp.format("%Y-%m-%d %H:%M:%S UTC"));
                    }
                }
                None => {
                    if expires_at.is_some() {
                        output::warning("The stored token has expired.");
                    } else {
                        output::warning("Not authenticated.");
                    }
                    println!(
                        "{}",
                        "Run 'conciliador auth set-token' to log in.".dimmed()
                    );
                }
            }
        }
        AuthCommands::Logout => {
            store.remove()?;
            output::success("✓ Logged out");
        }
    }

    Ok(())
}
