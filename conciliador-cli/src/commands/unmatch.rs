//! Unmatch command - undo one automatic match

use anyhow::Result;
use colored::Colorize;
use conciliador_core::{events, LogEvent};
use dialoguer::Confirm;

use super::{get_context, get_logger, log_event, with_spinner};
use crate::output;

pub fn run(match_id: i64, force: bool, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let logger = get_logger();

    if !force && !json {
        println!(
            "\n{}",
            format!(
                "Match #{} will be removed; both movements return to pending.",
                match_id
            )
            .yellow()
        );
        if !Confirm::new()
            .with_prompt("Are you sure?")
            .default(false)
            .interact()?
        {
            println!("{}\n", "Cancelled".dimmed());
            return Ok(());
        }
    }

    let message = with_spinner("Removing match...", json, || {
        ctx.reconciliation_service.remove_match(match_id)
    })?;
    log_event(
        &logger,
        LogEvent::new(events::MATCH_REMOVED).with_command("unmatch"),
    );

    if json {
        println!(
            "{}",
            serde_json::json!({ "match_id": match_id, "message": message })
        );
    } else {
        output::success(&format!("✓ {}", message));
    }

    Ok(())
}
