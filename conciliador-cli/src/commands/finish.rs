//! Finish command - mark a reconciliation as finished

use anyhow::Result;
use colored::Colorize;
use conciliador_core::{events, LogEvent};
use dialoguer::Confirm;

use super::{get_context, get_logger, log_event, with_spinner};
use crate::output;

pub fn run(reconciliation_id: i64, force: bool, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let logger = get_logger();

    if !force && !json {
        println!(
            "\n{}",
            format!(
                "Reconciliation #{} will be marked as finished.",
                reconciliation_id
            )
            .yellow()
        );
        if !Confirm::new()
            .with_prompt("Continue?")
            .default(false)
            .interact()?
        {
            println!("{}\n", "Cancelled".dimmed());
            return Ok(());
        }
    }

    let result = with_spinner("Finishing reconciliation...", json, || {
        ctx.reconciliation_service.finish(reconciliation_id)
    });
    let result = match result {
        Ok(result) => result,
        Err(e) => {
            log_event(
                &logger,
                LogEvent::new(events::COMMAND_FAILED)
                    .with_command("finish")
                    .with_reconciliation(reconciliation_id)
                    .with_error(format!("{:#}", e)),
            );
            return Err(e);
        }
    };
    log_event(
        &logger,
        LogEvent::new(events::RECONCILIATION_FINISHED)
            .with_command("finish")
            .with_reconciliation(reconciliation_id),
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        output::success(&format!("✓ {}", result.message));
    }

    Ok(())
}
