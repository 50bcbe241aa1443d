//! Delete command - remove a reconciliation and its movements

use anyhow::Result;
use colored::Colorize;
use conciliador_core::{events, LogEvent};
use dialoguer::Confirm;

use super::{get_context, get_logger, log_event, with_spinner};
use crate::output;

pub fn run(reconciliation_id: i64, force: bool, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let logger = get_logger();

    if !force {
        if json {
            anyhow::bail!("Refusing to delete without --force in JSON mode");
        }
        println!(
            "\n{}",
            format!(
                "This will permanently delete reconciliation #{} with all its movements and matches.",
                reconciliation_id
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

    let result = with_spinner("Deleting reconciliation...", json, || {
        ctx.reconciliation_service.delete(reconciliation_id)
    });
    let result = match result {
        Ok(result) => result,
        Err(e) => {
            log_event(
                &logger,
                LogEvent::new(events::COMMAND_FAILED)
                    .with_command("delete")
                    .with_reconciliation(reconciliation_id)
                    .with_error(format!("{:#}", e)),
            );
            return Err(e);
        }
    };
    log_event(
        &logger,
        LogEvent::new(events::RECONCILIATION_DELETED)
            .with_command("delete")
            .with_reconciliation(reconciliation_id),
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        output::success(&format!("✓ {}", result.message));
    }

    Ok(())
}
