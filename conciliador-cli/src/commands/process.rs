//! Process command - run the server's automatic matching

use anyhow::Result;
use conciliador_core::{events, LogEvent};

use super::{get_context, get_logger, log_event, with_spinner};
use crate::output;

pub fn run(reconciliation_id: i64, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let logger = get_logger();

    let result = with_spinner("Running automatic matching...", json, || {
        ctx.reconciliation_service.process(reconciliation_id)
    });
    let result = match result {
        Ok(result) => result,
        Err(e) => {
            log_event(
                &logger,
                LogEvent::new(events::COMMAND_FAILED)
                    .with_command("process")
                    .with_reconciliation(reconciliation_id)
                    .with_error(format!("{:#}", e)),
            );
            return Err(e);
        }
    };
    log_event(
        &logger,
        LogEvent::new(events::RECONCILIATION_PROCESSED)
            .with_command("process")
            .with_reconciliation(reconciliation_id),
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        output::success(&format!("✓ {}", result.message));
        println!("Run 'conciliador matches {}' to review the automatic matches.", reconciliation_id);
    }

    Ok(())
}
