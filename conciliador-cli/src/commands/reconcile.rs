//! Reconcile command - interactive manual reconciliation
//!
//! Bank movements are picked first, then ledger movements of the same
//! type, then the pairing is confirmed and submitted. After a successful
//! submission the detail is reloaded and the user may pair more movements.

use std::sync::Arc;

use anyhow::{bail, Result};
use colored::Colorize;
use conciliador_core::domain::{ManualReconciliationRequest, SelectionRegistry};
use conciliador_core::{
    events, ActionOutcome, Error, LogEvent, LoggingService, Origin, ReconciliationSessionController,
    SessionAction,
};
use dialoguer::{Confirm, MultiSelect};
use rust_decimal::Decimal;

use super::{get_context, get_logger, log_event};
use crate::output;
use crate::view::TerminalView;

/// Record the outcome of a controller action in the event log
pub fn log_outcome(
    logger: &Option<LoggingService>,
    command: &str,
    reconciliation_id: i64,
    outcome: &ActionOutcome,
) {
    let event = match outcome {
        ActionOutcome::BankConfirmed(_) => LogEvent::new(events::BANK_SELECTION_CONFIRMED),
        ActionOutcome::LedgerConfirmed(_) => LogEvent::new(events::LEDGER_SELECTION_CONFIRMED),
        ActionOutcome::Submitted { .. } => LogEvent::new(events::MANUAL_RECONCILIATION_SUBMITTED),
        ActionOutcome::Rejected(msg) => LogEvent::new(events::SELECTION_REJECTED).with_error(msg),
        ActionOutcome::SubmitFailed(msg) => {
            LogEvent::new(events::MANUAL_RECONCILIATION_FAILED).with_error(msg)
        }
        ActionOutcome::SessionExpired => LogEvent::new(events::SESSION_EXPIRED),
    };
    log_event(
        logger,
        event
            .with_command(command)
            .with_reconciliation(reconciliation_id),
    );
}

/// Let the user pick movements of `origin`; the registry is updated in place
fn pick(
    controller: &mut ReconciliationSessionController,
    origin: Origin,
    prompt: &str,
) -> Result<Vec<i64>> {
    let registry = controller.session().registry();
    let ids: Vec<i64> = registry.rendered(origin).to_vec();
    let labels: Vec<String> = ids
        .iter()
        .filter_map(|id| registry.movement(origin, *id))
        .map(output::movement_label)
        .collect();
    let defaults: Vec<bool> = ids
        .iter()
        .map(|id| registry.is_selected(origin, *id))
        .collect();

    let chosen = MultiSelect::new()
        .with_prompt(prompt)
        .items(&labels)
        .defaults(&defaults)
        .interact()?;

    controller.select_all(origin, false);
    let picked: Vec<i64> = chosen.into_iter().map(|i| ids[i]).collect();
    for id in &picked {
        controller.toggle(origin, *id, true);
    }
    Ok(picked)
}

fn total(registry: &SelectionRegistry, origin: Origin, ids: &[i64]) -> Decimal {
    ids.iter()
        .filter_map(|id| registry.movement(origin, *id))
        .map(|m| m.valor)
        .sum()
}

fn print_summary(registry: &SelectionRegistry, request: &ManualReconciliationRequest) {
    let bank = total(registry, Origin::Banco, &request.id_banco);
    let ledger = total(registry, Origin::Auxiliar, &request.id_auxiliar);

    println!();
    println!("{}", "Manual reconciliation".bold());
    println!(
        "  Bank:   {} movement(s), {}",
        request.id_banco.len(),
        output::format_amount(bank)
    );
    println!(
        "  Ledger: {} movement(s), {}",
        request.id_auxiliar.len(),
        output::format_amount(ledger)
    );
    let difference = bank - ledger;
    let difference = output::format_amount(difference);
    if bank == ledger {
        println!("  Difference: {}", difference.green());
    } else {
        println!("  Difference: {}", difference.yellow());
    }
    println!();
}

pub fn run(reconciliation_id: i64) -> Result<()> {
    if atty::isnt(atty::Stream::Stdin) || atty::isnt(atty::Stream::Stdout) {
        bail!("'reconcile' is interactive; use 'conciliador match --bank .. --ledger ..' in scripts");
    }

    let ctx = get_context()?;
    let logger = get_logger();
    let view = Arc::new(TerminalView::new(false));
    let mut controller = ctx.session_controller(reconciliation_id, view.clone());

    loop {
        let pb = output::spinner("Loading reconciliation...");
        let loaded = controller.load().map(|_| ());
        pb.finish_and_clear();
        if let Err(e) = loaded {
            log_event(
                &logger,
                LogEvent::new(events::DETAIL_LOAD_FAILED)
                    .with_command("reconcile")
                    .with_reconciliation(reconciliation_id)
                    .with_error(e.user_message()),
            );
            return Err(e.into());
        }
        // The controller already rendered the header
        let _ = view.take_reload_request();

        if let Some(detail) = controller.detail() {
            if detail.conciliacion.is_finished() {
                output::warning("This reconciliation is finished; nothing to pair.");
                return Ok(());
            }
            let pending = &detail.movimientos_no_conciliados;
            if pending.banco.is_empty() || pending.auxiliar.is_empty() {
                output::info("No pending movements left to pair on one of the sides.");
                return Ok(());
            }
        }

        // Bank side
        loop {
            let picked = pick(&mut controller, Origin::Banco, "Bank movements (space to select)")?;
            if picked.is_empty() {
                println!("{}", "Cancelled".dimmed());
                return Ok(());
            }
            let outcome = controller.handle(SessionAction::ConfirmBank);
            log_outcome(&logger, "reconcile", reconciliation_id, &outcome);
            if let ActionOutcome::BankConfirmed(direction) = outcome {
                println!("Bank movements confirmed (type {}).", direction);
                break;
            }
        }

        // Ledger side
        let request = loop {
            let picked = pick(
                &mut controller,
                Origin::Auxiliar,
                "Ledger movements of the same type (space to select)",
            )?;
            if picked.is_empty() {
                println!("{}", "Cancelled".dimmed());
                return Ok(());
            }
            let outcome = controller.handle(SessionAction::ConfirmLedger);
            log_outcome(&logger, "reconcile", reconciliation_id, &outcome);
            if let ActionOutcome::LedgerConfirmed(request) = outcome {
                break request;
            }
        };

        print_summary(controller.session().registry(), &request);

        // Submit, with retry on failure
        loop {
            if !Confirm::new()
                .with_prompt("Submit this manual reconciliation?")
                .default(true)
                .interact()?
            {
                println!("{}", "Cancelled".dimmed());
                return Ok(());
            }

            let outcome = controller.handle(SessionAction::ConfirmReconciliation);
            log_outcome(&logger, "reconcile", reconciliation_id, &outcome);
            match outcome {
                ActionOutcome::Submitted { message, .. } => {
                    output::success(&format!("✓ {}", message));
                    break;
                }
                ActionOutcome::SessionExpired => return Err(Error::Unauthorized.into()),
                // The view already alerted the reason; the selection is kept
                _ => println!("{}", "The selection is kept; you can submit again.".dimmed()),
            }
        }

        if !view.take_reload_request() {
            return Ok(());
        }
        if !Confirm::new()
            .with_prompt("Pair more movements?")
            .default(true)
            .interact()?
        {
            return Ok(());
        }
        println!();
    }
}
