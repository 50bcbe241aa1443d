//! Match command - non-interactive manual reconciliation

use std::sync::Arc;

use anyhow::{bail, Result};
use conciliador_core::{ActionOutcome, Error, Origin, SessionAction};

use super::get_context;
use super::reconcile::log_outcome;
use crate::output;
use crate::view::TerminalView;

pub fn run(reconciliation_id: i64, bank: Vec<i64>, ledger: Vec<i64>, json: bool) -> Result<()> {
    if bank.is_empty() || ledger.is_empty() {
        bail!("Select at least one bank movement and one ledger movement.");
    }

    let ctx = get_context()?;
    let logger = super::get_logger();
    let view = Arc::new(TerminalView::new(json));
    let mut controller = ctx.session_controller(reconciliation_id, view);

    controller.load()?;

    for id in &bank {
        controller.toggle(Origin::Banco, *id, true);
    }
    for id in &ledger {
        controller.toggle(Origin::Auxiliar, *id, true);
    }

    for action in [
        SessionAction::ConfirmBank,
        SessionAction::ConfirmLedger,
        SessionAction::ConfirmReconciliation,
    ] {
        let outcome = controller.handle(action);
        log_outcome(&logger, "match", reconciliation_id, &outcome);

        match outcome {
            ActionOutcome::Submitted { request, message } => {
                if json {
                    println!(
                        "{}",
                        serde_json::json!({
                            "reconciliation_id": reconciliation_id,
                            "id_banco": request.id_banco,
                            "id_auxiliar": request.id_auxiliar,
                            "message": message,
                        })
                    );
                } else {
                    output::success(&format!("✓ {}", message));
                }
                return Ok(());
            }
            ActionOutcome::Rejected(msg) | ActionOutcome::SubmitFailed(msg) => {
                if json {
                    println!("{}", serde_json::json!({ "error": msg }));
                }
                std::process::exit(1);
            }
            ActionOutcome::SessionExpired => return Err(Error::Unauthorized.into()),
            ActionOutcome::BankConfirmed(_) | ActionOutcome::LedgerConfirmed(_) => {}
        }
    }

    Ok(())
}
