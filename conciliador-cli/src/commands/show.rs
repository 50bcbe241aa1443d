//! Show command - reconciliation header and pending movements

use anyhow::Result;
use colored::Colorize;
use conciliador_core::{events, LogEvent, Origin};

use super::{get_context, get_logger, log_event, with_spinner};
use crate::output;

pub fn run(reconciliation_id: i64, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let logger = get_logger();

    let detail = match with_spinner("Loading reconciliation...", json, || {
        ctx.reconciliation_service.detail(reconciliation_id)
    }) {
        Ok(detail) => detail,
        Err(e) => {
            log_event(
                &logger,
                LogEvent::new(events::DETAIL_LOAD_FAILED)
                    .with_command("show")
                    .with_reconciliation(reconciliation_id)
                    .with_error(format!("{:#}", e)),
            );
            return Err(e);
        }
    };
    log_event(
        &logger,
        LogEvent::new(events::DETAIL_LOADED)
            .with_command("show")
            .with_reconciliation(reconciliation_id),
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&detail)?);
        return Ok(());
    }

    output::print_detail_header(&detail);
    println!();

    for origin in [Origin::Banco, Origin::Auxiliar] {
        let movements = detail.movimientos_no_conciliados.for_origin(origin);
        println!(
            "{} ({})",
            format!("Pending {} movements", origin.label()).bold(),
            movements.len()
        );
        if movements.is_empty() {
            println!("  {}", "None".dimmed());
        } else {
            println!("{}", output::movements_table(movements, |_| false));
        }
        println!();
    }

    if !detail.movimientos_conciliados.is_empty() {
        println!(
            "{} ({})",
            "Reconciled pairs".bold(),
            detail.movimientos_conciliados.len()
        );
        let mut table = output::create_table();
        table.set_header(vec!["Match", "Bank", "Ledger", "Criterion", "Difference", "Date"]);
        for record in &detail.movimientos_conciliados {
            table.add_row(vec![
                record.id.to_string(),
                record.id_movimiento_banco.to_string(),
                record.id_movimiento_auxiliar.to_string(),
                record.criterio_match.as_str().to_string(),
                output::format_amount(record.diferencia_valor),
                record.fecha_match.clone().unwrap_or_default(),
            ]);
        }
        println!("{}", table);
    }

    Ok(())
}
