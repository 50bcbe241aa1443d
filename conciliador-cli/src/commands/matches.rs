//! Matches command - automatic matches and manual groups

use anyhow::Result;
use colored::Colorize;
use conciliador_core::domain::Movement;

use super::{get_context, with_spinner};
use crate::output;

fn side(movement: Option<&Movement>) -> (String, String, String) {
    match movement {
        Some(m) => (
            m.fecha.clone().unwrap_or_default(),
            m.description().to_string(),
            output::format_amount(m.valor),
        ),
        None => ("-".to_string(), "-".to_string(), "-".to_string()),
    }
}

pub fn run(reconciliation_id: i64, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let overview = with_spinner("Loading matches...", json, || {
        ctx.reconciliation_service.matches(reconciliation_id)
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&overview)?);
        return Ok(());
    }

    println!(
        "{} ({})",
        "Automatic matches".bold(),
        overview.matches.len()
    );
    if overview.matches.is_empty() {
        println!("  {}", "None".dimmed());
    } else {
        let mut table = output::create_table();
        table.set_header(vec![
            "Match",
            "Bank date",
            "Bank description",
            "Bank amount",
            "Ledger date",
            "Ledger description",
            "Ledger amount",
            "Difference",
            "Criterion",
        ]);
        for m in &overview.matches {
            let (bank_date, bank_desc, bank_amount) = side(m.movimiento_banco.as_ref());
            let (ledger_date, ledger_desc, ledger_amount) = side(m.movimiento_auxiliar.as_ref());
            table.add_row(vec![
                m.id.to_string(),
                bank_date,
                bank_desc,
                bank_amount,
                ledger_date,
                ledger_desc,
                ledger_amount,
                output::format_amount(m.diferencia),
                m.criterio_match.as_str().to_string(),
            ]);
        }
        println!("{}", table);
    }
    println!();

    println!(
        "{} ({})",
        "Manual reconciliations".bold(),
        overview.conciliaciones_manuales.len()
    );
    if overview.conciliaciones_manuales.is_empty() {
        println!("  {}", "None".dimmed());
    }
    for group in &overview.conciliaciones_manuales {
        println!(
            "\n  {} {}",
            format!("#{}", group.id_conciliacion_manual).bold(),
            group.fecha_creacion.as_deref().unwrap_or("").dimmed()
        );
        println!("  Bank");
        println!("{}", output::movements_table(&group.movimientos_banco, |_| false));
        println!("  Ledger");
        println!("{}", output::movements_table(&group.movimientos_auxiliar, |_| false));
        println!("  Difference: {}", output::format_amount(group.difference()));
    }

    if !overview.matches.is_empty() {
        println!();
        println!(
            "{}",
            "Use 'conciliador unmatch <MATCH_ID>' to undo an automatic match.".dimmed()
        );
    }

    Ok(())
}
