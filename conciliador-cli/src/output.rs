//! Output formatting utilities

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, CellAlignment, ContentArrangement, Table};
use conciliador_core::domain::{Movement, ReconciliationDetail};
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::Decimal;

/// Print a success message
pub fn success(msg: &str) {
    println!("{}", msg.green());
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

/// Print a warning message
pub fn warning(msg: &str) {
    println!("{}", msg.yellow());
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{}", msg.cyan());
}

/// Create a styled table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Format bytes as human-readable size
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Amount with two decimals and thousands separators
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let text = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::new();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{}{}.{}", sign, grouped, frac_part)
}

/// One movement as a short single-line label (used by pickers)
pub fn movement_label(movement: &Movement) -> String {
    format!(
        "#{:<6} {}  {:>14}  {:<10}  {}",
        movement.id,
        movement.es,
        format_amount(movement.valor),
        movement.fecha.as_deref().unwrap_or("-"),
        movement.description()
    )
}

/// Table of movements with an optional selection marker column
pub fn movements_table<'a>(
    movements: impl IntoIterator<Item = &'a Movement>,
    is_selected: impl Fn(i64) -> bool,
) -> Table {
    let mut table = create_table();
    table.set_header(vec!["", "ID", "Date", "Description", "E/S", "Amount"]);
    for movement in movements {
        table.add_row(vec![
            Cell::new(if is_selected(movement.id) { "✓" } else { "" }),
            Cell::new(movement.id),
            Cell::new(movement.fecha.as_deref().unwrap_or("-")),
            Cell::new(movement.description()),
            Cell::new(movement.es.code()),
            Cell::new(format_amount(movement.valor)).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

/// Header block and progress counters of a reconciliation
pub fn print_detail_header(detail: &ReconciliationDetail) {
    let rec = &detail.conciliacion;
    println!(
        "{} {}",
        format!("Reconciliation #{}", rec.id).bold(),
        format!("({})", rec.period()).dimmed()
    );
    if let Some(account) = &rec.cuenta_conciliada {
        println!("  Account: {}", account);
    }
    let estado = rec.estado.as_deref().unwrap_or("-");
    let estado = if rec.is_finished() {
        estado.green()
    } else {
        estado.yellow()
    };
    println!("  Status: {}", estado);
    println!(
        "  Progress: {}/{} reconciled ({}%), {} pending",
        detail.stats.conciliados,
        detail.stats.total_movimientos,
        detail.stats.porcentaje_conciliacion.round_dp(1),
        detail.stats.pendientes
    );
}

/// Spinner shown while a request is in flight
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
