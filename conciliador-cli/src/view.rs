//! Terminal implementation of the session view port

use std::sync::atomic::{AtomicBool, Ordering};

use colored::Colorize;
use conciliador_core::domain::{Origin, ReconciliationDetail};
use conciliador_core::ports::SessionView;

use crate::output;

/// Prints what the controller reports; silent (except alerts) in JSON mode
pub struct TerminalView {
    quiet: bool,
    reload_requested: AtomicBool,
}

impl TerminalView {
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            reload_requested: AtomicBool::new(false),
        }
    }

    /// True once after the controller asked for a reload
    pub fn take_reload_request(&self) -> bool {
        self.reload_requested.swap(false, Ordering::SeqCst)
    }
}

impl SessionView for TerminalView {
    fn render(&self, detail: &ReconciliationDetail) {
        if self.quiet {
            return;
        }
        output::print_detail_header(detail);
        let pending = &detail.movimientos_no_conciliados;
        println!(
            "  Pending: {} bank, {} ledger",
            pending.banco.len(),
            pending.auxiliar.len()
        );
        println!();
    }

    fn alert(&self, message: &str) {
        output::error(message);
    }

    fn show_tab(&self, origin: Origin) {
        if !self.quiet {
            println!("{}", format!("-> {} movements", origin.label()).dimmed());
        }
    }

    fn set_submit_enabled(&self, enabled: bool) {
        if !enabled && !self.quiet {
            println!("{}", "Submitting manual reconciliation...".dimmed());
        }
    }

    fn reload(&self) {
        self.reload_requested.store(true, Ordering::SeqCst);
    }

    // Commands turn this into `Error::Unauthorized`, which main reports
    fn session_expired(&self) {}
}
