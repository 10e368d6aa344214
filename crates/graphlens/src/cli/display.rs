//! Common display utilities for CLI commands.

use colored::Colorize;
use graphlens::IntegrityWarning;

const MAX_DISPLAY_ITEMS: usize = 10;

/// Print reportable integrity warnings to stderr.
pub fn print_warnings(warnings: &[IntegrityWarning]) {
    for warning in warnings.iter().filter(|w| w.is_reportable()) {
        eprintln!("{}: {warning}", "warning".yellow());
    }
}

/// Display a list of node ids with optional truncation.
///
/// Shows up to `MAX_DISPLAY_ITEMS` ids with bullet points. If there are more,
/// shows "... and N more". If empty, shows the provided `empty_message`.
pub fn print_ids(ids: &[String], empty_message: &str) {
    if ids.is_empty() {
        println!("    {}", empty_message.dimmed());
        return;
    }

    for id in ids.iter().take(MAX_DISPLAY_ITEMS) {
        println!("    {} {id}", "•".dimmed());
    }

    if ids.len() > MAX_DISPLAY_ITEMS {
        println!(
            "    {} ... and {} more",
            "•".dimmed(),
            ids.len() - MAX_DISPLAY_ITEMS
        );
    }
}
