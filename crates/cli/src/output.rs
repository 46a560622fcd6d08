//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use reservation_lib::CoverageStatus;
use rust_decimal::Decimal;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a rounded table, or a placeholder line when there are no rows
pub fn print_table<T: Tabled>(rows: &[T]) {
    if rows.is_empty() {
        println!("{}", "No resources found".dimmed());
        return;
    }
    println!("{}", Table::new(rows).with(Style::rounded()));
}

/// Print any result structure as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a section heading
pub fn print_heading(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "=".repeat(50));
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Print the purchase recommendation for a reconciled delta
pub fn print_coverage(status: CoverageStatus, amount: &str) {
    match status {
        CoverageStatus::Shortfall => print_warning(&format!("You need to purchase {}", amount)),
        CoverageStatus::Surplus => print_warning(&format!("Over purchased {}", amount)),
        CoverageStatus::Covered => print_success("You have already purchased enough"),
    }
}

/// Format an hourly USD amount
pub fn format_hourly(amount: Decimal) -> String {
    format!("${}/hour", amount.normalize())
}

/// Format a normalized unit count
pub fn format_units(units: f64) -> String {
    if units.fract() == 0.0 {
        format!("{:.0}", units)
    } else {
        format!("{}", units)
    }
}

/// Color a coverage status
pub fn color_status(status: CoverageStatus) -> String {
    match status {
        CoverageStatus::Shortfall => "shortfall".red().to_string(),
        CoverageStatus::Surplus => "surplus".yellow().to_string(),
        CoverageStatus::Covered => "covered".green().to_string(),
    }
}
