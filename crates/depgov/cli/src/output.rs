//! Output formatting utilities

use colored::*;
use serde::Serialize;
use std::path::Path;

/// Print `data` as pretty JSON, or write it to `path` when one is given.
pub fn emit_json<T: Serialize>(data: &T, path: Option<&Path>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, json)?;
            print_info(&format!("Report written to {}", path.display()));
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Print a success message. Status lines go to stderr; stdout carries
/// reports.
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue(), message);
}

/// Color a risk level label
pub fn colorize_risk(risk: depgov_types::RiskLevel) -> ColoredString {
    use depgov_types::RiskLevel;
    match risk {
        RiskLevel::Safe => risk.as_str().green(),
        RiskLevel::NeedsReview => risk.as_str().yellow(),
        RiskLevel::Blocked => risk.as_str().red(),
    }
}
