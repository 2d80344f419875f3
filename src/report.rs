//! Colored console output for audit results.

use crate::types::{ConfuscanError, Summary};
use colored::Colorize;
use std::io::Write;
use std::path::Path;

/// Console output handler with colors and formatting.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReport;

impl ConsoleReport {
    pub fn new() -> Self {
        Self
    }

    /// Announce which manifest is being read.
    pub fn print_reading(&self, path: &Path) {
        println!(
            "{}",
            format!("Reading package.json from: {}", path.display()).cyan()
        );
    }

    /// Announce a successful parse and the dependency count.
    pub fn print_parsed(&self, dependency_count: usize) {
        println!("{}", "Successfully parsed package.json".green());
        println!("Found {} dependencies\n", dependency_count);
    }

    /// Print progress/info lines (bulk mode).
    pub fn print_info(&self, message: &str) {
        println!("{}", message);
    }

    /// Start a per-dependency line; the verdict lands on the same line.
    pub fn print_check_start(&self, name: &str, version: &str) {
        print!("Checking {} (version {}): ", name, version);
        let _ = std::io::stdout().flush();
    }

    pub fn print_exists(&self) {
        println!("{}", "✔ Exists".green());
    }

    pub fn print_missing(&self) {
        println!("{}", "✘ Does not exist".red());
    }

    pub fn print_check_error(&self, error: &ConfuscanError) {
        println!("{}", format!("Error: {}", error).red());
    }

    /// Print the end-of-run summary.
    pub fn print_summary(&self, summary: &Summary) {
        println!("\nSummary:");
        println!(
            "{}",
            format!("  ✔ {} packages exist", summary.exists).green()
        );
        println!(
            "{}",
            format!("  ✘ {} packages do not exist", summary.missing).red()
        );
        if summary.skipped > 0 {
            println!(
                "{}",
                format!("  ! {} checks skipped due to errors", summary.skipped).yellow()
            );
        }
    }
}
