//! Console output for the release run.
//!
//! Status lines go to stdout, errors and warnings to stderr. The text itself
//! is built in [formatter] so it can be tested without a terminal.

pub mod formatter;

use crate::boundary::BoundaryWarning;
use crate::cli::RunSummary;
use crate::config::Config;
use console::style;

pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold().for_stderr(), message);
}

pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Display a boundary warning to the user.
pub fn display_boundary_warning(warning: &BoundaryWarning) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow().for_stderr(), warning);
}

/// Print the effective configuration, secrets redacted
pub fn display_config(config: &Config) {
    println!("{}", style("Configuration:").bold());
    for line in formatter::format_config(config) {
        println!("  {}", line);
    }
}

/// Print what a finished run did, warnings first
pub fn display_summary(summary: &RunSummary) {
    for warning in &summary.warnings {
        display_boundary_warning(warning);
    }
    println!("\n{}", style("Release summary:").bold());
    for line in formatter::format_summary(summary) {
        display_success(&line);
    }
}
