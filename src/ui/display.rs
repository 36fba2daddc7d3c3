//! Diagnostic messages for the command-line front end.
//!
//! Everything here goes to standard error so that standard output carries
//! only generated records.

use std::time::Duration;

use console::{Term, style};

use crate::config::APP_NAME;
use crate::types::Summary;

/// Formats a duration the way the summary line prints it, e.g. `1.503s` or `250ms`.
pub fn format_elapsed(elapsed: Duration) -> String {
    if elapsed >= Duration::from_secs(1) { format!("{:.3}s", elapsed.as_secs_f64()) } else { format!("{}ms", elapsed.as_millis()) }
}

/// Prints the application banner.
pub fn print_banner() {
    let term = Term::stderr();
    let title = format!("{APP_NAME} v{} - Blockchain Address Generator", env!("CARGO_PKG_VERSION"));
    let _ = term.write_line(&style(&title).green().bold().to_string());
    let _ = term.write_line(&"=".repeat(title.len()));
}

/// Prints the final throughput line.
pub fn show_summary(summary: &Summary) {
    let line = format!("Generated {} addresses in {} ({:.2} addresses/sec)", summary.emitted, format_elapsed(summary.elapsed), summary.rate());
    let _ = Term::stderr().write_line(&format!("{} {}", style("✓").green(), style(line).bold()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_millis(250)), "250ms");
        assert_eq!(format_elapsed(Duration::ZERO), "0ms");
        assert_eq!(format_elapsed(Duration::from_millis(1503)), "1.503s");
        assert_eq!(format_elapsed(Duration::from_secs(90)), "90.000s");
    }
}
