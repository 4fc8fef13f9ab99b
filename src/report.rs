//! Run reporting: colored PASS/FAIL/SKIP lines and a summary.

use crate::runner::{Outcome, RunReport};

// Color constants for terminal output
const RESET: &str = "\x1b[0m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";

/// Configuration for report output.
pub struct ReportConfig {
    pub use_colors: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            use_colors: atty::is(atty::Stream::Stderr),
        }
    }
}

impl ReportConfig {
    /// Apply color formatting to text if colors are enabled.
    pub fn colorize(&self, text: &str, color: &str) -> String {
        if self.use_colors {
            format!("{}{}{}", color, text, RESET)
        } else {
            text.to_string()
        }
    }
}

/// Print per-case lines, fixture-level failures, and a summary.
pub fn report_results(report: &RunReport, config: &ReportConfig) {
    for outcome in &report.outcomes {
        let name = outcome.case.display_name();
        let fixture = outcome.case.fixture();
        match &outcome.outcome {
            Outcome::Passed => {
                println!("{}: {} [{}]", config.colorize("PASS", GREEN), name, fixture)
            }
            Outcome::Failed(error) => {
                eprintln!("{}: {} [{}]", config.colorize("FAIL", RED), name, fixture);
                eprintln!("  Error: {}", error);
            }
            Outcome::SkippedFixture { cause } => {
                println!(
                    "{}: {} [{}] (fixture failed: {})",
                    config.colorize("SKIP", YELLOW),
                    name,
                    fixture,
                    cause
                )
            }
        }
    }

    for failure in &report.fixture_failures {
        eprintln!(
            "{}: fixture {}",
            config.colorize("FAIL", RED),
            failure.fixture
        );
        eprintln!("  Error: {}", failure.error);
    }

    let (passed, failed, skipped) = report.totals();
    println!(
        "\nRun summary: total {}, {} {}, {} {}, {} {}",
        report.outcomes.len(),
        config.colorize("passed", GREEN),
        passed,
        config.colorize("failed", RED),
        failed,
        config.colorize("skipped", YELLOW),
        skipped,
    );

    if failed > 0 {
        eprintln!("\nFailed cases:");
        for outcome in &report.outcomes {
            if outcome.failed() {
                eprintln!("  - {}", outcome.case.display_name());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colorize_is_a_no_op_when_disabled() {
        let config = ReportConfig { use_colors: false };
        assert_eq!(config.colorize("PASS", GREEN), "PASS");
    }

    #[test]
    fn colorize_wraps_when_enabled() {
        let config = ReportConfig { use_colors: true };
        assert_eq!(config.colorize("PASS", GREEN), "\x1b[32mPASS\x1b[0m");
    }
}
