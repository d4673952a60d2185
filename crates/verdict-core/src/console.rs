//! Console reporting: the deterministic status block and the exit-code fold.
//!
//! Status lines are always emitted in ascending checker-name order, whatever
//! order the concurrent invocations actually completed in. The exit-code
//! derivation walks the same sorted list, so what the user reads and what
//! the process returns can never disagree.

use colored::Colorize;

use crate::outcome::EnrichedOutcome;

/// Ordered sink for status lines. Status output goes to stderr so stdout
/// stays clean for machine consumers.
pub trait Console: Send {
    fn print_stderr(&mut self, line: &str);

    fn sigil_skipped(&self) -> String {
        "-".to_string()
    }

    fn sigil_succeeded(&self) -> String {
        "✓".to_string()
    }

    fn sigil_failed(&self) -> String {
        "✕".to_string()
    }
}

/// Real console: stderr with colored sigils.
#[derive(Debug, Default)]
pub struct StderrConsole;

impl StderrConsole {
    pub fn new() -> Self {
        Self
    }
}

impl Console for StderrConsole {
    fn print_stderr(&mut self, line: &str) {
        eprintln!("{line}");
    }

    fn sigil_skipped(&self) -> String {
        "-".dimmed().to_string()
    }

    fn sigil_succeeded(&self) -> String {
        "✓".green().to_string()
    }

    fn sigil_failed(&self) -> String {
        "✕".red().to_string()
    }
}

/// Console fake that records lines verbatim, with the plain default sigils.
/// For tests and embedding hosts that capture output.
#[derive(Debug, Default)]
pub struct BufferConsole {
    pub lines: Vec<String>,
}

impl BufferConsole {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Console for BufferConsole {
    fn print_stderr(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }
}

/// Print one status line per outcome in name order and derive the process
/// exit code.
///
/// The exit code is a left fold over the sorted outcomes: every non-skipped
/// outcome with a nonzero code overwrites the running value, so the
/// alphabetically last failing checker wins even when its code is
/// numerically smaller. This mirrors the historical behavior exactly; if it
/// ever changes, switch the overwrite below to a `max` in one place.
pub fn report_results(console: &mut dyn Console, outcomes: &[EnrichedOutcome]) -> i32 {
    let mut sorted: Vec<&EnrichedOutcome> = outcomes.iter().collect();
    sorted.sort_by(|a, b| a.checker_name().cmp(b.checker_name()));

    let mut exit_code = 0;
    if !sorted.is_empty() {
        console.print_stderr("");
    }
    for outcome in sorted {
        let (sigil, status) = if outcome.skipped() {
            (console.sigil_skipped(), "skipped")
        } else if outcome.exit_code() == 0 {
            (console.sigil_succeeded(), "succeeded")
        } else {
            exit_code = outcome.exit_code();
            (console.sigil_failed(), "failed")
        };
        console.print_stderr(&format!("{sigil} {} {status}.", outcome.checker_name()));
    }
    exit_code
}

#[cfg(test)]
mod tests {
    use verdict_engine::Report;

    use super::*;
    use crate::outcome::{enrich, CheckOutcome, CheckResult};

    fn outcome(name: &str, exit_code: i32) -> EnrichedOutcome {
        enrich(
            CheckOutcome::new(
                name,
                vec![CheckResult {
                    exit_code,
                    stdout: String::new(),
                    stderr: String::new(),
                    partition_description: None,
                    report: Report::empty(),
                }],
            )
            .unwrap(),
        )
    }

    fn skipped(name: &str) -> EnrichedOutcome {
        enrich(CheckOutcome::new(name, vec![]).unwrap())
    }

    #[test]
    fn empty_run_prints_nothing_and_exits_zero() {
        let mut console = BufferConsole::default();
        assert_eq!(report_results(&mut console, &[]), 0);
        assert!(console.lines.is_empty());
    }

    #[test]
    fn lines_are_name_sorted_regardless_of_input_order() {
        let mut console = BufferConsole::default();
        let outcomes = vec![outcome("pytype", 0), skipped("golint"), outcome("mypy", 1)];
        report_results(&mut console, &outcomes);

        assert_eq!(
            console.lines,
            vec![
                "".to_string(),
                "- golint skipped.".to_string(),
                "✕ mypy failed.".to_string(),
                "✓ pytype succeeded.".to_string(),
            ]
        );
    }

    #[test]
    fn later_failure_does_not_get_reset_by_success() {
        let mut console = BufferConsole::default();
        let outcomes = vec![outcome("a", 3), outcome("b", 0)];
        assert_eq!(report_results(&mut console, &outcomes), 3);
    }

    #[test]
    fn last_failing_checker_in_sort_order_wins() {
        let mut console = BufferConsole::default();
        let outcomes = vec![skipped("a"), outcome("b", 3), outcome("c", 5)];
        assert_eq!(report_results(&mut console, &outcomes), 5);
    }

    #[test]
    fn overwrite_policy_beats_numeric_ordering() {
        // b's smaller code wins because b sorts after a. Overwrite, not max.
        let mut console = BufferConsole::default();
        let outcomes = vec![outcome("a", 5), outcome("b", 3)];
        assert_eq!(report_results(&mut console, &outcomes), 3);
    }

    #[test]
    fn all_clean_or_skipped_exits_zero() {
        let mut console = BufferConsole::default();
        let outcomes = vec![skipped("a"), outcome("b", 0)];
        assert_eq!(report_results(&mut console, &outcomes), 0);
    }
}
