//! Checker outcomes: normalization, aggregation, and enrichment.
//!
//! A checker typically returns one result. If it no-oped it returns zero
//! results, and some checkers partition their input and return several. This
//! module folds the partitions of one checker into a `CheckOutcome` and
//! projects it into an `EnrichedOutcome` carrying a severity and a fully
//! formatted message.
//!
//! `enrich` is deliberately a pure function: the raw outcome is the
//! cacheable computation, while the stage that calls `enrich` and streams
//! the result is an always-fresh observable effect. Keep it free of I/O.

use serde::{Deserialize, Serialize};
use verdict_engine::{ProcessOutcome, Report};

use crate::error::{CheckError, Result};

/// Severity of one checker's enriched outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Checker no-oped; only interesting when debugging.
    Debug,
    /// Checker ran and passed.
    Info,
    /// Checker ran and failed.
    Error,
}

impl Severity {
    /// The tracing level this severity streams at.
    pub fn as_level(self) -> tracing::Level {
        match self {
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// One concrete execution outcome of a checker partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub partition_description: Option<String>,
    pub report: Report,
}

impl CheckResult {
    /// Normalize a raw process outcome.
    ///
    /// When the engine ran the process in a sandbox directory, occurrences
    /// of that path are stripped from the captured output so messages refer
    /// to workspace-relative paths.
    pub fn from_process(outcome: &ProcessOutcome) -> Self {
        let prep = |s: &str| match &outcome.sandbox_root {
            Some(root) => strip_sandbox_root(s, &root.to_string_lossy()),
            None => s.to_string(),
        };
        Self {
            exit_code: outcome.exit_code,
            stdout: prep(&outcome.stdout),
            stderr: prep(&outcome.stderr),
            partition_description: outcome.description.clone(),
            report: outcome.report.clone(),
        }
    }

    /// Structured-logging metadata for this partition.
    pub fn metadata(&self) -> serde_json::Value {
        serde_json::json!({ "partition": self.partition_description })
    }
}

fn strip_sandbox_root(text: &str, root: &str) -> String {
    text.replace(&format!("{root}/"), "").replace(root, ".")
}

/// Zero or more `CheckResult`s for a single checker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckOutcome {
    results: Vec<CheckResult>,
    checker_name: String,
}

impl CheckOutcome {
    /// Construct an outcome. An empty checker name is rejected immediately.
    pub fn new(checker_name: impl Into<String>, results: Vec<CheckResult>) -> Result<Self> {
        let checker_name = checker_name.into();
        if checker_name.is_empty() {
            return Err(CheckError::MissingCheckerName);
        }
        Ok(Self {
            results,
            checker_name,
        })
    }

    /// Compatibility shim for callers still passing `typechecker_name`.
    /// Emits a one-time deprecation warning, then behaves exactly like
    /// [`CheckOutcome::new`]. Slated for removal in 0.3.0.
    pub fn with_typechecker_name(
        typechecker_name: impl Into<String>,
        results: Vec<CheckResult>,
    ) -> Result<Self> {
        crate::deprecation::warn_once(
            "the `typechecker_name` argument",
            "0.3.0",
            "Pass `checker_name` instead.",
        );
        Self::new(typechecker_name, results)
    }

    pub fn checker_name(&self) -> &str {
        &self.checker_name
    }

    pub fn results(&self) -> &[CheckResult] {
        &self.results
    }

    /// A checker that produced no partitions no-oped.
    pub fn skipped(&self) -> bool {
        self.results.is_empty()
    }

    /// Aggregate exit code for this checker: 0 when skipped or every
    /// partition is clean, otherwise the exit code of the last partition in
    /// natural order with a nonzero code. Not the maximum and not the first;
    /// the later partition wins.
    pub fn exit_code(&self) -> i32 {
        self.results
            .iter()
            .rev()
            .find(|result| result.exit_code != 0)
            .map(|result| result.exit_code)
            .unwrap_or(0)
    }
}

/// A `CheckOutcome` decorated with severity and a formatted message.
///
/// Purely a projection of the outcome; carries no new owned state beyond
/// the rendered strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedOutcome {
    outcome: CheckOutcome,
    severity: Severity,
    message: String,
}

impl EnrichedOutcome {
    pub fn outcome(&self) -> &CheckOutcome {
        &self.outcome
    }

    pub fn checker_name(&self) -> &str {
        self.outcome.checker_name()
    }

    pub fn results(&self) -> &[CheckResult] {
        self.outcome.results()
    }

    pub fn skipped(&self) -> bool {
        self.outcome.skipped()
    }

    pub fn exit_code(&self) -> i32 {
        self.outcome.exit_code()
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Enrich a checker outcome with severity and a formatted message.
///
/// Pure: same outcome in, same enrichment out. Callers that want fresh
/// console output on every run simply call this outside any memo boundary.
pub fn enrich(outcome: CheckOutcome) -> EnrichedOutcome {
    let severity = if outcome.skipped() {
        Severity::Debug
    } else if outcome.exit_code() != 0 {
        Severity::Error
    } else {
        Severity::Info
    };
    let message = render_message(&outcome);
    EnrichedOutcome {
        outcome,
        severity,
        message,
    }
}

fn render_message(outcome: &CheckOutcome) -> String {
    if outcome.skipped() {
        return format!("{} skipped.", outcome.checker_name());
    }

    let mut message = outcome.checker_name().to_string();
    if outcome.exit_code() == 0 {
        message.push_str(" succeeded.");
    } else {
        message.push_str(&format!(" failed (exit code {}).", outcome.exit_code()));
    }

    fn msg_for_result(result: &CheckResult) -> String {
        let mut msg = String::new();
        if !result.stdout.is_empty() {
            msg.push('\n');
            msg.push_str(&result.stdout);
        }
        if !result.stderr.is_empty() {
            msg.push('\n');
            msg.push_str(&result.stderr);
        }
        if !msg.is_empty() {
            msg = format!("{}\n\n", msg.trim_end());
        }
        msg
    }

    if outcome.results().len() == 1 {
        message.push_str(&msg_for_result(&outcome.results()[0]));
    } else {
        message.push('\n');
        for (i, result) in outcome.results().iter().enumerate() {
            message.push_str(&format!("Partition #{}", i + 1));
            match &result.partition_description {
                Some(description) => message.push_str(&format!(" - {description}:")),
                None => message.push(':'),
            }
            let body = msg_for_result(result);
            if body.is_empty() {
                message.push_str("\n\n");
            } else {
                message.push_str(&body);
            }
        }
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(exit_code: i32, stdout: &str, stderr: &str) -> CheckResult {
        CheckResult {
            exit_code,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            partition_description: None,
            report: Report::empty(),
        }
    }

    fn labelled(exit_code: i32, stdout: &str, label: &str) -> CheckResult {
        CheckResult {
            partition_description: Some(label.to_string()),
            ..result(exit_code, stdout, "")
        }
    }

    #[test]
    fn empty_name_is_rejected() {
        match CheckOutcome::new("", vec![]) {
            Err(CheckError::MissingCheckerName) => {}
            other => panic!("expected MissingCheckerName, got {other:?}"),
        }
    }

    #[test]
    fn legacy_constructor_still_validates_the_name() {
        assert!(CheckOutcome::with_typechecker_name("", vec![]).is_err());
        let outcome = CheckOutcome::with_typechecker_name("mypy", vec![]).unwrap();
        assert_eq!(outcome.checker_name(), "mypy");
    }

    #[test]
    fn zero_partitions_is_skipped_with_exit_zero() {
        let outcome = CheckOutcome::new("mypy", vec![]).unwrap();
        assert!(outcome.skipped());
        assert_eq!(outcome.exit_code(), 0);

        let enriched = enrich(outcome);
        assert_eq!(enriched.severity(), Severity::Debug);
        assert_eq!(enriched.message(), "mypy skipped.");
    }

    #[test]
    fn all_clean_partitions_aggregate_to_zero() {
        let outcome =
            CheckOutcome::new("mypy", vec![result(0, "", ""), result(0, "", "")]).unwrap();
        assert_eq!(outcome.exit_code(), 0);
        assert!(!outcome.skipped());
    }

    #[test]
    fn last_nonzero_partition_wins() {
        let outcome = CheckOutcome::new(
            "mypy",
            vec![result(5, "", ""), result(3, "", ""), result(0, "", "")],
        )
        .unwrap();
        assert_eq!(outcome.exit_code(), 3);
    }

    #[test]
    fn single_partition_message_inlines_output() {
        let outcome =
            CheckOutcome::new("mypy", vec![result(0, "all clean\n", "note: cached")]).unwrap();
        let enriched = enrich(outcome);
        assert_eq!(enriched.severity(), Severity::Info);
        assert_eq!(
            enriched.message(),
            "mypy succeeded.\nall clean\n\nnote: cached\n\n"
        );
    }

    #[test]
    fn failure_message_names_the_exit_code() {
        let outcome = CheckOutcome::new("mypy", vec![result(1, "", "type error")]).unwrap();
        let enriched = enrich(outcome);
        assert_eq!(enriched.severity(), Severity::Error);
        assert!(enriched.message().starts_with("mypy failed (exit code 1)."));
        assert!(enriched.message().contains("type error"));
    }

    #[test]
    fn multi_partition_message_emits_labelled_blocks() {
        let outcome = CheckOutcome::new(
            "mypy",
            vec![labelled(1, "bad\n", "py2"), labelled(0, "good\n", "py3")],
        )
        .unwrap();
        assert_eq!(outcome.exit_code(), 1);

        let enriched = enrich(outcome);
        assert!(enriched.message().contains("Partition #1 - py2:"));
        assert!(enriched.message().contains("Partition #2 - py3:"));
        assert!(enriched.message().contains("bad"));
        assert!(enriched.message().contains("good"));
    }

    #[test]
    fn unlabelled_partition_header_has_no_dash() {
        let outcome =
            CheckOutcome::new("mypy", vec![result(0, "", ""), result(0, "ok\n", "")]).unwrap();
        let enriched = enrich(outcome);
        assert!(enriched.message().contains("Partition #1:\n\n"));
        assert!(enriched.message().contains("Partition #2:\nok\n\n"));
    }

    #[test]
    fn sandbox_root_is_stripped_from_output() {
        let raw = ProcessOutcome {
            exit_code: 1,
            stdout: "/tmp/sandbox-abc/src/app.py:3: error".to_string(),
            stderr: "ran in /tmp/sandbox-abc".to_string(),
            description: None,
            report: Report::empty(),
            sandbox_root: Some("/tmp/sandbox-abc".into()),
        };
        let result = CheckResult::from_process(&raw);
        assert_eq!(result.stdout, "src/app.py:3: error");
        assert_eq!(result.stderr, "ran in .");
    }

    #[test]
    fn metadata_carries_the_partition_label() {
        let check = labelled(0, "", "py3");
        assert_eq!(
            check.metadata(),
            serde_json::json!({ "partition": "py3" })
        );
    }
}
