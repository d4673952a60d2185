//! Report persistence: materialize checker report artifacts on disk.
//!
//! Each checker writes into its own name-keyed directory beneath the output
//! root, so concurrent checkers never contend. Writing is overwrite-always;
//! re-running a goal refreshes the artifacts in place.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;
use verdict_engine::Report;

use crate::outcome::EnrichedOutcome;

/// Output sink rooted at a caller-supplied directory.
pub struct Workspace {
    output_root: PathBuf,
}

impl Workspace {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
        }
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Write a report's files under `dest` (relative to the output root),
    /// creating directories as needed and overwriting existing files.
    pub fn materialize(&self, dest: &Path, report: &Report) -> Result<()> {
        for (relative, contents) in report.files() {
            let path = self.output_root.join(dest).join(relative);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create report dir {parent:?}"))?;
            }
            std::fs::write(&path, contents).with_context(|| format!("write {path:?}"))?;
        }
        Ok(())
    }
}

/// Persist every non-empty report artifact, namespaced by checker name:
/// `<output_root>/<goal_name>/<checker_name>/<file>`.
pub fn write_reports(
    outcomes: &[EnrichedOutcome],
    workspace: &Workspace,
    goal_name: &str,
) -> Result<()> {
    for outcome in outcomes {
        for result in outcome.results() {
            if result.report.is_empty() {
                continue;
            }
            let dest = Path::new(goal_name).join(outcome.checker_name());
            debug!(
                checker = %outcome.checker_name(),
                digest = %result.report.digest().short(),
                "materializing report"
            );
            workspace
                .materialize(&dest, &result.report)
                .with_context(|| format!("persist report for {}", outcome.checker_name()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use verdict_engine::ProcessOutcome;

    use super::*;
    use crate::outcome::{enrich, CheckOutcome, CheckResult};

    fn outcome_with_report(name: &str, files: &[(&str, &[u8])]) -> EnrichedOutcome {
        let mut report = Report::empty();
        for (path, contents) in files {
            report.insert(*path, contents.to_vec());
        }
        let raw = ProcessOutcome::new(0, "", "").with_report(report);
        enrich(CheckOutcome::new(name, vec![CheckResult::from_process(&raw)]).unwrap())
    }

    #[test]
    fn reports_land_under_goal_and_checker_name() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = Workspace::new(dir.path());
        let outcomes = vec![outcome_with_report("mypy", &[("summary.txt", b"2 errors")])];

        write_reports(&outcomes, &workspace, "check").unwrap();

        let written = dir.path().join("check/mypy/summary.txt");
        assert_eq!(std::fs::read(written).unwrap(), b"2 errors");
    }

    #[test]
    fn empty_reports_write_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = Workspace::new(dir.path());
        let raw = ProcessOutcome::new(0, "clean", "");
        let outcomes = vec![enrich(
            CheckOutcome::new("mypy", vec![CheckResult::from_process(&raw)]).unwrap(),
        )];

        write_reports(&outcomes, &workspace, "check").unwrap();

        assert!(!dir.path().join("check").exists());
    }

    #[test]
    fn rerunning_overwrites_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = Workspace::new(dir.path());

        let first = vec![outcome_with_report("mypy", &[("summary.txt", b"old")])];
        write_reports(&first, &workspace, "check").unwrap();
        let second = vec![outcome_with_report("mypy", &[("summary.txt", b"new")])];
        write_reports(&second, &workspace, "check").unwrap();

        let written = dir.path().join("check/mypy/summary.txt");
        assert_eq!(std::fs::read(written).unwrap(), b"new");
    }

    #[test]
    fn nested_report_paths_are_created() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = Workspace::new(dir.path());
        let outcomes = vec![outcome_with_report(
            "coverage",
            &[("html/index.html", b"<html></html>" as &[u8])],
        )];

        write_reports(&outcomes, &workspace, "check").unwrap();

        assert!(dir.path().join("check/coverage/html/index.html").exists());
    }
}
