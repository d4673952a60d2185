//! The check goal: fan out, join, aggregate, persist, report.

use anyhow::{Context, Result};
use tracing::{debug, error, info, info_span};
use uuid::Uuid;

use crate::console::{report_results, Console};
use crate::dispatch::{build_valid_requests, dispatch};
use crate::outcome::{enrich, CheckOutcome, CheckResult, Severity};
use crate::registry::CheckerRegistry;
use crate::report::{write_reports, Workspace};
use crate::target::{SourcesProvider, Target};
use verdict_engine::TaskEngine;

/// Goal name; also the directory reports are namespaced under.
pub const GOAL_NAME: &str = "check";

/// Deprecated goal alias, kept for callers of the old `typecheck` name.
pub const DEPRECATED_GOAL_ALIAS: &str = "typecheck";

/// Version the deprecated alias disappears in.
pub const DEPRECATED_GOAL_ALIAS_REMOVAL: &str = "0.4.0";

/// Warn (once per process) that the goal was invoked under its deprecated
/// alias. Never affects the run's exit code.
pub fn warn_deprecated_goal_alias() {
    crate::deprecation::warn_once(
        &format!("the `{DEPRECATED_GOAL_ALIAS}` goal name"),
        DEPRECATED_GOAL_ALIAS_REMOVAL,
        &format!("Use `{GOAL_NAME}` instead."),
    );
}

/// Final result of one check goal invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckRun {
    /// Process exit code: 0 on full success or when nothing was applicable,
    /// otherwise the code of the alphabetically last failing checker.
    pub exit_code: i32,
}

/// Run the check goal over a resolved target set.
///
/// One invocation per applicable registered checker is dispatched to the
/// engine concurrently; the goal joins on all of them, folds the raw
/// outcomes into enriched per-checker results, persists report artifacts,
/// and prints the status block. The enrichment and reporting below is a
/// plain always-fresh stage: even when the engine serves a raw outcome from
/// its memo, what the user sees is recomputed here every run.
///
/// Any failure the engine raises for any single invocation aborts the whole
/// run; checker-level failures (nonzero exits) never do.
pub async fn run_check(
    registry: &CheckerRegistry,
    targets: &[Target],
    sources: &dyn SourcesProvider,
    engine: &dyn TaskEngine,
    workspace: &Workspace,
    console: &mut dyn Console,
) -> Result<CheckRun> {
    let run_id = Uuid::new_v4();
    let span = info_span!("check.run", run_id = %run_id);
    let _guard = span.enter();

    let requests = build_valid_requests(registry, targets, sources).await;
    info!(
        checkers = registry.len(),
        dispatched = requests.len(),
        targets = targets.len(),
        "dispatching check requests"
    );

    let raw = dispatch(engine, &requests)
        .await
        .context("resolve checker invocations")?;

    let mut enriched = Vec::with_capacity(raw.len());
    for (checker_name, execution) in raw {
        if execution.from_cache {
            debug!(checker = %checker_name, "raw outcome served from engine memo");
        }
        let results: Vec<CheckResult> = execution
            .partitions
            .iter()
            .map(CheckResult::from_process)
            .collect();
        let outcome = enrich(CheckOutcome::new(checker_name, results)?);
        match outcome.severity() {
            Severity::Debug => debug!("{}", outcome.message()),
            Severity::Info => info!("{}", outcome.message()),
            Severity::Error => error!("{}", outcome.message()),
        }
        enriched.push(outcome);
    }

    write_reports(&enriched, workspace, GOAL_NAME).context("write check reports")?;

    let exit_code = report_results(console, &enriched);
    info!(exit_code, "check goal finished");
    Ok(CheckRun { exit_code })
}
