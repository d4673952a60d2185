//! Verdict Core - The Check Goal
//!
//! Given a resolved set of buildable targets and a registry of pluggable
//! checker backends, the check goal concurrently invokes every applicable
//! backend through the task engine, consolidates the (possibly partitioned)
//! outcomes, persists per-checker report artifacts, and prints one
//! deterministic status line per checker regardless of completion order.
//!
//! ## Key Components
//!
//! - `CheckerRegistry` / `CheckerBackend`: the capability table of checkers
//! - `run_check`: the goal entry point (fan-out, join, aggregate, report)
//! - `CheckOutcome` / `enrich`: partition aggregation and severity/message
//!   derivation
//! - `Console` / `Workspace`: the reporting and persistence sinks

pub mod console;
pub mod deprecation;
mod dispatch;
mod error;
pub mod goal;
mod outcome;
mod registry;
pub mod report;
pub mod target;

pub use console::{report_results, BufferConsole, Console, StderrConsole};
pub use dispatch::{build_valid_requests, dispatch};
pub use error::{CheckError, Result};
pub use goal::{
    run_check, warn_deprecated_goal_alias, CheckRun, DEPRECATED_GOAL_ALIAS,
    DEPRECATED_GOAL_ALIAS_REMOVAL, GOAL_NAME,
};
pub use outcome::{enrich, CheckOutcome, CheckResult, EnrichedOutcome, Severity};
pub use registry::{CheckerBackend, CheckerRegistry, ConfiguredChecker};
pub use report::{write_reports, Workspace};
pub use target::{FieldDescriptor, NonEmptySources, SourcesProvider, Target};

/// verdict version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
