//! Local process engine: runs checker commands on the host.
//!
//! Each registered checker maps to a command template. One invocation runs
//! one process per partition (candidates grouped by a configured field),
//! captures exit code and output, and collects any files the process left in
//! its report scratch directory. Outcomes are memoized by request digest.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::process::Stdio;
use std::sync::Mutex;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{EngineError, EngineResult};
use crate::request::{
    Candidate, CheckRequest, ContentDigest, ExecutionOutcome, ProcessOutcome, Report, TaskEngine,
};

/// Environment variable naming the scratch directory a checker process may
/// write report files into.
pub const REPORT_DIR_ENV: &str = "VERDICT_REPORT_DIR";

/// Command template for one checker backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckerCommand {
    /// Command to execute (first element is the executable). Candidate
    /// addresses are appended as trailing arguments.
    pub argv: Vec<String>,

    /// Field to group candidates by. Each distinct value becomes one
    /// partition, labelled with the value.
    pub partition_by: Option<String>,

    /// Timeout in seconds; 0 means no timeout.
    pub timeout_secs: u64,
}

impl CheckerCommand {
    pub fn new(argv: Vec<String>) -> Self {
        Self {
            argv,
            partition_by: None,
            timeout_secs: 0,
        }
    }

    /// Partition candidates by the given field.
    pub fn partitioned_by(mut self, field: impl Into<String>) -> Self {
        self.partition_by = Some(field.into());
        self
    }

    /// Bound each partition's runtime.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// Task engine that executes checker commands as local child processes.
pub struct LocalProcessEngine {
    commands: HashMap<String, CheckerCommand>,
    memo: Mutex<HashMap<ContentDigest, ExecutionOutcome>>,
}

impl LocalProcessEngine {
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
            memo: Mutex::new(HashMap::new()),
        }
    }

    /// Register the command template for a checker name. Later registrations
    /// replace earlier ones.
    pub fn register(&mut self, name: impl Into<String>, command: CheckerCommand) {
        self.commands.insert(name.into(), command);
    }

    fn memo_key(request: &CheckRequest, command: &CheckerCommand) -> EngineResult<ContentDigest> {
        // The key covers the command template too: editing a checker's argv
        // must invalidate prior outcomes.
        let encoded = serde_json::to_vec(&(request, command))?;
        Ok(ContentDigest::from_bytes(&encoded))
    }

    async fn run_partition(
        &self,
        name: &str,
        command: &CheckerCommand,
        label: Option<String>,
        members: &[&Candidate],
    ) -> EngineResult<ProcessOutcome> {
        let scratch = tempfile::tempdir()?;

        let exe = &command.argv[0];
        let args = &command.argv[1..];

        let child = Command::new(exe)
            .args(args)
            .args(members.iter().map(|c| c.address.as_str()))
            .env(REPORT_DIR_ENV, scratch.path())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| EngineError::Spawn {
                name: name.to_string(),
                command: exe.clone(),
                source,
            })?;

        let output = if command.timeout_secs > 0 {
            tokio::time::timeout(
                std::time::Duration::from_secs(command.timeout_secs),
                child.wait_with_output(),
            )
            .await
            .map_err(|_| EngineError::Timeout {
                name: name.to_string(),
                timeout_secs: command.timeout_secs,
            })??
        } else {
            child.wait_with_output().await?
        };

        let exit_code = output.status.code().unwrap_or(-1);
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let report = collect_report(scratch.path())?;

        debug!(
            checker = %name,
            partition = label.as_deref().unwrap_or("-"),
            exit_code,
            "partition finished"
        );

        let mut outcome = ProcessOutcome::new(exit_code, stdout, stderr).with_report(report);
        outcome.description = label;
        Ok(outcome)
    }
}

impl Default for LocalProcessEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskEngine for LocalProcessEngine {
    async fn execute(&self, request: &CheckRequest) -> EngineResult<ExecutionOutcome> {
        let command = self
            .commands
            .get(&request.checker_name)
            .ok_or_else(|| EngineError::UnknownChecker {
                name: request.checker_name.clone(),
            })?;
        if command.argv.is_empty() {
            return Err(EngineError::EmptyCommand {
                name: request.checker_name.clone(),
            });
        }

        let key = Self::memo_key(request, command)?;
        if let Some(hit) = self.memo.lock().unwrap().get(&key) {
            debug!(checker = %request.checker_name, digest = %key.short(), "memo hit");
            let mut replay = hit.clone();
            replay.from_cache = true;
            return Ok(replay);
        }

        let start = Instant::now();
        let groups = partition_candidates(&request.candidates, command.partition_by.as_deref());

        let mut partitions = Vec::with_capacity(groups.len());
        for (label, members) in groups {
            let outcome = self
                .run_partition(&request.checker_name, command, label, &members)
                .await?;
            partitions.push(outcome);
        }

        let outcome = ExecutionOutcome {
            partitions,
            duration_ms: start.elapsed().as_millis() as u64,
            from_cache: false,
        };

        info!(
            checker = %request.checker_name,
            partitions = outcome.partitions.len(),
            duration_ms = outcome.duration_ms,
            "checker invocation resolved"
        );

        self.memo.lock().unwrap().insert(key, outcome.clone());
        Ok(outcome)
    }
}

/// Group candidates by the value of `field`, in label order. Candidates
/// missing the field land in an unlabelled group that sorts first. Without a
/// field, everything is one unlabelled partition.
fn partition_candidates<'a>(
    candidates: &'a [Candidate],
    field: Option<&str>,
) -> Vec<(Option<String>, Vec<&'a Candidate>)> {
    let Some(field) = field else {
        return vec![(None, candidates.iter().collect())];
    };

    let mut groups: BTreeMap<Option<String>, Vec<&Candidate>> = BTreeMap::new();
    for candidate in candidates {
        let label = candidate.fields.get(field).map(|value| match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        });
        groups.entry(label).or_default().push(candidate);
    }
    groups.into_iter().collect()
}

fn collect_report(root: &Path) -> EngineResult<Report> {
    let mut report = Report::empty();
    collect_into(root, root, &mut report)?;
    Ok(report)
}

fn collect_into(root: &Path, dir: &Path, report: &mut Report) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_into(root, &path, report)?;
        } else {
            let relative = path
                .strip_prefix(root)
                .expect("scratch entries always live under the scratch root")
                .to_string_lossy()
                .into_owned();
            report.insert(relative, std::fs::read(&path)?);
        }
    }
    Ok(())
}
