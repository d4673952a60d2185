//! Wire types and the execution contract for checker invocations
//!
//! These types cross the boundary between the check goal and whatever engine
//! resolves its invocations:
//! - `CheckRequest`: one invocation per checker backend per run
//! - `ExecutionOutcome` / `ProcessOutcome`: the raw, possibly partitioned
//!   result set an engine hands back
//! - `TaskEngine`: the async contract itself
//!
//! All types are serializable so an engine may run out of process. An
//! in-memory fake is provided for testing via the `fakes` module.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::{EngineError, EngineResult};

// ---------------------------------------------------------------------------
// ContentDigest
// ---------------------------------------------------------------------------

/// Content digest (SHA-256 hex string).
///
/// The inner field is private to guarantee the string is always valid
/// lowercase hex produced by `from_bytes` or validated via `TryFrom<String>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentDigest(String);

impl ContentDigest {
    /// Compute the SHA-256 digest of the given bytes.
    pub fn from_bytes(data: &[u8]) -> Self {
        use sha2::Digest;
        let mut hasher = Sha256::new();
        hasher.update(data);
        ContentDigest(hex::encode(hasher.finalize()))
    }

    /// Return the full hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form (first 12 hex chars).
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl TryFrom<String> for ContentDigest {
    type Error = EngineError;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        if s.len() != 64 || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(EngineError::InvalidDigest { digest: s });
        }
        Ok(ContentDigest(s.to_ascii_lowercase()))
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Candidate / CheckRequest
// ---------------------------------------------------------------------------

/// A buildable unit paired with the field values one checker cares about.
///
/// Candidates are extracted from resolved targets by the check goal; the
/// engine treats the field map as opaque except where a command is configured
/// to partition on one of its keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Target address (e.g. `src/py/app:lib`).
    pub address: String,

    /// Checker-specific field values keyed by field name.
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl Candidate {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Attach a field value.
    pub fn with_field(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }
}

/// One invocation request for a single checker backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckRequest {
    /// Name of the checker this request belongs to.
    pub checker_name: String,

    /// Applicable candidates, in target order.
    pub candidates: Vec<Candidate>,
}

impl CheckRequest {
    pub fn new(checker_name: impl Into<String>, candidates: Vec<Candidate>) -> Self {
        Self {
            checker_name: checker_name.into(),
            candidates,
        }
    }

    /// Canonical digest of this request, used as a memoization key.
    pub fn digest(&self) -> EngineResult<ContentDigest> {
        let encoded = serde_json::to_vec(self)?;
        Ok(ContentDigest::from_bytes(&encoded))
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Report artifact produced by one checker partition.
///
/// A report is a named set of files (relative path -> contents). The default
/// report is empty, meaning the partition produced no artifact to persist.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    files: BTreeMap<String, Vec<u8>>,
}

impl Report {
    /// The empty report.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Add a file to the report. Relative paths only; the writer namespaces
    /// them under the owning checker's directory.
    pub fn insert(&mut self, path: impl Into<String>, contents: Vec<u8>) {
        self.files.insert(path.into(), contents);
    }

    /// Iterate over (relative path, contents) pairs in path order.
    pub fn files(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.files.iter().map(|(p, c)| (p.as_str(), c.as_slice()))
    }

    /// Digest over the canonical encoding. Same files always yield the same
    /// digest.
    pub fn digest(&self) -> ContentDigest {
        let mut encoded = Vec::new();
        for (path, contents) in &self.files {
            encoded.extend_from_slice(path.as_bytes());
            encoded.push(0);
            encoded.extend_from_slice(contents);
            encoded.push(0);
        }
        ContentDigest::from_bytes(&encoded)
    }
}

// ---------------------------------------------------------------------------
// ProcessOutcome / ExecutionOutcome
// ---------------------------------------------------------------------------

/// Raw result of one concrete checker execution (one partition).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessOutcome {
    /// Exit code (0 = success).
    pub exit_code: i32,

    /// Captured stdout.
    pub stdout: String,

    /// Captured stderr.
    pub stderr: String,

    /// Why the backend split this partition off, if it did.
    pub description: Option<String>,

    /// Report artifact left behind by the process.
    pub report: Report,

    /// Sandbox directory the process ran in, when the engine used one.
    /// Consumers may strip this path from the captured output.
    pub sandbox_root: Option<PathBuf>,
}

impl ProcessOutcome {
    pub fn new(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
            description: None,
            report: Report::empty(),
            sandbox_root: None,
        }
    }

    /// Label this outcome as one partition of a split invocation.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attach a report artifact.
    pub fn with_report(mut self, report: Report) -> Self {
        self.report = report;
        self
    }
}

/// Raw result set for one `CheckRequest`.
///
/// Zero partitions means the backend no-opped (the goal reports it as
/// skipped). Engines that memoize set `from_cache` on replayed outcomes;
/// enrichment and reporting downstream always run fresh either way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    /// Partition results in the backend's natural order.
    pub partitions: Vec<ProcessOutcome>,

    /// Wall-clock duration of the invocation in milliseconds.
    pub duration_ms: u64,

    /// Whether this outcome was served from the engine's memo.
    pub from_cache: bool,
}

impl ExecutionOutcome {
    pub fn new(partitions: Vec<ProcessOutcome>) -> Self {
        Self {
            partitions,
            duration_ms: 0,
            from_cache: false,
        }
    }
}

// ---------------------------------------------------------------------------
// TaskEngine
// ---------------------------------------------------------------------------

/// Execution substrate for checker invocations.
///
/// Guarantees:
/// - `execute` resolves exactly one request to one raw result set.
/// - A nonzero checker exit code is data, not an error: it comes back inside
///   `ExecutionOutcome`. An `Err` means the invocation itself failed and the
///   caller should abort its run.
/// - Engines may memoize by `CheckRequest::digest()`; replayed outcomes are
///   flagged `from_cache`.
#[async_trait]
pub trait TaskEngine: Send + Sync {
    /// Resolve one checker invocation to its raw outcome.
    async fn execute(&self, request: &CheckRequest) -> EngineResult<ExecutionOutcome>;
}
