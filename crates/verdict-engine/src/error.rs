//! Error types for verdict-engine

use thiserror::Error;

/// Result type for engine operations
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Errors raised while resolving a dispatched checker invocation.
///
/// A nonzero exit code from a checker process is NOT an engine error; it is
/// captured in the returned `ProcessOutcome`. These variants cover failures
/// of the invocation itself.
#[derive(Error, Debug)]
pub enum EngineError {
    /// No backend command is configured for the requested checker.
    #[error("no checker command configured for '{name}'")]
    UnknownChecker { name: String },

    /// A checker command was configured with an empty argv.
    #[error("checker '{name}' has an empty command")]
    EmptyCommand { name: String },

    /// Spawning the checker process failed.
    #[error("failed to spawn '{command}' for checker '{name}'")]
    Spawn {
        name: String,
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The checker process exceeded its configured timeout.
    #[error("checker '{name}' timed out after {timeout_secs} seconds")]
    Timeout { name: String, timeout_secs: u64 },

    /// A digest string failed validation.
    #[error("invalid digest: {digest}")]
    InvalidDigest { digest: String },

    /// Filesystem error while preparing or collecting an invocation.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Request could not be canonically encoded for digesting.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
