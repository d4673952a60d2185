//! In-memory fakes for the task engine (testing only)
//!
//! Provides `StaticEngine`, which resolves requests from canned outcomes
//! without spawning processes. Per-checker delays let tests permute
//! completion order; per-checker failures let tests exercise engine aborts.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{EngineError, EngineResult};
use crate::request::{CheckRequest, ExecutionOutcome, ProcessOutcome, TaskEngine};

/// Canned-outcome engine backed by a `HashMap<checker name, outcome>`.
#[derive(Debug, Default)]
pub struct StaticEngine {
    outcomes: Mutex<HashMap<String, ExecutionOutcome>>,
    delays: Mutex<HashMap<String, Duration>>,
    failures: Mutex<HashMap<String, String>>,
}

impl StaticEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Can the given partitions as the outcome for a checker name.
    pub fn insert(&self, name: impl Into<String>, partitions: Vec<ProcessOutcome>) {
        self.outcomes
            .lock()
            .unwrap()
            .insert(name.into(), ExecutionOutcome::new(partitions));
    }

    /// Delay resolution of a checker's request, so tests can force a
    /// completion order different from dispatch order.
    pub fn delay(&self, name: impl Into<String>, delay: Duration) {
        self.delays.lock().unwrap().insert(name.into(), delay);
    }

    /// Make a checker's request fail at the engine level with a spawn error.
    pub fn fail(&self, name: impl Into<String>, message: impl Into<String>) {
        self.failures
            .lock()
            .unwrap()
            .insert(name.into(), message.into());
    }
}

#[async_trait]
impl TaskEngine for StaticEngine {
    async fn execute(&self, request: &CheckRequest) -> EngineResult<ExecutionOutcome> {
        let delay = self
            .delays
            .lock()
            .unwrap()
            .get(&request.checker_name)
            .copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(message) = self.failures.lock().unwrap().get(&request.checker_name) {
            return Err(EngineError::Spawn {
                name: request.checker_name.clone(),
                command: "<fake>".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::Other, message.clone()),
            });
        }

        self.outcomes
            .lock()
            .unwrap()
            .get(&request.checker_name)
            .cloned()
            .ok_or_else(|| EngineError::UnknownChecker {
                name: request.checker_name.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serves_canned_outcomes_by_name() {
        let engine = StaticEngine::new();
        engine.insert("mypy", vec![ProcessOutcome::new(0, "clean", "")]);

        let outcome = engine
            .execute(&CheckRequest::new("mypy", vec![]))
            .await
            .unwrap();
        assert_eq!(outcome.partitions[0].stdout, "clean");
    }

    #[tokio::test]
    async fn unknown_name_errors() {
        let engine = StaticEngine::new();
        let err = engine
            .execute(&CheckRequest::new("ghost", vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownChecker { .. }));
    }

    #[tokio::test]
    async fn configured_failure_surfaces_as_engine_error() {
        let engine = StaticEngine::new();
        engine.insert("mypy", vec![]);
        engine.fail("mypy", "sandbox unavailable");

        let err = engine
            .execute(&CheckRequest::new("mypy", vec![]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("mypy"));
    }
}
