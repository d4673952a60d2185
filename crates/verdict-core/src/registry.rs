//! The checker registry: a capability table of pluggable backends.
//!
//! Checker kinds are registered independently at process start; the goal has
//! no compile-time knowledge of how many or which kinds exist. Dispatch is a
//! walk over this table, not dynamic type inspection.

use std::collections::HashSet;
use std::sync::Arc;

use verdict_engine::{Candidate, CheckRequest};

use crate::error::{CheckError, Result};
use crate::target::FieldDescriptor;

/// One pluggable checker kind.
///
/// A backend supplies its identity, its field requirements, and a request
/// builder. It never executes anything itself; execution belongs to the task
/// engine.
pub trait CheckerBackend: Send + Sync {
    fn name(&self) -> &str;

    fn field_descriptor(&self) -> &FieldDescriptor;

    /// Build the invocation request for this run's applicable candidates.
    fn build_request(&self, candidates: Vec<Candidate>) -> CheckRequest {
        CheckRequest::new(self.name(), candidates)
    }
}

/// Checker kind declared by name and field requirements alone, with the
/// default request builder. Sufficient for command-configured backends.
#[derive(Debug, Clone)]
pub struct ConfiguredChecker {
    name: String,
    descriptor: FieldDescriptor,
}

impl ConfiguredChecker {
    pub fn new(name: impl Into<String>, descriptor: FieldDescriptor) -> Self {
        Self {
            name: name.into(),
            descriptor,
        }
    }
}

impl CheckerBackend for ConfiguredChecker {
    fn name(&self) -> &str {
        &self.name
    }

    fn field_descriptor(&self) -> &FieldDescriptor {
        &self.descriptor
    }
}

/// Name-keyed union of registered checker kinds.
///
/// Registration happens once, before any run; the registry is immutable
/// thereafter. Iteration order is insertion order, though nothing downstream
/// depends on it: output ordering is always re-derived from checker names.
#[derive(Default)]
pub struct CheckerRegistry {
    backends: Vec<Arc<dyn CheckerBackend>>,
    names: HashSet<String>,
}

impl CheckerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a checker kind. Duplicate names are a configuration error.
    pub fn register(&mut self, backend: Arc<dyn CheckerBackend>) -> Result<()> {
        let name = backend.name().to_string();
        if name.is_empty() {
            return Err(CheckError::MissingCheckerName);
        }
        if !self.names.insert(name.clone()) {
            return Err(CheckError::DuplicateChecker { name });
        }
        self.backends.push(backend);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn CheckerBackend>> {
        self.backends.iter()
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}
