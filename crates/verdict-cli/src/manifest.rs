//! The run manifest: targets and checker configuration for one invocation.
//!
//! Target discovery and option registration live outside this tool; the
//! manifest is the resolved form both hand over. It names the buildable
//! units with their field values and the checker backends with their
//! commands.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use verdict_core::{CheckerRegistry, ConfiguredChecker, FieldDescriptor, Target};
use verdict_engine::{CheckerCommand, LocalProcessEngine};

/// One resolved buildable unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetSpec {
    pub address: String,

    #[serde(default)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

/// One checker backend: identity, field requirements, and command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckerSpec {
    pub name: String,

    /// Fields a target must declare for this checker to apply.
    pub required_fields: Vec<String>,

    /// Command to execute; candidate addresses are appended.
    pub argv: Vec<String>,

    /// Field to partition candidates by, if any.
    #[serde(default)]
    pub partition_by: Option<String>,

    /// Per-partition timeout in seconds; 0 means none.
    #[serde(default)]
    pub timeout_secs: u64,
}

/// A full run manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub targets: Vec<TargetSpec>,
    pub checkers: Vec<CheckerSpec>,
}

impl RunManifest {
    /// Load a manifest from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read manifest {path:?}"))?;
        serde_json::from_str(&raw).with_context(|| format!("parse manifest {path:?}"))
    }

    /// The resolved target set.
    pub fn to_targets(&self) -> Vec<Target> {
        self.targets
            .iter()
            .map(|spec| Target {
                address: spec.address.clone(),
                fields: spec.fields.clone(),
            })
            .collect()
    }

    /// Build the checker registry declared by this manifest.
    pub fn build_registry(&self) -> Result<CheckerRegistry> {
        let mut registry = CheckerRegistry::new();
        for spec in &self.checkers {
            registry
                .register(Arc::new(ConfiguredChecker::new(
                    spec.name.clone(),
                    FieldDescriptor::new(spec.required_fields.clone()),
                )))
                .with_context(|| format!("register checker '{}'", spec.name))?;
        }
        Ok(registry)
    }

    /// Build the local engine with one command template per checker.
    pub fn build_engine(&self) -> LocalProcessEngine {
        let mut engine = LocalProcessEngine::new();
        for spec in &self.checkers {
            let mut command = CheckerCommand::new(spec.argv.clone());
            if let Some(field) = &spec.partition_by {
                command = command.partitioned_by(field.clone());
            }
            if spec.timeout_secs > 0 {
                command = command.with_timeout(spec.timeout_secs);
            }
            engine.register(spec.name.clone(), command);
        }
        engine
    }
}
