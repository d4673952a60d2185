//! Targets, field descriptors, and the applicability filter.
//!
//! A target is a resolved buildable unit with declared fields. A checker
//! declares which fields it needs via a `FieldDescriptor`; the descriptor
//! decides applicability and extracts the checker-specific `Candidate` from
//! an applicable target. Whether a candidate actually has sources worth
//! checking is a separate question answered by the `SourcesProvider`
//! collaborator.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use verdict_engine::Candidate;

/// A resolved buildable unit.
///
/// Targets arrive from the external target-resolution collaborator; the
/// check goal only reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    /// Unique target address (e.g. `src/py/app:lib`).
    pub address: String,

    /// Declared field values keyed by field name.
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl Target {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Declare a field value.
    pub fn with_field(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }
}

/// The field set one checker kind requires of a target.
///
/// Replaces duck-typed field probing with an explicit contract:
/// `is_applicable` decides, `create` extracts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    required: Vec<String>,
}

impl FieldDescriptor {
    pub fn new(required: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            required: required.into_iter().map(Into::into).collect(),
        }
    }

    pub fn required_fields(&self) -> &[String] {
        &self.required
    }

    /// True iff the target declares every required field.
    pub fn is_applicable(&self, target: &Target) -> bool {
        self.required.iter().all(|field| target.has_field(field))
    }

    /// Extract the checker-specific candidate from an applicable target.
    ///
    /// Only the required fields are carried over; the checker never sees the
    /// rest of the target.
    pub fn create(&self, target: &Target) -> Candidate {
        let mut candidate = Candidate::new(target.address.clone());
        for field in &self.required {
            if let Some(value) = target.fields.get(field) {
                candidate = candidate.with_field(field.clone(), value.clone());
            }
        }
        candidate
    }
}

/// External predicate deciding whether a candidate has sources worth
/// checking. Candidates that fail it are pruned before dispatch.
#[async_trait]
pub trait SourcesProvider: Send + Sync {
    async fn has_sources(&self, candidate: &Candidate) -> bool;
}

/// Default provider: a candidate has sources iff its sources field is a
/// non-empty array or non-empty string.
#[derive(Debug, Clone)]
pub struct NonEmptySources {
    field: String,
}

impl NonEmptySources {
    pub fn new() -> Self {
        Self {
            field: "sources".to_string(),
        }
    }

    /// Judge a different field than `sources`.
    pub fn on_field(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }
}

impl Default for NonEmptySources {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourcesProvider for NonEmptySources {
    async fn has_sources(&self, candidate: &Candidate) -> bool {
        match candidate.fields.get(&self.field) {
            Some(serde_json::Value::Array(entries)) => !entries.is_empty(),
            Some(serde_json::Value::String(path)) => !path.is_empty(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn py_target(address: &str) -> Target {
        Target::new(address)
            .with_field("sources", json!(["app.py"]))
            .with_field("interpreter", json!("py3"))
    }

    #[test]
    fn applicable_when_all_required_fields_present() {
        let descriptor = FieldDescriptor::new(["sources", "interpreter"]);
        assert!(descriptor.is_applicable(&py_target("src/app:lib")));
    }

    #[test]
    fn not_applicable_when_a_field_is_missing() {
        let descriptor = FieldDescriptor::new(["sources", "compiler_flags"]);
        assert!(!descriptor.is_applicable(&py_target("src/app:lib")));
    }

    #[test]
    fn create_extracts_only_required_fields() {
        let descriptor = FieldDescriptor::new(["sources"]);
        let candidate = descriptor.create(&py_target("src/app:lib"));
        assert_eq!(candidate.address, "src/app:lib");
        assert!(candidate.fields.contains_key("sources"));
        assert!(!candidate.fields.contains_key("interpreter"));
    }

    #[tokio::test]
    async fn non_empty_sources_accepts_populated_arrays() {
        let provider = NonEmptySources::new();
        let candidate = Candidate::new("a").with_field("sources", json!(["app.py"]));
        assert!(provider.has_sources(&candidate).await);
    }

    #[tokio::test]
    async fn non_empty_sources_rejects_empty_and_missing() {
        let provider = NonEmptySources::new();
        let empty = Candidate::new("a").with_field("sources", json!([]));
        let missing = Candidate::new("b");
        assert!(!provider.has_sources(&empty).await);
        assert!(!provider.has_sources(&missing).await);
    }
}
