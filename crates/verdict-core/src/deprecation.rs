//! One-time deprecation warnings.
//!
//! Deprecations are non-fatal and never affect a run's exit code; they
//! surface once per process on the warning channel, with the version the
//! deprecated entity disappears in.

use std::collections::HashSet;
use std::sync::{Mutex, OnceLock};

use tracing::warn;

static WARNED: OnceLock<Mutex<HashSet<String>>> = OnceLock::new();

/// Warn about a deprecated entity, once per process.
///
/// Returns true when the warning was actually emitted (first call for this
/// entity), false on repeats.
pub fn warn_once(entity: &str, removal_version: &str, hint: &str) -> bool {
    let warned = WARNED.get_or_init(|| Mutex::new(HashSet::new()));
    let newly = warned.lock().unwrap().insert(entity.to_string());
    if newly {
        warn!(
            removal_version = %removal_version,
            "DEPRECATED: {entity} will be removed in {removal_version}. {hint}"
        );
    }
    newly
}
