//! Domain-level error taxonomy for the check goal.

/// Configuration errors in the check goal.
///
/// These are all fail-fast: they surface when outcomes or registries are
/// constructed, never in the middle of a run.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("the `checker_name` argument is required")]
    MissingCheckerName,

    #[error("a checker named '{name}' is already registered")]
    DuplicateChecker { name: String },
}

/// Result type for check goal configuration.
pub type Result<T> = std::result::Result<T, CheckError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_error_display() {
        let err = CheckError::MissingCheckerName;
        assert!(err.to_string().contains("checker_name"));

        let err = CheckError::DuplicateChecker {
            name: "mypy".to_string(),
        };
        assert!(err.to_string().contains("mypy"));
    }
}
