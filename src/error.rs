//! Custom error types for tasktree.
//!
//! Every failure surfaces to the immediate caller; there is no retry layer.
//! Errors carry enough detail (offending ID, incomplete list, path) for the
//! caller to act without re-querying.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for tasktree operations
#[derive(Error, Debug)]
pub enum TrackerError {
    // =========================================================================
    // Lookup Errors
    // =========================================================================
    /// Referenced task, parent, or wave does not exist
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    // =========================================================================
    // Argument Errors
    // =========================================================================
    /// Operation invoked with an unsupported value
    #[error("Invalid {field}: {reason}")]
    InvalidArgument { field: String, reason: String },

    /// Operation refused because its precondition does not hold
    #[error("Cannot complete {task_id}: {message} (incomplete: {})", incomplete.join(", "))]
    PreconditionFailed {
        task_id: String,
        message: String,
        incomplete: Vec<String>,
    },

    /// Dependency edges form a cycle, so no execution order exists
    #[error("Dependency cycle among tasks: {}", task_ids.join(", "))]
    DependencyCycle { task_ids: Vec<String> },

    // =========================================================================
    // Storage Errors
    // =========================================================================
    /// Reading or writing a document failed
    #[error("Storage error at {path}: {message}")]
    Storage { path: PathBuf, message: String },

    /// A document exists but is not valid JSON for its schema
    #[error("Malformed document {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    // =========================================================================
    // Wrapped Errors
    // =========================================================================
    /// JSON error wrapper
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl TrackerError {
    // =========================================================================
    // Constructor helpers
    // =========================================================================

    /// Create a not-found error for a task ID
    pub fn task_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "Task",
            id: id.into(),
        }
    }

    /// Create a not-found error for a parent task ID
    pub fn parent_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "Parent task",
            id: id.into(),
        }
    }

    /// Create a not-found error for a wave number
    pub fn wave_not_found(wave: u32) -> Self {
        Self::NotFound {
            kind: "Wave",
            id: wave.to_string(),
        }
    }

    /// Create an invalid-argument error
    pub fn invalid_argument(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a precondition failure carrying the incomplete IDs
    pub fn precondition(
        task_id: impl Into<String>,
        message: impl Into<String>,
        incomplete: Vec<String>,
    ) -> Self {
        Self::PreconditionFailed {
            task_id: task_id.into(),
            message: message.into(),
            incomplete,
        }
    }

    /// Create a storage error for a path
    pub fn storage(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Storage {
            path: path.into(),
            message: message.into(),
        }
    }

    // =========================================================================
    // Classification helpers
    // =========================================================================

    /// Check if this error is a lookup miss
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// IDs reported by a precondition failure, empty for other errors
    pub fn incomplete_tasks(&self) -> &[String] {
        match self {
            Self::PreconditionFailed { incomplete, .. } => incomplete,
            _ => &[],
        }
    }

    /// Get error code for exit status
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidArgument { .. } => 2,
            Self::NotFound { .. } => 3,
            Self::PreconditionFailed { .. } => 4,
            Self::Storage { .. } | Self::Parse { .. } => 5,
            Self::DependencyCycle { .. } => 6,
            Self::Json(_) => 1,
        }
    }
}

/// Type alias for tasktree results
pub type Result<T> = std::result::Result<T, TrackerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = TrackerError::task_not_found("1.2.3");
        assert_eq!(err.to_string(), "Task 1.2.3 not found");
        assert!(err.is_not_found());

        let err = TrackerError::parent_not_found("9");
        assert_eq!(err.to_string(), "Parent task 9 not found");
    }

    #[test]
    fn test_precondition_lists_incomplete() {
        let err = TrackerError::precondition(
            "1.1",
            "descendants are not completed",
            vec!["1.1.2".into(), "1.1.3".into()],
        );
        assert!(err.to_string().contains("1.1.2, 1.1.3"));
        assert_eq!(err.incomplete_tasks(), ["1.1.2", "1.1.3"]);
    }

    #[test]
    fn test_incomplete_tasks_empty_for_other_errors() {
        let err = TrackerError::invalid_argument("level", "must be 1 or 2");
        assert!(err.incomplete_tasks().is_empty());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(TrackerError::invalid_argument("x", "y").exit_code(), 2);
        assert_eq!(TrackerError::task_not_found("1").exit_code(), 3);
        assert_eq!(
            TrackerError::precondition("1", "m", Vec::new()).exit_code(),
            4
        );
        assert_eq!(TrackerError::storage("/tmp/x", "denied").exit_code(), 5);
        assert_eq!(
            TrackerError::DependencyCycle {
                task_ids: vec!["1".into()]
            }
            .exit_code(),
            6
        );
    }
}
