//! Error types for `todo_core`.

use crate::todo::validate::ValidationErrors;

/// Errors that can occur in the task-tracking core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// One or more fields failed validation on create or update.
    ///
    /// Carries every violation found, not just the first one.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// An operation referenced an id that is not in the collection.
    #[error("todo not found: {0}")]
    NotFound(String),

    /// A durable write failed. Wraps the underlying storage failure.
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// An import payload did not have the expected top-level shape.
    #[error("invalid import data: {0}")]
    InvalidData(String),

    /// A state transition the item state machine does not define,
    /// such as toggling an archived item.
    #[error("unsupported transition: {0}")]
    UnsupportedTransition(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON serialization or parsing error occurred.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A `SQLite` database error occurred.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl Error {
    /// Wrap an underlying failure as a storage error.
    pub fn storage(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Storage(Box::new(source))
    }
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::todo::validate::ValidationIssue;

    #[test]
    fn test_not_found_display() {
        let err = Error::NotFound("todo-0001".to_string());
        assert_eq!(err.to_string(), "todo not found: todo-0001");
    }

    #[test]
    fn test_validation_display_lists_issues() {
        let errors = ValidationErrors::new(vec![
            ValidationIssue::new("text", "must not be empty"),
            ValidationIssue::new("description", "exceeds 1000 characters"),
        ]);
        let err = Error::Validation(errors);
        let message = err.to_string();
        assert!(message.contains("text: must not be empty"));
        assert!(message.contains("description: exceeds 1000 characters"));
    }

    #[test]
    fn test_storage_wraps_source() {
        let inner = std::io::Error::other("disk full");
        let err = Error::storage(inner);
        assert!(err.to_string().contains("disk full"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_json_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
