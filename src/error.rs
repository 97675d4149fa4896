//! Error taxonomy for table access.

use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by every accessor operation.
#[derive(Debug, Error)]
pub enum TableError {
    /// Missing or invalid `name`/`path` at open time.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A request or descriptor failed its shape checks; nothing was executed.
    #[error("invalid data object for {operation}: {reason}")]
    Validation {
        operation: &'static str,
        reason: String,
    },

    /// The database engine rejected the statement.
    #[error("database error: {0}")]
    Engine(#[from] rusqlite::Error),

    #[error("failed to prepare database directory {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The blocking task running the statement panicked or was cancelled.
    #[error("database task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl TableError {
    pub(crate) fn validation(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            operation,
            reason: reason.into(),
        }
    }

    /// True when the error was raised before the engine was touched.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

pub type Result<T> = std::result::Result<T, TableError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_names_operation() {
        let err = TableError::validation("update_where", "no columns to set");
        assert!(err.is_validation());
        assert_eq!(
            err.to_string(),
            "invalid data object for update_where: no columns to set"
        );
    }

    #[test]
    fn engine_errors_convert() {
        let err: TableError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(!err.is_validation());
        assert!(err.to_string().starts_with("database error"));
    }
}
