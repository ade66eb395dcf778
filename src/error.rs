/// Structured error types for the record stores.
///
/// The library returns `StoreError`; the binaries wrap it in `anyhow`
/// and add context at the call site.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for contact and expense store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// A required field is missing or could not be coerced
    #[error("{message}")]
    Validation { field: String, message: String },

    /// The action needs a selected record but none (or a stale one) was given
    #[error("Please select a {record} to {action}")]
    Selection { record: String, action: String },

    /// A persisted line or stored value is malformed
    #[error("Malformed record at line {line}: {reason}")]
    Parse { line: usize, reason: String },

    /// A value read back from storage has the wrong shape
    #[error("Stored {field} {value:?} is malformed: {reason}")]
    BadValue {
        field: String,
        value: String,
        reason: String,
    },

    /// I/O operation failed
    #[error("I/O error on {path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },

    /// SQLite operation failed
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// CSV reading or writing failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration error
    #[error("Configuration error: {reason}")]
    Config { reason: String },
}

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    /// Create a validation error for one field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a selection error, e.g. `selection("contact", "update")`
    pub fn selection(record: impl Into<String>, action: impl Into<String>) -> Self {
        Self::Selection {
            record: record.into(),
            action: action.into(),
        }
    }

    /// Create a parse error (line numbers are 1-based)
    pub fn parse(line: usize, reason: impl Into<String>) -> Self {
        Self::Parse {
            line,
            reason: reason.into(),
        }
    }

    /// Create an error for a stored value that fails to parse
    pub fn bad_value(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::BadValue {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a config error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Title of the notification shown for this error
    pub fn title(&self) -> &'static str {
        match self {
            StoreError::Validation { .. } => "Input Error",
            StoreError::Selection { .. } => "Selection Error",
            StoreError::Parse { .. } | StoreError::BadValue { .. } => "Parse Error",
            StoreError::Config { .. } => "Configuration Error",
            StoreError::Io { .. } | StoreError::Sqlite(_) | StoreError::Csv(_) => "Storage Error",
        }
    }

    /// True for errors caused by user input rather than storage
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            StoreError::Validation { .. } | StoreError::Selection { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::selection("contact", "update");
        assert_eq!(err.to_string(), "Please select a contact to update");

        let err = StoreError::parse(3, "missing ': ' separator");
        assert_eq!(
            err.to_string(),
            "Malformed record at line 3: missing ': ' separator"
        );
    }

    #[test]
    fn test_bad_value_names_the_value_not_a_line() {
        let err = StoreError::bad_value("date", "01/02/2024", "input contains invalid characters");
        assert_eq!(
            err.to_string(),
            "Stored date \"01/02/2024\" is malformed: input contains invalid characters"
        );
        assert!(!err.is_user_error());
    }

    #[test]
    fn test_titles() {
        assert_eq!(
            StoreError::validation("name", "Please enter both name and phone number").title(),
            "Input Error"
        );
        assert_eq!(StoreError::selection("contact", "remove").title(), "Selection Error");
        assert_eq!(StoreError::parse(1, "bad").title(), "Parse Error");
        assert_eq!(StoreError::bad_value("date", "x", "bad").title(), "Parse Error");
    }

    #[test]
    fn test_user_error_classification() {
        assert!(StoreError::validation("amount", "bad").is_user_error());
        assert!(StoreError::selection("contact", "remove").is_user_error());
        assert!(!StoreError::parse(1, "bad").is_user_error());
        assert!(!StoreError::config("bad").is_user_error());
    }

    #[test]
    fn test_sqlite_error_conversion() {
        let err: StoreError = rusqlite::Error::InvalidQuery.into();
        assert!(matches!(err, StoreError::Sqlite(_)));
        assert_eq!(err.title(), "Storage Error");
    }
}
