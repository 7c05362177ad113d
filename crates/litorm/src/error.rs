//! Error types for litorm

use crate::value::ValueKind;
use thiserror::Error;

/// Result type alias for litorm operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for schema, builder, engine and decode failures
#[derive(Debug, Clone, Error)]
pub enum OrmError {
    /// Malformed or conflicting schema descriptor
    #[error("Schema error on table '{table}': {message}")]
    Schema { table: String, message: String },

    /// Statement assembled in an invalid state (raised before any I/O)
    #[error("Builder error: {0}")]
    Builder(String),

    /// Raw engine failure, carrying the engine's own diagnostic text
    #[error("Engine error: {reason}")]
    Engine {
        /// Extended SQLite result code, when the engine reported one.
        code: Option<i32>,
        reason: String,
    },

    /// Storage could not be opened or configured
    #[error("Connection error: {0}")]
    Connection(String),

    /// Value present but of the wrong kind for the target type
    #[error("Type mismatch on column '{column}': expected {expected}, found {actual}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        actual: ValueKind,
    },

    /// NULL decoded into a non-optional target
    #[error("Unexpected NULL in column '{column}'")]
    UnexpectedNull { column: String },

    /// Declared column absent from the row
    #[error("Missing column '{table}.{column}' in row")]
    MissingColumn { table: String, column: String },

    /// Value of the right kind that could not be converted (range, parse)
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),
}

impl OrmError {
    /// Create a schema error for a table
    pub fn schema(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create a builder error
    pub fn builder(message: impl Into<String>) -> Self {
        Self::Builder(message.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// The engine's diagnostic text, if this is an engine error
    pub fn engine_reason(&self) -> Option<&str> {
        match self {
            Self::Engine { reason, .. } => Some(reason),
            _ => None,
        }
    }

    /// Check if the engine rejected the statement for a constraint violation
    pub fn is_constraint_violation(&self) -> bool {
        // SQLITE_CONSTRAINT and all of its extended codes share the low byte 19.
        matches!(self, Self::Engine { code: Some(code), .. } if code & 0xff == 19)
    }

    /// Check if the engine reported SQLITE_BUSY or SQLITE_LOCKED
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Engine { code: Some(code), .. } if matches!(code & 0xff, 5 | 6))
    }

    /// Check if this is a decode-time error
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            Self::TypeMismatch { .. }
                | Self::UnexpectedNull { .. }
                | Self::MissingColumn { .. }
                | Self::Decode { .. }
        )
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Convert a rusqlite error into an engine error, keeping the raw reason
    pub fn from_engine_error(err: rusqlite::Error) -> Self {
        let code = match &err {
            rusqlite::Error::SqliteFailure(ffi_err, _) => Some(ffi_err.extended_code),
            _ => None,
        };
        Self::Engine {
            code,
            reason: err.to_string(),
        }
    }
}

impl From<rusqlite::Error> for OrmError {
    fn from(err: rusqlite::Error) -> Self {
        Self::from_engine_error(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_codes_are_detected_by_primary_code() {
        // SQLITE_CONSTRAINT_FOREIGNKEY
        let err = OrmError::Engine {
            code: Some(787),
            reason: "FOREIGN KEY constraint failed".into(),
        };
        assert!(err.is_constraint_violation());
        assert!(!err.is_busy());
    }

    #[test]
    fn busy_codes_are_detected() {
        let err = OrmError::Engine {
            code: Some(5),
            reason: "database is locked".into(),
        };
        assert!(err.is_busy());
        assert_eq!(err.engine_reason(), Some("database is locked"));
    }

    #[test]
    fn decode_errors_name_the_column() {
        let err = OrmError::MissingColumn {
            table: "planet".into(),
            column: "name".into(),
        };
        assert!(err.is_decode());
        assert_eq!(err.to_string(), "Missing column 'planet.name' in row");
    }
}
