//! Error taxonomy for the memory store (: kinds, not concrete
//! per-database types).

use std::fmt;

#[derive(Debug)]
pub enum MemoryError {
    /// Caller-supplied input fails schema or enumeration checks. The
    /// `field` names the offending input.
    Validation { field: String, reason: String },
    /// Target entity does not exist or does not belong to the caller.
    NotFound,
    /// Operation-level failure from the store, wrapped with the
    /// operation name that was in flight.
    Database { operation: String, source: String },
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation { field, reason } => {
                write!(f, "validation failed for {field}: {reason}")
            }
            Self::NotFound => write!(f, "memory not found"),
            Self::Database { operation, source } => {
                write!(f, "database error during {operation}: {source}")
            }
        }
    }
}

impl std::error::Error for MemoryError {}

impl MemoryError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation { field: field.into(), reason: reason.into() }
    }

    pub fn database(operation: impl Into<String>, source: impl fmt::Display) -> Self {
        Self::Database { operation: operation.into(), source: source.to_string() }
    }
}

impl From<sqlx::Error> for MemoryError {
    fn from(e: sqlx::Error) -> Self {
        Self::database("query", e)
    }
}
