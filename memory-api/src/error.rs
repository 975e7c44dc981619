//! Surface-boundary error taxonomy . Library crates below this
//! one report their own narrower error enums; this is where they get
//! mapped onto both a JSON-RPC error code and an HTTP status code so the
//! two surfaces agree on meaning even though they disagree on shape.

use std::fmt;

use memory_core::MemoryError;

#[derive(Debug)]
pub enum ApiError {
    Validation { field: String, reason: String },
    NotFound,
    Conflict(String),
    Authentication(String),
    Database(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation { field, reason } => write!(f, "validation failed for {field}: {reason}"),
            Self::NotFound => write!(f, "not found"),
            Self::Conflict(msg) => write!(f, "conflict: {msg}"),
            Self::Authentication(msg) => write!(f, "authentication failed: {msg}"),
            Self::Database(_) => write!(f, "internal error"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<MemoryError> for ApiError {
    fn from(e: MemoryError) -> Self {
        match e {
            MemoryError::Validation { field, reason } => Self::Validation { field, reason },
            MemoryError::NotFound => Self::NotFound,
            MemoryError::Database { operation, source } => {
                tracing::error!(operation = %operation, error = %source, "database error");
                Self::Database(format!("{operation}: {source}"))
            }
        }
    }
}

/// JSON-RPC 2.0 standard error codes.
pub mod jsonrpc_code {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
}

impl ApiError {
    pub fn jsonrpc_code(&self) -> i64 {
        match self {
            Self::Validation { .. } => jsonrpc_code::INVALID_PARAMS,
            Self::NotFound => jsonrpc_code::INVALID_PARAMS,
            Self::Conflict(_) => jsonrpc_code::INVALID_PARAMS,
            Self::Authentication(_) => jsonrpc_code::INTERNAL_ERROR,
            Self::Database(_) => jsonrpc_code::INTERNAL_ERROR,
        }
    }

    /// Message surfaced verbatim to the caller. Database errors never
    /// leak their internals (propagation policy).
    pub fn public_message(&self) -> String {
        match self {
            Self::Database(_) => "internal error".to_string(),
            other => other.to_string(),
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            Self::Validation { .. } => 400,
            Self::NotFound => 404,
            Self::Conflict(_) => 409,
            Self::Authentication(_) => 401,
            Self::Database(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_errors_never_leak_internals() {
        let err = ApiError::Database("pq: relation \"memories\" does not exist".to_string());
        assert_eq!(err.public_message(), "internal error");
    }

    #[test]
    fn not_found_maps_to_404() {
        assert_eq!(ApiError::NotFound.http_status(), 404);
    }

    #[test]
    fn memory_error_validation_converts() {
        let err: ApiError = MemoryError::validation("content", "must not be empty").into();
        assert!(matches!(err, ApiError::Validation { .. }));
        assert_eq!(err.http_status(), 400);
    }
}
