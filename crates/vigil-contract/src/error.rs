//! Contract error types.

use std::fmt;

/// Result type for contract operations.
pub type ContractResult<T> = Result<T, ContractError>;

/// Errors that can occur while loading a contract or resolving a route.
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    /// The contract document could not be read.
    #[error("failed to load contract document: {0}")]
    DocumentLoad(String),

    /// The contract document could not be parsed.
    #[error("failed to parse contract document: {0}")]
    DocumentParse(String),

    /// No documented operation matches the request.
    #[error("no documented operation matches {method} {path}")]
    OperationNotFound {
        /// HTTP method of the request.
        method: String,
        /// Request path.
        path: String,
    },

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A single conformance error found while checking a request or response.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Location of the error (e.g. `body.name`, `query.limit`).
    pub path: String,
    /// Error message.
    pub message: String,
}

impl ValidationError {
    /// Creates an error at the given location.
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates an error with no location (whole-message errors).
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            path: String::new(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

impl std::error::Error for ValidationError {}

/// A failed conformance check, aggregating every error found.
#[derive(Debug, Clone)]
pub struct ValidationFailure {
    /// Errors in detection order.
    pub errors: Vec<ValidationError>,
}

impl ValidationFailure {
    /// Wraps a list of errors. The list must be non-empty.
    pub fn new(errors: Vec<ValidationError>) -> Self {
        Self { errors }
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for error in &self.errors {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}", error)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationFailure {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_not_found_display() {
        let err = ContractError::OperationNotFound {
            method: "GET".to_string(),
            path: "/pets".to_string(),
        };
        assert!(err.to_string().contains("GET"));
        assert!(err.to_string().contains("/pets"));
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new("body.name", "missing required field 'name'");
        assert_eq!(err.to_string(), "body.name: missing required field 'name'");

        let err = ValidationError::message("request body is required");
        assert_eq!(err.to_string(), "request body is required");
    }

    #[test]
    fn test_validation_failure_joins_errors() {
        let failure = ValidationFailure::new(vec![
            ValidationError::new("body.id", "expected integer"),
            ValidationError::message("unexpected trailing data"),
        ]);
        assert_eq!(
            failure.to_string(),
            "body.id: expected integer; unexpected trailing data"
        );
    }
}
