//! Error types for the LSA search core

use thiserror::Error;

/// Main error type for index build and query operations
#[derive(Debug, Error)]
pub enum LsaError {
    /// Invalid configuration or an index that cannot be built
    /// (bad rank, empty corpus, empty vocabulary, misuse of fit/transform)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Malformed query input at the boundary
    #[error("Query error: {0}")]
    Query(String),

    /// Vector or matrix dimensions do not line up
    #[error("Dimension error: {message}. Dimension: {dimension}, Expected: {expected}")]
    Dimension {
        /// Error message
        message: String,
        /// Actual dimension
        dimension: usize,
        /// Expected dimension
        expected: usize,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Convenient Result type using LsaError
pub type Result<T> = std::result::Result<T, LsaError>;

impl LsaError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        LsaError::Configuration(msg.into())
    }

    /// Create a query error
    pub fn query(msg: impl Into<String>) -> Self {
        LsaError::Query(msg.into())
    }

    /// Create a dimension error
    pub fn dimension(message: impl Into<String>, dimension: usize, expected: usize) -> Self {
        LsaError::Dimension {
            message: message.into(),
            dimension,
            expected,
        }
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        LsaError::Other(msg.into())
    }

    /// Whether this error is an internal dimension mismatch
    pub fn is_dimension(&self) -> bool {
        matches!(self, LsaError::Dimension { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = LsaError::config("empty corpus");
        assert_eq!(err.to_string(), "Configuration error: empty corpus");

        let err = LsaError::query("missing field 'query'");
        assert_eq!(err.to_string(), "Query error: missing field 'query'");
    }

    #[test]
    fn test_dimension_error_message() {
        let err = LsaError::dimension("query vector", 3, 5);
        assert!(err.is_dimension());
        assert_eq!(
            err.to_string(),
            "Dimension error: query vector. Dimension: 3, Expected: 5"
        );
    }

    #[test]
    fn test_result_type() {
        fn returns_result() -> Result<i32> {
            Ok(42)
        }

        assert_eq!(returns_result().unwrap(), 42);
    }
}
