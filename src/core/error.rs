//! Error handling and error types for pairboost.
//!
//! This module provides the crate-wide error type using Rust's Result
//! system, ensuring clear error propagation throughout the split-search
//! pipeline.

use thiserror::Error;

/// Main error type for the pairboost library.
///
/// Precondition and readiness violations are programming-contract errors:
/// immediate, local and non-retryable. They indicate caller misuse, not a
/// transient failure, and should abort the current split-search attempt.
#[derive(Error, Debug)]
pub enum PairBoostError {
    /// A policy-keyed accessor was called for a policy with no assigned
    /// features. Recoverable by checking `has_engine_for_policy` first.
    #[error("Precondition violated: {message}")]
    Precondition { message: String },

    /// Results were requested before `compute()` populated them.
    #[error("Results not ready: {message}")]
    NotReady { message: String },

    /// Configuration and validation errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Invalid input parameters
    #[error("Invalid parameter: {parameter} = {value}, {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },

    /// Dataset-related errors (malformed features, subsets, or pairs)
    #[error("Dataset error: {message}")]
    Dataset { message: String },

    /// Dimension mismatch errors
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: String, actual: String },

    /// Internal library errors (should not occur in normal usage)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Type alias for Results using PairBoostError
pub type Result<T> = std::result::Result<T, PairBoostError>;

impl PairBoostError {
    /// Create a precondition error
    pub fn precondition<S: Into<String>>(message: S) -> Self {
        PairBoostError::Precondition {
            message: message.into(),
        }
    }

    /// Create a not-ready error
    pub fn not_ready<S: Into<String>>(message: S) -> Self {
        PairBoostError::NotReady {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        PairBoostError::Config {
            message: message.into(),
        }
    }

    /// Create a dataset error
    pub fn dataset<S: Into<String>>(message: S) -> Self {
        PairBoostError::Dataset {
            message: message.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter<P, V, R>(parameter: P, value: V, reason: R) -> Self
    where
        P: Into<String>,
        V: Into<String>,
        R: Into<String>,
    {
        PairBoostError::InvalidParameter {
            parameter: parameter.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a dimension mismatch error
    pub fn dimension_mismatch<E, A>(expected: E, actual: A) -> Self
    where
        E: Into<String>,
        A: Into<String>,
    {
        PairBoostError::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an internal error (should be used sparingly)
    pub fn internal<S: Into<String>>(message: S) -> Self {
        PairBoostError::Internal {
            message: message.into(),
        }
    }

    /// Get error category for logging and diagnostics
    pub fn category(&self) -> &'static str {
        match self {
            PairBoostError::Precondition { .. } => "precondition",
            PairBoostError::NotReady { .. } => "not_ready",
            PairBoostError::Config { .. } => "config",
            PairBoostError::InvalidParameter { .. } => "invalid_parameter",
            PairBoostError::Dataset { .. } => "dataset",
            PairBoostError::DimensionMismatch { .. } => "dimension_mismatch",
            PairBoostError::Internal { .. } => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = PairBoostError::precondition("no engine for policy");
        assert_eq!(err.category(), "precondition");

        let err = PairBoostError::not_ready("compute() has not run");
        assert_eq!(err.category(), "not_ready");
    }

    #[test]
    fn test_error_display() {
        let err = PairBoostError::invalid_parameter("l2_reg", "-1", "must be positive");
        let error_string = format!("{}", err);
        assert!(error_string.contains("l2_reg"));
        assert!(error_string.contains("must be positive"));
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = PairBoostError::dimension_mismatch("8 leaves", "4 leaves");
        assert_eq!(err.category(), "dimension_mismatch");
        assert!(format!("{}", err).contains("expected 8 leaves"));
    }
}
