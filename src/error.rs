//! Error types for key estimation

use thiserror::Error;

/// Errors that can occur during key estimation
///
/// Every variant carries a caller-facing message. Failures are local to one
/// estimation call and never leave shared state behind.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// Empty or malformed audio segment (nothing left after trimming,
    /// zero sample rate, non-finite samples, inverted time bounds)
    #[error("Invalid segment: {0}")]
    InvalidSegment(String),

    /// The chromagram carries no usable energy, so correlation is undefined
    #[error("Indeterminate key: {0}")]
    IndeterminateKey(String),

    /// Invalid configuration or malformed intermediate data
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl AnalysisError {
    /// True when retrying with a longer or louder segment may succeed
    pub fn is_indeterminate(&self) -> bool {
        matches!(self, AnalysisError::IndeterminateKey(_))
    }
}
