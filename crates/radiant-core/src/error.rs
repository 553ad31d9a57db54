//! Error taxonomy shared by every core operation.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the numeric core.
///
/// Validation always happens before any output buffer is allocated, so an
/// `Err` never comes with a partially built result.
#[derive(Debug, Error)]
pub enum Error {
    /// Empty buffers, non-positive dimensions or out-of-range parameters.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Wrong channel count or bit depth for a 16-bit grayscale operation.
    #[error("unsupported format: expected 1-channel 16-bit, got {channels}-channel {bit_depth}-bit")]
    FormatError { channels: u8, bit_depth: u8 },

    /// Two fields that must be compared have different dimensions.
    #[error("shape mismatch: expected {}x{}, got {}x{}", expected.0, expected.1, actual.0, actual.1)]
    ShapeMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    /// The metric is undefined for this input (e.g. a single-pixel field).
    #[error("degenerate input: {0}")]
    DegenerateInput(String),

    /// An unexpected internal fault, wrapped with the stage it happened in.
    #[error("{context}: {message}")]
    ComputationFailure { context: String, message: String },

    /// A configuration file could not be read, parsed or written.
    #[error("config {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    /// A caller raised the cancel flag; the run stopped at a stage boundary.
    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }

    pub(crate) fn failure(context: impl Into<String>, message: impl ToString) -> Self {
        Error::ComputationFailure {
            context: context.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch_message() {
        let err = Error::ShapeMismatch {
            expected: (4, 4),
            actual: (4, 5),
        };
        assert_eq!(err.to_string(), "shape mismatch: expected 4x4, got 4x5");
    }

    #[test]
    fn test_format_error_message() {
        let err = Error::FormatError {
            channels: 3,
            bit_depth: 8,
        };
        assert!(err.to_string().contains("3-channel 8-bit"));
    }

    #[test]
    fn test_failure_wraps_context() {
        let err = Error::failure("building thread pool", "no threads");
        assert_eq!(err.to_string(), "building thread pool: no threads");
    }
}
