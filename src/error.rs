//! Error types for packgl

use thiserror::Error;

/// Result type alias using packgl's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building kernel parameters or driving a harness
///
/// Synthesis itself never fails: every variant here is raised either at a
/// parameter constructor, before any shader text is produced, or by the
/// harness layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Shape mismatch between operands
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Expected shape
        expected: Vec<i32>,
        /// Actual shape
        got: Vec<i32>,
    },

    /// Batch dimensions cannot be broadcast together
    #[error("Cannot broadcast batch dimensions {lhs:?} and {rhs:?}")]
    BroadcastError {
        /// Left-hand side shape
        lhs: Vec<i32>,
        /// Right-hand side shape
        rhs: Vec<i32>,
    },

    /// Invalid argument provided to a parameter constructor
    #[error("Invalid argument '{arg}': {reason}")]
    InvalidArgument {
        /// The argument name
        arg: &'static str,
        /// Reason for invalidity
        reason: String,
    },

    /// Packed convolution only has fetch strategies for strides 1 and 2
    #[error("Unsupported stride width {stride} for packed convolution (supported: 1, 2)")]
    UnsupportedStride {
        /// The rejected stride width
        stride: i32,
    },

    /// Uniform values do not match the uniforms a program declares
    #[error("Uniform '{name}' mismatch: {reason}")]
    UniformMismatch {
        /// Uniform name
        name: String,
        /// Description of the mismatch
        reason: String,
    },

    /// Failure reported by a kernel harness (compile or run)
    #[error("Harness error: {0}")]
    Harness(String),

    /// Synthesized program violates an internal invariant
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a shape mismatch error
    pub fn shape_mismatch(expected: &[i32], got: &[i32]) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_vec(),
            got: got.to_vec(),
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(arg: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            arg,
            reason: reason.into(),
        }
    }

    /// Create a uniform mismatch error
    pub fn uniform_mismatch(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UniformMismatch {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
