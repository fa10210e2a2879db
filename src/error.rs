//! Error types for graphr
//!
//! Every fallible operation in the engine returns [`Result`]; the error
//! enum is the sole status channel. Variants map onto four classes:
//! precondition violations, state violations, capability gaps, and
//! execution failures reported by a backend.

use crate::dtype::DType;
use thiserror::Error;

/// Result type alias using graphr's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in graphr operations
#[derive(Error, Debug)]
pub enum Error {
    /// A caller-supplied argument violates a precondition
    #[error("Invalid argument '{arg}': {reason}")]
    InvalidArgument {
        /// The argument name
        arg: &'static str,
        /// Reason for invalidity
        reason: String,
    },

    /// Coordinate outside the container's dimensions
    #[error("Index {index} out of bounds for dimension of size {size}")]
    IndexOutOfBounds {
        /// The invalid index
        index: u32,
        /// Size of the dimension
        size: u32,
    },

    /// The container or engine is in a state that forbids the operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// No algorithm registered for the requested operation tuple
    #[error("Not implemented: no '{op}' algorithm for dtype {dtype}")]
    NotImplemented {
        /// The operation name as registered
        op: &'static str,
        /// Element type of the dispatch
        dtype: DType,
    },

    /// Unsupported dtype for an operation
    #[error("Unsupported dtype {dtype} for operation '{op}'")]
    UnsupportedDType {
        /// The unsupported dtype
        dtype: DType,
        /// The operation name
        op: &'static str,
    },

    /// Accelerator kernel source failed to compile
    #[error("Kernel compilation failed: {0}")]
    Compilation(String),

    /// The device rejected a launch or reported a fault
    #[error("Kernel execution failed: {0}")]
    Execution(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an invalid-argument error
    pub fn invalid_argument(arg: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            arg,
            reason: reason.into(),
        }
    }

    /// Create an invalid-state error
    pub fn invalid_state(reason: impl Into<String>) -> Self {
        Self::InvalidState(reason.into())
    }
}
