//! Error types for argreduce

use crate::dtype::DType;
use thiserror::Error;

/// Result type alias using argreduce's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while planning or launching an arg-reduction
///
/// Every error is raised on the host before any core starts running; device
/// code has no error path.
#[derive(Error, Debug)]
pub enum Error {
    /// Shape mismatch between data and declared shape
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Expected shape
        expected: Vec<usize>,
        /// Actual shape
        got: Vec<usize>,
    },

    /// Invalid dimension index
    #[error("Invalid dimension {dim} for tensor with {ndim} dimensions")]
    InvalidDimension {
        /// The invalid dimension
        dim: isize,
        /// Number of dimensions
        ndim: usize,
    },

    /// Unsupported dtype for an operation
    #[error("Unsupported dtype {dtype:?} for operation '{op}'")]
    UnsupportedDType {
        /// The unsupported dtype
        dtype: DType,
        /// The operation name
        op: &'static str,
    },

    /// Tensor accessed with a dtype other than its own
    #[error("DType mismatch: tensor holds {expected:?}, requested {got:?}")]
    DTypeMismatch {
        /// Dtype stored in the tensor
        expected: DType,
        /// Dtype requested by the caller
        got: DType,
    },

    /// Invalid argument provided to an operation
    #[error("Invalid argument '{arg}': {reason}")]
    InvalidArgument {
        /// The argument name
        arg: &'static str,
        /// Reason for invalidity
        reason: String,
    },

    /// A platform property could not be queried
    #[error("Failed to query platform {property}: {reason}")]
    PlatformQuery {
        /// The property being queried
        property: &'static str,
        /// Why the query failed
        reason: String,
    },

    /// Backend-specific error (worker pool construction, launch limits)
    #[error("Backend error: {0}")]
    Backend(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a shape mismatch error
    pub fn shape_mismatch(expected: &[usize], got: &[usize]) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_vec(),
            got: got.to_vec(),
        }
    }

    /// Create an unsupported dtype error
    pub fn unsupported_dtype(dtype: DType, op: &'static str) -> Self {
        Self::UnsupportedDType { dtype, op }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(arg: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            arg,
            reason: reason.into(),
        }
    }

    /// Create a platform query error
    pub fn platform_query(property: &'static str, reason: impl Into<String>) -> Self {
        Self::PlatformQuery {
            property,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = Error::InvalidDimension { dim: -4, ndim: 3 };
        assert_eq!(
            err.to_string(),
            "Invalid dimension -4 for tensor with 3 dimensions"
        );

        let err = Error::unsupported_dtype(DType::F64, "arg_reduce");
        assert!(err.to_string().contains("arg_reduce"));

        let err = Error::platform_query("core_num", "no cores configured");
        assert_eq!(
            err.to_string(),
            "Failed to query platform core_num: no cores configured"
        );
    }
}
