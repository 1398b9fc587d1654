//! Error types.
use crate::quadrature::QuadratureError;
use thiserror::Error;

/// Library-wide error type.
///
/// Every fallible operation of the crate surfaces one of these variants synchronously to the
/// caller. None of them are retried or logged-and-ignored internally.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum PoissonError {
    /// The requested operation is not available for the current configuration,
    /// e.g. gradient recovery for elements of degree other than one.
    #[error("unsupported configuration: {0}")]
    UnsupportedConfiguration(String),
    /// The mesh violates a geometric or topological precondition, e.g. a cell with
    /// zero area or a node without incident cells.
    #[error("malformed mesh: {0}")]
    MalformedMesh(String),
    /// The linear system could not be solved.
    #[error("linear solve failed: {0}")]
    LinearAlgebra(String),
    /// Two objects that must agree in size do not.
    #[error("dimension mismatch in {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },
    #[error(transparent)]
    Quadrature(#[from] QuadratureError),
}

impl PoissonError {
    pub fn dimension_mismatch(context: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            context: context.into(),
            expected,
            actual,
        }
    }

    /// Returns an error if `actual != expected`.
    pub(crate) fn check_dimension(context: &str, expected: usize, actual: usize) -> Result<(), Self> {
        if expected == actual {
            Ok(())
        } else {
            Err(Self::dimension_mismatch(context, expected, actual))
        }
    }
}
