//! Error types for the finite difference solver lifecycle.
//!
//! Errors fall into three categories, one per lifecycle stage that can fail:
//! validating the problem, building the discretizer, and advancing the
//! solution. Backend (`numr`) errors are mapped into the category of the stage
//! that raised them rather than into a catch-all variant.

use thiserror::Error;

use crate::DType;

/// Result type for PDE operations.
pub type PdeResult<T> = Result<T, PdeError>;

/// Errors that can occur while constructing or advancing a solver.
#[derive(Debug, Clone, Error)]
pub enum PdeError {
    /// The problem description is inconsistent or malformed.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// The space or time operator could not be built.
    #[error("discretization error: {0}")]
    Discretization(#[from] DiscretizationError),

    /// The iteration kernel failed while advancing the solution.
    #[error("numerical fault: {0}")]
    Numerical(#[from] NumericalFault),
}

impl PdeError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    pub fn is_discretization(&self) -> bool {
        matches!(self, Self::Discretization(_))
    }

    pub fn is_numerical(&self) -> bool {
        matches!(self, Self::Numerical(_))
    }
}

/// Inconsistent or malformed problem description.
#[derive(Debug, Clone, Error)]
pub enum ConfigurationError {
    /// Array sizes do not agree with the spatial extent.
    #[error("{field}: expected {expected} values, got {actual}")]
    DimensionMismatch {
        field: String,
        expected: usize,
        actual: usize,
    },

    /// Invalid grid specification.
    #[error("invalid grid: {context}")]
    InvalidGrid { context: String },

    /// Time step is not a finite positive number.
    #[error("time step must be finite and positive, got {dt}")]
    InvalidTimeStep { dt: f64 },

    /// Only F32 and F64 tensors are supported.
    #[error("{field}: unsupported dtype {dtype:?} (expected F32 or F64)")]
    UnsupportedDType { field: String, dtype: DType },

    /// Tensors of one problem must share a dtype.
    #[error("{field}: dtype {actual:?} does not match problem dtype {expected:?}")]
    DTypeMismatch {
        field: String,
        expected: DType,
        actual: DType,
    },

    /// Boundary side does not exist for the problem dimensionality.
    #[error("boundary side {side} is not valid for a {dimensions}D problem")]
    InvalidBoundarySide { side: String, dimensions: usize },

    /// Invalid parameter value.
    #[error("invalid parameter '{parameter}': {message}")]
    InvalidParameter { parameter: String, message: String },

    /// Scheme name could not be parsed.
    #[error("unknown scheme '{name}'")]
    UnknownScheme { name: String },
}

/// Failure while assembling the space operator or the time operator stack.
#[derive(Debug, Clone, Error)]
pub enum DiscretizationError {
    /// Boundary condition combination cannot be discretized.
    #[error("unsupported boundary conditions: {context}")]
    UnsupportedBoundary { context: String },

    /// A linear system in the scheme transform is singular or ill-conditioned.
    #[error("singular operator in {context}: {reason}")]
    SingularOperator { context: String, reason: String },

    /// Error from the underlying tensor runtime.
    #[error("numr error: {0}")]
    Backend(String),
}

/// Failure reported while iterating the operator stack.
#[derive(Debug, Clone, Error)]
pub enum NumericalFault {
    /// The advanced solution contains NaN or infinite entries.
    #[error("{entries} non-finite entries after advancing {steps} steps")]
    NonFinite { steps: usize, entries: usize },

    /// The solution buffer does not match the operator stack.
    #[error("solution buffer has shape {actual:?}, operator stack expects {expected:?}")]
    SolutionShape {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// Error from the underlying tensor runtime.
    #[error("numr error: {0}")]
    Backend(String),
}

impl From<numr::error::Error> for DiscretizationError {
    fn from(err: numr::error::Error) -> Self {
        Self::Backend(err.to_string())
    }
}

impl From<numr::error::Error> for NumericalFault {
    fn from(err: numr::error::Error) -> Self {
        Self::Backend(err.to_string())
    }
}
