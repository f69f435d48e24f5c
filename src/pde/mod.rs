//! Finite difference solvers for linear advection-diffusion problems.
//!
//! A problem ([`PdeInput1D`] or [`PdeInput2D`]) is discretized once into a
//! stationary operator stack, which the solver then applies repeatedly to a
//! short history of states. Memory space is chosen by the runtime type and
//! precision by the dtype of the problem tensors.

mod cpu;
#[cfg(feature = "cuda")]
mod cuda;
pub mod error;
pub mod impl_generic;
pub mod problem;
pub mod solver;
pub mod time_discretizer;
pub mod traits;
pub mod types;
#[cfg(feature = "wgpu")]
mod wgpu;

pub use error::{ConfigurationError, DiscretizationError, NumericalFault, PdeError, PdeResult};
pub use impl_generic::BoundaryProjection;
pub use problem::{PdeInput1D, PdeInput2D};
#[cfg(feature = "cuda")]
pub use solver::{CudaSolver1D, CudaSolver2D};
pub use solver::{
    CpuSolver1D, CpuSolver2D, FiniteDifferenceSolver, FiniteDifferenceSolver1D,
    FiniteDifferenceSolver2D,
};
#[cfg(feature = "wgpu")]
pub use solver::{WgpuSolver1D, WgpuSolver2D};
pub use time_discretizer::TimeDiscretizer;
pub use traits::{FiniteDifferenceAlgorithms, PdeProblem};
pub use types::{BoundaryCondition, BoundarySide, BoundarySpec, Scheme, SolverOptions};
