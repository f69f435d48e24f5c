//! Finite difference method traits for PDE solving.
use crate::DType;

use numr::runtime::Runtime;
use numr::tensor::Tensor;

use crate::pde::error::PdeResult;
use crate::pde::impl_generic::BoundaryProjection;
use crate::pde::problem::{PdeInput1D, PdeInput2D};
use crate::pde::time_discretizer::TimeDiscretizer;
use crate::pde::types::{Scheme, SolverOptions};

/// Finite difference discretization and time stepping of linear
/// advection-diffusion problems.
///
/// The space operator is assembled with non-uniform three-point stencils and
/// turned into a stationary time operator stack by the chosen scheme. All
/// matrix work runs on the client's runtime.
pub trait FiniteDifferenceAlgorithms<R: Runtime<DType = DType>> {
    /// Assemble the dense 1D space operator `[n, n]`.
    fn fdm_space_operator_1d(&self, input: &PdeInput1D<R>) -> PdeResult<Tensor<R>>;

    /// Assemble the dense 2D space operator `[nx*ny, nx*ny]` on the
    /// row-major flattened grid.
    fn fdm_space_operator_2d(&self, input: &PdeInput2D<R>) -> PdeResult<Tensor<R>>;

    /// Build the time operator stack of `scheme` with the boundary projection
    /// folded in.
    fn fdm_time_discretizer(
        &self,
        space_op: &Tensor<R>,
        projection: &BoundaryProjection,
        dt: f64,
        scheme: Scheme,
        options: &SolverOptions,
    ) -> PdeResult<TimeDiscretizer<R>>;

    /// Build the one-step operator used to fill the warm-start history of
    /// multi-step schemes.
    fn fdm_warm_start_discretizer(
        &self,
        space_op: &Tensor<R>,
        projection: &BoundaryProjection,
        dt: f64,
        options: &SolverOptions,
    ) -> PdeResult<TimeDiscretizer<R>>;

    /// Advance a solution buffer `[n, solver_steps]` by `n_steps`.
    ///
    /// Pure: the input is left untouched and the advanced buffer is returned.
    fn fdm_iterate(
        &self,
        discretizer: &TimeDiscretizer<R>,
        solution: &Tensor<R>,
        n_steps: usize,
    ) -> PdeResult<Tensor<R>>;
}
