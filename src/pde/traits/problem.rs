//! Per-dimension problem descriptions behind one solver lifecycle.
use crate::DType;

use numr::runtime::Runtime;
use numr::tensor::Tensor;

use crate::pde::error::PdeResult;
use crate::pde::impl_generic::BoundaryProjection;
use crate::pde::types::Scheme;

use super::FiniteDifferenceAlgorithms;

/// A linear advection-diffusion problem the finite difference solver can
/// discretize.
///
/// Implemented for [`PdeInput1D`](crate::pde::PdeInput1D) and
/// [`PdeInput2D`](crate::pde::PdeInput2D). The solver only sees the flattened
/// point count; `field_shape` restores the natural layout.
pub trait PdeProblem<R: Runtime<DType = DType>> {
    /// Spatial dimensionality.
    const DIMENSIONS: usize;

    /// Time step.
    fn dt(&self) -> f64;

    fn scheme(&self) -> Scheme;

    /// Initial state, in field shape or flat.
    fn initial_condition(&self) -> &Tensor<R>;

    /// Number of grid points after flattening.
    fn point_count(&self) -> usize;

    /// Shape of one state: `[n]` in 1D, `[nx, ny]` in 2D.
    fn field_shape(&self) -> Vec<usize>;

    /// Precision of the problem.
    fn dtype(&self) -> DType {
        self.initial_condition().dtype()
    }

    /// Check sizes, dtypes, grid and boundary consistency.
    ///
    /// Only [`ConfigurationError`](crate::pde::error::ConfigurationError)s are
    /// returned.
    fn validate(&self) -> PdeResult<()>;

    /// Dense space operator `[n, n]`.
    fn space_operator<C: FiniteDifferenceAlgorithms<R>>(&self, client: &C) -> PdeResult<Tensor<R>>;

    /// Affine projection imposing the non-periodic boundary conditions.
    fn boundary_projection(&self) -> PdeResult<BoundaryProjection>;
}
