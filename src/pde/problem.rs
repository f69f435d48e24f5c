//! Problem descriptions for 1D and 2D advection-diffusion.

use numr::runtime::Runtime;
use numr::tensor::Tensor;

use crate::DType;
use crate::pde::error::{ConfigurationError, DiscretizationError, PdeResult};
use crate::pde::impl_generic::boundary::{Axis, resolve_axis};
use crate::pde::impl_generic::host::{is_float_dtype, tensor_to_f64};
use crate::pde::impl_generic::BoundaryProjection;
use crate::pde::traits::{FiniteDifferenceAlgorithms, PdeProblem};
use crate::pde::types::{BoundaryCondition, BoundarySide, BoundarySpec, Scheme};

/// `du/dt = -v du/dx + D d2u/dx2` on a 1D grid.
#[derive(Debug, Clone)]
pub struct PdeInput1D<R: Runtime> {
    /// Strictly increasing node coordinates `[n]`.
    pub grid: Tensor<R>,
    /// Advection velocity per node `[n]`.
    pub velocity: Tensor<R>,
    /// Diffusion coefficient per node `[n]`.
    pub diffusion: Tensor<R>,
    /// Boundary specs; later entries override earlier ones.
    pub boundary: Vec<BoundarySpec<R>>,
    /// Initial state `[n]` or `[n, 1]`.
    pub initial_condition: Tensor<R>,
    pub dt: f64,
    pub scheme: Scheme,
}

/// `du/dt = -vx du/dx - vy du/dy + D (d2u/dx2 + d2u/dy2)` on a tensor grid.
///
/// Fields are `[nx, ny]` or flat `[nx * ny]`, with point `(i, j)` at index
/// `i * ny + j`.
#[derive(Debug, Clone)]
pub struct PdeInput2D<R: Runtime> {
    pub x_grid: Tensor<R>,
    pub y_grid: Tensor<R>,
    pub x_velocity: Tensor<R>,
    pub y_velocity: Tensor<R>,
    pub diffusion: Tensor<R>,
    pub boundary: Vec<BoundarySpec<R>>,
    pub initial_condition: Tensor<R>,
    pub dt: f64,
    pub scheme: Scheme,
}

// ============================================================================
// Validation helpers
// ============================================================================

fn check_dtype<R: Runtime<DType = DType>>(
    field: &str,
    tensor: &Tensor<R>,
    expected: DType,
) -> PdeResult<()> {
    if tensor.dtype() != expected {
        return Err(ConfigurationError::DTypeMismatch {
            field: field.to_string(),
            expected,
            actual: tensor.dtype(),
        }
        .into());
    }
    Ok(())
}

fn check_numel<R: Runtime>(field: &str, tensor: &Tensor<R>, expected: usize) -> PdeResult<()> {
    if tensor.numel() != expected {
        return Err(ConfigurationError::DimensionMismatch {
            field: field.to_string(),
            expected,
            actual: tensor.numel(),
        }
        .into());
    }
    Ok(())
}

/// Field must be flat or in one of the accepted shapes.
fn check_field<R: Runtime>(field: &str, tensor: &Tensor<R>, shapes: &[&[usize]]) -> PdeResult<()> {
    let expected: usize = shapes[0].iter().product();
    check_numel(field, tensor, expected)?;
    if !shapes.iter().any(|s| tensor.shape() == *s) {
        return Err(ConfigurationError::InvalidParameter {
            parameter: field.to_string(),
            message: format!("shape {:?} is not one of {:?}", tensor.shape(), shapes),
        }
        .into());
    }
    Ok(())
}

/// Check a grid axis and return its coordinates.
fn check_axis<R: Runtime<DType = DType>>(field: &str, grid: &Tensor<R>) -> PdeResult<Vec<f64>> {
    if grid.shape().len() != 1 {
        return Err(ConfigurationError::InvalidGrid {
            context: format!("{} must be 1-D, got shape {:?}", field, grid.shape()),
        }
        .into());
    }
    if grid.numel() < 3 {
        return Err(ConfigurationError::InvalidGrid {
            context: format!("{} needs at least 3 points, got {}", field, grid.numel()),
        }
        .into());
    }

    let coords = tensor_to_f64(grid, "validate").map_err(|e| ConfigurationError::InvalidGrid {
        context: format!("{}: {}", field, e),
    })?;
    if let Some(k) = coords
        .windows(2)
        .position(|w| !(w[0].is_finite() && w[1].is_finite() && w[1] > w[0]))
    {
        return Err(ConfigurationError::InvalidGrid {
            context: format!(
                "{} must be finite and strictly increasing (index {}: {} -> {})",
                field,
                k,
                coords[k],
                coords[k + 1]
            ),
        }
        .into());
    }
    Ok(coords)
}

fn check_time_step(dt: f64) -> PdeResult<()> {
    if !(dt.is_finite() && dt > 0.0) {
        return Err(ConfigurationError::InvalidTimeStep { dt }.into());
    }
    Ok(())
}

fn check_precision<R: Runtime<DType = DType>>(initial_condition: &Tensor<R>) -> PdeResult<DType> {
    let dtype = initial_condition.dtype();
    if !is_float_dtype(dtype) {
        return Err(ConfigurationError::UnsupportedDType {
            field: "initial_condition".to_string(),
            dtype,
        }
        .into());
    }
    Ok(dtype)
}

/// Boundary values must be empty, uniform or one per side node.
fn check_boundary_values<R: Runtime<DType = DType>>(
    spec: &BoundarySpec<R>,
    side_len: usize,
    dtype: DType,
) -> PdeResult<()> {
    let count = spec.value_count();
    if count > 1 && count != side_len {
        return Err(ConfigurationError::DimensionMismatch {
            field: format!("boundary values on {}", spec.side),
            expected: side_len,
            actual: count,
        }
        .into());
    }
    if let BoundaryCondition::Dirichlet(v) | BoundaryCondition::Neumann(v) = &spec.condition {
        check_dtype(&format!("boundary values on {}", spec.side), v, dtype)?;
    }
    Ok(())
}

// ============================================================================
// 1D
// ============================================================================

impl<R: Runtime<DType = DType>> PdeProblem<R> for PdeInput1D<R> {
    const DIMENSIONS: usize = 1;

    fn dt(&self) -> f64 {
        self.dt
    }

    fn scheme(&self) -> Scheme {
        self.scheme
    }

    fn initial_condition(&self) -> &Tensor<R> {
        &self.initial_condition
    }

    fn point_count(&self) -> usize {
        self.grid.numel()
    }

    fn field_shape(&self) -> Vec<usize> {
        vec![self.grid.numel()]
    }

    fn validate(&self) -> PdeResult<()> {
        let dtype = check_precision(&self.initial_condition)?;
        for (field, tensor) in [
            ("grid", &self.grid),
            ("velocity", &self.velocity),
            ("diffusion", &self.diffusion),
        ] {
            check_dtype(field, tensor, dtype)?;
        }

        check_axis("grid", &self.grid)?;
        let n = self.grid.numel();
        check_field("velocity", &self.velocity, &[&[n]])?;
        check_field("diffusion", &self.diffusion, &[&[n]])?;
        check_field("initial_condition", &self.initial_condition, &[&[n], &[n, 1]])?;
        check_time_step(self.dt)?;

        for spec in &self.boundary {
            match spec.side {
                BoundarySide::Left | BoundarySide::Right | BoundarySide::All => {
                    check_boundary_values(spec, 1, dtype)?
                }
                side => {
                    return Err(ConfigurationError::InvalidBoundarySide {
                        side: side.to_string(),
                        dimensions: 1,
                    }
                    .into());
                }
            }
        }
        Ok(())
    }

    fn space_operator<C: FiniteDifferenceAlgorithms<R>>(&self, client: &C) -> PdeResult<Tensor<R>> {
        client.fdm_space_operator_1d(self)
    }

    fn boundary_projection(&self) -> PdeResult<BoundaryProjection> {
        let grid = tensor_to_f64(&self.grid, "boundary_projection")
            .map_err(DiscretizationError::from)?;
        let axis = resolve_axis(&self.boundary, Axis::X)?;
        Ok(BoundaryProjection::for_1d(&grid, &axis))
    }
}

// ============================================================================
// 2D
// ============================================================================

impl<R: Runtime<DType = DType>> PdeProblem<R> for PdeInput2D<R> {
    const DIMENSIONS: usize = 2;

    fn dt(&self) -> f64 {
        self.dt
    }

    fn scheme(&self) -> Scheme {
        self.scheme
    }

    fn initial_condition(&self) -> &Tensor<R> {
        &self.initial_condition
    }

    fn point_count(&self) -> usize {
        self.x_grid.numel() * self.y_grid.numel()
    }

    fn field_shape(&self) -> Vec<usize> {
        vec![self.x_grid.numel(), self.y_grid.numel()]
    }

    fn validate(&self) -> PdeResult<()> {
        let dtype = check_precision(&self.initial_condition)?;
        for (field, tensor) in [
            ("x_grid", &self.x_grid),
            ("y_grid", &self.y_grid),
            ("x_velocity", &self.x_velocity),
            ("y_velocity", &self.y_velocity),
            ("diffusion", &self.diffusion),
        ] {
            check_dtype(field, tensor, dtype)?;
        }

        check_axis("x_grid", &self.x_grid)?;
        check_axis("y_grid", &self.y_grid)?;
        let nx = self.x_grid.numel();
        let ny = self.y_grid.numel();
        let shapes: [&[usize]; 2] = [&[nx, ny], &[nx * ny]];
        for (field, tensor) in [
            ("x_velocity", &self.x_velocity),
            ("y_velocity", &self.y_velocity),
            ("diffusion", &self.diffusion),
            ("initial_condition", &self.initial_condition),
        ] {
            check_field(field, tensor, &shapes)?;
        }
        check_time_step(self.dt)?;

        for spec in &self.boundary {
            // Left/Right run along y, Bottom/Top along x
            let side_len = match spec.side {
                BoundarySide::Left | BoundarySide::Right => ny,
                BoundarySide::Bottom | BoundarySide::Top => nx,
                BoundarySide::All if nx == ny => nx,
                BoundarySide::All => 1,
            };
            check_boundary_values(spec, side_len, dtype)?;
        }
        Ok(())
    }

    fn space_operator<C: FiniteDifferenceAlgorithms<R>>(&self, client: &C) -> PdeResult<Tensor<R>> {
        client.fdm_space_operator_2d(self)
    }

    fn boundary_projection(&self) -> PdeResult<BoundaryProjection> {
        let x_grid = tensor_to_f64(&self.x_grid, "boundary_projection")
            .map_err(DiscretizationError::from)?;
        let y_grid = tensor_to_f64(&self.y_grid, "boundary_projection")
            .map_err(DiscretizationError::from)?;
        let x_axis = resolve_axis(&self.boundary, Axis::X)?;
        let y_axis = resolve_axis(&self.boundary, Axis::Y)?;
        Ok(BoundaryProjection::for_2d(&x_grid, &y_grid, &x_axis, &y_axis))
    }
}
