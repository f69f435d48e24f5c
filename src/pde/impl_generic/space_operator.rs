//! Space operator assembly from a problem description.
use crate::DType;

use numr::runtime::{Runtime, RuntimeClient};
use numr::tensor::Tensor;

use crate::pde::error::{DiscretizationError, PdeResult};
use crate::pde::problem::{PdeInput1D, PdeInput2D};
use crate::pde::traits::PdeProblem;

use super::boundary::{Axis, resolve_axis};
use super::host::{tensor_from_f64, tensor_to_f64};
use super::stencil::{assemble_operator_1d, assemble_operator_2d};

fn host<R: Runtime<DType = DType>>(tensor: &Tensor<R>) -> PdeResult<Vec<f64>> {
    Ok(tensor_to_f64(tensor, "fdm_space_operator").map_err(DiscretizationError::from)?)
}

/// Dense 1D advection-diffusion operator `[n, n]`.
pub fn space_operator_1d_impl<R, C>(client: &C, input: &PdeInput1D<R>) -> PdeResult<Tensor<R>>
where
    R: Runtime<DType = DType>,
    C: RuntimeClient<R>,
{
    input.validate()?;

    let grid = host(&input.grid)?;
    let velocity = host(&input.velocity)?;
    let diffusion = host(&input.diffusion)?;
    let axis = resolve_axis(&input.boundary, Axis::X)?;

    let n = grid.len();
    let data = assemble_operator_1d(&grid, &velocity, &diffusion, &axis);

    tracing::debug!(
        points = n,
        periodic = axis.is_periodic(),
        "assembled 1D space operator"
    );

    let dtype = input.grid.dtype();
    Ok(
        tensor_from_f64::<R>(&data, &[n, n], dtype, client.device(), "fdm_space_operator_1d")
            .map_err(DiscretizationError::from)?,
    )
}

/// Dense 2D advection-diffusion operator `[nx*ny, nx*ny]`.
pub fn space_operator_2d_impl<R, C>(client: &C, input: &PdeInput2D<R>) -> PdeResult<Tensor<R>>
where
    R: Runtime<DType = DType>,
    C: RuntimeClient<R>,
{
    input.validate()?;

    let x_grid = host(&input.x_grid)?;
    let y_grid = host(&input.y_grid)?;
    let x_velocity = host(&input.x_velocity)?;
    let y_velocity = host(&input.y_velocity)?;
    let diffusion = host(&input.diffusion)?;
    let x_axis = resolve_axis(&input.boundary, Axis::X)?;
    let y_axis = resolve_axis(&input.boundary, Axis::Y)?;

    let n = x_grid.len() * y_grid.len();
    let data = assemble_operator_2d(
        &x_grid,
        &y_grid,
        &x_velocity,
        &y_velocity,
        &diffusion,
        &x_axis,
        &y_axis,
    );

    tracing::debug!(
        nx = x_grid.len(),
        ny = y_grid.len(),
        x_periodic = x_axis.is_periodic(),
        y_periodic = y_axis.is_periodic(),
        "assembled 2D space operator"
    );

    let dtype = input.x_grid.dtype();
    Ok(
        tensor_from_f64::<R>(&data, &[n, n], dtype, client.device(), "fdm_space_operator_2d")
            .map_err(DiscretizationError::from)?,
    )
}
