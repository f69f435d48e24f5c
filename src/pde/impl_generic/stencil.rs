//! Dense stencil assembly for the advection-diffusion space operator.
//!
//! Builds `L` such that `L u ~ -v du/dx + D d2u/dx2` with second-order
//! three-point stencils on non-uniform grids. Assembly is a one-time setup
//! cost, done on the host in f64.

use super::boundary::AxisBoundary;

/// Three-point weights `[left, center, right]` of the first derivative.
pub fn first_derivative_weights(h_minus: f64, h_plus: f64) -> [f64; 3] {
    let sum = h_minus + h_plus;
    [
        -h_plus / (h_minus * sum),
        (h_plus - h_minus) / (h_minus * h_plus),
        h_minus / (h_plus * sum),
    ]
}

/// Three-point weights `[left, center, right]` of the second derivative.
pub fn second_derivative_weights(h_minus: f64, h_plus: f64) -> [f64; 3] {
    let sum = h_minus + h_plus;
    [
        2.0 / (h_minus * sum),
        -2.0 / (h_minus * h_plus),
        2.0 / (h_plus * sum),
    ]
}

/// Neighbour stencil of one node along an axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisStencil {
    pub left: usize,
    pub right: usize,
    pub h_minus: f64,
    pub h_plus: f64,
}

/// Stencil of node `i` on `grid`, or `None` for a bounded boundary node.
///
/// Periodic axes wrap between the last and first node with a spacing equal
/// to the mean of the first and last spacing.
pub fn axis_stencil(grid: &[f64], i: usize, axis: &AxisBoundary) -> Option<AxisStencil> {
    let n = grid.len();
    let last = n - 1;
    let wrap = 0.5 * ((grid[1] - grid[0]) + (grid[last] - grid[last - 1]));

    match axis {
        AxisBoundary::Bounded { .. } if i == 0 || i == last => None,
        AxisBoundary::Periodic if i == 0 => Some(AxisStencil {
            left: last,
            right: 1,
            h_minus: wrap,
            h_plus: grid[1] - grid[0],
        }),
        AxisBoundary::Periodic if i == last => Some(AxisStencil {
            left: last - 1,
            right: 0,
            h_minus: grid[last] - grid[last - 1],
            h_plus: wrap,
        }),
        _ => Some(AxisStencil {
            left: i - 1,
            right: i + 1,
            h_minus: grid[i] - grid[i - 1],
            h_plus: grid[i + 1] - grid[i],
        }),
    }
}

/// Advection-diffusion weights `-v d1 + D d2` for one stencil.
fn advection_diffusion_weights(stencil: &AxisStencil, velocity: f64, diffusion: f64) -> [f64; 3] {
    let d1 = first_derivative_weights(stencil.h_minus, stencil.h_plus);
    let d2 = second_derivative_weights(stencil.h_minus, stencil.h_plus);
    [
        -velocity * d1[0] + diffusion * d2[0],
        -velocity * d1[1] + diffusion * d2[1],
        -velocity * d1[2] + diffusion * d2[2],
    ]
}

/// Assemble the dense 1D operator (row-major `n x n`).
///
/// Rows of bounded boundary nodes are left zero; their values are imposed by
/// the boundary projection.
pub fn assemble_operator_1d(
    grid: &[f64],
    velocity: &[f64],
    diffusion: &[f64],
    axis: &AxisBoundary,
) -> Vec<f64> {
    let n = grid.len();
    let mut data = vec![0.0; n * n];

    for i in 0..n {
        let Some(stencil) = axis_stencil(grid, i, axis) else {
            continue;
        };
        let w = advection_diffusion_weights(&stencil, velocity[i], diffusion[i]);
        let row = &mut data[i * n..(i + 1) * n];
        row[stencil.left] += w[0];
        row[i] += w[1];
        row[stencil.right] += w[2];
    }

    data
}

/// Assemble the dense 2D operator on the flattened grid (`i * ny + j`).
///
/// A node is treated as a boundary row when it lies on a bounded side of
/// either axis.
#[allow(clippy::too_many_arguments)]
pub fn assemble_operator_2d(
    x_grid: &[f64],
    y_grid: &[f64],
    x_velocity: &[f64],
    y_velocity: &[f64],
    diffusion: &[f64],
    x_axis: &AxisBoundary,
    y_axis: &AxisBoundary,
) -> Vec<f64> {
    let nx = x_grid.len();
    let ny = y_grid.len();
    let n = nx * ny;
    let idx = |i: usize, j: usize| i * ny + j;
    let mut data = vec![0.0; n * n];

    for i in 0..nx {
        let Some(sx) = axis_stencil(x_grid, i, x_axis) else {
            continue;
        };
        for j in 0..ny {
            let Some(sy) = axis_stencil(y_grid, j, y_axis) else {
                continue;
            };
            let p = idx(i, j);
            let wx = advection_diffusion_weights(&sx, x_velocity[p], diffusion[p]);
            let wy = advection_diffusion_weights(&sy, y_velocity[p], diffusion[p]);

            let row = &mut data[p * n..(p + 1) * n];
            row[idx(sx.left, j)] += wx[0];
            row[idx(sx.right, j)] += wx[2];
            row[idx(i, sy.left)] += wy[0];
            row[idx(i, sy.right)] += wy[2];
            row[p] += wx[1] + wy[1];
        }
    }

    data
}
