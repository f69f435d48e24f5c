//! Boundary condition resolution and the boundary projection.
//!
//! Boundary specs are resolved per axis into either a periodic axis or a pair
//! of side conditions. Non-periodic sides are imposed after every step through
//! an affine projection `u <- Q u + c`, which is folded into the time
//! discretizer so that every stack matrix keeps side `n`.

use numr::runtime::Runtime;

use crate::DType;
use crate::pde::error::{DiscretizationError, PdeResult};
use crate::pde::types::{BoundaryCondition, BoundarySide, BoundarySpec};

use super::host::tensor_to_f64;

/// Grid axis a boundary side belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    fn sides(&self) -> (BoundarySide, BoundarySide) {
        match self {
            Self::X => (BoundarySide::Left, BoundarySide::Right),
            Self::Y => (BoundarySide::Bottom, BoundarySide::Top),
        }
    }
}

/// Resolved condition on one non-periodic side, with host values.
#[derive(Debug, Clone, PartialEq)]
pub enum SideCondition {
    Dirichlet(Vec<f64>),
    Neumann(Vec<f64>),
}

impl SideCondition {
    /// Value at node `k` along the side: uniform for 0 or 1 values.
    pub fn value_at(&self, k: usize) -> f64 {
        let values = match self {
            Self::Dirichlet(v) | Self::Neumann(v) => v,
        };
        match values.len() {
            0 => 0.0,
            1 => values[0],
            _ => values[k],
        }
    }
}

impl Default for SideCondition {
    fn default() -> Self {
        Self::Dirichlet(Vec::new())
    }
}

/// Resolved boundary treatment of one axis.
#[derive(Debug, Clone, PartialEq)]
pub enum AxisBoundary {
    Periodic,
    Bounded {
        low: SideCondition,
        high: SideCondition,
    },
}

impl AxisBoundary {
    pub fn is_periodic(&self) -> bool {
        matches!(self, Self::Periodic)
    }
}

enum Resolved {
    Periodic,
    Side(SideCondition),
}

/// Resolve the boundary specs that touch `axis`.
///
/// Later specs override earlier ones for the same side, `All` applies to both
/// sides, and a side without a spec is homogeneous Dirichlet. Periodicity must
/// be requested on both sides of the axis.
pub fn resolve_axis<R: Runtime<DType = DType>>(
    boundary: &[BoundarySpec<R>],
    axis: Axis,
) -> PdeResult<AxisBoundary> {
    let (low_side, high_side) = axis.sides();
    let mut low: Option<Resolved> = None;
    let mut high: Option<Resolved> = None;

    for spec in boundary {
        let applies_low = spec.side == low_side || spec.side == BoundarySide::All;
        let applies_high = spec.side == high_side || spec.side == BoundarySide::All;
        if !applies_low && !applies_high {
            continue;
        }

        let resolved = || -> PdeResult<Resolved> {
            Ok(match &spec.condition {
                BoundaryCondition::Dirichlet(v) => Resolved::Side(SideCondition::Dirichlet(
                    tensor_to_f64(v, "boundary").map_err(DiscretizationError::from)?,
                )),
                BoundaryCondition::Neumann(v) => Resolved::Side(SideCondition::Neumann(
                    tensor_to_f64(v, "boundary").map_err(DiscretizationError::from)?,
                )),
                BoundaryCondition::Periodic => Resolved::Periodic,
            })
        };

        if applies_low {
            low = Some(resolved()?);
        }
        if applies_high {
            high = Some(resolved()?);
        }
    }

    match (low, high) {
        (Some(Resolved::Periodic), Some(Resolved::Periodic)) => Ok(AxisBoundary::Periodic),
        (Some(Resolved::Periodic), _) | (_, Some(Resolved::Periodic)) => {
            Err(DiscretizationError::UnsupportedBoundary {
                context: format!(
                    "periodic condition on the {:?} axis must be set on both {} and {}",
                    axis, low_side, high_side
                ),
            }
            .into())
        }
        (low, high) => {
            let side = |r: Option<Resolved>| match r {
                Some(Resolved::Side(s)) => s,
                _ => SideCondition::default(),
            };
            Ok(AxisBoundary::Bounded {
                low: side(low),
                high: side(high),
            })
        }
    }
}

// ============================================================================
// Boundary Projection
// ============================================================================

/// How one boundary node is reset after a step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectionRule {
    /// `u[row] = value`
    Fixed(f64),
    /// `u[row] = u[source] + offset`
    Mirror { source: usize, offset: f64 },
}

/// Affine map `u <- Q u + c` imposing Dirichlet and Neumann sides.
///
/// Rules are applied in order, so a later rule reads the already projected
/// value of its source node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundaryProjection {
    points: usize,
    rules: Vec<(usize, ProjectionRule)>,
}

impl BoundaryProjection {
    pub fn new(points: usize) -> Self {
        Self {
            points,
            rules: Vec::new(),
        }
    }

    pub fn push(&mut self, row: usize, rule: ProjectionRule) {
        self.rules.push((row, rule));
    }

    pub fn points(&self) -> usize {
        self.points
    }

    pub fn rules(&self) -> &[(usize, ProjectionRule)] {
        &self.rules
    }

    /// True when no node is projected (fully periodic domain).
    pub fn is_identity(&self) -> bool {
        self.rules.is_empty()
    }

    /// Dense row-major `Q` (`n x n`) and offset `c` (`n`).
    pub fn dense(&self) -> (Vec<f64>, Vec<f64>) {
        let n = self.points;
        let mut q = vec![0.0; n * n];
        for i in 0..n {
            q[i * n + i] = 1.0;
        }
        let mut c = vec![0.0; n];

        for &(row, rule) in &self.rules {
            match rule {
                ProjectionRule::Fixed(value) => {
                    q[row * n..(row + 1) * n].fill(0.0);
                    c[row] = value;
                }
                ProjectionRule::Mirror { source, offset } => {
                    q.copy_within(source * n..(source + 1) * n, row * n);
                    c[row] = c[source] + offset;
                }
            }
        }

        (q, c)
    }

    fn push_side(&mut self, row: usize, inner: usize, side: &SideCondition, k: usize, step: f64) {
        let rule = match side {
            SideCondition::Dirichlet(_) => ProjectionRule::Fixed(side.value_at(k)),
            SideCondition::Neumann(_) => ProjectionRule::Mirror {
                source: inner,
                offset: step * side.value_at(k),
            },
        };
        self.push(row, rule);
    }

    /// Projection for a 1D grid.
    pub fn for_1d(grid: &[f64], axis: &AxisBoundary) -> Self {
        let n = grid.len();
        let mut projection = Self::new(n);
        if let AxisBoundary::Bounded { low, high } = axis {
            projection.push_side(0, 1, low, 0, -(grid[1] - grid[0]));
            projection.push_side(n - 1, n - 2, high, 0, grid[n - 1] - grid[n - 2]);
        }
        projection
    }

    /// Projection for a 2D grid flattened as `i * ny + j`.
    ///
    /// x sides are applied first, so Bottom/Top rules own the corners.
    pub fn for_2d(
        x_grid: &[f64],
        y_grid: &[f64],
        x_axis: &AxisBoundary,
        y_axis: &AxisBoundary,
    ) -> Self {
        let nx = x_grid.len();
        let ny = y_grid.len();
        let idx = |i: usize, j: usize| i * ny + j;
        let mut projection = Self::new(nx * ny);

        if let AxisBoundary::Bounded { low, high } = x_axis {
            let h_low = -(x_grid[1] - x_grid[0]);
            let h_high = x_grid[nx - 1] - x_grid[nx - 2];
            for j in 0..ny {
                projection.push_side(idx(0, j), idx(1, j), low, j, h_low);
                projection.push_side(idx(nx - 1, j), idx(nx - 2, j), high, j, h_high);
            }
        }

        if let AxisBoundary::Bounded { low, high } = y_axis {
            let h_low = -(y_grid[1] - y_grid[0]);
            let h_high = y_grid[ny - 1] - y_grid[ny - 2];
            for i in 0..nx {
                projection.push_side(idx(i, 0), idx(i, 1), low, i, h_low);
                projection.push_side(idx(i, ny - 1), idx(i, ny - 2), high, i, h_high);
            }
        }

        projection
    }
}
