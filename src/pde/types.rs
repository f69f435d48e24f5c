//! Shared types for the finite difference solvers.

use std::fmt;
use std::str::FromStr;

use numr::runtime::Runtime;
use numr::tensor::Tensor;

use crate::DType;
use crate::pde::error::{ConfigurationError, PdeError, PdeResult};

// ============================================================================
// Boundary Conditions
// ============================================================================

/// Boundary condition type.
///
/// Value tensors hold either a single value applied along the whole side or
/// one value per node of the side. An empty tensor means zero.
#[derive(Debug, Clone)]
pub enum BoundaryCondition<R: Runtime> {
    /// Fixed values at boundary (Dirichlet).
    Dirichlet(Tensor<R>),
    /// Fixed derivative along the positive axis direction (Neumann).
    Neumann(Tensor<R>),
    /// Periodic boundary (wraps around). Both sides of the axis must be periodic.
    Periodic,
}

/// Which side of the domain to apply a boundary condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundarySide {
    /// Lowest x coordinate.
    Left,
    /// Highest x coordinate.
    Right,
    /// Lowest y coordinate (2D only).
    Bottom,
    /// Highest y coordinate (2D only).
    Top,
    All,
}

impl fmt::Display for BoundarySide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Left => "Left",
            Self::Right => "Right",
            Self::Bottom => "Bottom",
            Self::Top => "Top",
            Self::All => "All",
        };
        f.write_str(name)
    }
}

/// A boundary specification: side + condition.
#[derive(Debug, Clone)]
pub struct BoundarySpec<R: Runtime> {
    pub side: BoundarySide,
    pub condition: BoundaryCondition<R>,
}

impl<R: Runtime> BoundarySpec<R> {
    pub fn new(side: BoundarySide, condition: BoundaryCondition<R>) -> Self {
        Self { side, condition }
    }

    /// Number of values carried by the condition (0 for periodic).
    pub fn value_count(&self) -> usize {
        match &self.condition {
            BoundaryCondition::Dirichlet(v) | BoundaryCondition::Neumann(v) => v.numel(),
            BoundaryCondition::Periodic => 0,
        }
    }
}

// ============================================================================
// Time Integration Schemes
// ============================================================================

/// Time integration scheme used to turn the space operator into the time
/// discretizer.
///
/// For a linear autonomous system every Runge-Kutta variant of order `p`
/// reduces to the degree `p` Taylor polynomial of `exp(dt * L)`, so the
/// explicit variants differ only in their order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scheme {
    /// Forward Euler, first order.
    #[default]
    ExplicitEuler,
    /// Backward Euler, first order, L-stable.
    ImplicitEuler,
    /// Trapezoidal rule, second order, A-stable.
    CrankNicolson,
    /// Ralston's second-order Runge-Kutta.
    RungeKuttaRalston,
    /// Classical third-order Runge-Kutta.
    RungeKutta3,
    /// Classical fourth-order Runge-Kutta.
    RungeKutta4,
    /// Kutta's 3/8-rule fourth-order Runge-Kutta.
    RungeKuttaThreeEight,
    /// Two-stage Gauss-Legendre collocation, fourth order, A-stable.
    RungeKuttaGaussLegendre4,
    /// Two-level Richardson extrapolation of backward Euler, second order.
    RichardsonExtrapolation2,
    /// Three-level Richardson extrapolation of backward Euler, third order.
    RichardsonExtrapolation3,
    /// Two-step Adams-Bashforth, second order.
    AdamsBashforth2,
    /// Two-step Adams-Moulton, third order.
    AdamsMoulton2,
}

impl Scheme {
    /// Every supported scheme.
    pub const ALL: [Scheme; 12] = [
        Scheme::ExplicitEuler,
        Scheme::ImplicitEuler,
        Scheme::CrankNicolson,
        Scheme::RungeKuttaRalston,
        Scheme::RungeKutta3,
        Scheme::RungeKutta4,
        Scheme::RungeKuttaThreeEight,
        Scheme::RungeKuttaGaussLegendre4,
        Scheme::RichardsonExtrapolation2,
        Scheme::RichardsonExtrapolation3,
        Scheme::AdamsBashforth2,
        Scheme::AdamsMoulton2,
    ];

    /// Number of matrices in the time discretizer, i.e. how many past states
    /// one step of the scheme reads.
    pub fn solver_steps(&self) -> usize {
        match self {
            Self::AdamsBashforth2 | Self::AdamsMoulton2 => 2,
            _ => 1,
        }
    }

    /// Whether building the discretizer requires a linear solve.
    pub fn is_implicit(&self) -> bool {
        matches!(
            self,
            Self::ImplicitEuler
                | Self::CrankNicolson
                | Self::RungeKuttaGaussLegendre4
                | Self::RichardsonExtrapolation2
                | Self::RichardsonExtrapolation3
                | Self::AdamsMoulton2
        )
    }

    /// Kebab-case name, accepted by [`FromStr`].
    pub fn name(&self) -> &'static str {
        match self {
            Self::ExplicitEuler => "explicit-euler",
            Self::ImplicitEuler => "implicit-euler",
            Self::CrankNicolson => "crank-nicolson",
            Self::RungeKuttaRalston => "runge-kutta-ralston",
            Self::RungeKutta3 => "runge-kutta-3",
            Self::RungeKutta4 => "runge-kutta-4",
            Self::RungeKuttaThreeEight => "runge-kutta-three-eight",
            Self::RungeKuttaGaussLegendre4 => "runge-kutta-gauss-legendre-4",
            Self::RichardsonExtrapolation2 => "richardson-extrapolation-2",
            Self::RichardsonExtrapolation3 => "richardson-extrapolation-3",
            Self::AdamsBashforth2 => "adams-bashforth-2",
            Self::AdamsMoulton2 => "adams-moulton-2",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scheme {
    type Err = PdeError;

    fn from_str(s: &str) -> PdeResult<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .iter()
            .copied()
            .find(|scheme| scheme.name() == normalized)
            .ok_or_else(|| {
                ConfigurationError::UnknownScheme {
                    name: s.to_string(),
                }
                .into()
            })
    }
}

// ============================================================================
// Solver Options
// ============================================================================

/// Options for the finite difference solver lifecycle.
#[derive(Debug, Clone)]
pub struct SolverOptions {
    /// Gauss-Legendre sub-steps per warm-start step for multi-step schemes.
    pub warm_start_substeps: usize,
    /// Reject an advance whose result contains NaN or infinite entries.
    pub check_finite: bool,
    /// Relative residual above which a linear solve in the scheme transform is
    /// treated as singular. `None` uses [`SolverOptions::default_singular_tolerance`].
    pub singular_tolerance: Option<f64>,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            warm_start_substeps: 4,
            check_finite: true,
            singular_tolerance: None,
        }
    }
}

impl SolverOptions {
    pub fn validate(&self) -> PdeResult<()> {
        if self.warm_start_substeps == 0 {
            return Err(ConfigurationError::InvalidParameter {
                parameter: "warm_start_substeps".to_string(),
                message: "must be at least 1".to_string(),
            }
            .into());
        }
        if let Some(tol) = self.singular_tolerance {
            if !(tol.is_finite() && tol > 0.0) {
                return Err(ConfigurationError::InvalidParameter {
                    parameter: "singular_tolerance".to_string(),
                    message: format!("must be finite and positive, got {}", tol),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Residual tolerance for the given precision.
    pub fn singular_tolerance_for(&self, dtype: DType) -> f64 {
        self.singular_tolerance
            .unwrap_or_else(|| Self::default_singular_tolerance(dtype))
    }

    pub fn default_singular_tolerance(dtype: DType) -> f64 {
        match dtype {
            DType::F32 => 1e-4,
            _ => 1e-10,
        }
    }
}
