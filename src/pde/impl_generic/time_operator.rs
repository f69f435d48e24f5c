//! Scheme transforms: space operator -> time operator stack.
//!
//! For the linear system `du/dt = L u` every scheme reduces to a small set of
//! matrix polynomials and rational functions of `hL`. They are evaluated on
//! the client's runtime with `matmul` and `solve`, and every solve is checked
//! against its residual.
use crate::DType;

use numr::ops::{LinalgOps, ScalarOps, ShapeOps, TensorOps};
use numr::runtime::{Runtime, RuntimeClient};
use numr::tensor::Tensor;

use crate::pde::error::{DiscretizationError, PdeResult};
use crate::pde::time_discretizer::TimeDiscretizer;
use crate::pde::types::{Scheme, SolverOptions};

use super::boundary::BoundaryProjection;
use super::host::{count_non_finite, max_abs, tensor_from_f64, tensor_to_f64};

/// Shared state of one transform: identity, `hL` and the solve tolerance.
struct Transform<'a, R: Runtime, C> {
    client: &'a C,
    eye: Tensor<R>,
    space_op: &'a Tensor<R>,
    tolerance: f64,
    scheme: Scheme,
}

impl<'a, R, C> Transform<'a, R, C>
where
    R: Runtime<DType = DType>,
    C: TensorOps<R> + ScalarOps<R> + LinalgOps<R> + RuntimeClient<R>,
{
    fn new(
        client: &'a C,
        space_op: &'a Tensor<R>,
        tolerance: f64,
        scheme: Scheme,
    ) -> PdeResult<Self> {
        let n = space_op.shape()[0];
        let eye = client
            .eye(n, None, space_op.dtype())
            .map_err(DiscretizationError::from)?;
        Ok(Self {
            client,
            eye,
            space_op,
            tolerance,
            scheme,
        })
    }

    /// `h L`
    fn scaled(&self, h: f64) -> PdeResult<Tensor<R>> {
        Ok(self
            .client
            .mul_scalar(self.space_op, h)
            .map_err(DiscretizationError::from)?)
    }

    /// `I + alpha * m`
    fn shifted(&self, m: &Tensor<R>, alpha: f64) -> PdeResult<Tensor<R>> {
        let scaled = self
            .client
            .mul_scalar(m, alpha)
            .map_err(DiscretizationError::from)?;
        Ok(self
            .client
            .add(&self.eye, &scaled)
            .map_err(DiscretizationError::from)?)
    }

    fn matmul(&self, a: &Tensor<R>, b: &Tensor<R>) -> PdeResult<Tensor<R>> {
        Ok(self.client.matmul(a, b).map_err(DiscretizationError::from)?)
    }

    /// `m^k` by repeated squaring.
    fn power(&self, m: &Tensor<R>, mut k: usize) -> PdeResult<Tensor<R>> {
        let mut result: Option<Tensor<R>> = None;
        let mut base = m.clone();
        while k > 0 {
            if k & 1 == 1 {
                result = Some(match result {
                    Some(r) => self.matmul(&r, &base)?,
                    None => base.clone(),
                });
            }
            k >>= 1;
            if k > 0 {
                base = self.matmul(&base, &base)?;
            }
        }
        Ok(result.unwrap_or_else(|| self.eye.clone()))
    }

    /// Degree `order` Taylor polynomial of `exp(hL)`, in Horner form.
    fn taylor(&self, h: f64, order: usize) -> PdeResult<Tensor<R>> {
        let hl = self.scaled(h)?;
        let mut acc = self.eye.clone();
        for k in (1..=order).rev() {
            let product = self.matmul(&hl, &acc)?;
            acc = self.shifted(&product, 1.0 / k as f64)?;
        }
        Ok(acc)
    }

    /// Backward Euler step `(I - hL)^-1`.
    fn backward_euler(&self, h: f64) -> PdeResult<Tensor<R>> {
        let hl = self.scaled(h)?;
        let m = self.shifted(&hl, -1.0)?;
        self.solve(&m, &self.eye)
    }

    /// Padé (2,2) step `(I - hL/2 + (hL)^2/12)^-1 (I + hL/2 + (hL)^2/12)`.
    fn gauss_legendre(&self, h: f64) -> PdeResult<Tensor<R>> {
        let hl = self.scaled(h)?;
        let hl2 = self
            .client
            .mul_scalar(&self.matmul(&hl, &hl)?, 1.0 / 12.0)
            .map_err(DiscretizationError::from)?;
        let lhs = self.shifted(&hl, -0.5)?;
        let lhs = self.client.add(&lhs, &hl2).map_err(DiscretizationError::from)?;
        let rhs = self.shifted(&hl, 0.5)?;
        let rhs = self.client.add(&rhs, &hl2).map_err(DiscretizationError::from)?;
        self.solve(&lhs, &rhs)
    }

    /// `a * x + b * y`
    fn combine(&self, a: f64, x: &Tensor<R>, b: f64, y: &Tensor<R>) -> PdeResult<Tensor<R>> {
        let ax = self.client.mul_scalar(x, a).map_err(DiscretizationError::from)?;
        let by = self.client.mul_scalar(y, b).map_err(DiscretizationError::from)?;
        Ok(self.client.add(&ax, &by).map_err(DiscretizationError::from)?)
    }

    /// Solve `m x = b`, rejecting singular or ill-conditioned systems.
    fn solve(&self, m: &Tensor<R>, b: &Tensor<R>) -> PdeResult<Tensor<R>> {
        let singular = |reason: String| DiscretizationError::SingularOperator {
            context: self.scheme.to_string(),
            reason,
        };

        let x = self
            .client
            .solve(m, b)
            .map_err(|e| singular(e.to_string()))?;

        let residual = self
            .client
            .sub(&self.matmul(m, &x)?, b)
            .map_err(DiscretizationError::from)?;

        let x_host = tensor_to_f64(&x, "solve").map_err(DiscretizationError::from)?;
        let non_finite = count_non_finite(&x_host);
        if non_finite > 0 {
            return Err(singular(format!("{} non-finite entries in solution", non_finite)).into());
        }

        let m_host = tensor_to_f64(m, "solve").map_err(DiscretizationError::from)?;
        let b_host = tensor_to_f64(b, "solve").map_err(DiscretizationError::from)?;
        let r_host = tensor_to_f64(&residual, "solve").map_err(DiscretizationError::from)?;

        let n = m.shape()[0] as f64;
        let scale = n * max_abs(&m_host) * max_abs(&x_host) + max_abs(&b_host);
        let r_max = max_abs(&r_host);
        if r_max > self.tolerance * scale {
            return Err(singular(format!(
                "residual {:.3e} exceeds tolerance {:.3e}",
                r_max,
                self.tolerance * scale
            ))
            .into());
        }

        Ok(x)
    }

    /// Unprojected stack matrices of `scheme` for step `h`.
    fn scheme_matrices(&self, h: f64) -> PdeResult<Vec<Tensor<R>>> {
        let matrices = match self.scheme {
            Scheme::ExplicitEuler => vec![self.taylor(h, 1)?],
            Scheme::RungeKuttaRalston => vec![self.taylor(h, 2)?],
            Scheme::RungeKutta3 => vec![self.taylor(h, 3)?],
            Scheme::RungeKutta4 | Scheme::RungeKuttaThreeEight => vec![self.taylor(h, 4)?],
            Scheme::ImplicitEuler => vec![self.backward_euler(h)?],
            Scheme::CrankNicolson => {
                let hl = self.scaled(h)?;
                let lhs = self.shifted(&hl, -0.5)?;
                let rhs = self.shifted(&hl, 0.5)?;
                vec![self.solve(&lhs, &rhs)?]
            }
            Scheme::RungeKuttaGaussLegendre4 => vec![self.gauss_legendre(h)?],
            Scheme::RichardsonExtrapolation2 => {
                let full = self.backward_euler(h)?;
                let half = self.power(&self.backward_euler(h / 2.0)?, 2)?;
                vec![self.combine(2.0, &half, -1.0, &full)?]
            }
            Scheme::RichardsonExtrapolation3 => {
                let full = self.backward_euler(h)?;
                let half = self.power(&self.backward_euler(h / 2.0)?, 2)?;
                let quarter = self.power(&self.backward_euler(h / 4.0)?, 4)?;
                let partial = self.combine(8.0 / 3.0, &quarter, -2.0, &half)?;
                let third = self
                    .client
                    .mul_scalar(&full, 1.0 / 3.0)
                    .map_err(DiscretizationError::from)?;
                vec![
                    self.client
                        .add(&partial, &third)
                        .map_err(DiscretizationError::from)?,
                ]
            }
            Scheme::AdamsBashforth2 => {
                let hl = self.scaled(h)?;
                let newest = self.shifted(&hl, 1.5)?;
                let previous = self
                    .client
                    .mul_scalar(&hl, -0.5)
                    .map_err(DiscretizationError::from)?;
                vec![newest, previous]
            }
            Scheme::AdamsMoulton2 => {
                let hl = self.scaled(h)?;
                let lhs = self.shifted(&hl, -5.0 / 12.0)?;
                let newest = self.shifted(&hl, 2.0 / 3.0)?;
                let previous = self
                    .client
                    .mul_scalar(&hl, -1.0 / 12.0)
                    .map_err(DiscretizationError::from)?;
                vec![self.solve(&lhs, &newest)?, self.solve(&lhs, &previous)?]
            }
        };
        Ok(matrices)
    }
}

/// Fold the projection into `matrices` and stack them with the offset.
fn project_and_stack<R, C>(
    client: &C,
    matrices: Vec<Tensor<R>>,
    projection: &BoundaryProjection,
    scheme: Scheme,
    dt: f64,
) -> PdeResult<TimeDiscretizer<R>>
where
    R: Runtime<DType = DType>,
    C: TensorOps<R> + LinalgOps<R> + ShapeOps<R> + RuntimeClient<R>,
{
    let n = projection.points();
    let dtype = matrices[0].dtype();
    let device = client.device();
    let (q, c) = projection.dense();

    let matrices = if projection.is_identity() {
        matrices
    } else {
        let q = tensor_from_f64::<R>(&q, &[n, n], dtype, device, "fdm_time_discretizer")
            .map_err(DiscretizationError::from)?;
        matrices
            .iter()
            .map(|a| client.matmul(&q, a))
            .collect::<numr::error::Result<Vec<_>>>()
            .map_err(DiscretizationError::from)?
    };

    let refs: Vec<&Tensor<R>> = matrices.iter().collect();
    let operators = client.stack(&refs, 0).map_err(DiscretizationError::from)?;
    let offset = tensor_from_f64::<R>(&c, &[n, 1], dtype, device, "fdm_time_discretizer")
        .map_err(DiscretizationError::from)?;

    Ok(TimeDiscretizer::new(operators, offset, scheme, dt))
}

/// Build the time operator stack of `scheme` from the space operator.
pub fn time_discretizer_impl<R, C>(
    client: &C,
    space_op: &Tensor<R>,
    projection: &BoundaryProjection,
    dt: f64,
    scheme: Scheme,
    options: &SolverOptions,
) -> PdeResult<TimeDiscretizer<R>>
where
    R: Runtime<DType = DType>,
    C: TensorOps<R> + ScalarOps<R> + LinalgOps<R> + ShapeOps<R> + RuntimeClient<R>,
{
    let tolerance = options.singular_tolerance_for(space_op.dtype());
    let transform = Transform::new(client, space_op, tolerance, scheme)?;
    let matrices = transform.scheme_matrices(dt)?;

    tracing::debug!(
        scheme = %scheme,
        implicit = scheme.is_implicit(),
        dt,
        solver_steps = matrices.len(),
        points = projection.points(),
        projected_nodes = projection.rules().len(),
        "built time operator stack"
    );

    project_and_stack(client, matrices, projection, scheme, dt)
}

/// Build the single-matrix operator used to fill the warm-start columns of a
/// multi-step scheme: `substeps` Gauss-Legendre steps of `dt / substeps`.
pub fn warm_start_discretizer_impl<R, C>(
    client: &C,
    space_op: &Tensor<R>,
    projection: &BoundaryProjection,
    dt: f64,
    options: &SolverOptions,
) -> PdeResult<TimeDiscretizer<R>>
where
    R: Runtime<DType = DType>,
    C: TensorOps<R> + ScalarOps<R> + LinalgOps<R> + ShapeOps<R> + RuntimeClient<R>,
{
    let scheme = Scheme::RungeKuttaGaussLegendre4;
    let substeps = options.warm_start_substeps;
    let tolerance = options.singular_tolerance_for(space_op.dtype());
    let transform = Transform::new(client, space_op, tolerance, scheme)?;

    let step = transform.gauss_legendre(dt / substeps as f64)?;
    let full = transform.power(&step, substeps)?;

    tracing::debug!(dt, substeps, "built warm-start operator");

    project_and_stack(client, vec![full], projection, scheme, dt)
}
