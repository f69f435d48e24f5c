//! CPU implementation of finite difference PDE solvers.

use numr::runtime::cpu::{CpuClient, CpuRuntime};
use numr::tensor::Tensor;

use crate::pde::error::PdeResult;
use crate::pde::impl_generic::{
    BoundaryProjection, iterate_impl, space_operator_1d_impl, space_operator_2d_impl,
    time_discretizer_impl, warm_start_discretizer_impl,
};
use crate::pde::problem::{PdeInput1D, PdeInput2D};
use crate::pde::time_discretizer::TimeDiscretizer;
use crate::pde::traits::FiniteDifferenceAlgorithms;
use crate::pde::types::{Scheme, SolverOptions};

impl FiniteDifferenceAlgorithms<CpuRuntime> for CpuClient {
    fn fdm_space_operator_1d(
        &self,
        input: &PdeInput1D<CpuRuntime>,
    ) -> PdeResult<Tensor<CpuRuntime>> {
        space_operator_1d_impl(self, input)
    }

    fn fdm_space_operator_2d(
        &self,
        input: &PdeInput2D<CpuRuntime>,
    ) -> PdeResult<Tensor<CpuRuntime>> {
        space_operator_2d_impl(self, input)
    }

    fn fdm_time_discretizer(
        &self,
        space_op: &Tensor<CpuRuntime>,
        projection: &BoundaryProjection,
        dt: f64,
        scheme: Scheme,
        options: &SolverOptions,
    ) -> PdeResult<TimeDiscretizer<CpuRuntime>> {
        time_discretizer_impl(self, space_op, projection, dt, scheme, options)
    }

    fn fdm_warm_start_discretizer(
        &self,
        space_op: &Tensor<CpuRuntime>,
        projection: &BoundaryProjection,
        dt: f64,
        options: &SolverOptions,
    ) -> PdeResult<TimeDiscretizer<CpuRuntime>> {
        warm_start_discretizer_impl(self, space_op, projection, dt, options)
    }

    fn fdm_iterate(
        &self,
        discretizer: &TimeDiscretizer<CpuRuntime>,
        solution: &Tensor<CpuRuntime>,
        n_steps: usize,
    ) -> PdeResult<Tensor<CpuRuntime>> {
        iterate_impl(self, discretizer, solution, n_steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DType;
    use crate::pde::error::{DiscretizationError, NumericalFault};
    use crate::pde::solver::{CpuSolver1D, CpuSolver2D};
    use crate::pde::types::{BoundaryCondition, BoundarySide, BoundarySpec};
    use crate::pde::PdeError;
    use numr::ops::{BinaryOps, LinalgOps, UtilityOps};
    use numr::runtime::cpu::CpuDevice;

    fn setup() -> (CpuClient, CpuDevice) {
        let device = CpuDevice::new();
        let client = CpuClient::new(device.clone());
        (client, device)
    }

    fn tensor(data: &[f64], device: &CpuDevice) -> Tensor<CpuRuntime> {
        Tensor::<CpuRuntime>::from_slice(data, &[data.len()], device)
    }

    fn uniform_grid(n: usize, h: f64) -> Vec<f64> {
        (0..n).map(|i| i as f64 * h).collect()
    }

    /// 1D problem with constant coefficients.
    fn problem_1d(
        device: &CpuDevice,
        grid: &[f64],
        velocity: f64,
        diffusion: f64,
        initial: &[f64],
        dt: f64,
        scheme: Scheme,
    ) -> PdeInput1D<CpuRuntime> {
        let n = grid.len();
        PdeInput1D {
            grid: tensor(grid, device),
            velocity: tensor(&vec![velocity; n], device),
            diffusion: tensor(&vec![diffusion; n], device),
            boundary: vec![],
            initial_condition: tensor(initial, device),
            dt,
            scheme,
        }
    }

    fn bump(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let x = i as f64 / (n - 1) as f64;
                (std::f64::consts::PI * x).sin()
            })
            .collect()
    }

    fn column(solution: &Tensor<CpuRuntime>, k: usize) -> Vec<f64> {
        solution.narrow(1, k, 1).unwrap().contiguous().to_vec()
    }

    fn assert_close(a: &[f64], b: &[f64], tol: f64) {
        assert_eq!(a.len(), b.len());
        for (i, (x, y)) in a.iter().zip(b).enumerate() {
            assert!(
                (x - y).abs() <= tol,
                "index {}: {} vs {} (tol {})",
                i,
                x,
                y,
                tol
            );
        }
    }

    #[test]
    fn test_explicit_step_matches_stencil() {
        let (client, device) = setup();

        // 5 points, h = 0.25, pure diffusion, homogeneous Dirichlet
        let grid = uniform_grid(5, 0.25);
        let u0 = [0.0, 1.0, 2.0, 1.0, 0.0];
        let input = problem_1d(&device, &grid, 0.0, 1.0, &u0, 0.01, Scheme::ExplicitEuler);

        let mut solver = CpuSolver1D::new(&client, &input).unwrap();
        solver.advance(&client, 1).unwrap();

        // u_i + dt * (u_{i-1} - 2 u_i + u_{i+1}) / h^2
        let expected = [0.0, 1.0, 1.68, 1.0, 0.0];
        let current: Vec<f64> = solver.current().unwrap().to_vec();
        assert_close(&current, &expected, 1e-12);
        assert_eq!(solver.steps_taken(), 1);
        assert!((solver.time() - 0.01).abs() < 1e-15);
    }

    #[test]
    fn test_advance_composition() {
        let (client, device) = setup();
        let grid = uniform_grid(9, 0.125);

        for scheme in [Scheme::CrankNicolson, Scheme::AdamsBashforth2] {
            let input = problem_1d(&device, &grid, 0.5, 0.2, &bump(9), 0.01, scheme);

            let mut split = CpuSolver1D::new(&client, &input).unwrap();
            split.advance(&client, 3).unwrap();
            split.advance(&client, 4).unwrap();

            let mut whole = CpuSolver1D::new(&client, &input).unwrap();
            whole.advance(&client, 7).unwrap();

            let a: Vec<f64> = split.solution().to_vec();
            let b: Vec<f64> = whole.solution().to_vec();
            assert_close(&a, &b, 1e-12);
            assert_eq!(split.steps_taken(), whole.steps_taken());
        }
    }

    #[test]
    fn test_advance_zero_is_identity() {
        let (client, device) = setup();
        let grid = uniform_grid(7, 1.0 / 6.0);
        let input = problem_1d(&device, &grid, 0.0, 0.1, &bump(7), 0.05, Scheme::AdamsMoulton2);

        let mut solver = CpuSolver1D::new(&client, &input).unwrap();
        let before: Vec<f64> = solver.solution().to_vec();
        solver.advance(&client, 0).unwrap();
        let after: Vec<f64> = solver.solution().to_vec();

        assert_eq!(before, after);
        assert_eq!(solver.steps_taken(), 1);
    }

    #[test]
    fn test_initial_column_and_stack_shape() {
        let (client, device) = setup();
        let n = 6;
        let grid = [0.0, 0.1, 0.3, 0.4, 0.7, 1.0];
        let u0 = [0.0, 0.3, 0.9, 0.7, 0.2, 0.0];

        for scheme in Scheme::ALL {
            let input = problem_1d(&device, &grid, 0.2, 0.05, &u0, 0.01, scheme);
            let solver = CpuSolver1D::new(&client, &input).unwrap();
            let s = scheme.solver_steps();

            assert_eq!(solver.solution().shape(), &[n, s], "{}", scheme);
            assert_eq!(
                solver.time_discretizer().operators().shape(),
                &[s, n, n],
                "{}",
                scheme
            );
            assert_eq!(solver.time_discretizer().offset().shape(), &[n, 1]);
            assert_eq!(column(solver.solution(), 0), u0.to_vec(), "{}", scheme);
            assert_eq!(solver.steps_taken(), s - 1);
        }
    }

    #[test]
    fn test_dimension_mismatch() {
        let (client, device) = setup();
        let grid = uniform_grid(5, 0.25);

        let mut input = problem_1d(
            &device,
            &grid,
            0.0,
            1.0,
            &[0.0; 5],
            0.01,
            Scheme::ImplicitEuler,
        );
        input.velocity = tensor(&[0.0; 4], &device);
        let err = CpuSolver1D::new(&client, &input).unwrap_err();
        assert!(err.is_configuration(), "{}", err);

        let input = problem_1d(&device, &grid, 0.0, 1.0, &[0.0; 6], 0.01, Scheme::ImplicitEuler);
        assert!(CpuSolver1D::new(&client, &input).unwrap_err().is_configuration());

        let input = problem_1d(&device, &grid, 0.0, 1.0, &[0.0; 5], -0.01, Scheme::ImplicitEuler);
        assert!(CpuSolver1D::new(&client, &input).unwrap_err().is_configuration());

        let mut input = problem_1d(
            &device,
            &grid,
            0.0,
            1.0,
            &[0.0; 5],
            0.01,
            Scheme::ImplicitEuler,
        );
        input.boundary = vec![BoundarySpec::new(
            BoundarySide::Top,
            BoundaryCondition::Dirichlet(tensor(&[1.0], &device)),
        )];
        assert!(CpuSolver1D::new(&client, &input).unwrap_err().is_configuration());

        let descending = [1.0, 0.5, 0.0];
        let input = problem_1d(
            &device,
            &descending,
            0.0,
            1.0,
            &[0.0; 3],
            0.01,
            Scheme::ImplicitEuler,
        );
        assert!(CpuSolver1D::new(&client, &input).unwrap_err().is_configuration());
    }

    #[test]
    fn test_dtype_mismatch() {
        let (client, device) = setup();
        let grid = uniform_grid(5, 0.25);
        let mut input = problem_1d(
            &device,
            &grid,
            0.0,
            1.0,
            &[0.0; 5],
            0.01,
            Scheme::ExplicitEuler,
        );
        input.initial_condition = Tensor::<CpuRuntime>::from_slice(&[0.0f32; 5], &[5], &device);

        let err = CpuSolver1D::new(&client, &input).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_space_operator_validates_input() {
        let (client, device) = setup();
        let grid = uniform_grid(5, 0.25);

        let mut input = problem_1d(
            &device,
            &grid,
            0.0,
            1.0,
            &[0.0; 5],
            0.01,
            Scheme::CrankNicolson,
        );
        input.velocity = tensor(&[0.0; 3], &device);
        let err = client.fdm_space_operator_1d(&input).unwrap_err();
        assert!(err.is_configuration(), "{}", err);

        let x = uniform_grid(3, 0.5);
        let mut input = problem_2d(
            &device,
            &x,
            &x,
            (0.0, 0.0, 1.0),
            &[0.0; 9],
            0.01,
            Scheme::CrankNicolson,
        );
        input.diffusion = tensor(&[1.0; 8], &device);
        let err = client.fdm_space_operator_2d(&input).unwrap_err();
        assert!(err.is_configuration(), "{}", err);
    }

    #[test]
    fn test_iterate_rejects_wrong_solution_shape() {
        let (client, device) = setup();
        let grid = uniform_grid(5, 0.25);
        let input = problem_1d(&device, &grid, 0.0, 1.0, &bump(5), 0.01, Scheme::ImplicitEuler);
        let solver = CpuSolver1D::new(&client, &input).unwrap();

        let wide = Tensor::<CpuRuntime>::from_slice(&[0.0; 10], &[5, 2], &device);
        let err = client
            .fdm_iterate(solver.time_discretizer(), &wide, 1)
            .unwrap_err();
        assert!(err.is_numerical(), "{}", err);
        assert!(matches!(
            err,
            PdeError::Numerical(NumericalFault::SolutionShape { .. })
        ));

        let flat = tensor(&bump(5), &device);
        let err = client
            .fdm_iterate(solver.time_discretizer(), &flat, 0)
            .unwrap_err();
        assert!(err.is_numerical(), "{}", err);
    }

    #[test]
    fn test_singular_implicit_operator() {
        let (client, device) = setup();

        // I - dt * L has a zero row in its interior block
        let input = problem_1d(
            &device,
            &[0.0, 1.0, 2.0],
            0.0,
            -1.0,
            &[0.0, 1.0, 0.0],
            0.5,
            Scheme::ImplicitEuler,
        );

        let err = CpuSolver1D::new(&client, &input).unwrap_err();
        assert!(
            matches!(
                err,
                PdeError::Discretization(DiscretizationError::SingularOperator { .. })
            ),
            "{}",
            err
        );
    }

    #[test]
    fn test_explicit_schemes_skip_the_solve() {
        let (client, device) = setup();

        // I - dt * L is singular, which only matters to schemes that solve
        for scheme in Scheme::ALL {
            let input = problem_1d(
                &device,
                &[0.0, 1.0, 2.0],
                0.0,
                -1.0,
                &[0.0, 1.0, 0.0],
                0.5,
                scheme,
            );
            let result = CpuSolver1D::new(&client, &input);
            if scheme == Scheme::ImplicitEuler {
                assert!(result.unwrap_err().is_discretization());
            } else if !scheme.is_implicit() {
                assert!(result.is_ok(), "{}", scheme);
            }
        }
    }

    #[test]
    fn test_one_sided_periodic_rejected() {
        let (client, device) = setup();
        let grid = uniform_grid(5, 0.25);
        let mut input = problem_1d(
            &device,
            &grid,
            0.0,
            1.0,
            &[0.0; 5],
            0.01,
            Scheme::ExplicitEuler,
        );
        input.boundary = vec![BoundarySpec::new(BoundarySide::Left, BoundaryCondition::Periodic)];

        let err = CpuSolver1D::new(&client, &input).unwrap_err();
        assert!(
            matches!(
                err,
                PdeError::Discretization(DiscretizationError::UnsupportedBoundary { .. })
            ),
            "{}",
            err
        );
    }

    #[test]
    fn test_dirichlet_values_held() {
        let (client, device) = setup();
        let grid = uniform_grid(8, 1.0 / 7.0);
        let mut input = problem_1d(
            &device,
            &grid,
            0.3,
            0.1,
            &[0.0; 8],
            0.02,
            Scheme::ImplicitEuler,
        );
        input.boundary = vec![
            BoundarySpec::new(
                BoundarySide::Left,
                BoundaryCondition::Dirichlet(tensor(&[1.0], &device)),
            ),
            BoundarySpec::new(
                BoundarySide::Right,
                BoundaryCondition::Dirichlet(tensor(&[2.0], &device)),
            ),
        ];

        let mut solver = CpuSolver1D::new(&client, &input).unwrap();
        solver.advance(&client, 10).unwrap();
        let u: Vec<f64> = solver.current().unwrap().to_vec();

        assert!((u[0] - 1.0).abs() < 1e-12);
        assert!((u[7] - 2.0).abs() < 1e-12);
        // Heat flows in from both sides
        assert!(u[1..7].iter().all(|&v| v > 0.0));
    }

    #[test]
    fn test_neumann_zero_flux_mirrors_neighbour() {
        let (client, device) = setup();
        let grid = uniform_grid(9, 0.125);
        let mut input = problem_1d(&device, &grid, 0.0, 0.5, &bump(9), 0.005, Scheme::RungeKutta4);
        input.boundary = vec![BoundarySpec::new(
            BoundarySide::All,
            BoundaryCondition::Neumann(tensor(&[], &device)),
        )];

        let mut solver = CpuSolver1D::new(&client, &input).unwrap();
        solver.advance(&client, 20).unwrap();
        let u: Vec<f64> = solver.current().unwrap().to_vec();

        assert!((u[0] - u[1]).abs() < 1e-12);
        assert!((u[8] - u[7]).abs() < 1e-12);
        assert!(u[0] > 0.0);
    }

    #[test]
    fn test_neumann_value_sets_outward_slope() {
        let (client, device) = setup();
        let grid = uniform_grid(9, 0.125);
        let mut input = problem_1d(&device, &grid, 0.2, 0.5, &bump(9), 0.01, Scheme::ImplicitEuler);
        input.boundary = vec![
            BoundarySpec::new(
                BoundarySide::Left,
                BoundaryCondition::Neumann(tensor(&[0.5], &device)),
            ),
            BoundarySpec::new(
                BoundarySide::Right,
                BoundaryCondition::Neumann(tensor(&[-1.0], &device)),
            ),
        ];

        let mut solver = CpuSolver1D::new(&client, &input).unwrap();
        solver.advance(&client, 10).unwrap();
        let u: Vec<f64> = solver.current().unwrap().to_vec();

        // Derivatives point along +x on both sides
        assert!((u[0] - (u[1] - 0.5 * 0.125)).abs() < 1e-12);
        assert!((u[8] - (u[7] - 1.0 * 0.125)).abs() < 1e-12);
    }

    #[test]
    fn test_periodic_conserves_mass() {
        let (client, device) = setup();
        let n = 8;
        let grid = uniform_grid(n, 1.0 / n as f64);
        let u0: Vec<f64> = (0..n).map(|i| if i < 3 { 1.0 } else { 0.0 }).collect();
        let mut input = problem_1d(&device, &grid, 0.5, 0.1, &u0, 0.01, Scheme::CrankNicolson);
        input.boundary = vec![BoundarySpec::new(BoundarySide::All, BoundaryCondition::Periodic)];

        let mut solver = CpuSolver1D::new(&client, &input).unwrap();
        solver.advance(&client, 50).unwrap();
        let u: Vec<f64> = solver.current().unwrap().to_vec();

        let mass0: f64 = u0.iter().sum();
        let mass: f64 = u.iter().sum();
        assert!((mass - mass0).abs() < 1e-10, "mass {} vs {}", mass, mass0);
        assert!(solver.time_discretizer().offset().to_vec::<f64>().iter().all(|&c| c == 0.0));
    }

    #[test]
    fn test_f32_agrees_with_f64() {
        let (client, device) = setup();
        let grid = uniform_grid(9, 0.125);
        let u0 = bump(9);
        let input64 = problem_1d(&device, &grid, 0.2, 0.1, &u0, 0.01, Scheme::CrankNicolson);

        let to_f32 = |v: &[f64]| -> Vec<f32> { v.iter().map(|&x| x as f32).collect() };
        let t32 = |v: &[f64]| Tensor::<CpuRuntime>::from_slice(&to_f32(v), &[v.len()], &device);
        let input32 = PdeInput1D {
            grid: t32(&grid),
            velocity: t32(&[0.2; 9]),
            diffusion: t32(&[0.1; 9]),
            boundary: vec![],
            initial_condition: t32(&u0),
            dt: 0.01,
            scheme: Scheme::CrankNicolson,
        };

        let mut s64 = CpuSolver1D::new(&client, &input64).unwrap();
        let mut s32 = CpuSolver1D::new(&client, &input32).unwrap();
        s64.advance(&client, 20).unwrap();
        s32.advance(&client, 20).unwrap();

        assert_eq!(s32.current().unwrap().dtype(), DType::F32);
        let a: Vec<f64> = s64.current().unwrap().to_vec();
        let b: Vec<f64> = s32
            .current()
            .unwrap()
            .to_vec::<f32>()
            .into_iter()
            .map(f64::from)
            .collect();
        assert_close(&a, &b, 1e-4);
    }

    #[test]
    fn test_non_finite_advance_rejected() {
        let (client, device) = setup();
        let grid = uniform_grid(5, 1.0);
        let input = problem_1d(
            &device,
            &grid,
            0.0,
            1.0,
            &[0.0, 1.0, -1.0, 1.0, 0.0],
            100.0,
            Scheme::ExplicitEuler,
        );

        let mut solver = CpuSolver1D::new(&client, &input).unwrap();
        let before: Vec<f64> = solver.solution().to_vec();

        let err = solver.advance(&client, 400).unwrap_err();
        assert!(err.is_numerical(), "{}", err);

        let after: Vec<f64> = solver.solution().to_vec();
        assert_eq!(before, after);
        assert_eq!(solver.steps_taken(), 0);
    }

    #[test]
    fn test_reset_reproduces_initial_state() {
        let (client, device) = setup();
        let grid = uniform_grid(9, 0.125);
        let input = problem_1d(&device, &grid, 0.1, 0.2, &bump(9), 0.01, Scheme::AdamsBashforth2);

        let mut solver = CpuSolver1D::new(&client, &input).unwrap();
        let initial: Vec<f64> = solver.solution().to_vec();
        assert_eq!(solver.steps_taken(), 1);

        solver.advance(&client, 5).unwrap();
        assert_eq!(solver.steps_taken(), 6);

        solver.reset(&client).unwrap();
        let restored: Vec<f64> = solver.solution().to_vec();
        assert_eq!(initial, restored);
        assert_eq!(solver.steps_taken(), 1);
    }

    #[test]
    fn test_warm_start_tracks_implicit_step() {
        let (client, device) = setup();
        let grid = uniform_grid(9, 0.125);
        let u0 = bump(9);
        let input = problem_1d(&device, &grid, 0.0, 0.1, &u0, 0.01, Scheme::AdamsMoulton2);

        let solver = CpuSolver1D::new(&client, &input).unwrap();
        let warm = column(solver.solution(), 1);

        // sin(pi x) decays as exp(-D pi^2 t) up to O(h^2)
        let decay = (-0.1 * std::f64::consts::PI.powi(2) * 0.01).exp();
        let expected: Vec<f64> = u0.iter().map(|v| v * decay).collect();
        assert_close(&warm, &expected, 1e-3);
        assert!(warm[4] < u0[4]);
    }

    // ========================================================================
    // 2D
    // ========================================================================

    fn problem_2d(
        device: &CpuDevice,
        x: &[f64],
        y: &[f64],
        coefficients: (f64, f64, f64),
        initial: &[f64],
        dt: f64,
        scheme: Scheme,
    ) -> PdeInput2D<CpuRuntime> {
        let (nx, ny) = (x.len(), y.len());
        let field = |v: f64| Tensor::<CpuRuntime>::from_slice(&vec![v; nx * ny], &[nx, ny], device);
        PdeInput2D {
            x_grid: tensor(x, device),
            y_grid: tensor(y, device),
            x_velocity: field(coefficients.0),
            y_velocity: field(coefficients.1),
            diffusion: field(coefficients.2),
            boundary: vec![],
            initial_condition: Tensor::<CpuRuntime>::from_slice(initial, &[nx, ny], device),
            dt,
            scheme,
        }
    }

    #[test]
    fn test_2d_constant_operator_is_kronecker_sum() {
        let (client, device) = setup();
        let x = [0.0, 0.3, 0.5, 0.9];
        let y = [0.0, 0.2, 0.6];
        let (vx, vy, d) = (0.4, -0.7, 0.25);
        let periodic = vec![BoundarySpec::new(BoundarySide::All, BoundaryCondition::Periodic)];

        let mut input = problem_2d(
            &device,
            &x,
            &y,
            (vx, vy, d),
            &[0.0; 12],
            0.01,
            Scheme::ExplicitEuler,
        );
        input.boundary = periodic.clone();
        let l2d = client.fdm_space_operator_2d(&input).unwrap();

        let mut x_input = problem_1d(&device, &x, vx, d, &[0.0; 4], 0.01, Scheme::ExplicitEuler);
        x_input.boundary = periodic.clone();
        let mut y_input = problem_1d(&device, &y, vy, d, &[0.0; 3], 0.01, Scheme::ExplicitEuler);
        y_input.boundary = periodic;
        let lx = client.fdm_space_operator_1d(&x_input).unwrap();
        let ly = client.fdm_space_operator_1d(&y_input).unwrap();

        let ix = client.eye(4, None, DType::F64).unwrap();
        let iy = client.eye(3, None, DType::F64).unwrap();
        let kron_sum = client
            .add(&client.kron(&lx, &iy).unwrap(), &client.kron(&ix, &ly).unwrap())
            .unwrap();

        assert_eq!(l2d.shape(), &[12, 12]);
        let a: Vec<f64> = l2d.to_vec();
        let b: Vec<f64> = kron_sum.to_vec();
        assert_close(&a, &b, 1e-12);
    }

    #[test]
    fn test_2d_explicit_step_matches_five_point_stencil() {
        let (client, device) = setup();
        let grid = uniform_grid(4, 1.0);
        let u0 = [
            0.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 2.0, 0.0, //
            0.0, 3.0, 4.0, 0.0, //
            0.0, 0.0, 0.0, 0.0,
        ];
        let input = problem_2d(
            &device,
            &grid,
            &grid,
            (0.0, 0.0, 1.0),
            &u0,
            0.1,
            Scheme::ExplicitEuler,
        );

        let mut solver = CpuSolver2D::new(&client, &input).unwrap();
        solver.advance(&client, 1).unwrap();
        let current = solver.current().unwrap();
        assert_eq!(current.shape(), &[4, 4]);

        let u: Vec<f64> = current.to_vec();
        let idx = |i: usize, j: usize| i * 4 + j;
        for i in 1..3 {
            for j in 1..3 {
                let lap = u0[idx(i - 1, j)] + u0[idx(i + 1, j)] + u0[idx(i, j - 1)]
                    + u0[idx(i, j + 1)]
                    - 4.0 * u0[idx(i, j)];
                let expected = u0[idx(i, j)] + 0.1 * lap;
                assert!((u[idx(i, j)] - expected).abs() < 1e-12, "({}, {})", i, j);
            }
        }
        assert_eq!(u[idx(0, 0)], 0.0);
        assert_eq!(u[idx(3, 2)], 0.0);
    }

    #[test]
    fn test_2d_composition_and_corners() {
        let (client, device) = setup();
        let x = uniform_grid(5, 0.25);
        let y = uniform_grid(4, 1.0 / 3.0);
        let u0: Vec<f64> = (0..20).map(|k| (k as f64 * 0.37).sin().abs()).collect();
        let mut input = problem_2d(
            &device,
            &x,
            &y,
            (0.3, 0.1, 0.05),
            &u0,
            0.02,
            Scheme::CrankNicolson,
        );
        input.boundary = vec![
            BoundarySpec::new(
                BoundarySide::All,
                BoundaryCondition::Dirichlet(tensor(&[1.0], &device)),
            ),
            BoundarySpec::new(
                BoundarySide::Bottom,
                BoundaryCondition::Dirichlet(tensor(&[2.0], &device)),
            ),
        ];

        let mut split = CpuSolver2D::new(&client, &input).unwrap();
        split.advance(&client, 2).unwrap();
        split.advance(&client, 3).unwrap();
        let mut whole = CpuSolver2D::new(&client, &input).unwrap();
        whole.advance(&client, 5).unwrap();

        let a: Vec<f64> = split.current().unwrap().to_vec();
        let b: Vec<f64> = whole.current().unwrap().to_vec();
        assert_close(&a, &b, 1e-12);

        // Bottom (j = 0) owns the corners, Top keeps the All value
        assert!((a[0] - 2.0).abs() < 1e-12);
        assert!((a[4 * 4] - 2.0).abs() < 1e-12);
        assert!((a[3] - 1.0).abs() < 1e-12);
        assert!((a[2 * 4 + 3] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_2d_initial_column_and_stack_shape() {
        let (client, device) = setup();
        let x = uniform_grid(3, 0.5);
        let y = [0.0, 0.2, 0.5, 1.0];
        let u0: Vec<f64> = (0..12).map(|k| (k as f64 * 0.61).cos()).collect();

        for scheme in Scheme::ALL {
            let input = problem_2d(&device, &x, &y, (0.2, -0.1, 0.05), &u0, 0.01, scheme);
            let solver = CpuSolver2D::new(&client, &input).unwrap();
            let s = scheme.solver_steps();

            assert_eq!(
                solver.time_discretizer().operators().shape(),
                &[s, 12, 12],
                "{}",
                scheme
            );
            assert_eq!(solver.solution().shape(), &[12, s], "{}", scheme);
            assert_eq!(column(solver.solution(), 0), u0, "{}", scheme);
            assert_eq!(solver.current().unwrap().shape(), &[3, 4]);
        }
    }

    #[test]
    fn test_2d_per_node_dirichlet_on_left() {
        let (client, device) = setup();
        let x = uniform_grid(3, 0.5);
        let y = uniform_grid(4, 1.0 / 3.0);
        let ny = 4;
        let mut input = problem_2d(
            &device,
            &x,
            &y,
            (0.0, 0.0, 0.1),
            &[0.0; 12],
            0.01,
            Scheme::ImplicitEuler,
        );
        input.boundary = vec![BoundarySpec::new(
            BoundarySide::Left,
            BoundaryCondition::Dirichlet(tensor(&[1.0, 2.0, 3.0, 4.0], &device)),
        )];

        let mut solver = CpuSolver2D::new(&client, &input).unwrap();
        solver.advance(&client, 5).unwrap();
        let u: Vec<f64> = solver.current().unwrap().to_vec();

        for j in 1..3 {
            assert!((u[j] - (j + 1) as f64).abs() < 1e-12, "j = {}", j);
        }
        // Bottom/Top keep their default zero and own the corners
        assert!(u[0].abs() < 1e-12);
        assert!(u[ny - 1].abs() < 1e-12);
        assert!(u[2 * ny].abs() < 1e-12);
    }

    #[test]
    fn test_2d_per_node_neumann_on_right() {
        let (client, device) = setup();
        let x = uniform_grid(3, 0.5);
        let y = uniform_grid(4, 1.0 / 3.0);
        let ny = 4;
        let g = [0.0, 0.4, -0.2, 0.0];
        let mut input = problem_2d(
            &device,
            &x,
            &y,
            (0.1, 0.0, 0.1),
            &[0.0; 12],
            0.01,
            Scheme::CrankNicolson,
        );
        input.boundary = vec![
            BoundarySpec::new(
                BoundarySide::Left,
                BoundaryCondition::Dirichlet(tensor(&[1.0], &device)),
            ),
            BoundarySpec::new(
                BoundarySide::Right,
                BoundaryCondition::Neumann(tensor(&g, &device)),
            ),
        ];

        let mut solver = CpuSolver2D::new(&client, &input).unwrap();
        solver.advance(&client, 4).unwrap();
        let u: Vec<f64> = solver.current().unwrap().to_vec();

        for j in 1..3 {
            let expected = u[ny + j] + g[j] * 0.5;
            assert!((u[2 * ny + j] - expected).abs() < 1e-12, "j = {}", j);
        }
        assert!(u[ny + 1] > 0.0);
    }

    #[test]
    fn test_describe_lists_every_matrix() {
        let (client, device) = setup();
        let grid = uniform_grid(4, 1.0 / 3.0);
        let input = problem_1d(&device, &grid, 0.0, 1.0, &[0.0; 4], 0.01, Scheme::AdamsBashforth2);
        let solver = CpuSolver1D::new(&client, &input).unwrap();

        let text = solver.time_discretizer().describe();
        assert!(text.contains("adams-bashforth-2"));
        assert!(text.contains("A[0]"));
        assert!(text.contains("A[1]"));
    }
}
