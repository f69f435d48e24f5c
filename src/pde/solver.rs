//! Finite difference solver lifecycle.
//!
//! A solver is constructed in one go: the problem is validated, the solution
//! buffer is allocated and seeded, and the time discretizer is built. Only a
//! ready solver is ever returned. `advance` then applies the cached operator
//! stack, committing the result only when it is finite.
use crate::DType;

use numr::runtime::cpu::CpuRuntime;
use numr::runtime::{Runtime, RuntimeClient};
use numr::tensor::Tensor;

use crate::pde::error::{DiscretizationError, NumericalFault, PdeError, PdeResult};
use crate::pde::impl_generic::host::{count_non_finite, tensor_from_f64, tensor_to_f64};
use crate::pde::problem::{PdeInput1D, PdeInput2D};
use crate::pde::time_discretizer::TimeDiscretizer;
use crate::pde::traits::{FiniteDifferenceAlgorithms, PdeProblem};
use crate::pde::types::SolverOptions;

/// Time-stepping solver for a borrowed [`PdeProblem`].
///
/// The solution is kept as an `[n, solver_steps]` buffer whose columns run
/// from the oldest to the newest state; the newest column is the current
/// state. For multi-step schemes the columns after the initial condition are
/// filled by a warm-start integrator during construction.
#[derive(Debug)]
pub struct FiniteDifferenceSolver<'p, R, P>
where
    R: Runtime<DType = DType>,
    P: PdeProblem<R>,
{
    problem: &'p P,
    options: SolverOptions,
    solution: Tensor<R>,
    time_discretizer: TimeDiscretizer<R>,
    warm_start: Option<TimeDiscretizer<R>>,
    steps_taken: usize,
}

/// Solver for 1D problems on any runtime.
pub type FiniteDifferenceSolver1D<'p, R> = FiniteDifferenceSolver<'p, R, PdeInput1D<R>>;

/// Solver for 2D problems on any runtime.
pub type FiniteDifferenceSolver2D<'p, R> = FiniteDifferenceSolver<'p, R, PdeInput2D<R>>;

/// CPU solvers.
pub type CpuSolver1D<'p> = FiniteDifferenceSolver1D<'p, CpuRuntime>;
pub type CpuSolver2D<'p> = FiniteDifferenceSolver2D<'p, CpuRuntime>;

/// CUDA solvers.
#[cfg(feature = "cuda")]
pub type CudaSolver1D<'p> = FiniteDifferenceSolver1D<'p, numr::runtime::cuda::CudaRuntime>;
#[cfg(feature = "cuda")]
pub type CudaSolver2D<'p> = FiniteDifferenceSolver2D<'p, numr::runtime::cuda::CudaRuntime>;

/// WebGPU solvers.
#[cfg(feature = "wgpu")]
pub type WgpuSolver1D<'p> = FiniteDifferenceSolver1D<'p, numr::runtime::wgpu::WgpuRuntime>;
#[cfg(feature = "wgpu")]
pub type WgpuSolver2D<'p> = FiniteDifferenceSolver2D<'p, numr::runtime::wgpu::WgpuRuntime>;

impl<'p, R, P> FiniteDifferenceSolver<'p, R, P>
where
    R: Runtime<DType = DType>,
    P: PdeProblem<R>,
{
    /// Construct a ready solver with default options.
    pub fn new<C>(client: &C, problem: &'p P) -> PdeResult<Self>
    where
        C: FiniteDifferenceAlgorithms<R> + RuntimeClient<R>,
    {
        Self::with_options(client, problem, SolverOptions::default())
    }

    /// Construct a ready solver.
    ///
    /// Configuration errors are reported before anything is allocated.
    /// Discretization errors abort construction.
    pub fn with_options<C>(client: &C, problem: &'p P, options: SolverOptions) -> PdeResult<Self>
    where
        C: FiniteDifferenceAlgorithms<R> + RuntimeClient<R>,
    {
        problem.validate()?;
        options.validate()?;

        let scheme = problem.scheme();
        let dt = problem.dt();
        let n = problem.point_count();
        let s = scheme.solver_steps();

        // Setup: every history column starts at the initial condition
        let initial = tensor_to_f64(problem.initial_condition(), "setup")
            .map_err(DiscretizationError::from)?;
        let seeded = seed_columns(client, &[initial], n, s, problem.dtype())?;

        tracing::debug!(
            dimensions = P::DIMENSIONS,
            points = n,
            solver_steps = s,
            scheme = %scheme,
            dtype = ?problem.dtype(),
            "allocated solution buffer"
        );

        // Build the discretizer
        let space_op = problem.space_operator(client)?;
        let projection = problem.boundary_projection()?;
        let time_discretizer =
            client.fdm_time_discretizer(&space_op, &projection, dt, scheme, &options)?;
        let warm_start = if s > 1 {
            Some(client.fdm_warm_start_discretizer(&space_op, &projection, dt, &options)?)
        } else {
            None
        };

        if tracing::enabled!(tracing::Level::TRACE) {
            tracing::trace!("{}", time_discretizer.describe());
        }

        let mut solver = Self {
            problem,
            options,
            solution: seeded,
            time_discretizer,
            warm_start,
            steps_taken: 0,
        };
        if s > 1 {
            solver.solution = solver.initial_solution(client)?;
        }
        solver.steps_taken = s - 1;

        tracing::info!(
            points = n,
            scheme = %scheme,
            dt,
            "finite difference solver ready"
        );

        Ok(solver)
    }

    /// Initial buffer: the initial condition followed by warm-start states.
    fn initial_solution<C>(&self, client: &C) -> PdeResult<Tensor<R>>
    where
        C: FiniteDifferenceAlgorithms<R> + RuntimeClient<R>,
    {
        let n = self.problem.point_count();
        let s = self.solver_steps();
        let initial = tensor_to_f64(self.problem.initial_condition(), "setup")
            .map_err(DiscretizationError::from)?;

        let warm_start = match &self.warm_start {
            Some(w) if s > 1 => w,
            _ => return seed_columns(client, &[initial], n, s, self.problem.dtype()),
        };

        let mut columns = vec![initial];
        let mut state = self
            .problem
            .initial_condition()
            .contiguous()
            .reshape(&[n, 1])
            .map_err(DiscretizationError::from)?;
        for _ in 1..s {
            state = client
                .fdm_iterate(warm_start, &state, 1)
                .map_err(warm_start_fault)?;
            columns.push(tensor_to_f64(&state, "warm_start").map_err(DiscretizationError::from)?);
        }

        tracing::debug!(
            columns = s - 1,
            substeps = self.options.warm_start_substeps,
            "filled warm-start history"
        );

        seed_columns(client, &columns, n, s, self.problem.dtype())
    }

    /// Advance the solution by `n_steps` time steps.
    ///
    /// On error the solution is left at its previous state.
    pub fn advance<C>(&mut self, client: &C, n_steps: usize) -> PdeResult<()>
    where
        C: FiniteDifferenceAlgorithms<R> + RuntimeClient<R>,
    {
        if n_steps == 0 {
            return Ok(());
        }

        let staged = client.fdm_iterate(&self.time_discretizer, &self.solution, n_steps)?;

        if self.options.check_finite {
            let values = tensor_to_f64(&staged, "advance").map_err(NumericalFault::from)?;
            let entries = count_non_finite(&values);
            if entries > 0 {
                tracing::warn!(steps = n_steps, entries, "advance produced non-finite values");
                return Err(NumericalFault::NonFinite {
                    steps: n_steps,
                    entries,
                }
                .into());
            }
        }

        self.solution = staged;
        self.steps_taken += n_steps;

        tracing::debug!(
            steps = n_steps,
            steps_taken = self.steps_taken,
            time = self.time(),
            "advanced solution"
        );

        Ok(())
    }

    /// Restore the state right after construction, reusing the discretizer.
    pub fn reset<C>(&mut self, client: &C) -> PdeResult<()>
    where
        C: FiniteDifferenceAlgorithms<R> + RuntimeClient<R>,
    {
        self.solution = self.initial_solution(client)?;
        self.steps_taken = self.solver_steps() - 1;
        tracing::debug!("solver reset");
        Ok(())
    }

    pub fn time_discretizer(&self) -> &TimeDiscretizer<R> {
        &self.time_discretizer
    }

    /// Solution buffer `[n, solver_steps]`, oldest column first.
    pub fn solution(&self) -> &Tensor<R> {
        &self.solution
    }

    /// Current state in the problem's field shape.
    pub fn current(&self) -> PdeResult<Tensor<R>> {
        let last = self.solver_steps() - 1;
        let column = self
            .solution
            .narrow(1, last, 1)
            .map_err(NumericalFault::from)?
            .contiguous();
        Ok(column
            .reshape(&self.problem.field_shape())
            .map_err(NumericalFault::from)?)
    }

    pub fn problem(&self) -> &'p P {
        self.problem
    }

    pub fn options(&self) -> &SolverOptions {
        &self.options
    }

    /// Logical step index of the current state.
    pub fn steps_taken(&self) -> usize {
        self.steps_taken
    }

    /// Simulated time of the current state.
    pub fn time(&self) -> f64 {
        self.steps_taken as f64 * self.problem.dt()
    }

    pub fn solver_steps(&self) -> usize {
        self.time_discretizer.solver_steps()
    }
}

/// Upload `columns` as an `[n, s]` buffer, repeating the last column.
fn seed_columns<R, C>(
    client: &C,
    columns: &[Vec<f64>],
    n: usize,
    s: usize,
    dtype: DType,
) -> PdeResult<Tensor<R>>
where
    R: Runtime<DType = DType>,
    C: RuntimeClient<R>,
{
    let mut data = vec![0.0; n * s];
    for k in 0..s {
        let column = &columns[k.min(columns.len() - 1)];
        for i in 0..n {
            data[i * s + k] = column[i];
        }
    }
    Ok(tensor_from_f64::<R>(&data, &[n, s], dtype, client.device(), "setup")
        .map_err(DiscretizationError::from)?)
}

/// Warm-start failures belong to the discretizer build.
fn warm_start_fault(err: PdeError) -> PdeError {
    match err {
        PdeError::Numerical(fault) => DiscretizationError::Backend(fault.to_string()).into(),
        other => other,
    }
}
