//! Iteration kernel: apply the operator stack to the solution buffer.
use crate::DType;

use std::collections::VecDeque;

use numr::ops::{LinalgOps, ShapeOps, TensorOps};
use numr::runtime::{Runtime, RuntimeClient};
use numr::tensor::Tensor;

use crate::pde::error::{NumericalFault, PdeResult};
use crate::pde::time_discretizer::TimeDiscretizer;

/// Advance `solution` (`[n, s]`, oldest column first) by `n_steps`.
///
/// Returns the new buffer and leaves the input untouched. Each step computes
/// `sum_k A[k] u[newest - k] + c`, drops the oldest column and appends the
/// new state.
pub fn iterate_impl<R, C>(
    client: &C,
    discretizer: &TimeDiscretizer<R>,
    solution: &Tensor<R>,
    n_steps: usize,
) -> PdeResult<Tensor<R>>
where
    R: Runtime<DType = DType>,
    C: TensorOps<R> + LinalgOps<R> + ShapeOps<R> + RuntimeClient<R>,
{
    let s = discretizer.solver_steps();
    let n = discretizer.point_count();

    if solution.shape() != [n, s] {
        return Err(NumericalFault::SolutionShape {
            expected: vec![n, s],
            actual: solution.shape().to_vec(),
        }
        .into());
    }

    if n_steps == 0 {
        return Ok(solution.clone());
    }

    let matrices = (0..s)
        .map(|k| discretizer.matrix(k))
        .collect::<numr::error::Result<Vec<_>>>()
        .map_err(NumericalFault::from)?;
    let offset = discretizer.offset();

    let mut history: VecDeque<Tensor<R>> = (0..s)
        .map(|k| solution.narrow(1, k, 1).map(|col| col.contiguous()))
        .collect::<numr::error::Result<_>>()
        .map_err(NumericalFault::from)?;

    for _ in 0..n_steps {
        let mut next = client
            .matmul(&matrices[0], &history[s - 1])
            .map_err(NumericalFault::from)?;
        for (k, matrix) in matrices.iter().enumerate().skip(1) {
            let term = client
                .matmul(matrix, &history[s - 1 - k])
                .map_err(NumericalFault::from)?;
            next = client.add(&next, &term).map_err(NumericalFault::from)?;
        }
        next = client.add(&next, offset).map_err(NumericalFault::from)?;

        history.pop_front();
        history.push_back(next);
    }

    let refs: Vec<&Tensor<R>> = history.iter().collect();
    Ok(client.cat(&refs, 1).map_err(NumericalFault::from)?)
}
