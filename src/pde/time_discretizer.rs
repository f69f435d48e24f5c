//! The stationary time operator stack.

use std::fmt::Write as _;

use numr::error::Result;
use numr::runtime::Runtime;
use numr::tensor::Tensor;

use crate::DType;
use crate::pde::impl_generic::host::tensor_to_f64;
use crate::pde::types::Scheme;

/// Operator stack advancing the solution by one time step.
///
/// Matrix `k` multiplies the state `k` steps behind the newest one:
///
/// ```text
/// u[m+1] = sum_k A[k] u[m-k] + c
/// ```
///
/// The boundary projection is already folded into every `A[k]`, and `c` is the
/// constant part of the projection.
#[derive(Debug, Clone)]
pub struct TimeDiscretizer<R: Runtime> {
    operators: Tensor<R>,
    offset: Tensor<R>,
    scheme: Scheme,
    dt: f64,
}

impl<R: Runtime<DType = DType>> TimeDiscretizer<R> {
    /// Wrap an operator stack `[s, n, n]` and an offset `[n, 1]`.
    pub fn new(operators: Tensor<R>, offset: Tensor<R>, scheme: Scheme, dt: f64) -> Self {
        Self {
            operators,
            offset,
            scheme,
            dt,
        }
    }

    /// Number of past states one step reads.
    pub fn solver_steps(&self) -> usize {
        self.operators.shape()[0]
    }

    /// Side length of every stack matrix.
    pub fn point_count(&self) -> usize {
        self.operators.shape()[1]
    }

    /// Matrix `k` of the stack as a contiguous `[n, n]` tensor.
    pub fn matrix(&self, k: usize) -> Result<Tensor<R>> {
        let n = self.point_count();
        self.operators.narrow(0, k, 1)?.contiguous().reshape(&[n, n])
    }

    /// The full stack `[s, n, n]`.
    pub fn operators(&self) -> &Tensor<R> {
        &self.operators
    }

    /// Boundary offset `[n, 1]`.
    pub fn offset(&self) -> &Tensor<R> {
        &self.offset
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn dtype(&self) -> DType {
        self.operators.dtype()
    }

    /// Human readable dump of the stack, one matrix after another.
    pub fn describe(&self) -> String {
        let s = self.solver_steps();
        let n = self.point_count();
        let mut out = format!(
            "TimeDiscretizer {{ scheme: {}, dt: {}, solver_steps: {}, points: {}, dtype: {:?} }}\n",
            self.scheme,
            self.dt,
            s,
            n,
            self.dtype()
        );

        let (data, offset) = match (
            tensor_to_f64(&self.operators, "describe"),
            tensor_to_f64(&self.offset, "describe"),
        ) {
            (Ok(data), Ok(offset)) => (data, offset),
            _ => {
                out.push_str("  <operators unavailable>\n");
                return out;
            }
        };

        for k in 0..s {
            let _ = writeln!(out, "  A[{}] =", k);
            for i in 0..n {
                out.push_str("   ");
                for j in 0..n {
                    let _ = write!(out, " {:>12.5e}", data[(k * n + i) * n + j]);
                }
                out.push('\n');
            }
        }
        out.push_str("  c =\n   ");
        for v in &offset {
            let _ = write!(out, " {:>12.5e}", v);
        }
        out.push('\n');
        out
    }
}
