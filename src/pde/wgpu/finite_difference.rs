//! WebGPU implementation of finite difference PDE solvers.

use numr::runtime::wgpu::{WgpuClient, WgpuRuntime};
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

impl FiniteDifferenceAlgorithms<WgpuRuntime> for WgpuClient {
    fn fdm_space_operator_1d(
        &self,
        input: &PdeInput1D<WgpuRuntime>,
    ) -> PdeResult<Tensor<WgpuRuntime>> {
        space_operator_1d_impl(self, input)
    }

    fn fdm_space_operator_2d(
        &self,
        input: &PdeInput2D<WgpuRuntime>,
    ) -> PdeResult<Tensor<WgpuRuntime>> {
        space_operator_2d_impl(self, input)
    }

    fn fdm_time_discretizer(
        &self,
        space_op: &Tensor<WgpuRuntime>,
        projection: &BoundaryProjection,
        dt: f64,
        scheme: Scheme,
        options: &SolverOptions,
    ) -> PdeResult<TimeDiscretizer<WgpuRuntime>> {
        time_discretizer_impl(self, space_op, projection, dt, scheme, options)
    }

    fn fdm_warm_start_discretizer(
        &self,
        space_op: &Tensor<WgpuRuntime>,
        projection: &BoundaryProjection,
        dt: f64,
        options: &SolverOptions,
    ) -> PdeResult<TimeDiscretizer<WgpuRuntime>> {
        warm_start_discretizer_impl(self, space_op, projection, dt, options)
    }

    fn fdm_iterate(
        &self,
        discretizer: &TimeDiscretizer<WgpuRuntime>,
        solution: &Tensor<WgpuRuntime>,
        n_steps: usize,
    ) -> PdeResult<Tensor<WgpuRuntime>> {
        iterate_impl(self, discretizer, solution, n_steps)
    }
}
