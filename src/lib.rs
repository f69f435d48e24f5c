//! Finite difference time stepping for linear advection-diffusion PDEs.
//!
//! A [`FiniteDifferenceSolver`](pde::FiniteDifferenceSolver) turns a problem
//! description (grid, coefficients, boundary conditions, time step and scheme)
//! into a stack of update matrices once, then advances the solution with it.
//! All storage is `numr` tensors, so the same solver runs on the CPU, CUDA or
//! WebGPU runtime at single or double precision.
//!
//! ```ignore
//! use fdpde::pde::{CpuSolver1D, PdeInput1D, Scheme};
//! use numr::runtime::cpu::{CpuClient, CpuDevice};
//! use numr::tensor::Tensor;
//!
//! let device = CpuDevice::new();
//! let client = CpuClient::new(device.clone());
//!
//! let grid: Vec<f64> = (0..11).map(|i| i as f64 / 10.0).collect();
//! let input = PdeInput1D {
//!     grid: Tensor::from_slice(&grid, &[11], &device),
//!     velocity: Tensor::from_slice(&[0.0; 11], &[11], &device),
//!     diffusion: Tensor::from_slice(&[1.0; 11], &[11], &device),
//!     boundary: vec![],
//!     initial_condition: Tensor::from_slice(&grid, &[11], &device),
//!     dt: 1e-3,
//!     scheme: Scheme::CrankNicolson,
//! };
//!
//! let mut solver = CpuSolver1D::new(&client, &input)?;
//! solver.advance(&client, 100)?;
//! let u: Vec<f64> = solver.current()?.to_vec();
//! ```

pub mod pde;

pub use numr::dtype::DType;
