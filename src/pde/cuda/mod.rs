//! CUDA implementation of PDE solvers.

mod finite_difference;
