//! Generic implementations of the finite difference kernels.
//!
//! Backend trait impls delegate here; the host-side assembly helpers run in
//! f64 and are shared by every runtime.

pub mod boundary;
pub mod host;
pub mod iterate;
pub mod space_operator;
pub mod stencil;
pub mod time_operator;

pub use boundary::{AxisBoundary, BoundaryProjection, ProjectionRule, SideCondition};
pub use iterate::iterate_impl;
pub use space_operator::{space_operator_1d_impl, space_operator_2d_impl};
pub use time_operator::{time_discretizer_impl, warm_start_discretizer_impl};
