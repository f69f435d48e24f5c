//! PDE algorithm trait definitions.

pub mod finite_difference;
pub mod problem;

pub use finite_difference::FiniteDifferenceAlgorithms;
pub use problem::PdeProblem;
