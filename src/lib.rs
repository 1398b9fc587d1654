//! Adaptive finite element solution of the Poisson problem $-\Delta u = f$ on triangle meshes.
//!
//! The central type is [`PoissonFemModel`](model::PoissonFemModel), a solver session bound to a
//! single mesh. A session assembles and solves the discrete system, evaluates several error
//! norms against a known exact solution and computes a gradient recovery error indicator.
//! [`run_adaptive`](adaptive::run_adaptive) drives the solve-estimate-mark-refine loop.
use nalgebra::RealField;

pub mod adaptive;
pub mod assembly;
pub mod boundary;
pub mod connectivity;
pub mod element;
pub mod error;
pub mod integrate;
pub mod mesh;
pub mod model;
pub mod problem;
#[cfg(feature = "proptest")]
pub mod proptest;
pub mod quadrature;
pub mod solver;
pub mod space;

pub extern crate nalgebra;
pub extern crate nalgebra_sparse;

pub use error::PoissonError;

/// Convenience alias for results produced by this crate.
pub type Result<T> = std::result::Result<T, PoissonError>;

/// Scalar type used throughout the crate.
///
/// Used as a trait alias for the traits frequently needed by generic routines.
pub trait Real: RealField + Copy {}

impl<T> Real for T where T: RealField + Copy {}
