//! Convex quadratic programming backend for optimal control problems.
//!
//! Problems have the form
//!
//! ```text
//! minimize    ½ xᵀ P x + qᵀ x
//! subject to  l ≤ A x ≤ u,   lb ≤ x ≤ ub
//! ```
//!
//! The sparsity of `A` and `P` together with the variable and constraint
//! identifiers is fixed once in a [`QpStructure`]. Every solve takes a fresh
//! [`QpData`] carrying the numeric values (costs, bounds, right-hand sides,
//! coefficients), so one structure serves every receding-horizon step.
//! The iteration is the operator-splitting (ADMM) scheme popularized by OSQP.

pub mod admm;
pub mod error;
pub mod problem;

pub use admm::{QpSettings, QpSolution, QpStatus, solve};
pub use error::{SolverError, SolverResult};
pub use problem::{QpBuilder, QpData, QpStructure};
