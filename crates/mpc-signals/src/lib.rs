//! Signal tables, interpolation and boundary conditions.
//!
//! Everything exchanged between the receding-horizon components is a
//! [`SignalTable`]: named numeric columns sharing one strictly increasing
//! `time` column. On top of it this crate provides:
//! - piecewise-linear and zero-order-hold interpolation kernels
//! - [`BoundaryConditions`], a read-only disturbance source with periodic or
//!   hold-edge extrapolation
//! - the [`Predictor`] seam and its default [`PerfectPrediction`]

pub mod boundary;
pub mod error;
pub mod interp;
pub mod prediction;
pub mod table;

pub use boundary::{BoundaryConditions, Extrapolation};
pub use error::{SignalError, SignalResult};
pub use prediction::{PerfectPrediction, Predictor};
pub use table::{Row, SignalTable, TIME};
