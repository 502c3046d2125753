//! Control side of the receding-horizon loop.
//!
//! A [`Control`] combines three pluggable roles:
//! - a [`StateEstimator`] answering "what is the state at time t"
//! - a [`mpc_signals::Predictor`] forecasting disturbances over the horizon
//! - a [`ControlFormulation`] that builds an optimal control problem once and
//!   re-solves it with fresh numeric data at every step
//!
//! `Control` itself owns the invariant parts: the time window, the
//! formulate-once protocol and the solution history.

pub mod control;
pub mod error;
pub mod estimation;
pub mod formulation;
pub mod settings;

pub use control::Control;
pub use error::{ControlError, ControlResult};
pub use estimation::{PerfectStateEstimation, StateEstimator};
pub use formulation::{ControlFormulation, ControlStep};
pub use settings::{ControlSettings, HistoryPolicy};
