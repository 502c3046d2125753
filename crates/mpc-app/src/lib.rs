//! Receding-horizon MPC runs.
//!
//! This crate wires the pieces together: an [`Mpc`] owns an emulator, a
//! controller and the ground-truth boundary conditions, and runs the
//! receding-horizon loop to produce one results table. Runs can be configured
//! from YAML ([`RunConfig`]) and executed side by side ([`sweep`]).

pub mod config;
pub mod error;
pub mod mpc;
pub mod progress;
pub mod sweep;

pub use config::{BoundaryConfig, MpcOptions, RunConfig};
pub use error::{AppError, AppResult};
pub use mpc::{Mpc, NextStep};
pub use progress::MpcProgressEvent;
pub use sweep::sweep;
