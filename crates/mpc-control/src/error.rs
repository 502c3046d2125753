//! Error types for control operations.

use mpc_core::{CoreError, ErrorKind};
use mpc_signals::SignalError;
use mpc_solver::SolverError;
use thiserror::Error;

/// Result type for control operations.
pub type ControlResult<T> = Result<T, ControlError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    /// Bad horizon/timestep/receding values or a malformed formulation output.
    #[error("Invalid control configuration: {what}")]
    Configuration { what: String },

    /// Controller state error.
    #[error("Controller state error: {what}")]
    StateError { what: String },

    #[error(transparent)]
    Solver(#[from] SolverError),

    #[error(transparent)]
    Signals(#[from] SignalError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl ControlError {
    pub fn config(what: impl Into<String>) -> Self {
        ControlError::Configuration { what: what.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ControlError::Configuration { .. } => ErrorKind::Configuration,
            ControlError::StateError { .. } => ErrorKind::State,
            ControlError::Solver(e) => e.kind(),
            ControlError::Signals(e) => e.kind(),
            ControlError::Core(e) => e.kind(),
        }
    }
}
