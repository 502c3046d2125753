//! Error types for emulation.

use mpc_core::{CoreError, ErrorKind};
use mpc_signals::SignalError;
use thiserror::Error;

/// Errors encountered while configuring or advancing the emulator.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid emulator configuration: {what}")]
    Configuration { what: String },

    /// Operation invoked out of order, or the engine broke a result invariant.
    #[error("Invalid emulator state: {what}")]
    State { what: String },

    #[error("Non-physical condition: {what}")]
    NonPhysical { what: String },

    #[error("Engine error: {message}")]
    Engine { message: String },

    #[error(transparent)]
    Signals(#[from] SignalError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type SimResult<T> = Result<T, SimError>;

impl SimError {
    pub(crate) fn config(what: impl Into<String>) -> Self {
        SimError::Configuration { what: what.into() }
    }

    pub(crate) fn state(what: impl Into<String>) -> Self {
        SimError::State { what: what.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SimError::Configuration { .. } => ErrorKind::Configuration,
            SimError::State { .. } | SimError::NonPhysical { .. } | SimError::Engine { .. } => {
                ErrorKind::State
            }
            SimError::Signals(e) => e.kind(),
            SimError::Core(e) => e.kind(),
        }
    }
}
