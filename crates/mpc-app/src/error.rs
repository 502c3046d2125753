//! Error types for the run layer.

use std::path::PathBuf;

use mpc_control::ControlError;
use mpc_core::{CoreError, ErrorKind};
use mpc_signals::SignalError;
use mpc_sim::SimError;

/// Unified error for configuring and running an MPC simulation.
///
/// Lower-layer errors are kept intact so their [`ErrorKind`] survives.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid run configuration: {0}")]
    Configuration(String),

    #[error("Failed to read run file: {path}")]
    ConfigFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Control error: {0}")]
    Control(#[from] ControlError),

    #[error("Simulation error: {0}")]
    Simulation(#[from] SimError),

    #[error("Signal error: {0}")]
    Signals(#[from] SignalError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type for mpc-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Configuration(_) | AppError::ConfigFileRead { .. } | AppError::Yaml(_) => {
                ErrorKind::Configuration
            }
            AppError::Control(e) => e.kind(),
            AppError::Simulation(e) => e.kind(),
            AppError::Signals(e) => e.kind(),
            AppError::Core(e) => e.kind(),
        }
    }
}
