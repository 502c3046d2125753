//! Error types for signal table operations.

use mpc_core::{CoreError, ErrorKind};
use thiserror::Error;

/// Result type for signal operations.
pub type SignalResult<T> = Result<T, SignalError>;

/// Errors raised while building or combining signal tables.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SignalError {
    /// Malformed table: missing `time`, length mismatch, non-monotonic time.
    #[error("Invalid signal table: {what}")]
    Configuration { what: String },

    /// A named signal is not present in the table.
    #[error("Unknown signal: {name}")]
    UnknownSignal { name: String },

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl SignalError {
    pub fn config(what: impl Into<String>) -> Self {
        Self::Configuration { what: what.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Configuration
    }
}
