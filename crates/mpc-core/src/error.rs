use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

/// Coarse classification shared by every error type in the workspace.
///
/// Configuration and state errors are fatal and never retried. Solver errors
/// abort the receding loop and are handed back to the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed input data or options, detected at construction/formulation.
    Configuration,
    /// An operation was invoked out of its required order.
    State,
    /// The optimization did not reach an optimal status.
    Solver,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("{what}: {numerator} is not an integer multiple of {denominator}")]
    NotMultiple {
        what: &'static str,
        numerator: f64,
        denominator: f64,
    },
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Configuration
    }
}
