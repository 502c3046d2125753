//! The contract an emulated plant fulfils.

use mpc_signals::{Row, SignalTable};

use crate::error::SimResult;

/// A simulation engine the [`crate::Emulator`] drives one window at a time.
///
/// The engine is an opaque blocking call. It receives the last recorded row
/// as its initial state and must return a table whose time column starts at
/// `start` and ends at `stop`.
pub trait SimulationEngine {
    /// Inputs the engine reads; every one must be declared on the emulator.
    fn input_names(&self) -> Vec<String>;

    /// Parameters without a default value.
    fn required_parameters(&self) -> Vec<String> {
        Vec::new()
    }

    /// Simulate `[start, stop]`.
    ///
    /// `initial` may carry names the engine does not know; they are ignored.
    fn simulate(
        &mut self,
        start: f64,
        stop: f64,
        initial: &Row,
        parameters: &Row,
        input: &SignalTable,
    ) -> SimResult<SignalTable>;
}

impl<E: SimulationEngine + ?Sized> SimulationEngine for Box<E> {
    fn input_names(&self) -> Vec<String> {
        (**self).input_names()
    }

    fn required_parameters(&self) -> Vec<String> {
        (**self).required_parameters()
    }

    fn simulate(
        &mut self,
        start: f64,
        stop: f64,
        initial: &Row,
        parameters: &Row,
        input: &SignalTable,
    ) -> SimResult<SignalTable> {
        (**self).simulate(start, stop, initial, parameters, input)
    }
}
