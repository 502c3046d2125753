//! Model traits for pluggable dynamic systems.

use mpc_signals::Row;

use crate::error::SimResult;

/// A dynamic system in the form integrators consume.
///
/// State arithmetic is provided by the model so integrators stay generic over
/// the state representation.
pub trait TransientModel {
    type State: Clone;

    fn initial_state(&self) -> Self::State;

    /// State derivative `dx/dt = f(t, x)`.
    ///
    /// Takes `&mut self` so models may cache work between evaluations.
    fn rhs(&mut self, t: f64, x: &Self::State) -> SimResult<Self::State>;

    /// Element-wise `a + b`.
    fn add(&self, a: &Self::State, b: &Self::State) -> Self::State;

    /// `scale * a`.
    fn scale(&self, a: &Self::State, scale: f64) -> Self::State;
}

/// A forced state-space model `dx/dt = f(t, x, u, p)` with named states,
/// inputs and parameters.
///
/// [`crate::OdeEngine`] turns such a model into a [`crate::SimulationEngine`].
pub trait DynamicModel {
    fn state_names(&self) -> Vec<String>;

    fn input_names(&self) -> Vec<String>;

    fn parameter_names(&self) -> Vec<String>;

    /// State used for every state without an explicit initial condition.
    fn default_state(&self) -> Vec<f64>;

    /// Parameter defaults. Parameters absent here must be set explicitly.
    fn default_parameters(&self) -> Row {
        Row::new()
    }

    /// `x`, `u` and `p` are ordered like the corresponding name lists.
    fn derivatives(&self, t: f64, x: &[f64], u: &[f64], p: &[f64]) -> SimResult<Vec<f64>>;
}
