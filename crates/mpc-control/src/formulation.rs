//! The pluggable optimal-control problem.

use mpc_signals::{Row, SignalTable};

use crate::error::ControlResult;

/// Everything a formulation sees at one receding step.
#[derive(Debug, Clone, Copy)]
pub struct ControlStep<'a> {
    /// Control parameters fixed for the whole run.
    pub parameters: &'a Row,
    /// Control sample times, `start ..= start + horizon`.
    pub time: &'a [f64],
    /// Estimated state at `time[0]`.
    pub state: &'a Row,
    /// Predicted disturbances at every entry of `time`.
    pub prediction: &'a SignalTable,
}

impl ControlStep<'_> {
    pub fn start(&self) -> f64 {
        self.time[0]
    }

    /// Number of control intervals.
    pub fn steps(&self) -> usize {
        self.time.len() - 1
    }
}

/// An optimal control problem split into a structural and a numeric phase.
///
/// [`ControlFormulation::formulate`] runs once per [`crate::Control`] and
/// builds the time-invariant structure: variables, constraints and their
/// identifiers. [`ControlFormulation::solve`] then re-applies the time-varying
/// bounds, coefficients and initial conditions of each step to that
/// structure, invokes the solver and returns the control trajectory.
///
/// The trajectory must cover `step.time`. Solver failures are returned as
/// errors, never retried.
pub trait ControlFormulation {
    type Formulation;

    fn formulate(&self, step: &ControlStep<'_>) -> ControlResult<Self::Formulation>;

    fn solve(
        &self,
        formulation: &Self::Formulation,
        step: &ControlStep<'_>,
    ) -> ControlResult<SignalTable>;
}
