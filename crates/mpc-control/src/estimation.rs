//! State estimation from emulator measurements.

use mpc_signals::{Row, SignalTable};

use crate::error::ControlResult;

/// Produces the controller's view of the plant state at one instant.
///
/// `measurements` is the emulator's accumulated results. `time` need not be
/// the latest recorded instant.
pub trait StateEstimator {
    fn estimate(&mut self, time: f64, measurements: &SignalTable) -> ControlResult<Row>;
}

impl<S: StateEstimator + ?Sized> StateEstimator for Box<S> {
    fn estimate(&mut self, time: f64, measurements: &SignalTable) -> ControlResult<Row> {
        (**self).estimate(time, measurements)
    }
}

/// Reads the measurements directly, interpolating linearly between samples
/// and holding the edge values outside the recorded range.
#[derive(Debug, Clone, Default)]
pub struct PerfectStateEstimation {
    names: Option<Vec<String>>,
}

impl PerfectStateEstimation {
    /// Estimate every recorded signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Estimate only the given signals.
    pub fn with_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: Some(names.into_iter().map(Into::into).collect()),
        }
    }
}

impl StateEstimator for PerfectStateEstimation {
    fn estimate(&mut self, time: f64, measurements: &SignalTable) -> ControlResult<Row> {
        match &self.names {
            Some(names) => names
                .iter()
                .map(|name| Ok((name.clone(), measurements.value_at(name, time)?)))
                .collect(),
            None => measurements
                .names()
                .map(|name| Ok((name.to_string(), measurements.value_at(name, time)?)))
                .collect(),
        }
    }
}
