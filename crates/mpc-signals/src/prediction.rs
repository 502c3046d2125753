//! Predictions of future boundary conditions.

use std::sync::Arc;

use crate::boundary::BoundaryConditions;
use crate::error::SignalResult;
use crate::table::SignalTable;

/// Forecast of the disturbances over a future time window.
///
/// Implementations may inject noise, bias or reduced resolution, but must
/// return one row per requested time with `time` echoing `times`.
pub trait Predictor {
    fn predict(&mut self, times: &[f64]) -> SignalResult<SignalTable>;
}

/// Perfect foresight: the prediction is the boundary conditions themselves.
#[derive(Debug, Clone)]
pub struct PerfectPrediction {
    boundary_conditions: Arc<BoundaryConditions>,
}

impl PerfectPrediction {
    pub fn new(boundary_conditions: Arc<BoundaryConditions>) -> Self {
        Self {
            boundary_conditions,
        }
    }

    pub fn boundary_conditions(&self) -> &BoundaryConditions {
        &self.boundary_conditions
    }
}

impl Predictor for PerfectPrediction {
    fn predict(&mut self, times: &[f64]) -> SignalResult<SignalTable> {
        self.boundary_conditions.query_table(times)
    }
}

impl<P: Predictor + ?Sized> Predictor for Box<P> {
    fn predict(&mut self, times: &[f64]) -> SignalResult<SignalTable> {
        (**self).predict(times)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_prediction_delegates_to_query() {
        let table = SignalTable::from_columns([
            ("time", vec![0.0, 3600.0, 7200.0]),
            ("T_am", vec![273.15, 274.15, 275.15]),
        ])
        .unwrap();
        let bcs = Arc::new(BoundaryConditions::with_periodic(table, false).unwrap());
        let mut prediction = PerfectPrediction::new(bcs.clone());

        let times = [0.0, 1800.0, 3600.0];
        let predicted = prediction.predict(&times).unwrap();
        assert_eq!(predicted, bcs.query_table(&times).unwrap());
        assert_eq!(predicted.time(), &times);
        assert!((predicted.signal("T_am").unwrap()[1] - 273.65).abs() < 1e-9);
    }
}
