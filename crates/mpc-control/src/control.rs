//! Receding-horizon control: time window, formulate-once, solve, history.

use std::collections::VecDeque;

use mpc_core::time_tolerance;
use mpc_core::timing::{RunStats, Timer};
use mpc_signals::{Predictor, Row, SignalTable};

use crate::error::{ControlError, ControlResult};
use crate::estimation::StateEstimator;
use crate::formulation::{ControlFormulation, ControlStep};
use crate::settings::{ControlSettings, HistoryPolicy};

/// A controller that formulates its optimization problem once and re-solves
/// it at every receding step.
///
/// The cached formulation is created lazily by the first [`Control::solve`]
/// (or eagerly by [`Control::formulate`]) and is never rebuilt.
pub struct Control<F: ControlFormulation, E, P> {
    formulation: F,
    estimator: E,
    predictor: P,
    parameters: Row,
    settings: ControlSettings,
    history: HistoryPolicy,
    cached: Option<F::Formulation>,
    formulations: usize,
    solutions: VecDeque<(f64, SignalTable)>,
    stats: RunStats,
}

impl<F, E, P> Control<F, E, P>
where
    F: ControlFormulation,
    E: StateEstimator,
    P: Predictor,
{
    pub fn new(
        formulation: F,
        estimator: E,
        predictor: P,
        settings: ControlSettings,
    ) -> ControlResult<Self> {
        settings.validate()?;
        Ok(Self {
            formulation,
            estimator,
            predictor,
            parameters: Row::new(),
            settings,
            history: HistoryPolicy::default(),
            cached: None,
            formulations: 0,
            solutions: VecDeque::new(),
            stats: RunStats::default(),
        })
    }

    pub fn with_parameters(mut self, parameters: Row) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_history(mut self, history: HistoryPolicy) -> Self {
        self.history = history;
        self
    }

    pub fn settings(&self) -> &ControlSettings {
        &self.settings
    }

    pub fn parameters(&self) -> &Row {
        &self.parameters
    }

    pub fn formulation(&self) -> &F {
        &self.formulation
    }

    pub fn estimator(&self) -> &E {
        &self.estimator
    }

    pub fn predictor(&self) -> &P {
        &self.predictor
    }

    pub fn is_formulated(&self) -> bool {
        self.cached.is_some()
    }

    /// The cached problem structure, once formulated.
    pub fn formulated(&self) -> Option<&F::Formulation> {
        self.cached.as_ref()
    }

    /// How many times the formulation phase has run (0 or 1).
    pub fn formulation_count(&self) -> usize {
        self.formulations
    }

    /// Stored solutions, oldest first, with their start times.
    pub fn solutions(&self) -> impl Iterator<Item = (f64, &SignalTable)> {
        self.solutions.iter().map(|(t, s)| (*t, s))
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Control sample times `start, start + timestep, ..., start + horizon`.
    pub fn time_window(&self, start: f64) -> ControlResult<Vec<f64>> {
        let n = self.settings.steps()?;
        Ok((0..=n)
            .map(|k| start + k as f64 * self.settings.timestep)
            .collect())
    }

    /// Build the problem structure using a throwaway estimate and prediction
    /// at time 0.
    pub fn formulate(&mut self, measurements: &SignalTable) -> ControlResult<()> {
        if self.cached.is_some() {
            return Err(ControlError::StateError {
                what: "control problem already formulated".to_string(),
            });
        }
        let timer = Timer::start("formulate");
        let time = self.time_window(0.0)?;
        let state = self.estimator.estimate(0.0, measurements)?;
        let prediction = self.predictor.predict(&time)?;
        let step = ControlStep {
            parameters: &self.parameters,
            time: &time,
            state: &state,
            prediction: &prediction,
        };
        let formulation = self.formulation.formulate(&step)?;
        self.cached = Some(formulation);
        self.formulations += 1;
        timer.stop_into(&self.stats.formulate);
        tracing::debug!(steps = time.len() - 1, "control problem formulated");
        Ok(())
    }

    /// Solve the control problem over the window starting at `start`.
    ///
    /// `measurements` are the emulator results the state estimate is taken
    /// from. Returns the control trajectory over the whole window.
    pub fn solve(&mut self, start: f64, measurements: &SignalTable) -> ControlResult<SignalTable> {
        if self.cached.is_none() {
            self.formulate(measurements)?;
        }
        let timer = Timer::start("solve");
        let time = self.time_window(start)?;
        let state = self.estimator.estimate(start, measurements)?;
        let prediction = self.predictor.predict(&time)?;
        let formulation = self.cached.as_ref().ok_or_else(|| ControlError::StateError {
            what: "control problem not formulated".to_string(),
        })?;
        let step = ControlStep {
            parameters: &self.parameters,
            time: &time,
            state: &state,
            prediction: &prediction,
        };
        let solution = self.formulation.solve(formulation, &step)?;
        timer.stop_into(&self.stats.solve);
        check_coverage(&solution, &time)?;
        self.remember(start, &solution);
        Ok(solution)
    }

    fn remember(&mut self, start: f64, solution: &SignalTable) {
        match self.history.capacity() {
            Some(0) => {}
            Some(n) => {
                self.solutions.push_back((start, solution.clone()));
                while self.solutions.len() > n {
                    self.solutions.pop_front();
                }
            }
            None => self.solutions.push_back((start, solution.clone())),
        }
    }
}

fn check_coverage(solution: &SignalTable, time: &[f64]) -> ControlResult<()> {
    let (start, end) = (time[0], time[time.len() - 1]);
    if solution.t_min() > start + time_tolerance(start)
        || solution.t_max() < end - time_tolerance(end)
    {
        return Err(ControlError::config(format!(
            "control trajectory covers [{}, {}], window is [{start}, {end}]",
            solution.t_min(),
            solution.t_max()
        )));
    }
    Ok(())
}
