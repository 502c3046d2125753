//! The emulator: configuration, warm-up and the accumulated results table.

use serde::{Deserialize, Serialize};

use mpc_core::{ensure_finite, ensure_positive, same_time, time_tolerance};
use mpc_signals::{Row, SignalTable};

use crate::engine::SimulationEngine;
use crate::error::{SimError, SimResult};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmulatorSettings {
    /// Length of the warm-up run performed by [`Emulator::initialize`].
    pub initialization_time: f64,
}

impl Default for EmulatorSettings {
    fn default() -> Self {
        Self {
            initialization_time: 1.0,
        }
    }
}

/// Drives a [`SimulationEngine`] window by window and accumulates `res`.
///
/// `res` exists only between [`Emulator::initialize`] and
/// [`Emulator::reset`]. Every successful [`Emulator::advance`] appends rows
/// that strictly continue its time column and carry every tracked variable.
/// A failed call leaves `res` untouched.
#[derive(Debug)]
pub struct Emulator<E> {
    engine: E,
    inputs: Vec<String>,
    parameters: Row,
    initial_conditions: Row,
    settings: EmulatorSettings,
    res: Option<SignalTable>,
}

impl<E: SimulationEngine> Emulator<E> {
    pub fn new<I, S>(engine: E, inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = inputs.into_iter().map(Into::into).collect();
        names.sort();
        names.dedup();
        Self {
            engine,
            inputs: names,
            parameters: Row::new(),
            initial_conditions: Row::new(),
            settings: EmulatorSettings::default(),
            res: None,
        }
    }

    pub fn with_settings(mut self, settings: EmulatorSettings) -> SimResult<Self> {
        ensure_positive(settings.initialization_time, "initialization_time")?;
        self.settings = settings;
        Ok(self)
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Declared input names, sorted.
    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    pub fn parameters(&self) -> &Row {
        &self.parameters
    }

    pub fn initial_conditions(&self) -> &Row {
        &self.initial_conditions
    }

    pub fn is_initialized(&self) -> bool {
        self.res.is_some()
    }

    /// Merge parameter values into the configuration.
    pub fn set_parameters(&mut self, parameters: &Row) -> SimResult<()> {
        self.check_configurable("set_parameters")?;
        for (name, value) in parameters {
            ensure_finite(*value, "parameter")?;
            self.parameters.insert(name.clone(), *value);
        }
        Ok(())
    }

    /// Merge initial-condition values into the configuration.
    pub fn set_initial_conditions(&mut self, initial_conditions: &Row) -> SimResult<()> {
        self.check_configurable("set_initial_conditions")?;
        for (name, value) in initial_conditions {
            ensure_finite(*value, "initial condition")?;
            self.initial_conditions.insert(name.clone(), *value);
        }
        Ok(())
    }

    /// Initial conditions given as trajectories: the last value of every
    /// signal is used.
    pub fn set_initial_conditions_from_table(&mut self, table: &SignalTable) -> SimResult<()> {
        self.set_initial_conditions(&table.last_row())
    }

    /// Apply the configuration, run the warm-up and seed `res` with one row.
    ///
    /// Initial conditions and parameters that the engine does not report are
    /// dropped with a warning and the warm-up is repeated without them.
    pub fn initialize(&mut self) -> SimResult<()> {
        if self.res.is_some() {
            return Err(SimError::state("emulator already initialized"));
        }
        let missing_inputs: Vec<String> = self
            .engine
            .input_names()
            .into_iter()
            .filter(|name| !self.inputs.contains(name))
            .collect();
        if !missing_inputs.is_empty() {
            return Err(SimError::state(format!(
                "engine inputs not declared on the emulator: {}",
                missing_inputs.join(", ")
            )));
        }
        let missing_parameters: Vec<String> = self
            .engine
            .required_parameters()
            .into_iter()
            .filter(|name| !self.parameters.contains_key(name))
            .collect();
        if !missing_parameters.is_empty() {
            return Err(SimError::state(format!(
                "required parameters not set: {}",
                missing_parameters.join(", ")
            )));
        }

        let stop = self.settings.initialization_time;
        let mut warm_up = SignalTable::new(vec![0.0, stop])?;
        for name in &self.inputs {
            warm_up.insert(name.clone(), vec![0.0, 0.0])?;
        }

        let first = loop {
            let result = self.engine.simulate(
                0.0,
                stop,
                &self.initial_conditions,
                &self.parameters,
                &warm_up,
            )?;
            let unknown_ics = drop_unreported(&mut self.initial_conditions, &result);
            let unknown_parameters = drop_unreported(&mut self.parameters, &result);
            if unknown_ics.is_empty() && unknown_parameters.is_empty() {
                break result;
            }
            if !unknown_ics.is_empty() {
                tracing::warn!(names = ?unknown_ics, "ignoring unknown initial conditions");
            }
            if !unknown_parameters.is_empty() {
                tracing::warn!(names = ?unknown_parameters, "ignoring unknown parameters");
            }
        };

        if !same_time(first.t_min(), 0.0) {
            return Err(SimError::state(format!(
                "warm-up results start at {} instead of 0",
                first.t_min()
            )));
        }
        let mut row = first.row(0);
        for name in &self.inputs {
            row.entry(name.clone()).or_insert(0.0);
        }
        let seeded = SignalTable::from_row(0.0, &row)?;
        tracing::info!(
            variables = seeded.names().count(),
            initialization_time = stop,
            "emulator initialized"
        );
        self.res = Some(seeded);
        Ok(())
    }

    /// Forget `res` so the emulator can be initialized again.
    pub fn reset(&mut self) {
        self.res = None;
    }

    /// Accumulated results.
    pub fn res(&self) -> SimResult<&SignalTable> {
        self.res
            .as_ref()
            .ok_or_else(|| SimError::state("emulator not initialized"))
    }

    /// Simulate `[start, stop]` under `input` and append the results.
    ///
    /// Returns the rows of the window as reported (including the shared row
    /// at `start`).
    pub fn advance(&mut self, start: f64, stop: f64, input: &SignalTable) -> SimResult<SignalTable> {
        let tail = self.res()?.t_max();
        if !same_time(start, tail) {
            return Err(SimError::state(format!(
                "advance starts at {start} but results end at {tail}"
            )));
        }
        if stop <= start || same_time(start, stop) {
            return Err(SimError::config(format!(
                "advance window [{start}, {stop}] is empty"
            )));
        }
        for name in &self.inputs {
            if !input.contains(name) {
                return Err(SimError::config(format!("input `{name}` not supplied")));
            }
        }
        if input.t_min() > start + time_tolerance(start)
            || input.t_max() < stop - time_tolerance(stop)
        {
            return Err(SimError::config(format!(
                "input covers [{}, {}] but the window is [{start}, {stop}]",
                input.t_min(),
                input.t_max()
            )));
        }

        let initial = self.res()?.last_row();
        let mut result = self
            .engine
            .simulate(start, stop, &initial, &self.parameters, input)?;
        if !same_time(result.t_min(), start) || !same_time(result.t_max(), stop) {
            return Err(SimError::state(format!(
                "engine returned [{}, {}] for window [{start}, {stop}]",
                result.t_min(),
                result.t_max()
            )));
        }
        for name in &self.inputs {
            if !result.contains(name) {
                let values = result
                    .time()
                    .iter()
                    .map(|&t| input.value_at(name, t))
                    .collect::<Result<Vec<_>, _>>()?;
                result.insert(name.clone(), values)?;
            }
        }

        let res = self.res.as_mut().ok_or_else(|| SimError::state("emulator not initialized"))?;
        let tracked: Vec<String> = res.names().map(str::to_string).collect();
        if let Some(name) = tracked.iter().find(|name| !result.contains(name)) {
            return Err(SimError::state(format!(
                "engine results dropped tracked variable `{name}`"
            )));
        }
        let window = result.select(tracked.iter().map(String::as_str))?;
        let appended = res.append(&window)?;
        tracing::debug!(start, stop, rows = appended, "emulator advanced");
        Ok(window)
    }

    fn check_configurable(&self, operation: &str) -> SimResult<()> {
        if self.res.is_some() {
            return Err(SimError::state(format!(
                "{operation} called after initialize; reset first"
            )));
        }
        Ok(())
    }
}

/// Remove entries whose name is not a column of `reported`; return them.
fn drop_unreported(values: &mut Row, reported: &SignalTable) -> Vec<String> {
    let unknown: Vec<String> = values
        .keys()
        .filter(|name| !reported.contains(name))
        .cloned()
        .collect();
    for name in &unknown {
        values.remove(name);
    }
    unknown
}
