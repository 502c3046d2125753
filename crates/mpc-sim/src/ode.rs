//! Reference engine integrating a [`DynamicModel`] at a fixed native step.

use mpc_core::{ensure_positive, same_time, time_tolerance};
use mpc_signals::{Row, SignalTable};

use crate::engine::SimulationEngine;
use crate::error::{SimError, SimResult};
use crate::integrator::IntegratorType;
use crate::model::{DynamicModel, TransientModel};

/// Integrates a state-space model and reports a row every `dt`.
///
/// The reported variables are the model states plus its parameters (as
/// constant columns). The last step of a window is shortened so the final
/// row lands exactly on `stop`.
#[derive(Debug, Clone)]
pub struct OdeEngine<M> {
    model: M,
    dt: f64,
    integrator: IntegratorType,
}

impl<M: DynamicModel> OdeEngine<M> {
    pub fn new(model: M, dt: f64) -> SimResult<Self> {
        ensure_positive(dt, "native step")?;
        Ok(Self {
            model,
            dt,
            integrator: IntegratorType::default(),
        })
    }

    pub fn with_integrator(mut self, integrator: IntegratorType) -> Self {
        self.integrator = integrator;
        self
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    fn resolve_parameters(&self, parameters: &Row) -> SimResult<Vec<f64>> {
        let defaults = self.model.default_parameters();
        self.model
            .parameter_names()
            .iter()
            .map(|name| {
                parameters
                    .get(name)
                    .or_else(|| defaults.get(name))
                    .copied()
                    .ok_or_else(|| SimError::config(format!("parameter `{name}` has no value")))
            })
            .collect()
    }

    /// Sample times: `start + k·dt` while short of `stop`, then `stop`.
    fn grid(&self, start: f64, stop: f64) -> Vec<f64> {
        let mut times = vec![start];
        let mut k = 1usize;
        loop {
            let t = start + k as f64 * self.dt;
            if t >= stop - time_tolerance(stop) {
                break;
            }
            times.push(t);
            k += 1;
        }
        times.push(stop);
        times
    }
}

impl<M: DynamicModel> SimulationEngine for OdeEngine<M> {
    fn input_names(&self) -> Vec<String> {
        self.model.input_names()
    }

    fn required_parameters(&self) -> Vec<String> {
        let defaults = self.model.default_parameters();
        self.model
            .parameter_names()
            .into_iter()
            .filter(|name| !defaults.contains_key(name))
            .collect()
    }

    fn simulate(
        &mut self,
        start: f64,
        stop: f64,
        initial: &Row,
        parameters: &Row,
        input: &SignalTable,
    ) -> SimResult<SignalTable> {
        if stop <= start || same_time(start, stop) {
            return Err(SimError::config(format!(
                "empty simulation window [{start}, {stop}]"
            )));
        }
        let states = self.model.state_names();
        let defaults = self.model.default_state();
        if defaults.len() != states.len() {
            return Err(SimError::config(format!(
                "model declares {} states but {} defaults",
                states.len(),
                defaults.len()
            )));
        }
        let x0 = states
            .iter()
            .zip(&defaults)
            .map(|(name, d)| initial.get(name).copied().unwrap_or(*d))
            .collect();
        let parameter_names = self.model.parameter_names();
        let p = self.resolve_parameters(parameters)?;
        let inputs = self.model.input_names();
        for name in &inputs {
            input.signal(name)?;
        }

        let times = self.grid(start, stop);
        let mut forced = Forced {
            model: &self.model,
            input,
            inputs: &inputs,
            parameters: &p,
            x0,
        };
        let mut x = forced.initial_state();
        let mut trajectory = Vec::with_capacity(times.len());
        trajectory.push(x.clone());
        for w in times.windows(2) {
            x = self.integrator.step(&mut forced, w[0], &x, w[1] - w[0])?;
            if let Some(i) = x.iter().position(|v| !v.is_finite()) {
                return Err(SimError::NonPhysical {
                    what: format!("state `{}` diverged at t={}", states[i], w[1]),
                });
            }
            trajectory.push(x.clone());
        }

        let n = times.len();
        let mut out = SignalTable::new(times)?;
        for (i, name) in states.iter().enumerate() {
            out.insert(name.clone(), trajectory.iter().map(|x| x[i]).collect())?;
        }
        for (name, value) in parameter_names.iter().zip(&p) {
            out.insert(name.clone(), vec![*value; n])?;
        }
        Ok(out)
    }
}

/// A model with its inputs and parameters bound, ready for an integrator.
struct Forced<'a, M> {
    model: &'a M,
    input: &'a SignalTable,
    inputs: &'a [String],
    parameters: &'a [f64],
    x0: Vec<f64>,
}

impl<M: DynamicModel> TransientModel for Forced<'_, M> {
    type State = Vec<f64>;

    fn initial_state(&self) -> Vec<f64> {
        self.x0.clone()
    }

    fn rhs(&mut self, t: f64, x: &Vec<f64>) -> SimResult<Vec<f64>> {
        let u = self
            .inputs
            .iter()
            .map(|name| self.input.value_at(name, t))
            .collect::<Result<Vec<_>, _>>()?;
        let dx = self.model.derivatives(t, x, &u, self.parameters)?;
        if dx.len() != x.len() {
            return Err(SimError::Engine {
                message: format!("{} derivatives for {} states", dx.len(), x.len()),
            });
        }
        Ok(dx)
    }

    fn add(&self, a: &Vec<f64>, b: &Vec<f64>) -> Vec<f64> {
        a.iter().zip(b).map(|(x, y)| x + y).collect()
    }

    fn scale(&self, a: &Vec<f64>, scale: f64) -> Vec<f64> {
        a.iter().map(|x| x * scale).collect()
    }
}
