//! Shared fixtures for the run-level tests.
#![allow(dead_code)]

use std::cell::Cell;
use std::sync::Arc;

use mpc_control::{ControlError, ControlFormulation, ControlResult, ControlStep};
use mpc_core::{ConId, VarId};
use mpc_signals::{BoundaryConditions, Row, SignalTable};
use mpc_sim::{DynamicModel, SimResult};
use mpc_solver::{QpBuilder, QpSettings, QpStructure, SolverError, solve};

pub const HOUR: f64 = 3600.0;

pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

pub fn row(pairs: &[(&str, f64)]) -> Row {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

/// dx/dt = u
pub struct Accumulator;

impl DynamicModel for Accumulator {
    fn state_names(&self) -> Vec<String> {
        vec!["x".into()]
    }

    fn input_names(&self) -> Vec<String> {
        vec!["u".into()]
    }

    fn parameter_names(&self) -> Vec<String> {
        Vec::new()
    }

    fn default_state(&self) -> Vec<f64> {
        vec![0.0]
    }

    fn derivatives(&self, _t: f64, _x: &[f64], u: &[f64], _p: &[f64]) -> SimResult<Vec<f64>> {
        Ok(vec![u[0]])
    }
}

/// Single thermal zone, temperatures in °C and heat in W:
/// `C dT/dt = UA (Ta - T) + Q`.
pub struct Zone;

impl DynamicModel for Zone {
    fn state_names(&self) -> Vec<String> {
        vec!["T".into()]
    }

    fn input_names(&self) -> Vec<String> {
        vec!["Q".into(), "Ta".into()]
    }

    fn parameter_names(&self) -> Vec<String> {
        vec!["C".into(), "UA".into()]
    }

    fn default_state(&self) -> Vec<f64> {
        vec![20.0]
    }

    fn default_parameters(&self) -> Row {
        row(&[("UA", 500.0)])
    }

    fn derivatives(&self, _t: f64, x: &[f64], u: &[f64], p: &[f64]) -> SimResult<Vec<f64>> {
        let (c, ua) = (p[0], p[1]);
        Ok(vec![(ua * (u[1] - x[0]) + u[0]) / c])
    }
}

/// Emits `u[k] = k` over the window, counting every phase call.
///
/// With `fail_at` set, the solve with that (0-based) index fails the way an
/// infeasible optimization would.
#[derive(Default)]
pub struct Scripted {
    pub formulations: Cell<usize>,
    pub solves: Cell<usize>,
    pub fail_at: Option<usize>,
    pub constant: Option<f64>,
}

impl ControlFormulation for Scripted {
    type Formulation = ();

    fn formulate(&self, _step: &ControlStep<'_>) -> ControlResult<()> {
        self.formulations.set(self.formulations.get() + 1);
        Ok(())
    }

    fn solve(&self, _f: &(), step: &ControlStep<'_>) -> ControlResult<SignalTable> {
        let index = self.solves.get();
        self.solves.set(index + 1);
        if self.fail_at == Some(index) {
            return Err(SolverError::Infeasible {
                what: "scripted failure".into(),
            }
            .into());
        }
        let u = (0..step.time.len())
            .map(|k| self.constant.unwrap_or(k as f64))
            .collect();
        Ok(SignalTable::new(step.time.to_vec())?.with_signal("u", u)?)
    }
}

/// Comfort-constrained heating of a [`Zone`], discretized with one explicit
/// Euler step per control interval. Heat is optimized in kW and reported in W.
///
/// Control parameters: `C`, `UA`, `q_max` (kW) and `t_min`.
pub struct Heating;

pub struct HeatingProblem {
    structure: QpStructure,
    temperature: Vec<VarId>,
    heat: Vec<VarId>,
    slack: Vec<VarId>,
    initial: ConId,
    dynamics: Vec<ConId>,
    comfort: Vec<ConId>,
}

fn parameter(step: &ControlStep<'_>, name: &str) -> ControlResult<f64> {
    step.parameters
        .get(name)
        .copied()
        .ok_or_else(|| ControlError::config(format!("missing control parameter `{name}`")))
}

impl ControlFormulation for Heating {
    type Formulation = HeatingProblem;

    fn formulate(&self, step: &ControlStep<'_>) -> ControlResult<HeatingProblem> {
        let n = step.steps();
        let mut b = QpBuilder::new();
        let temperature = b.add_variables("T", n + 1);
        let heat = b.add_variables("Q", n);
        let slack = b.add_variables("s", n);
        let initial = b.add_constraint("initial", &[(temperature[0], 1.0)])?;
        let mut dynamics = Vec::with_capacity(n);
        let mut comfort = Vec::with_capacity(n);
        for k in 0..n {
            // Coefficients are placeholders; the real values depend on the
            // step length and the parameters and are set per solve.
            dynamics.push(b.add_constraint(
                format!("dynamics[{k}]"),
                &[(temperature[k + 1], 1.0), (temperature[k], -1.0), (heat[k], -1.0)],
            )?);
            comfort.push(b.add_constraint(
                format!("comfort[{k}]"),
                &[(temperature[k + 1], 1.0), (slack[k], 1.0)],
            )?);
            b.add_quadratic(slack[k], slack[k], 100.0)?;
        }
        Ok(HeatingProblem {
            structure: b.build()?,
            temperature,
            heat,
            slack,
            initial,
            dynamics,
            comfort,
        })
    }

    fn solve(&self, p: &HeatingProblem, step: &ControlStep<'_>) -> ControlResult<SignalTable> {
        let (c, ua) = (parameter(step, "C")?, parameter(step, "UA")?);
        let (q_max, t_min) = (parameter(step, "q_max")?, parameter(step, "t_min")?);
        let ambient = step.prediction.signal("Ta")?;
        let price = step.prediction.signal("price")?;
        let t0 = step
            .state
            .get("T")
            .copied()
            .ok_or_else(|| ControlError::config("state estimate lacks `T`"))?;

        let mut data = p.structure.data();
        data.set_rhs(p.initial, t0)?;
        for k in 0..step.steps() {
            let dt = step.time[k + 1] - step.time[k];
            let loss = dt * ua / c;
            data.set_coefficient(p.dynamics[k], p.temperature[k], -(1.0 - loss))?;
            data.set_coefficient(p.dynamics[k], p.heat[k], -dt * 1000.0 / c)?;
            data.set_rhs(p.dynamics[k], loss * ambient[k])?;
            data.set_row_bounds(p.comfort[k], t_min, f64::INFINITY)?;
            data.set_bounds(p.heat[k], 0.0, q_max)?;
            data.set_cost(p.heat[k], price[k])?;
            data.set_bounds(p.slack[k], 0.0, f64::INFINITY)?;
        }
        let settings = QpSettings {
            eps_abs: 1e-5,
            eps_rel: 1e-5,
            max_iterations: 100_000,
            ..QpSettings::default()
        };
        let sol = solve(&data, &settings)?;

        let mut watts: Vec<f64> = sol.values(&p.heat).iter().map(|q| q * 1000.0).collect();
        watts.push(watts[watts.len() - 1]);
        Ok(SignalTable::new(step.time.to_vec())?
            .with_signal("Q", watts)?
            .with_signal("T", sol.values(&p.temperature))?)
    }
}

/// A day of hourly outdoor temperature (sinusoid around 5 °C) and a price
/// that doubles in the evening.
pub fn weather() -> Arc<BoundaryConditions> {
    let time: Vec<f64> = (0..=24).map(|h| h as f64 * HOUR).collect();
    let ambient = (0..=24)
        .map(|h| 5.0 - 5.0 * (2.0 * std::f64::consts::PI * h as f64 / 24.0).cos())
        .collect();
    let price = (0..=24)
        .map(|h| if (17..21).contains(&h) { 2.0 } else { 1.0 })
        .collect();
    let table = SignalTable::from_columns([("time", time), ("Ta", ambient), ("price", price)])
        .expect("weather table");
    Arc::new(
        BoundaryConditions::with_periodic(table, true)
            .and_then(|b| b.with_zoh_keys(["price"]))
            .expect("weather boundary conditions"),
    )
}
