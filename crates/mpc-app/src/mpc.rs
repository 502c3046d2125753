//! The receding-horizon loop.

use std::sync::Arc;
use std::time::Instant;

use mpc_control::{Control, ControlFormulation, StateEstimator};
use mpc_core::timing::Timer;
use mpc_core::{same_time, time_tolerance};
use mpc_signals::{interp, BoundaryConditions, Predictor, SignalTable};
use mpc_sim::{Emulator, SimulationEngine};

use crate::config::MpcOptions;
use crate::error::AppResult;
use crate::progress::MpcProgressEvent;

/// Decides, from a fresh control trajectory, how many receding periods to
/// apply before solving again. Values below 1 count as 1.
pub type NextStep = Box<dyn FnMut(&SignalTable) -> usize + Send>;

/// Fraction of the result step by which a control breakpoint is preceded in
/// the emulator input, so the engine sees a step instead of a ramp.
const ZOH_OFFSET: f64 = 1e-6;

/// One receding-horizon MPC simulation.
///
/// The emulator is plant and measurement source at once; boundary conditions
/// passed to the emulator always come from the ground truth, never from the
/// controller's prediction.
pub struct Mpc<S, F, E, P>
where
    F: ControlFormulation,
{
    emulator: Emulator<S>,
    control: Control<F, E, P>,
    boundary_conditions: Arc<BoundaryConditions>,
    options: MpcOptions,
    next_step: Option<NextStep>,
}

impl<S, F, E, P> Mpc<S, F, E, P>
where
    S: SimulationEngine,
    F: ControlFormulation,
    E: StateEstimator,
    P: Predictor,
{
    pub fn new(
        emulator: Emulator<S>,
        control: Control<F, E, P>,
        boundary_conditions: Arc<BoundaryConditions>,
        options: MpcOptions,
    ) -> AppResult<Self> {
        options.validate()?;
        Ok(Self {
            emulator,
            control,
            boundary_conditions,
            options,
            next_step: None,
        })
    }

    pub fn with_next_step(mut self, next_step: NextStep) -> Self {
        self.next_step = Some(next_step);
        self
    }

    pub fn emulator(&self) -> &Emulator<S> {
        &self.emulator
    }

    pub fn emulator_mut(&mut self) -> &mut Emulator<S> {
        &mut self.emulator
    }

    pub fn control(&self) -> &Control<F, E, P> {
        &self.control
    }

    pub fn boundary_conditions(&self) -> &BoundaryConditions {
        &self.boundary_conditions
    }

    pub fn options(&self) -> &MpcOptions {
        &self.options
    }

    /// Run the loop over `[0, emulation_time]` and return the resampled
    /// results.
    pub fn run(&mut self) -> AppResult<SignalTable> {
        self.run_with_progress(|_| {})
    }

    /// [`Mpc::run`], reporting every completed iteration.
    ///
    /// On error the emulator keeps the results of every completed iteration.
    pub fn run_with_progress(
        &mut self,
        mut progress: impl FnMut(MpcProgressEvent),
    ) -> AppResult<SignalTable> {
        let started = Instant::now();
        let end = self.options.emulation_time;
        let settings = *self.control.settings();
        let max_periods = ((settings.horizon / settings.receding) + 1e-9).floor().max(1.0) as usize;

        if !self.emulator.is_initialized() {
            self.emulator.initialize()?;
        }
        tracing::info!(
            emulation_time = end,
            horizon = settings.horizon,
            timestep = settings.timestep,
            receding = settings.receding,
            "mpc run started"
        );

        let mut t = 0.0;
        let mut step = 0;
        while t < end && !same_time(t, end) {
            let solution = self.control.solve(t, self.emulator.res()?)?;
            let periods = self
                .next_step
                .as_mut()
                .map_or(1, |next| next(&solution))
                .clamp(1, max_periods);
            let stop = (t + periods as f64 * settings.receding).min(end);

            let input = self.emulator_input(&solution, t, stop)?;
            let timer = Timer::start("advance");
            self.emulator.advance(t, stop, &input)?;
            timer.stop_into(&self.control.stats().advance);

            step += 1;
            tracing::debug!(step, window_start = t, window_end = stop, "receding step done");
            progress(MpcProgressEvent {
                step,
                window_start: t,
                window_end: stop,
                fraction_complete: stop / end,
                elapsed_wall_s: started.elapsed().as_secs_f64(),
            });
            t = stop;
        }

        let results = self.results()?;
        self.control.stats().log_summary();
        tracing::info!(
            iterations = step,
            rows = results.len(),
            elapsed_s = started.elapsed().as_secs_f64(),
            "mpc run finished"
        );
        Ok(results)
    }

    /// The emulator results resampled onto `0, Δ, 2Δ, ..., emulation_time`,
    /// with every boundary condition the emulator does not report added.
    pub fn results(&self) -> AppResult<SignalTable> {
        let res = self.emulator.res()?;
        let grid = result_grid(self.options.emulation_time, self.options.result_timestep);
        let mut out = res.resample(&grid)?;
        for (name, values) in self.boundary_conditions.query(&grid) {
            if !out.contains(&name) {
                out.insert(name, values)?;
            }
        }
        Ok(out)
    }

    /// Emulator input over `[start, stop]`: control signals held piecewise
    /// constant, boundary conditions from the ground truth.
    fn emulator_input(
        &self,
        solution: &SignalTable,
        start: f64,
        stop: f64,
    ) -> AppResult<SignalTable> {
        let dt = self.options.result_timestep;
        let mut times = vec![start];
        let first = (start / dt).floor() as i64 + 1;
        let mut k = first;
        loop {
            let t = k as f64 * dt;
            if t >= stop - time_tolerance(stop) {
                break;
            }
            if t > start + time_tolerance(start) {
                times.push(t);
            }
            k += 1;
        }
        for &tc in solution.time() {
            if tc <= start + time_tolerance(start) || tc > stop + time_tolerance(stop) {
                continue;
            }
            let before = tc - ZOH_OFFSET * dt;
            if before > start + time_tolerance(start) {
                times.push(before);
            }
            if tc < stop - time_tolerance(stop) {
                times.push(tc);
            }
        }
        times.push(stop);
        times.sort_by(f64::total_cmp);
        times.dedup_by(|a, b| (*a - *b).abs() <= 1e-12 * a.abs().max(1.0));

        let mut input = SignalTable::new(times)?;
        for name in self.emulator.inputs() {
            let values = if let Some(control) = solution.get(name) {
                interp::zero_order_hold_many(solution.time(), control, input.time())
            } else if self.boundary_conditions.contains(name) {
                input
                    .time()
                    .iter()
                    .map(|&t| self.boundary_conditions.value(name, t))
                    .collect::<Result<Vec<_>, _>>()?
            } else {
                tracing::warn!(input = %name, "no control or boundary-condition source for input");
                continue;
            };
            input.insert(name.clone(), values)?;
        }
        Ok(input)
    }
}

/// `0, step, 2·step, ...` up to `end`, with `end` itself always the last entry.
fn result_grid(end: f64, step: f64) -> Vec<f64> {
    let mut grid = Vec::new();
    let mut k = 0usize;
    loop {
        let t = k as f64 * step;
        if t > end || same_time(t, end) {
            break;
        }
        grid.push(t);
        k += 1;
    }
    grid.push(end);
    grid
}
