//! Boundary conditions: disturbances sampled on a time grid.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{SignalError, SignalResult};
use crate::interp;
use crate::table::{Row, SignalTable};

/// How query times outside the stored range are mapped back into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extrapolation {
    /// Wrap modulo `t_max - t_min`, repeating the data set.
    ///
    /// `t_max` itself keeps the last sample while anything past it wraps to
    /// the first, so the data must be cyclic (last row equal to the first)
    /// for the wrap to be continuous.
    #[default]
    Periodic,
    /// Hold the first row below `t_min` and the last row above `t_max`.
    Hold,
}

/// Read-only source of disturbance signals.
///
/// Queries never fail for out-of-range times; the configured
/// [`Extrapolation`] is applied deterministically.
#[derive(Debug, Clone)]
pub struct BoundaryConditions {
    bcs: SignalTable,
    extrapolation: Extrapolation,
    zoh_keys: BTreeSet<String>,
}

impl BoundaryConditions {
    pub fn new(bcs: SignalTable, extrapolation: Extrapolation) -> SignalResult<Self> {
        if extrapolation == Extrapolation::Periodic && bcs.len() < 2 {
            return Err(SignalError::config(
                "periodic boundary conditions need at least two samples",
            ));
        }
        Ok(Self {
            bcs,
            extrapolation,
            zoh_keys: BTreeSet::new(),
        })
    }

    /// Shorthand taking the `periodic` flag directly.
    pub fn with_periodic(bcs: SignalTable, periodic: bool) -> SignalResult<Self> {
        let extrapolation = if periodic {
            Extrapolation::Periodic
        } else {
            Extrapolation::Hold
        };
        Self::new(bcs, extrapolation)
    }

    /// Interpolate the named signals with zero-order hold instead of linearly.
    pub fn with_zoh_keys<I, S>(mut self, keys: I) -> SignalResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for key in keys {
            let key = key.into();
            if !self.bcs.contains(&key) || key == crate::TIME {
                return Err(SignalError::UnknownSignal { name: key });
            }
            self.zoh_keys.insert(key);
        }
        Ok(self)
    }

    pub fn table(&self) -> &SignalTable {
        &self.bcs
    }

    pub fn extrapolation(&self) -> Extrapolation {
        self.extrapolation
    }

    pub fn is_periodic(&self) -> bool {
        self.extrapolation == Extrapolation::Periodic
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bcs.contains(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bcs.names()
    }

    /// Map a query time into `[t_min, t_max]` according to the policy.
    pub fn map_time(&self, t: f64) -> f64 {
        let (t_min, t_max) = (self.bcs.t_min(), self.bcs.t_max());
        if (t_min..=t_max).contains(&t) {
            return t;
        }
        match self.extrapolation {
            Extrapolation::Periodic => {
                let period = t_max - t_min;
                (t_min + (t - t_min).rem_euclid(period)).min(t_max)
            }
            Extrapolation::Hold => t.clamp(t_min, t_max),
        }
    }

    /// Value of one signal at `t`.
    pub fn value(&self, name: &str, t: f64) -> SignalResult<f64> {
        let values = self.bcs.signal(name)?;
        Ok(self.eval(name, values, self.map_time(t)))
    }

    /// Every signal at a single time.
    pub fn query_at(&self, t: f64) -> Row {
        let tm = self.map_time(t);
        self.bcs
            .iter()
            .map(|(name, values)| (name.to_string(), self.eval(name, values, tm)))
            .collect()
    }

    /// Every signal at every query time, one value per signal per entry of
    /// `times`.
    ///
    /// `times` may be in any order and may repeat; the query never fails.
    pub fn query(&self, times: &[f64]) -> BTreeMap<String, Vec<f64>> {
        let mapped: Vec<f64> = times.iter().map(|&t| self.map_time(t)).collect();
        self.bcs
            .iter()
            .map(|(name, values)| {
                let column = mapped
                    .iter()
                    .map(|&tm| self.eval(name, values, tm))
                    .collect();
                (name.to_string(), column)
            })
            .collect()
    }

    /// [`BoundaryConditions::query`] as a table whose `time` echoes `times`.
    ///
    /// Fails only when `times` is not a valid time column.
    pub fn query_table(&self, times: &[f64]) -> SignalResult<SignalTable> {
        let mut out = SignalTable::new(times.to_vec())?;
        for (name, column) in self.query(times) {
            out.insert(name, column)?;
        }
        Ok(out)
    }

    fn eval(&self, name: &str, values: &[f64], t: f64) -> f64 {
        if self.zoh_keys.contains(name) {
            interp::zero_order_hold(self.bcs.time(), values, t)
        } else {
            interp::linear(self.bcs.time(), values, t)
        }
    }
}
