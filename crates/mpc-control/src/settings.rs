//! Horizon, sampling and history configuration.

use mpc_core::{ensure_positive, whole_steps};
use serde::{Deserialize, Serialize};

use crate::error::{ControlError, ControlResult};

/// Timing of the receding-horizon controller, in the emulator's time unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlSettings {
    /// Length of the optimization window.
    pub horizon: f64,
    /// Spacing of the control samples; `horizon` must be a whole multiple.
    pub timestep: f64,
    /// How far the plant advances between solves.
    pub receding: f64,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            horizon: 3.0 * 24.0 * 3600.0,
            timestep: 3600.0,
            receding: 3600.0,
        }
    }
}

impl ControlSettings {
    pub fn new(horizon: f64, timestep: f64, receding: f64) -> ControlResult<Self> {
        let settings = Self {
            horizon,
            timestep,
            receding,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Number of control intervals in the horizon.
    pub fn steps(&self) -> ControlResult<usize> {
        Ok(whole_steps(self.horizon, self.timestep, "horizon / timestep")?)
    }

    pub fn validate(&self) -> ControlResult<()> {
        ensure_positive(self.horizon, "horizon")?;
        ensure_positive(self.receding, "receding")?;
        self.steps()?;
        if self.receding > self.horizon {
            return Err(ControlError::config(format!(
                "receding time {} exceeds horizon {}",
                self.receding, self.horizon
            )));
        }
        Ok(())
    }
}

/// Which past solutions a [`crate::Control`] keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryPolicy {
    #[default]
    None,
    All,
    /// Keep the most recent `n`.
    Last(usize),
}

impl HistoryPolicy {
    pub(crate) fn capacity(self) -> Option<usize> {
        match self {
            HistoryPolicy::None => Some(0),
            HistoryPolicy::All => None,
            HistoryPolicy::Last(n) => Some(n),
        }
    }
}
