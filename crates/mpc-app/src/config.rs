//! Run configuration, loadable from YAML.

use std::path::Path;

use serde::{Deserialize, Serialize};

use mpc_control::{ControlSettings, HistoryPolicy};
use mpc_core::ensure_positive;
use mpc_signals::{BoundaryConditions, Extrapolation, Row, SignalTable};
use mpc_sim::EmulatorSettings;

use crate::error::{AppError, AppResult};

/// Length of the run and spacing of the returned results.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MpcOptions {
    /// The run covers `[0, emulation_time]`.
    pub emulation_time: f64,
    /// Spacing of the resampled results grid.
    pub result_timestep: f64,
}

impl Default for MpcOptions {
    fn default() -> Self {
        Self {
            emulation_time: 7.0 * 24.0 * 3600.0,
            result_timestep: 600.0,
        }
    }
}

impl MpcOptions {
    pub fn validate(&self) -> AppResult<()> {
        ensure_positive(self.emulation_time, "emulation_time")?;
        ensure_positive(self.result_timestep, "result_timestep")?;
        Ok(())
    }
}

/// How the boundary-condition table is interpreted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryConfig {
    pub extrapolation: Extrapolation,
    /// Signals interpolated with zero-order hold instead of linearly.
    pub zoh_keys: Vec<String>,
}

impl BoundaryConfig {
    pub fn build(&self, table: SignalTable) -> AppResult<BoundaryConditions> {
        Ok(BoundaryConditions::new(table, self.extrapolation)?
            .with_zoh_keys(self.zoh_keys.iter().cloned())?)
    }
}

/// Everything needed to set up one run apart from the models themselves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub mpc: MpcOptions,
    pub control: ControlSettings,
    /// Written as `history: all` or `history: {last: 4}`.
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub history: HistoryPolicy,
    pub emulator: EmulatorSettings,
    pub boundary: BoundaryConfig,
    /// Parameters handed to the control formulation.
    pub control_parameters: Row,
    /// Emulator parameters.
    pub parameters: Row,
    /// Emulator initial conditions.
    pub initial_conditions: Row,
}

impl RunConfig {
    pub fn from_yaml_str(content: &str) -> AppResult<Self> {
        let config: RunConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_yaml(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| AppError::ConfigFileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn to_yaml_string(&self) -> AppResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> AppResult<()> {
        self.mpc.validate()?;
        self.control.validate()?;
        ensure_positive(self.emulator.initialization_time, "initialization_time")?;
        for (what, row) in [
            ("control parameter", &self.control_parameters),
            ("parameter", &self.parameters),
            ("initial condition", &self.initial_conditions),
        ] {
            if let Some((name, value)) = row.iter().find(|(_, v)| !v.is_finite()) {
                return Err(AppError::Configuration(format!(
                    "{what} `{name}` is {value}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpc_core::ErrorKind;

    #[test]
    fn empty_document_gives_defaults() {
        let config = RunConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, RunConfig::default());
        assert_eq!(config.mpc.result_timestep, 600.0);
        assert_eq!(config.control.horizon, 259_200.0);
        assert_eq!(config.emulator.initialization_time, 1.0);
    }

    #[test]
    fn parses_full_document() {
        let yaml = r#"
mpc:
  emulation_time: 86400
  result_timestep: 900
control:
  horizon: 43200
  timestep: 3600
  receding: 3600
history:
  last: 4
boundary:
  extrapolation: hold
  zoh_keys: [price]
parameters:
  C: 1.0e7
initial_conditions:
  T: 293.15
"#;
        let config = RunConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.mpc.emulation_time, 86_400.0);
        assert_eq!(config.history, HistoryPolicy::Last(4));
        assert_eq!(config.boundary.extrapolation, Extrapolation::Hold);
        assert_eq!(config.boundary.zoh_keys, vec!["price".to_string()]);
        assert_eq!(config.parameters["C"], 1.0e7);

        let round = RunConfig::from_yaml_str(&config.to_yaml_string().unwrap()).unwrap();
        assert_eq!(round, config);
    }

    #[test]
    fn history_accepts_map_and_plain_forms() {
        let config = RunConfig::from_yaml_str("history: {last: 2}").unwrap();
        assert_eq!(config.history, HistoryPolicy::Last(2));
        let yaml = config.to_yaml_string().unwrap();
        assert!(yaml.contains("last: 2"), "{yaml}");
        assert_eq!(RunConfig::from_yaml_str(&yaml).unwrap(), config);

        let config = RunConfig::from_yaml_str("history: all").unwrap();
        assert_eq!(config.history, HistoryPolicy::All);
        assert_eq!(RunConfig::default().history, HistoryPolicy::None);
    }

    #[test]
    fn non_integer_horizon_is_configuration_error() {
        let yaml = "control: {horizon: 10, timestep: 3, receding: 3}";
        let err = RunConfig::from_yaml_str(yaml).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn negative_result_step_rejected() {
        let err = RunConfig::from_yaml_str("mpc: {result_timestep: -1}").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = RunConfig::load_yaml(Path::new("/nonexistent/run.yaml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/run.yaml"));
    }

    #[test]
    fn boundary_config_builds_zoh() {
        let table = SignalTable::from_columns([
            ("time", vec![0.0, 10.0]),
            ("price", vec![1.0, 2.0]),
        ])
        .unwrap();
        let config = BoundaryConfig {
            extrapolation: Extrapolation::Hold,
            zoh_keys: vec!["price".into()],
        };
        let bcs = config.build(table).unwrap();
        assert_eq!(bcs.value("price", 5.0).unwrap(), 1.0);
    }
}
