//! One day of price-aware heating of a single zone.

mod common;

use common::{HOUR, Heating, Zone, init_logging, weather};
use mpc_app::{Mpc, MpcOptions, RunConfig};
use mpc_control::{Control, PerfectStateEstimation};
use mpc_signals::PerfectPrediction;
use mpc_sim::{Emulator, OdeEngine};

const CONFIG: &str = r#"
mpc:
  emulation_time: 86400
  result_timestep: 600
control:
  horizon: 43200
  timestep: 3600
  receding: 3600
control_parameters:
  C: 1.0e7
  UA: 500
  q_max: 20
  t_min: 20
parameters:
  C: 1.0e7
initial_conditions:
  T: 20.0
"#;

#[test]
fn zone_stays_comfortable_within_heater_limits() {
    init_logging();
    let config = RunConfig::from_yaml_str(CONFIG).unwrap();
    let bcs = weather();

    let engine = OdeEngine::new(Zone, 600.0).unwrap();
    let mut emulator = Emulator::new(engine, ["Q", "Ta"])
        .with_settings(config.emulator)
        .unwrap();
    emulator.set_parameters(&config.parameters).unwrap();
    emulator
        .set_initial_conditions(&config.initial_conditions)
        .unwrap();

    let control = Control::new(
        Heating,
        PerfectStateEstimation::with_names(["T"]),
        PerfectPrediction::new(bcs.clone()),
        config.control,
    )
    .unwrap()
    .with_parameters(config.control_parameters.clone())
    .with_history(config.history);

    let mut mpc = Mpc::new(emulator, control, bcs, config.mpc).unwrap();
    let mut steps = 0;
    let results = mpc.run_with_progress(|_| steps += 1).unwrap();

    assert_eq!(steps, 24);
    assert_eq!(results.len(), 145);
    assert_eq!(results.t_max(), 24.0 * HOUR);
    for name in ["T", "Q", "Ta", "price", "C", "UA"] {
        assert!(results.contains(name), "missing {name}");
    }

    let q = results.signal("Q").unwrap();
    assert!(q.iter().all(|&w| (-1.0..=20_000.0 + 1.0).contains(&w)));
    assert!(q.iter().any(|&w| w > 1000.0), "heater never used");

    let temperature = results.signal("T").unwrap();
    let coldest = temperature.iter().copied().fold(f64::INFINITY, f64::min);
    assert!(coldest > 19.0, "zone dropped to {coldest}");

    // Evening hours cost double, so the zone is preheated before 17:00.
    let preheated = results.value_at("T", 17.0 * HOUR).unwrap();
    assert!(preheated > 21.0, "T(17h) = {preheated}");

    assert_eq!(mpc.emulator().parameters()["C"], 1.0e7);
    assert_eq!(results.signal("UA").unwrap()[0], 500.0);
}
