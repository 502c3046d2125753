//! Boundary-condition behavior on a week of quarter-hourly data.

use mpc_signals::{BoundaryConditions, Extrapolation, SignalTable};

const DAY: f64 = 24.0 * 3600.0;

fn week() -> SignalTable {
    let time: Vec<f64> = (0..=7 * 96).map(|i| i as f64 * 900.0).collect();
    let y0: Vec<f64> = time.iter().map(|t| (t / DAY).sin()).collect();
    let y1: Vec<f64> = time.iter().map(|t| ((t / 900.0) as u64 % 7) as f64).collect();
    SignalTable::from_columns([("time", time), ("y0", y0), ("y1", y1)]).unwrap()
}

#[test]
fn value_matches_linear_interpolation() {
    let bcs = BoundaryConditions::new(week(), Extrapolation::Periodic).unwrap();
    let t0 = DAY + 450.0;
    let row = bcs.query_at(t0);

    let table = bcs.table();
    assert_eq!(row["y0"], table.value_at("y0", t0).unwrap());
    assert_eq!(row["y1"], table.value_at("y1", t0).unwrap());
    assert_eq!(row.len(), 2);
}

#[test]
fn periodic_repeats_after_one_period() {
    let bcs = BoundaryConditions::new(week(), Extrapolation::Periodic).unwrap();
    let period = bcs.table().t_max() - bcs.table().t_min();
    let t0 = DAY;
    let a = bcs.query_at(t0);
    let b = bcs.query_at(t0 + period);
    for name in ["y0", "y1"] {
        assert!((a[name] - b[name]).abs() < 1e-12, "{name}");
    }
}

#[test]
fn periodic_with_time_offset() {
    let base = week();
    let shifted: Vec<f64> = base.time().iter().map(|t| t + 2.0 * DAY).collect();
    let table = SignalTable::from_columns([
        ("time", shifted),
        ("y0", base.signal("y0").unwrap().to_vec()),
        ("y1", base.signal("y1").unwrap().to_vec()),
    ])
    .unwrap();
    let bcs = BoundaryConditions::new(table, Extrapolation::Periodic).unwrap();

    let period = bcs.table().t_max() - bcs.table().t_min();
    let t0 = 3.0 * DAY;
    let a = bcs.query_at(t0);
    let b = bcs.query_at(t0 + period);
    for name in ["y0", "y1"] {
        assert!((a[name] - b[name]).abs() < 1e-12, "{name}");
    }
}

#[test]
fn hold_repeats_last_row() {
    let bcs = BoundaryConditions::new(week(), Extrapolation::Hold).unwrap();
    let t_max = bcs.table().t_max();
    assert_eq!(bcs.query_at(t_max), bcs.query_at(t_max + DAY));
    assert_eq!(bcs.query_at(0.0), bcs.query_at(-DAY));
}

#[test]
fn query_over_horizon_keeps_every_signal() {
    let bcs = BoundaryConditions::new(week(), Extrapolation::Periodic).unwrap();
    let times: Vec<f64> = (0..=24).map(|i| 6.5 * DAY + i as f64 * 3600.0).collect();
    let out = bcs.query_table(&times).unwrap();
    assert_eq!(out.len(), times.len());
    assert_eq!(out.names().collect::<Vec<_>>(), vec!["y0", "y1"]);

    let columns = bcs.query(&times);
    assert_eq!(columns.keys().collect::<Vec<_>>(), vec!["y0", "y1"]);
    assert_eq!(columns["y0"], out.signal("y0").unwrap());
}
