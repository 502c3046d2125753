//! The signal table: named columns over one shared time column.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{SignalError, SignalResult};
use crate::interp;

/// Reserved column name holding the sample times.
pub const TIME: &str = "time";

/// One value per signal at a single instant.
pub type Row = BTreeMap<String, f64>;

/// Named numeric arrays sharing one strictly increasing time array.
///
/// The invariants are enforced when the table is built, so every consumer can
/// index columns by the time index without re-checking lengths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, Vec<f64>>", into = "BTreeMap<String, Vec<f64>>")]
pub struct SignalTable {
    time: Vec<f64>,
    columns: BTreeMap<String, Vec<f64>>,
}

impl SignalTable {
    /// Create a table with only a time column.
    pub fn new(time: Vec<f64>) -> SignalResult<Self> {
        validate_time(&time)?;
        Ok(Self {
            time,
            columns: BTreeMap::new(),
        })
    }

    /// Build a table from `(name, values)` pairs, one of which must be `time`.
    pub fn from_columns<I, S>(columns: I) -> SignalResult<Self>
    where
        I: IntoIterator<Item = (S, Vec<f64>)>,
        S: Into<String>,
    {
        let mut columns: BTreeMap<String, Vec<f64>> = columns
            .into_iter()
            .map(|(name, values)| (name.into(), values))
            .collect();
        let time = columns
            .remove(TIME)
            .ok_or_else(|| SignalError::config("missing `time` column"))?;
        let mut table = Self::new(time)?;
        for (name, values) in columns {
            table.insert(name, values)?;
        }
        Ok(table)
    }

    /// Add or replace a column.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) -> SignalResult<()> {
        let name = name.into();
        if name == TIME {
            return Err(SignalError::config("`time` is reserved"));
        }
        if values.len() != self.time.len() {
            return Err(SignalError::config(format!(
                "column `{name}` has {} values for {} time samples",
                values.len(),
                self.time.len()
            )));
        }
        self.columns.insert(name, values);
        Ok(())
    }

    /// A single-sample table holding `row` at time `t`.
    pub fn from_row(t: f64, row: &Row) -> SignalResult<Self> {
        let mut table = Self::new(vec![t])?;
        for (name, value) in row {
            table.insert(name.clone(), vec![*value])?;
        }
        Ok(table)
    }

    /// Copy keeping only the named signals.
    pub fn select<'a, I>(&self, names: I) -> SignalResult<SignalTable>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut out = SignalTable::new(self.time.clone())?;
        for name in names.into_iter().filter(|&n| n != TIME) {
            out.columns.insert(name.to_string(), self.signal(name)?.to_vec());
        }
        Ok(out)
    }

    /// Builder form of [`SignalTable::insert`].
    pub fn with_signal(mut self, name: impl Into<String>, values: Vec<f64>) -> SignalResult<Self> {
        self.insert(name, values)?;
        Ok(self)
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    /// Number of time samples.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn t_min(&self) -> f64 {
        self.time[0]
    }

    pub fn t_max(&self) -> f64 {
        self.time[self.time.len() - 1]
    }

    /// Signal names, excluding `time`, in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        name == TIME || self.columns.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&[f64]> {
        if name == TIME {
            return Some(&self.time);
        }
        self.columns.get(name).map(Vec::as_slice)
    }

    pub fn signal(&self, name: &str) -> SignalResult<&[f64]> {
        self.get(name).ok_or_else(|| SignalError::UnknownSignal {
            name: name.to_string(),
        })
    }

    /// Iterate `(name, values)` pairs, excluding `time`.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.columns
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Values of every signal at sample `index`.
    pub fn row(&self, index: usize) -> Row {
        self.columns
            .iter()
            .map(|(name, values)| (name.clone(), values[index]))
            .collect()
    }

    pub fn last_row(&self) -> Row {
        self.row(self.len() - 1)
    }

    /// Linear, edge-holding value of `name` at `t`.
    pub fn value_at(&self, name: &str, t: f64) -> SignalResult<f64> {
        let values = self.signal(name)?;
        Ok(interp::linear(&self.time, values, t))
    }

    /// Linear, edge-holding resample of every column onto `times`.
    pub fn resample(&self, times: &[f64]) -> SignalResult<SignalTable> {
        let mut out = SignalTable::new(times.to_vec())?;
        for (name, values) in &self.columns {
            out.columns
                .insert(name.clone(), interp::linear_many(&self.time, values, times));
        }
        Ok(out)
    }

    /// Rows whose time lies in `[t0, t1]`, with time tolerance on both ends.
    pub fn window(&self, t0: f64, t1: f64) -> SignalResult<SignalTable> {
        let lo = t0 - mpc_core::time_tolerance(t0);
        let hi = t1 + mpc_core::time_tolerance(t1);
        let keep: Vec<usize> = (0..self.len())
            .filter(|&i| self.time[i] >= lo && self.time[i] <= hi)
            .collect();
        if keep.is_empty() {
            return Err(SignalError::config(format!(
                "no samples in window [{t0}, {t1}]"
            )));
        }
        let mut out = SignalTable::new(keep.iter().map(|&i| self.time[i]).collect())?;
        for (name, values) in &self.columns {
            out.columns
                .insert(name.clone(), keep.iter().map(|&i| values[i]).collect());
        }
        Ok(out)
    }

    /// Append the rows of `other` that lie strictly after this table's tail.
    ///
    /// A leading row of `other` at the current tail time is treated as the
    /// shared boundary sample and skipped. Both tables must carry exactly the
    /// same signal names. Returns the number of appended rows.
    pub fn append(&mut self, other: &SignalTable) -> SignalResult<usize> {
        for name in self.columns.keys() {
            if !other.columns.contains_key(name) {
                return Err(SignalError::config(format!(
                    "appended rows are missing `{name}`"
                )));
            }
        }
        for name in other.columns.keys() {
            if !self.columns.contains_key(name) {
                return Err(SignalError::config(format!(
                    "appended rows introduce untracked `{name}`"
                )));
            }
        }

        let tail = self.t_max();
        let first = other
            .time
            .iter()
            .position(|&t| !mpc_core::same_time(t, tail))
            .unwrap_or(other.len());
        if first < other.len() && other.time[first] < tail {
            return Err(SignalError::config(format!(
                "appended time {} overlaps tail {tail}",
                other.time[first]
            )));
        }

        self.time.extend_from_slice(&other.time[first..]);
        for (name, values) in self.columns.iter_mut() {
            values.extend_from_slice(&other.columns[name][first..]);
        }
        Ok(other.len() - first)
    }
}

fn validate_time(time: &[f64]) -> SignalResult<()> {
    if time.is_empty() {
        return Err(SignalError::config("`time` column is empty"));
    }
    for (i, t) in time.iter().enumerate() {
        mpc_core::ensure_finite(*t, "time")?;
        if i > 0 && *t <= time[i - 1] {
            return Err(SignalError::config(format!(
                "`time` not strictly increasing at index {i} ({} -> {t})",
                time[i - 1]
            )));
        }
    }
    Ok(())
}

impl TryFrom<BTreeMap<String, Vec<f64>>> for SignalTable {
    type Error = SignalError;

    fn try_from(columns: BTreeMap<String, Vec<f64>>) -> SignalResult<Self> {
        Self::from_columns(columns)
    }
}

impl From<SignalTable> for BTreeMap<String, Vec<f64>> {
    fn from(table: SignalTable) -> Self {
        let mut columns = table.columns;
        columns.insert(TIME.to_string(), table.time);
        columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SignalTable {
        SignalTable::from_columns([
            ("time", vec![0.0, 1.0, 2.0]),
            ("a", vec![0.0, 10.0, 20.0]),
            ("b", vec![5.0, 5.0, 5.0]),
        ])
        .unwrap()
    }

    #[test]
    fn from_columns_requires_time() {
        let err = SignalTable::from_columns([("a", vec![1.0])]).unwrap_err();
        assert!(matches!(err, SignalError::Configuration { .. }));
    }

    #[test]
    fn mismatched_lengths_rejected() {
        let err = SignalTable::from_columns([("time", vec![0.0, 1.0]), ("a", vec![1.0])])
            .unwrap_err();
        assert!(err.to_string().contains("`a`"));
    }

    #[test]
    fn time_must_increase() {
        assert!(SignalTable::new(vec![0.0, 0.0]).is_err());
        assert!(SignalTable::new(vec![1.0, 0.5]).is_err());
        assert!(SignalTable::new(vec![]).is_err());
        assert!(SignalTable::new(vec![0.0, f64::NAN]).is_err());
    }

    #[test]
    fn time_is_reserved() {
        let mut table = SignalTable::new(vec![0.0]).unwrap();
        assert!(table.insert("time", vec![1.0]).is_err());
        assert!(table.contains("time"));
        assert_eq!(table.get("time"), Some(&[0.0][..]));
    }

    #[test]
    fn value_at_interpolates() {
        let table = sample();
        assert_eq!(table.value_at("a", 1.5).unwrap(), 15.0);
        assert_eq!(table.value_at("a", 9.0).unwrap(), 20.0);
        assert!(table.value_at("missing", 0.0).is_err());
    }

    #[test]
    fn window_selects_closed_interval() {
        let table = sample();
        let w = table.window(1.0, 2.0).unwrap();
        assert_eq!(w.time(), &[1.0, 2.0]);
        assert_eq!(w.signal("a").unwrap(), &[10.0, 20.0]);
        assert!(table.window(5.0, 6.0).is_err());
    }

    #[test]
    fn append_skips_shared_boundary() {
        let mut table = sample();
        let next = SignalTable::from_columns([
            ("time", vec![2.0, 3.0]),
            ("a", vec![20.0, 30.0]),
            ("b", vec![5.0, 6.0]),
        ])
        .unwrap();
        assert_eq!(table.append(&next).unwrap(), 1);
        assert_eq!(table.time(), &[0.0, 1.0, 2.0, 3.0]);
        assert_eq!(table.last_row()["b"], 6.0);
    }

    #[test]
    fn append_rejects_dropped_column() {
        let mut table = sample();
        let next = SignalTable::from_columns([("time", vec![2.0, 3.0]), ("a", vec![1.0, 2.0])])
            .unwrap();
        assert!(table.append(&next).is_err());
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn append_rejects_overlap() {
        let mut table = sample();
        let next = SignalTable::from_columns([
            ("time", vec![1.5, 3.0]),
            ("a", vec![0.0, 0.0]),
            ("b", vec![0.0, 0.0]),
        ])
        .unwrap();
        assert!(table.append(&next).is_err());
    }

    #[test]
    fn select_and_from_row() {
        let table = sample();
        let only_a = table.select(["a"]).unwrap();
        assert_eq!(only_a.names().collect::<Vec<_>>(), vec!["a"]);
        assert!(table.select(["zzz"]).is_err());

        let single = SignalTable::from_row(2.0, &table.last_row()).unwrap();
        assert_eq!(single.time(), &[2.0]);
        assert_eq!(single.signal("a").unwrap(), &[20.0]);
    }

    #[test]
    fn serde_round_trip_validates() {
        let table = sample();
        let json = serde_json::to_string(&table).unwrap();
        let back: SignalTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);

        let bad = r#"{"time":[0.0,1.0],"a":[1.0]}"#;
        assert!(serde_json::from_str::<SignalTable>(bad).is_err());
    }
}
