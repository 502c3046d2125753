//! Lightweight performance timing utilities.
//!
//! Measures where a receding-horizon run spends its wall-clock time
//! (formulation, solves, emulator advances). Enabled via the `MPC_TIMING`
//! environment variable or programmatically.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

static ENABLED: AtomicBool = AtomicBool::new(false);

/// Enable performance timing globally.
pub fn enable_timing() {
    ENABLED.store(true, Ordering::Relaxed);
}

/// Disable performance timing globally.
pub fn disable_timing() {
    ENABLED.store(false, Ordering::Relaxed);
}

/// Check if timing is enabled.
pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed) || std::env::var("MPC_TIMING").is_ok()
}

/// A simple timer that measures elapsed time.
pub struct Timer {
    label: &'static str,
    start: Instant,
    enabled: bool,
}

impl Timer {
    /// Create and start a new timer with the given label.
    pub fn start(label: &'static str) -> Self {
        Self {
            label,
            start: Instant::now(),
            enabled: is_enabled(),
        }
    }

    /// Stop the timer and return elapsed time in seconds.
    /// If timing is disabled, returns None.
    pub fn stop(self) -> Option<f64> {
        if self.enabled {
            Some(self.start.elapsed().as_secs_f64())
        } else {
            None
        }
    }

    /// Stop the timer, record into `acc` and log the elapsed time.
    pub fn stop_into(self, acc: &AccumulatingTimer) {
        let label = self.label;
        if let Some(elapsed) = self.stop() {
            acc.record(elapsed);
            tracing::trace!(label, elapsed_s = elapsed, "timer");
        }
    }
}

/// Accumulating timer for tracking total time across multiple calls.
pub struct AccumulatingTimer {
    total_ns: AtomicU64,
    count: AtomicU64,
}

impl Default for AccumulatingTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl AccumulatingTimer {
    pub const fn new() -> Self {
        Self {
            total_ns: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    pub fn record(&self, duration_s: f64) {
        let nanos = (duration_s * 1e9) as u64;
        self.total_ns.fetch_add(nanos, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    /// Total time spent (in seconds).
    pub fn total_seconds(&self) -> f64 {
        self.total_ns.load(Ordering::Relaxed) as f64 / 1e9
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Average time per call (in seconds).
    pub fn average_seconds(&self) -> f64 {
        let count = self.count();
        if count > 0 {
            self.total_seconds() / count as f64
        } else {
            0.0
        }
    }

    pub fn reset(&self) {
        self.total_ns.store(0, Ordering::Relaxed);
        self.count.store(0, Ordering::Relaxed);
    }
}

/// Per-run counters, one per phase of the receding loop.
#[derive(Default)]
pub struct RunStats {
    pub formulate: AccumulatingTimer,
    pub solve: AccumulatingTimer,
    pub advance: AccumulatingTimer,
}

impl RunStats {
    pub fn reset(&self) {
        self.formulate.reset();
        self.solve.reset();
        self.advance.reset();
    }

    /// Log a summary of the statistics.
    pub fn log_summary(&self) {
        if !is_enabled() {
            return;
        }
        for (phase, acc) in [
            ("formulate", &self.formulate),
            ("solve", &self.solve),
            ("advance", &self.advance),
        ] {
            if acc.count() > 0 {
                tracing::info!(
                    phase,
                    calls = acc.count(),
                    total_s = acc.total_seconds(),
                    avg_ms = acc.average_seconds() * 1000.0,
                    "timing"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulating_timer_averages() {
        let acc = AccumulatingTimer::new();
        assert_eq!(acc.average_seconds(), 0.0);
        acc.record(0.5);
        acc.record(1.5);
        assert_eq!(acc.count(), 2);
        assert!((acc.total_seconds() - 2.0).abs() < 1e-6);
        assert!((acc.average_seconds() - 1.0).abs() < 1e-6);
        acc.reset();
        assert_eq!(acc.count(), 0);
    }
}
