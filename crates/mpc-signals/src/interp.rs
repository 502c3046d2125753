//! One-dimensional interpolation kernels.
//!
//! Both kernels expect `xp` strictly increasing and `xp.len() == fp.len() >= 1`.
//! Query points outside `[xp[0], xp[last]]` hold the edge value, matching
//! `numpy.interp`.

/// Relative slack used to snap a query onto the next sample.
const SNAP_REL: f64 = 1e-12;

/// Index of the last sample at or before `x`, clamped to the valid range.
fn lower_index(xp: &[f64], x: f64) -> usize {
    xp.partition_point(|&v| v <= x).saturating_sub(1)
}

/// Piecewise-linear interpolation with edge hold.
///
/// Exact at stored samples: `linear(xp, fp, xp[i]) == fp[i]`.
pub fn linear(xp: &[f64], fp: &[f64], x: f64) -> f64 {
    let last = xp.len() - 1;
    if x <= xp[0] {
        return fp[0];
    }
    if x >= xp[last] {
        return fp[last];
    }
    let i = lower_index(xp, x);
    let frac = (x - xp[i]) / (xp[i + 1] - xp[i]);
    if frac == 0.0 {
        return fp[i];
    }
    fp[i] + frac * (fp[i + 1] - fp[i])
}

/// Zero-order hold: value of the last sample at or before `x`.
///
/// A query within rounding distance of the next sample snaps to it, so that
/// `x` reconstructed by floating arithmetic still lands on its own sample.
pub fn zero_order_hold(xp: &[f64], fp: &[f64], x: f64) -> f64 {
    let last = xp.len() - 1;
    if x <= xp[0] {
        return fp[0];
    }
    if x >= xp[last] {
        return fp[last];
    }
    let i = lower_index(xp, x);
    if xp[i + 1] - x <= SNAP_REL * x.abs().max(1.0) {
        fp[i + 1]
    } else {
        fp[i]
    }
}

/// Interpolate a whole column at every query time.
pub fn linear_many(xp: &[f64], fp: &[f64], xs: &[f64]) -> Vec<f64> {
    xs.iter().map(|&x| linear(xp, fp, x)).collect()
}

/// Zero-order hold of a whole column at every query time.
pub fn zero_order_hold_many(xp: &[f64], fp: &[f64], xs: &[f64]) -> Vec<f64> {
    xs.iter().map(|&x| zero_order_hold(xp, fp, x)).collect()
}
