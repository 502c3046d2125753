use crate::CoreError;

pub fn ensure_finite(v: f64, what: &'static str) -> Result<f64, CoreError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

pub fn ensure_positive(v: f64, what: &'static str) -> Result<f64, CoreError> {
    let v = ensure_finite(v, what)?;
    if v > 0.0 {
        Ok(v)
    } else {
        Err(CoreError::InvalidArg { what })
    }
}

/// Slack allowed when two time stamps are considered the same instant.
pub fn time_tolerance(t: f64) -> f64 {
    1e-9 * t.abs().max(1.0)
}

/// Same-instant comparison for time stamps.
pub fn same_time(a: f64, b: f64) -> bool {
    (a - b).abs() <= time_tolerance(a.abs().max(b.abs()))
}

/// Number of `step`s that fit in `span`, requiring an integer ratio.
pub fn whole_steps(span: f64, step: f64, what: &'static str) -> Result<usize, CoreError> {
    ensure_positive(step, what)?;
    let span = ensure_finite(span, what)?;
    if span < 0.0 {
        return Err(CoreError::InvalidArg { what });
    }
    let ratio = span / step;
    let n = ratio.round();
    if (ratio - n).abs() > 1e-9 * n.max(1.0) {
        return Err(CoreError::NotMultiple {
            what,
            numerator: span,
            denominator: step,
        });
    }
    Ok(n as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(f64::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn whole_steps_accepts_exact_ratio() {
        assert_eq!(whole_steps(24.0, 1.0, "horizon").unwrap(), 24);
        assert_eq!(whole_steps(3.0 * 24.0 * 3600.0, 3600.0, "horizon").unwrap(), 72);
        assert_eq!(whole_steps(0.3, 0.1, "horizon").unwrap(), 3);
    }

    #[test]
    fn whole_steps_rejects_fraction() {
        let err = whole_steps(2.5, 1.0, "horizon").unwrap_err();
        assert!(matches!(err, CoreError::NotMultiple { .. }));
        assert!(whole_steps(1.0, 0.0, "timestep").is_err());
        assert!(whole_steps(-1.0, 1.0, "horizon").is_err());
    }

    #[test]
    fn same_time_scales_with_magnitude() {
        assert!(same_time(86_400.0, 86_400.0 + 1e-7));
        assert!(!same_time(1.0, 1.0 + 1e-6));
    }
}
