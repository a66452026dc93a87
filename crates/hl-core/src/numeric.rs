use crate::CoreError;

pub fn ensure_finite(v: f64, what: &'static str) -> Result<f64, CoreError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// Check that `[min, max]` is a usable clamp range.
pub fn ensure_range(min: f64, max: f64, what: &'static str) -> Result<(), CoreError> {
    if !min.is_finite() || !max.is_finite() || min > max {
        return Err(CoreError::InvalidRange { what, min, max });
    }
    Ok(())
}

/// Clamp that never panics: when the bounds cross, the lower bound wins.
///
/// `f64::clamp` asserts `min <= max`; physical bounds derived at runtime
/// (e.g. `outdoor - 2` vs. a fixed ceiling) can legitimately cross.
/// NaN inputs collapse to `min`.
#[inline]
pub fn clamp_lower_wins(v: f64, min: f64, max: f64) -> f64 {
    if v.is_nan() {
        return min;
    }
    v.min(max).max(min)
}

/// Round to a fixed number of decimal places, for wire payloads.
#[inline]
pub fn round_to(v: f64, decimals: u32) -> f64 {
    let scale = 10_f64.powi(decimals as i32);
    (v * scale).round() / scale
}
