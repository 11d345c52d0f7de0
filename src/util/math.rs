//! Index clamping and rounding helpers for the correlation loops.

/// Clamps a signed coordinate into `[0, len)`.
///
/// `len` must be at least 1.
#[inline]
pub(crate) fn clamp_index(value: isize, len: usize) -> usize {
    if value <= 0 {
        0
    } else {
        (value as usize).min(len - 1)
    }
}

/// Rounds to nearest (half away from zero) and clamps into `[lo, hi]`.
///
/// NaN maps to `lo`.
#[inline]
pub(crate) fn round_saturate(value: f64, lo: f64, hi: f64) -> f64 {
    let rounded = value.round();
    if rounded.is_nan() {
        return lo;
    }
    rounded.clamp(lo, hi)
}

/// Ceiling division for positive divisors.
#[inline]
pub(crate) fn div_ceil(value: usize, divisor: usize) -> usize {
    value.div_ceil(divisor)
}
