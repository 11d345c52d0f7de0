//! Element types that buffers can hold.
//!
//! Every element widens to an `f64` accumulator. Integer elements round to
//! nearest and saturate into their range when written back; float elements
//! store the accumulated sum as-is.

use crate::util::math::round_saturate;
use std::fmt::Debug;

/// Numeric element stored in a [`Buffer`](crate::Buffer).
pub trait Element: Copy + Default + PartialEq + Debug + Send + Sync + Unpin + 'static {
    /// Short type name used in reports.
    const NAME: &'static str;
    /// Whether write-back rounds and clamps into a bounded range.
    const SATURATING: bool;

    /// Widens the element into the accumulator type.
    fn to_acc(self) -> f64;

    /// Narrows an accumulated sum back into the element type.
    fn from_acc(acc: f64) -> Self;

    /// Maps a uniform sample in `[0, 1)` to a fill value.
    fn from_unit(unit: f64) -> Self;

    /// Maps a linear index to a fill value, saturating for narrow types.
    fn from_index(index: usize) -> Self;
}

impl Element for u8 {
    const NAME: &'static str = "u8";
    const SATURATING: bool = true;

    #[inline]
    fn to_acc(self) -> f64 {
        f64::from(self)
    }

    #[inline]
    fn from_acc(acc: f64) -> Self {
        round_saturate(acc, 0.0, f64::from(u8::MAX)) as u8
    }

    #[inline]
    fn from_unit(unit: f64) -> Self {
        (unit * 256.0).floor().clamp(0.0, 255.0) as u8
    }

    #[inline]
    fn from_index(index: usize) -> Self {
        index.min(u8::MAX as usize) as u8
    }
}

impl Element for u16 {
    const NAME: &'static str = "u16";
    const SATURATING: bool = true;

    #[inline]
    fn to_acc(self) -> f64 {
        f64::from(self)
    }

    #[inline]
    fn from_acc(acc: f64) -> Self {
        round_saturate(acc, 0.0, f64::from(u16::MAX)) as u16
    }

    #[inline]
    fn from_unit(unit: f64) -> Self {
        (unit * 65536.0).floor().clamp(0.0, 65535.0) as u16
    }

    #[inline]
    fn from_index(index: usize) -> Self {
        index.min(u16::MAX as usize) as u16
    }
}

impl Element for f32 {
    const NAME: &'static str = "f32";
    const SATURATING: bool = false;

    #[inline]
    fn to_acc(self) -> f64 {
        f64::from(self)
    }

    #[inline]
    fn from_acc(acc: f64) -> Self {
        acc as f32
    }

    #[inline]
    fn from_unit(unit: f64) -> Self {
        (unit * 10.0) as f32
    }

    #[inline]
    fn from_index(index: usize) -> Self {
        index as f32
    }
}

impl Element for f64 {
    const NAME: &'static str = "f64";
    const SATURATING: bool = false;

    #[inline]
    fn to_acc(self) -> f64 {
        self
    }

    #[inline]
    fn from_acc(acc: f64) -> Self {
        acc
    }

    #[inline]
    fn from_unit(unit: f64) -> Self {
        unit * 10.0
    }

    #[inline]
    fn from_index(index: usize) -> Self {
        index as f64
    }
}

#[cfg(test)]
mod tests {
    use super::Element;

    #[test]
    fn u8_write_back_rounds_and_saturates() {
        assert_eq!(u8::from_acc(12.49), 12);
        assert_eq!(u8::from_acc(12.5), 13);
        assert_eq!(u8::from_acc(-0.7), 0);
        assert_eq!(u8::from_acc(1024.0), 255);
    }

    #[test]
    fn float_write_back_is_raw() {
        assert_eq!(f64::from_acc(-1234.567), -1234.567);
        assert_eq!(f32::from_acc(1.0e6), 1.0e6f32);
    }

    #[test]
    fn unit_samples_stay_in_range() {
        assert_eq!(u8::from_unit(0.0), 0);
        assert_eq!(u8::from_unit(0.999_999), 255);
        assert_eq!(u16::from_unit(0.999_999_99), 65535);
        assert!(f64::from_unit(0.5) < 10.0);
    }

    #[test]
    fn index_fill_saturates_narrow_types() {
        assert_eq!(u8::from_index(300), 255);
        assert_eq!(u16::from_index(300), 300);
        assert_eq!(f64::from_index(300), 300.0);
    }
}
