//! Boundary modes and the clamped coordinate sampler.

use crate::buffer::Shape;
use crate::util::math::clamp_index;
use crate::util::{CorrFilterError, CorrFilterResult};

/// How windows that cross the source edge are handled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BoundaryMode {
    /// Output shrinks to `(rows - K + 1, cols - K + 1)`; every window lies
    /// fully inside the source.
    Valid,
    /// Output keeps the source shape; out-of-range samples replicate the
    /// nearest edge cell.
    #[default]
    Clamped,
}

impl BoundaryMode {
    /// Returns the output shape for a source of `src` and a `kernel x kernel`
    /// window.
    pub fn output_shape(self, src: Shape, kernel: usize) -> CorrFilterResult<Shape> {
        match self {
            BoundaryMode::Clamped => Ok(src),
            BoundaryMode::Valid => {
                if kernel == 0 || kernel > src.rows() || kernel > src.cols() {
                    return Err(CorrFilterError::KernelTooLarge {
                        kernel,
                        rows: src.rows(),
                        cols: src.cols(),
                    });
                }
                Shape::new(src.rows() - kernel + 1, src.cols() - kernel + 1)
            }
        }
    }

    /// Returns the lowercase mode name.
    pub fn as_str(self) -> &'static str {
        match self {
            BoundaryMode::Valid => "valid",
            BoundaryMode::Clamped => "clamped",
        }
    }
}

impl std::fmt::Display for BoundaryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BoundaryMode {
    type Err = CorrFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "valid" => Ok(BoundaryMode::Valid),
            "clamped" | "clamp" | "same" => Ok(BoundaryMode::Clamped),
            _ => Err(CorrFilterError::InvalidConfig {
                reason: "boundary mode must be `valid` or `clamped`",
            }),
        }
    }
}

/// Maps a possibly out-of-range window coordinate to an in-range source
/// coordinate by edge replication.
#[inline]
pub fn clamp_sample(y: isize, x: isize, shape: Shape) -> (usize, usize) {
    (clamp_index(y, shape.rows()), clamp_index(x, shape.cols()))
}

/// Returns the source coordinate sampled for output `(i, j)` and kernel tap
/// `(ky, kx)`.
///
/// Valid mode maps directly to `(i + ky, j + kx)`; Clamped mode offsets by the
/// kernel center and clamps.
#[inline]
pub fn sample(
    mode: BoundaryMode,
    shape: Shape,
    center: usize,
    i: usize,
    j: usize,
    ky: usize,
    kx: usize,
) -> (usize, usize) {
    match mode {
        BoundaryMode::Valid => (i + ky, j + kx),
        BoundaryMode::Clamped => {
            let y = i as isize + ky as isize - center as isize;
            let x = j as isize + kx as isize - center as isize;
            clamp_sample(y, x, shape)
        }
    }
}

/// Half-open range of output indices along one axis whose windows need no
/// clamping in Clamped mode.
#[inline]
pub(crate) fn interior_range(len: usize, kernel: usize, center: usize) -> (usize, usize) {
    let after = kernel - 1 - center;
    if len < kernel {
        return (0, 0);
    }
    (center, len - after)
}

#[cfg(test)]
mod tests {
    use super::{clamp_sample, interior_range, sample, BoundaryMode};
    use crate::{CorrFilterError, Shape};

    #[test]
    fn output_shapes_follow_mode() {
        let src = Shape::new(7, 9).unwrap();
        assert_eq!(
            BoundaryMode::Valid.output_shape(src, 3).unwrap(),
            Shape::new(5, 7).unwrap()
        );
        assert_eq!(BoundaryMode::Clamped.output_shape(src, 3).unwrap(), src);
        assert_eq!(
            BoundaryMode::Valid.output_shape(src, 7).unwrap(),
            Shape::new(1, 3).unwrap()
        );
        assert_eq!(
            BoundaryMode::Valid.output_shape(src, 9).unwrap_err(),
            CorrFilterError::KernelTooLarge {
                kernel: 9,
                rows: 7,
                cols: 9
            }
        );
    }

    #[test]
    fn clamp_replicates_edges_without_wrapping() {
        let shape = Shape::new(4, 5).unwrap();
        assert_eq!(clamp_sample(-2, -1, shape), (0, 0));
        assert_eq!(clamp_sample(5, 7, shape), (3, 4));
        assert_eq!(clamp_sample(2, 3, shape), (2, 3));
    }

    #[test]
    fn sample_offsets_by_center_in_clamped_mode() {
        let shape = Shape::new(4, 4).unwrap();
        assert_eq!(sample(BoundaryMode::Valid, shape, 1, 0, 0, 2, 1), (2, 1));
        assert_eq!(sample(BoundaryMode::Clamped, shape, 1, 0, 0, 0, 0), (0, 0));
        assert_eq!(sample(BoundaryMode::Clamped, shape, 1, 3, 3, 2, 2), (3, 3));
        assert_eq!(sample(BoundaryMode::Clamped, shape, 1, 2, 2, 2, 0), (3, 1));
    }

    #[test]
    fn interior_range_excludes_border_windows() {
        assert_eq!(interior_range(7, 3, 1), (1, 6));
        assert_eq!(interior_range(7, 1, 0), (0, 7));
        assert_eq!(interior_range(2, 5, 2), (0, 0));
    }

    #[test]
    fn modes_parse_and_display() {
        assert_eq!("valid".parse::<BoundaryMode>().unwrap(), BoundaryMode::Valid);
        assert_eq!("Clamped".parse::<BoundaryMode>().unwrap(), BoundaryMode::Clamped);
        assert!("wrap".parse::<BoundaryMode>().is_err());
        assert_eq!(BoundaryMode::Valid.to_string(), "valid");
    }
}
