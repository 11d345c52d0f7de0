//! Square weight kernels and their normalization.
//!
//! A kernel is a `K x K` matrix of `f64` weights stored row-major, with `K`
//! odd so the window has a well-defined center at `(K / 2, K / 2)`.
//! Normalization rescales the weights to sum to 1 unless the raw sum is too
//! close to zero, in which case the weights are returned unchanged.

use crate::util::{CorrFilterError, CorrFilterResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Tolerance used by normalization and its checks.
pub const NORMALIZE_EPSILON: f64 = 1e-4;

/// Immutable square weight matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct Kernel {
    size: usize,
    weights: Vec<f64>,
}

impl Kernel {
    /// Creates a kernel from raw row-major weights.
    pub fn new(size: usize, weights: Vec<f64>) -> CorrFilterResult<Self> {
        let expected = weight_count(size)?;
        if weights.len() != expected {
            return Err(CorrFilterError::InvalidKernel {
                reason: "weight count must equal size * size",
            });
        }
        if weights.iter().any(|w| !w.is_finite()) {
            return Err(CorrFilterError::InvalidKernel {
                reason: "weights must be finite",
            });
        }
        Ok(Self { size, weights })
    }

    /// Uniform box kernel with every weight equal to `1 / size²`.
    pub fn box_filter(size: usize) -> CorrFilterResult<Self> {
        let n = weight_count(size)?;
        Self::new(size, vec![1.0 / n as f64; n])
    }

    /// Kernel with weights drawn uniformly from `[0, 10)` by a seeded RNG.
    ///
    /// The result is not normalized.
    pub fn random(size: usize, seed: u64) -> CorrFilterResult<Self> {
        let n = weight_count(size)?;
        let mut rng = StdRng::seed_from_u64(seed);
        let weights = (0..n).map(|_| rng.random::<f64>() * 10.0).collect();
        Self::new(size, weights)
    }

    /// Returns the side length `K`.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns the center offset `K / 2`.
    pub fn center(&self) -> usize {
        self.size / 2
    }

    /// Returns all weights, row-major.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Returns weight row `ky`; `ky` must be below `size`.
    pub(crate) fn row(&self, ky: usize) -> &[f64] {
        &self.weights[ky * self.size..(ky + 1) * self.size]
    }

    /// Returns the weight at `(ky, kx)`.
    pub fn get(&self, ky: usize, kx: usize) -> Option<f64> {
        if ky >= self.size || kx >= self.size {
            return None;
        }
        self.weights.get(ky * self.size + kx).copied()
    }

    /// Returns the sum of all weights.
    pub fn sum(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// Returns true when the weights sum to 1 within [`NORMALIZE_EPSILON`].
    pub fn is_normalized(&self) -> bool {
        (self.sum() - 1.0).abs() <= NORMALIZE_EPSILON
    }

    /// Divides every weight by the sum when `|sum| > NORMALIZE_EPSILON`.
    ///
    /// Near-zero sums leave the kernel unchanged.
    pub fn normalized(mut self) -> Self {
        let sum = self.sum();
        if sum.abs() > NORMALIZE_EPSILON {
            for w in &mut self.weights {
                *w /= sum;
            }
        }
        self
    }
}

/// Validates `size` and returns `size * size` before anything is allocated.
fn weight_count(size: usize) -> CorrFilterResult<usize> {
    if size == 0 {
        return Err(CorrFilterError::InvalidKernel {
            reason: "size must be at least 1",
        });
    }
    if size % 2 == 0 {
        return Err(CorrFilterError::InvalidKernel {
            reason: "size must be odd",
        });
    }
    size.checked_mul(size)
        .filter(|n| {
            n.checked_mul(std::mem::size_of::<f64>())
                .is_some_and(|bytes| bytes <= isize::MAX as usize)
        })
        .ok_or(CorrFilterError::InvalidKernel {
            reason: "size overflows",
        })
}
