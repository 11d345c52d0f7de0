//! Scalar reference loops for windowed correlation.
//!
//! Each output value is `sum_{ky, kx} src[sample] * kernel[ky, kx]`,
//! accumulated in `f64` with `ky` as the outer loop and `kx` as the inner loop.
//! The interior and border paths share that order so a cell's value does not
//! depend on which path computed it.

use crate::buffer::{BufferView, Element};
use crate::engine::sampler::{interior_range, BoundaryMode};
use crate::kernel::Kernel;
use crate::util::math::clamp_index;

/// Read-only inputs shared by every row of a job.
pub(crate) struct RowContext<'a, T> {
    pub(crate) src: BufferView<'a, T>,
    pub(crate) kernel: &'a Kernel,
    pub(crate) mode: BoundaryMode,
    /// Copy the last channel through instead of correlating it.
    pub(crate) passthrough: bool,
    pub(crate) out_cols: usize,
}

impl<T: Element> RowContext<'_, T> {
    /// Number of leading channels that are correlated.
    #[inline]
    pub(crate) fn filtered_channels(&self) -> usize {
        let channels = self.src.channels();
        if self.passthrough && channels > 1 {
            channels - 1
        } else {
            channels
        }
    }

    /// Whether output row `i` reads only in-range source rows.
    #[inline]
    pub(crate) fn row_is_interior(&self, i: usize) -> bool {
        match self.mode {
            BoundaryMode::Valid => true,
            BoundaryMode::Clamped => {
                let (lo, hi) =
                    interior_range(self.src.rows(), self.kernel.size(), self.kernel.center());
                i >= lo && i < hi
            }
        }
    }

    /// Output columns whose windows need no clamping, as `[lo, hi)`.
    #[inline]
    pub(crate) fn interior_cols(&self) -> (usize, usize) {
        match self.mode {
            BoundaryMode::Valid => (0, self.out_cols),
            BoundaryMode::Clamped => {
                interior_range(self.src.cols(), self.kernel.size(), self.kernel.center())
            }
        }
    }

    /// Top-left source cell of the window for output `(i, j)` when the window
    /// is fully in range.
    #[inline]
    pub(crate) fn window_origin(&self, i: usize, j: usize) -> (usize, usize) {
        match self.mode {
            BoundaryMode::Valid => (i, j),
            BoundaryMode::Clamped => {
                let c = self.kernel.center();
                (i - c, j - c)
            }
        }
    }

    /// Source cell the output `(i, j)` is aligned with.
    #[inline]
    fn anchor(&self, i: usize, j: usize) -> (usize, usize) {
        match self.mode {
            BoundaryMode::Valid => {
                let c = self.kernel.center();
                (i + c, j + c)
            }
            BoundaryMode::Clamped => (i, j),
        }
    }
}

/// Window sum for a window fully inside the source.
#[inline]
pub(crate) fn window_sum<T: Element>(
    src: BufferView<'_, T>,
    kernel: &Kernel,
    top: usize,
    left: usize,
    channel: usize,
) -> f64 {
    let data = src.as_slice();
    let row_len = src.row_len();
    let channels = src.channels();
    let k = kernel.size();
    let mut acc = 0.0f64;
    for ky in 0..k {
        let weights = kernel.row(ky);
        let base = (top + ky) * row_len + left * channels + channel;
        for (kx, &w) in weights.iter().enumerate() {
            acc += data[base + kx * channels].to_acc() * w;
        }
    }
    acc
}

/// Window sum with edge replication for output `(i, j)` in Clamped mode.
#[inline]
pub(crate) fn clamped_window_sum<T: Element>(
    src: BufferView<'_, T>,
    kernel: &Kernel,
    i: usize,
    j: usize,
    channel: usize,
) -> f64 {
    let data = src.as_slice();
    let row_len = src.row_len();
    let channels = src.channels();
    let rows = src.rows();
    let cols = src.cols();
    let center = kernel.center() as isize;
    let k = kernel.size();
    let mut acc = 0.0f64;
    for ky in 0..k {
        let sy = clamp_index(i as isize + ky as isize - center, rows);
        let weights = kernel.row(ky);
        let base = sy * row_len + channel;
        for (kx, &w) in weights.iter().enumerate() {
            let sx = clamp_index(j as isize + kx as isize - center, cols);
            acc += data[base + sx * channels].to_acc() * w;
        }
    }
    acc
}

/// Computes one output cell without narrowing to the element type.
///
/// Returns `None` when `(i, j, channel)` is outside the mode-determined
/// output or the kernel does not fit in Valid mode.
pub fn correlate_cell<T: Element>(
    src: BufferView<'_, T>,
    kernel: &Kernel,
    mode: BoundaryMode,
    i: usize,
    j: usize,
    channel: usize,
) -> Option<f64> {
    let out = mode.output_shape(src.shape(), kernel.size()).ok()?;
    if i >= out.rows() || j >= out.cols() || channel >= src.channels() {
        return None;
    }
    Some(match mode {
        BoundaryMode::Valid => window_sum(src, kernel, i, j, channel),
        BoundaryMode::Clamped => clamped_window_sum(src, kernel, i, j, channel),
    })
}

/// Computes output columns `[col_lo, col_hi)` of row `i` into `dst_row`.
pub(crate) fn correlate_span<T: Element>(
    ctx: &RowContext<'_, T>,
    i: usize,
    col_lo: usize,
    col_hi: usize,
    dst_row: &mut [T],
) {
    let channels = ctx.src.channels();
    let filtered = ctx.filtered_channels();
    let interior_row = ctx.row_is_interior(i);
    let (int_lo, int_hi) = ctx.interior_cols();

    for j in col_lo..col_hi {
        let out_base = j * channels;
        let interior = interior_row && j >= int_lo && j < int_hi;
        for ch in 0..filtered {
            let acc = if interior {
                let (top, left) = ctx.window_origin(i, j);
                window_sum(ctx.src, ctx.kernel, top, left, ch)
            } else {
                clamped_window_sum(ctx.src, ctx.kernel, i, j, ch)
            };
            dst_row[out_base + ch] = T::from_acc(acc);
        }
    }
}

/// Copies the passthrough channel for columns `[0, out_cols)` of row `i`.
pub(crate) fn copy_passthrough<T: Element>(ctx: &RowContext<'_, T>, i: usize, dst_row: &mut [T]) {
    let channels = ctx.src.channels();
    if !ctx.passthrough || channels < 2 {
        return;
    }
    let last = channels - 1;
    for j in 0..ctx.out_cols {
        let (sy, sx) = ctx.anchor(i, j);
        if let Some(value) = ctx.src.get_channel(sy, sx, last) {
            dst_row[j * channels + last] = value;
        }
    }
}

/// Computes the full output row `i`.
pub(crate) fn correlate_row<T: Element>(ctx: &RowContext<'_, T>, i: usize, dst_row: &mut [T]) {
    correlate_span(ctx, i, 0, ctx.out_cols, dst_row);
    copy_passthrough(ctx, i, dst_row);
}
