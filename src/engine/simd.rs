//! SIMD row kernel using the `wide` crate.
//!
//! Each of the 4 lanes of an `f64x4` accumulates a different output column,
//! so every lane performs the same multiply-then-add sequence as the scalar
//! loop. Results are bit-identical to [`scalar`](crate::engine::scalar).

use crate::buffer::Element;
use crate::engine::scalar::{copy_passthrough, correlate_span, RowContext};
use wide::f64x4;

const LANES: usize = 4;

/// Loads 4 elements spaced `stride` apart, widened to `f64`.
#[inline]
fn load_strided<T: Element>(data: &[T], start: usize, stride: usize) -> f64x4 {
    f64x4::from([
        data[start].to_acc(),
        data[start + stride].to_acc(),
        data[start + 2 * stride].to_acc(),
        data[start + 3 * stride].to_acc(),
    ])
}

/// Computes output row `i`, vectorizing the unclamped column span.
pub(crate) fn correlate_row_simd<T: Element>(ctx: &RowContext<'_, T>, i: usize, dst_row: &mut [T]) {
    if !ctx.row_is_interior(i) {
        correlate_span(ctx, i, 0, ctx.out_cols, dst_row);
        copy_passthrough(ctx, i, dst_row);
        return;
    }

    let (lo, hi) = ctx.interior_cols();
    let lo = lo.min(ctx.out_cols);
    let hi = hi.min(ctx.out_cols).max(lo);
    correlate_span(ctx, i, 0, lo, dst_row);

    let data = ctx.src.as_slice();
    let row_len = ctx.src.row_len();
    let channels = ctx.src.channels();
    let filtered = ctx.filtered_channels();
    let k = ctx.kernel.size();

    let mut j = lo;
    while j + LANES <= hi {
        let (top, left) = ctx.window_origin(i, j);
        for ch in 0..filtered {
            let mut acc = f64x4::ZERO;
            for ky in 0..k {
                let weights = ctx.kernel.row(ky);
                let base = (top + ky) * row_len + left * channels + ch;
                for (kx, &w) in weights.iter().enumerate() {
                    let values = load_strided(data, base + kx * channels, channels);
                    acc += values * f64x4::splat(w);
                }
            }
            for (lane, value) in acc.to_array().into_iter().enumerate() {
                dst_row[(j + lane) * channels + ch] = T::from_acc(value);
            }
        }
        j += LANES;
    }

    correlate_span(ctx, i, j, ctx.out_cols, dst_row);
    copy_passthrough(ctx, i, dst_row);
}
