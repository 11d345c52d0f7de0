//! Dense row-major 2D buffers and borrowed views.
//!
//! A buffer stores `rows * cols * channels` elements contiguously. Channels are
//! interleaved within a cell, so row `r` occupies
//! `[r * cols * channels, (r + 1) * cols * channels)`. Views borrow the same
//! layout from any backing storage (vector, pinned box, raw allocation).

use crate::util::{CorrFilterError, CorrFilterResult};

pub mod element;
mod fill;
mod owned;

pub use element::Element;
pub use owned::Buffer;

/// Rows and columns of a buffer, both at least 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Shape {
    rows: usize,
    cols: usize,
}

impl Shape {
    /// Creates a shape, rejecting zero extents.
    pub fn new(rows: usize, cols: usize) -> CorrFilterResult<Self> {
        if rows == 0 || cols == 0 {
            return Err(CorrFilterError::InvalidDimensions { rows, cols });
        }
        rows.checked_mul(cols)
            .ok_or(CorrFilterError::InvalidDimensions { rows, cols })?;
        Ok(Self { rows, cols })
    }

    /// Returns the number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Returns the number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Returns `rows * cols`.
    pub fn cells(&self) -> usize {
        self.rows * self.cols
    }

    /// Returns the storage length for `channels` interleaved channels.
    pub fn storage_len(&self, channels: usize) -> CorrFilterResult<usize> {
        if channels == 0 {
            return Err(CorrFilterError::InvalidChannels { channels });
        }
        self.cells()
            .checked_mul(channels)
            .ok_or(CorrFilterError::InvalidDimensions {
                rows: self.rows,
                cols: self.cols,
            })
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

fn check_len(shape: Shape, channels: usize, got: usize) -> CorrFilterResult<()> {
    let expected = shape.storage_len(channels)?;
    if got != expected {
        return Err(CorrFilterError::BufferLengthMismatch { expected, got });
    }
    Ok(())
}

/// Borrowed read-only view of a row-major buffer.
#[derive(Clone, Copy, Debug)]
pub struct BufferView<'a, T> {
    data: &'a [T],
    shape: Shape,
    channels: usize,
}

impl<'a, T: Element> BufferView<'a, T> {
    /// Creates a single-channel view; `data.len()` must equal `rows * cols`.
    pub fn from_slice(data: &'a [T], rows: usize, cols: usize) -> CorrFilterResult<Self> {
        Self::new(data, Shape::new(rows, cols)?, 1)
    }

    /// Creates a view with interleaved channels.
    pub fn new(data: &'a [T], shape: Shape, channels: usize) -> CorrFilterResult<Self> {
        check_len(shape, channels, data.len())?;
        Ok(Self {
            data,
            shape,
            channels,
        })
    }

    pub(crate) fn from_parts(data: &'a [T], shape: Shape, channels: usize) -> Self {
        debug_assert_eq!(data.len(), shape.cells() * channels);
        Self {
            data,
            shape,
            channels,
        }
    }

    /// Returns the buffer shape.
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Returns the number of rows.
    pub fn rows(&self) -> usize {
        self.shape.rows
    }

    /// Returns the number of columns.
    pub fn cols(&self) -> usize {
        self.shape.cols
    }

    /// Returns the number of interleaved channels per cell.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Returns the number of elements per row.
    pub fn row_len(&self) -> usize {
        self.shape.cols * self.channels
    }

    /// Returns the backing slice.
    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }

    /// Returns row `row` including all channels.
    pub fn row(&self, row: usize) -> Option<&'a [T]> {
        if row >= self.shape.rows {
            return None;
        }
        let len = self.row_len();
        self.data.get(row * len..(row + 1) * len)
    }

    /// Returns channel 0 of the cell at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> Option<T> {
        self.get_channel(row, col, 0)
    }

    /// Returns channel `channel` of the cell at `(row, col)`.
    pub fn get_channel(&self, row: usize, col: usize, channel: usize) -> Option<T> {
        if row >= self.shape.rows || col >= self.shape.cols || channel >= self.channels {
            return None;
        }
        self.data
            .get((row * self.shape.cols + col) * self.channels + channel)
            .copied()
    }

    /// Copies the view into a new owned buffer.
    pub fn to_buffer(&self) -> Buffer<T> {
        Buffer::from_parts(self.data.to_vec(), self.shape, self.channels)
    }
}

/// Borrowed mutable view of a row-major buffer.
#[derive(Debug)]
pub struct BufferViewMut<'a, T> {
    data: &'a mut [T],
    shape: Shape,
    channels: usize,
}

impl<'a, T: Element> BufferViewMut<'a, T> {
    /// Creates a single-channel mutable view.
    pub fn from_slice(data: &'a mut [T], rows: usize, cols: usize) -> CorrFilterResult<Self> {
        Self::new(data, Shape::new(rows, cols)?, 1)
    }

    /// Creates a mutable view with interleaved channels.
    pub fn new(data: &'a mut [T], shape: Shape, channels: usize) -> CorrFilterResult<Self> {
        check_len(shape, channels, data.len())?;
        Ok(Self {
            data,
            shape,
            channels,
        })
    }

    /// Returns the buffer shape.
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Returns the number of rows.
    pub fn rows(&self) -> usize {
        self.shape.rows
    }

    /// Returns the number of columns.
    pub fn cols(&self) -> usize {
        self.shape.cols
    }

    /// Returns the number of interleaved channels per cell.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Returns the number of elements per row.
    pub fn row_len(&self) -> usize {
        self.shape.cols * self.channels
    }

    /// Reborrows as a read-only view.
    pub fn as_view(&self) -> BufferView<'_, T> {
        BufferView {
            data: &*self.data,
            shape: self.shape,
            channels: self.channels,
        }
    }

    /// Reborrows as a shorter-lived mutable view.
    pub fn reborrow(&mut self) -> BufferViewMut<'_, T> {
        BufferViewMut {
            data: &mut *self.data,
            shape: self.shape,
            channels: self.channels,
        }
    }

    /// Returns the backing slice.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut *self.data
    }

    /// Returns row `row` mutably.
    pub fn row_mut(&mut self, row: usize) -> Option<&mut [T]> {
        if row >= self.shape.rows {
            return None;
        }
        let len = self.row_len();
        self.data.get_mut(row * len..(row + 1) * len)
    }

    /// Writes channel 0 of the cell at `(row, col)`; returns false when out of range.
    pub fn set(&mut self, row: usize, col: usize, value: T) -> bool {
        if row >= self.shape.rows || col >= self.shape.cols {
            return false;
        }
        let idx = (row * self.shape.cols + col) * self.channels;
        self.data[idx] = value;
        true
    }

    /// Copies `src` into this view; shapes and channels must match.
    pub fn copy_from(&mut self, src: BufferView<'_, T>) -> CorrFilterResult<()> {
        if src.shape() != self.shape {
            return Err(CorrFilterError::DimensionMismatch {
                expected_rows: self.shape.rows,
                expected_cols: self.shape.cols,
                got_rows: src.rows(),
                got_cols: src.cols(),
            });
        }
        if src.channels() != self.channels {
            return Err(CorrFilterError::ChannelMismatch {
                expected: self.channels,
                got: src.channels(),
            });
        }
        self.data.copy_from_slice(src.as_slice());
        Ok(())
    }

    pub(crate) fn from_parts(data: &'a mut [T], shape: Shape, channels: usize) -> Self {
        debug_assert_eq!(data.len(), shape.cells() * channels);
        Self {
            data,
            shape,
            channels,
        }
    }

    pub(crate) fn into_slice(self) -> &'a mut [T] {
        self.data
    }
}
