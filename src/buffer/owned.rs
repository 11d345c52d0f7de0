//! Owned contiguous buffer.
//!
//! The backing vector is sized once at construction and never grows or
//! shrinks, so its address stays fixed for the buffer's lifetime.

use crate::buffer::{check_len, BufferView, BufferViewMut, Element, Shape};
use crate::util::CorrFilterResult;

/// Owned row-major buffer with interleaved channels.
#[derive(Clone, Debug, PartialEq)]
pub struct Buffer<T> {
    data: Vec<T>,
    shape: Shape,
    channels: usize,
}

impl<T: Element> Buffer<T> {
    /// Allocates a single-channel buffer filled with `T::default()`.
    pub fn new(rows: usize, cols: usize) -> CorrFilterResult<Self> {
        Self::with_shape(Shape::new(rows, cols)?, 1)
    }

    /// Allocates a buffer of `shape` with `channels` interleaved channels.
    pub fn with_shape(shape: Shape, channels: usize) -> CorrFilterResult<Self> {
        let len = shape.storage_len(channels)?;
        Ok(Self {
            data: vec![T::default(); len],
            shape,
            channels,
        })
    }

    /// Wraps an existing single-channel vector.
    pub fn from_vec(data: Vec<T>, rows: usize, cols: usize) -> CorrFilterResult<Self> {
        Self::from_vec_channels(data, Shape::new(rows, cols)?, 1)
    }

    /// Wraps an existing vector with interleaved channels.
    pub fn from_vec_channels(
        data: Vec<T>,
        shape: Shape,
        channels: usize,
    ) -> CorrFilterResult<Self> {
        check_len(shape, channels, data.len())?;
        Ok(Self::from_parts(data, shape, channels))
    }

    pub(crate) fn from_parts(data: Vec<T>, shape: Shape, channels: usize) -> Self {
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
        self.shape.rows()
    }

    /// Returns the number of columns.
    pub fn cols(&self) -> usize {
        self.shape.cols()
    }

    /// Returns the number of interleaved channels per cell.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Returns the backing slice.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Returns the backing slice mutably.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Returns the address of the first element.
    pub fn as_ptr(&self) -> *const T {
        self.data.as_ptr()
    }

    /// Returns channel 0 of the cell at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> Option<T> {
        self.view().get(row, col)
    }

    /// Returns row `row` including all channels.
    pub fn row(&self, row: usize) -> Option<&[T]> {
        let len = self.shape.cols() * self.channels;
        if row >= self.shape.rows() {
            return None;
        }
        self.data.get(row * len..(row + 1) * len)
    }

    /// Returns a borrowed view of the buffer.
    pub fn view(&self) -> BufferView<'_, T> {
        BufferView {
            data: &self.data,
            shape: self.shape,
            channels: self.channels,
        }
    }

    /// Returns a borrowed mutable view of the buffer.
    pub fn view_mut(&mut self) -> BufferViewMut<'_, T> {
        BufferViewMut {
            data: &mut self.data,
            shape: self.shape,
            channels: self.channels,
        }
    }

    /// Fills every element with `value`.
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    /// Fills channel values from `f(row, col, channel)`.
    pub fn fill_with<F>(&mut self, f: F)
    where
        F: FnMut(usize, usize, usize) -> T,
    {
        self.view_mut().fill_with(f);
    }

    /// Fills with seeded uniform values (see [`Element::from_unit`]).
    pub fn fill_random(&mut self, seed: u64) {
        self.view_mut().fill_random(seed);
    }

    /// Fills each cell with `row * cols + col`.
    pub fn fill_index_pattern(&mut self) {
        self.view_mut().fill_index_pattern();
    }

    /// Consumes the buffer and returns the backing vector.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::Buffer;
    use crate::{CorrFilterError, Shape};

    #[test]
    fn new_buffer_is_zeroed_and_row_major() {
        let mut buf = Buffer::<u8>::new(2, 3).unwrap();
        assert_eq!(buf.as_slice(), &[0u8; 6]);
        buf.fill_index_pattern();
        assert_eq!(buf.row(1).unwrap(), &[3u8, 4, 5]);
        assert_eq!(buf.get(1, 2), Some(5));
        assert_eq!(buf.get(2, 0), None);
    }

    #[test]
    fn from_vec_rejects_wrong_length() {
        let err = Buffer::from_vec(vec![0.0f64; 5], 2, 3).unwrap_err();
        assert_eq!(
            err,
            CorrFilterError::BufferLengthMismatch {
                expected: 6,
                got: 5
            }
        );
    }

    #[test]
    fn channels_are_interleaved_per_cell() {
        let shape = Shape::new(1, 2).unwrap();
        let buf = Buffer::from_vec_channels(vec![1u8, 2, 3, 4, 5, 6], shape, 3).unwrap();
        assert_eq!(buf.view().get_channel(0, 1, 0), Some(4));
        assert_eq!(buf.view().get_channel(0, 1, 2), Some(6));
        assert_eq!(buf.view().get_channel(0, 1, 3), None);
    }

    #[test]
    fn zero_channels_are_rejected() {
        let shape = Shape::new(2, 2).unwrap();
        let err = Buffer::<f32>::with_shape(shape, 0).unwrap_err();
        assert_eq!(err, CorrFilterError::InvalidChannels { channels: 0 });
    }
}
