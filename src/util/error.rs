//! Error types for corrfilter.

use thiserror::Error;

/// Result alias for corrfilter operations.
pub type CorrFilterResult<T> = std::result::Result<T, CorrFilterError>;

/// Errors that can occur when building buffers, kernels, jobs or leases.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CorrFilterError {
    /// Rows or columns are zero, or their product overflows.
    #[error("invalid dimensions: rows={rows}, cols={cols}")]
    InvalidDimensions { rows: usize, cols: usize },
    /// Channel count is zero.
    #[error("invalid channel count: {channels}")]
    InvalidChannels { channels: usize },
    /// Backing storage length does not equal rows * cols * channels.
    #[error("buffer length mismatch: expected {expected}, got {got}")]
    BufferLengthMismatch { expected: usize, got: usize },
    /// Kernel weights or size are unusable.
    #[error("invalid kernel: {reason}")]
    InvalidKernel { reason: &'static str },
    /// Valid mode needs the kernel to fit inside the source.
    #[error("kernel of size {kernel} does not fit a {rows}x{cols} source")]
    KernelTooLarge {
        kernel: usize,
        rows: usize,
        cols: usize,
    },
    /// Destination shape differs from the mode-determined output shape.
    #[error(
        "destination is {got_rows}x{got_cols}, expected {expected_rows}x{expected_cols}"
    )]
    DimensionMismatch {
        expected_rows: usize,
        expected_cols: usize,
        got_rows: usize,
        got_cols: usize,
    },
    /// Destination channel count differs from the source.
    #[error("destination has {got} channels, expected {expected}")]
    ChannelMismatch { expected: usize, got: usize },
    /// A lease or scope was used after its storage was released.
    #[error("use after release: {what}")]
    UseAfterRelease { what: &'static str },
    /// A configuration value is out of range.
    #[error("invalid config: {reason}")]
    InvalidConfig { reason: &'static str },
    /// The worker pool could not be built.
    #[error("thread pool: {reason}")]
    ThreadPool { reason: String },
    /// Raw allocation failed or its size overflowed.
    #[error("allocation of {bytes} bytes failed")]
    AllocationFailed { bytes: usize },
}
