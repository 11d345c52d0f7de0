//! CorrFilter is a CPU-first windowed correlation library for dense 2D buffers.
//!
//! A square odd-sized [`Kernel`] is slid over a source [`Buffer`] and every
//! output cell receives the weighted sum of the window around it. Windows that
//! cross the edge either shrink the output ([`BoundaryMode::Valid`]) or sample
//! the nearest edge cell ([`BoundaryMode::Clamped`]). Rows are partitioned
//! across a fixed worker pool with the `rayon` feature, and the `simd` feature
//! vectorizes interior rows without changing results.
//!
//! Buffers used around a job can come from one of four lifecycle strategies
//! in [`lifecycle`]: fresh allocation, a bounded pool, pinned storage, or raw
//! unmanaged allocations with explicit close.
//!
//! ```
//! use corrfilter::{BoundaryMode, Buffer, Correlator, Kernel};
//!
//! let mut src = Buffer::<u8>::new(16, 16)?;
//! src.fill_random(42);
//! let kernel = Kernel::box_filter(3)?;
//! let out = Correlator::new()?.correlate(src.view(), &kernel, BoundaryMode::Clamped)?;
//! assert_eq!(out.output.shape(), src.shape());
//! # Ok::<(), corrfilter::CorrFilterError>(())
//! ```

mod trace;

pub mod buffer;
pub mod engine;
pub mod kernel;
pub mod lifecycle;
pub mod lowlevel;
pub mod util;

pub use buffer::{Buffer, BufferView, BufferViewMut, Element, Shape};
pub use engine::{BoundaryMode, CorrelateConfig, Correlation, Correlator, Job, JobReport};
pub use kernel::Kernel;
pub use lifecycle::{
    run_scoped, BufferLease, BufferLifecycle, BufferPool, FreshAllocator, LifecycleStats,
    PinnedAllocator, PinnedLease, StrategyKind, UnmanagedAllocator, UnmanagedBuffer,
};
pub use util::{CorrFilterError, CorrFilterResult};
