//! Buffer lifecycle strategies.
//!
//! A strategy hands out leases on buffers of one fixed shape. A lease owns its
//! storage until it is released, either explicitly through
//! [`BufferLease::release`] or when it is dropped, so storage is returned or
//! freed on every exit path of the owning scope. Release is idempotent: only
//! the first call has an effect, and a released lease reports
//! [`CorrFilterError::UseAfterRelease`] instead of touching its old storage.
//!
//! Four strategies are provided:
//! - [`FreshAllocator`]: a new buffer per lease, dropped on release.
//! - [`BufferPool`]: bounded reuse of released buffers.
//! - [`PinnedAllocator`]: storage with a fixed address for the lease's scope.
//! - [`UnmanagedAllocator`]: raw allocations with an idempotent `close()` and
//!   a drop-time safety net.

use crate::buffer::{BufferView, BufferViewMut, Element, Shape};
use crate::engine::{BoundaryMode, Correlator, Job, JobReport};
use crate::kernel::Kernel;
use crate::trace::trace_span;
use crate::util::{CorrFilterError, CorrFilterResult};
use std::sync::atomic::{AtomicUsize, Ordering};

pub mod fresh;
pub mod pinned;
pub mod pool;
pub mod unmanaged;

pub use fresh::{FreshAllocator, FreshLease};
pub use pinned::{PinnedAllocator, PinnedLease};
pub use pool::{BufferPool, PoolLease};
pub use unmanaged::{UnmanagedAllocator, UnmanagedBuffer};

/// Strategy selector for hosts that pick a strategy at runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    Fresh,
    Pool,
    Pinned,
    Unmanaged,
}

impl StrategyKind {
    /// All strategies, in declaration order.
    pub const ALL: [StrategyKind; 4] = [
        StrategyKind::Fresh,
        StrategyKind::Pool,
        StrategyKind::Pinned,
        StrategyKind::Unmanaged,
    ];

    /// Returns the lowercase strategy name.
    pub fn as_str(self) -> &'static str {
        match self {
            StrategyKind::Fresh => "fresh",
            StrategyKind::Pool => "pool",
            StrategyKind::Pinned => "pinned",
            StrategyKind::Unmanaged => "unmanaged",
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StrategyKind {
    type Err = CorrFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StrategyKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or(CorrFilterError::InvalidConfig {
                reason: "strategy must be one of fresh, pool, pinned, unmanaged",
            })
    }
}

/// Snapshot of a strategy's counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LifecycleStats {
    /// Leases or buffers handed out.
    pub acquired: usize,
    /// Handed-out buffers that needed a new allocation.
    pub allocated: usize,
    /// Handed-out buffers served from retained storage.
    pub reused: usize,
    /// Effective releases (repeated releases are not counted).
    pub released: usize,
    /// Returned buffers the strategy refused to retain.
    pub discarded: usize,
    /// Storage deallocations.
    pub freed: usize,
    /// Releases performed by `Drop` rather than an explicit call.
    pub released_on_drop: usize,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    acquired: AtomicUsize,
    allocated: AtomicUsize,
    reused: AtomicUsize,
    released: AtomicUsize,
    discarded: AtomicUsize,
    freed: AtomicUsize,
    released_on_drop: AtomicUsize,
}

impl Counters {
    pub(crate) fn acquire(&self, reused: bool) {
        self.acquired.fetch_add(1, Ordering::Relaxed);
        if reused {
            self.reused.fetch_add(1, Ordering::Relaxed);
        } else {
            self.allocated.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn release(&self, on_drop: bool) {
        self.released.fetch_add(1, Ordering::Relaxed);
        if on_drop {
            self.released_on_drop.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn discard(&self) {
        self.discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn free(&self, count: usize) {
        self.freed.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> LifecycleStats {
        LifecycleStats {
            acquired: self.acquired.load(Ordering::Relaxed),
            allocated: self.allocated.load(Ordering::Relaxed),
            reused: self.reused.load(Ordering::Relaxed),
            released: self.released.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            freed: self.freed.load(Ordering::Relaxed),
            released_on_drop: self.released_on_drop.load(Ordering::Relaxed),
        }
    }
}

/// Owning handle on a leased buffer.
pub trait BufferLease<T: Element> {
    /// Returns a read-only view, or `UseAfterRelease` once released.
    fn view(&self) -> CorrFilterResult<BufferView<'_, T>>;

    /// Returns a mutable view, or `UseAfterRelease` once released.
    fn view_mut(&mut self) -> CorrFilterResult<BufferViewMut<'_, T>>;

    /// Releases the storage. Returns true only for the call that released it.
    fn release(&mut self) -> bool;

    /// Returns true once the storage has been released.
    fn is_released(&self) -> bool;
}

/// Source of fixed-shape buffer leases.
pub trait BufferLifecycle<T: Element> {
    type Lease<'a>: BufferLease<T>
    where
        Self: 'a;

    /// Returns which strategy this is.
    fn kind(&self) -> StrategyKind;

    /// Returns the shape of every leased buffer.
    fn shape(&self) -> Shape;

    /// Returns the interleaved channel count of every leased buffer.
    fn channels(&self) -> usize;

    /// Hands out a lease on a buffer of [`shape`](Self::shape).
    fn lease(&self) -> CorrFilterResult<Self::Lease<'_>>;

    /// Returns a snapshot of the strategy's counters.
    fn stats(&self) -> LifecycleStats;
}

/// Leases a source and a destination, correlates, and releases both.
///
/// `fill` writes the leased source, `inspect` reads the finished destination.
/// Both leases are released before returning, including when any step fails.
/// The destination strategy's shape must equal the job's output shape.
#[allow(clippy::too_many_arguments)]
pub fn run_scoped<T, S, D, F, I, R>(
    source: &S,
    destination: &D,
    correlator: &Correlator,
    kernel: &Kernel,
    mode: BoundaryMode,
    fill: F,
    inspect: I,
) -> CorrFilterResult<(R, JobReport)>
where
    T: Element,
    S: BufferLifecycle<T>,
    D: BufferLifecycle<T>,
    F: FnOnce(BufferViewMut<'_, T>),
    I: FnOnce(BufferView<'_, T>) -> R,
{
    let _span = trace_span!(
        "lease",
        source = source.kind().as_str(),
        destination = destination.kind().as_str()
    )
    .entered();

    let mut src_lease = source.lease()?;
    let mut dst_lease = destination.lease()?;

    fill(src_lease.view_mut()?);
    let report = {
        let job = Job::new(src_lease.view()?, kernel, mode)?;
        correlator.run_into(&job, dst_lease.view_mut()?)?
    };
    let result = inspect(dst_lease.view()?);

    dst_lease.release();
    src_lease.release();
    Ok((result, report))
}
