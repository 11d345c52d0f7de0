//! Address-stable storage for the duration of a lease.
//!
//! A pinned lease owns a boxed slice behind [`Pin`], so the storage address
//! observed at acquisition stays valid until release. Hosts that pass the
//! address to foreign code can read it with [`PinnedLease::as_ptr`]. Release
//! unpins exactly once.

use crate::buffer::{Buffer, BufferView, BufferViewMut, Element, Shape};
use crate::lifecycle::{BufferLease, BufferLifecycle, Counters, LifecycleStats, StrategyKind};
use crate::util::{CorrFilterError, CorrFilterResult};
use std::marker::PhantomData;
use std::pin::Pin;

const WHAT: &str = "pinned lease";

/// Hands out pinned leases on zeroed buffers of one shape.
#[derive(Debug)]
pub struct PinnedAllocator<T> {
    shape: Shape,
    channels: usize,
    counters: Counters,
    _elem: PhantomData<fn() -> T>,
}

impl<T: Element> PinnedAllocator<T> {
    /// Creates an allocator for single-channel buffers of `shape`.
    pub fn new(shape: Shape) -> Self {
        Self::with_channels(shape, 1)
    }

    /// Creates an allocator for buffers with `channels` interleaved channels.
    pub fn with_channels(shape: Shape, channels: usize) -> Self {
        Self {
            shape,
            channels,
            counters: Counters::default(),
            _elem: PhantomData,
        }
    }
}

impl<T: Element> BufferLifecycle<T> for PinnedAllocator<T> {
    type Lease<'a>
        = PinnedLease<'a, T>
    where
        Self: 'a;

    fn kind(&self) -> StrategyKind {
        StrategyKind::Pinned
    }

    fn shape(&self) -> Shape {
        self.shape
    }

    fn channels(&self) -> usize {
        self.channels
    }

    fn lease(&self) -> CorrFilterResult<PinnedLease<'_, T>> {
        let len = self.shape.storage_len(self.channels)?;
        let storage = vec![T::default(); len].into_boxed_slice();
        self.counters.acquire(false);
        Ok(PinnedLease::from_storage(
            storage,
            self.shape,
            self.channels,
            Some(&self.counters),
        ))
    }

    fn stats(&self) -> LifecycleStats {
        self.counters.snapshot()
    }
}

/// Lease on storage whose address does not change until release.
#[derive(Debug)]
pub struct PinnedLease<'a, T> {
    storage: Option<Pin<Box<[T]>>>,
    base: *const T,
    shape: Shape,
    channels: usize,
    counters: Option<&'a Counters>,
}

// SAFETY: `base` is only compared against the owned storage address and never
// dereferenced; the lease otherwise owns a `Box<[T]>` and shared references.
unsafe impl<T: Send> Send for PinnedLease<'_, T> {}
// SAFETY: see `Send`; shared access only reads the boxed slice.
unsafe impl<T: Sync> Sync for PinnedLease<'_, T> {}

impl<T: Element> PinnedLease<'static, T> {
    /// Pins an existing buffer's storage for the lifetime of the lease.
    pub fn pin(buffer: Buffer<T>) -> Self {
        let shape = buffer.shape();
        let channels = buffer.channels();
        Self::from_storage(buffer.into_vec().into_boxed_slice(), shape, channels, None)
    }
}

impl<'a, T: Element> PinnedLease<'a, T> {
    fn from_storage(
        storage: Box<[T]>,
        shape: Shape,
        channels: usize,
        counters: Option<&'a Counters>,
    ) -> Self {
        let storage = Pin::new(storage);
        let base = storage.as_ptr();
        Self {
            storage: Some(storage),
            base,
            shape,
            channels,
            counters,
        }
    }

    /// Returns the pinned storage address.
    pub fn as_ptr(&self) -> CorrFilterResult<*const T> {
        match &self.storage {
            Some(_) => Ok(self.base),
            None => Err(CorrFilterError::UseAfterRelease { what: WHAT }),
        }
    }

    /// Unpins and returns the storage as an owned buffer.
    pub fn into_buffer(mut self) -> CorrFilterResult<Buffer<T>> {
        let storage = self
            .storage
            .take()
            .ok_or(CorrFilterError::UseAfterRelease { what: WHAT })?;
        if let Some(counters) = self.counters {
            counters.release(false);
        }
        let data = Pin::into_inner(storage).into_vec();
        Ok(Buffer::from_parts(data, self.shape, self.channels))
    }
}

impl<T> PinnedLease<'_, T> {
    fn release_inner(&mut self, on_drop: bool) -> bool {
        match self.storage.take() {
            Some(storage) => {
                debug_assert_eq!(storage.as_ptr(), self.base, "pinned storage moved");
                drop(storage);
                if let Some(counters) = self.counters {
                    counters.release(on_drop);
                    counters.free(1);
                }
                true
            }
            None => false,
        }
    }
}

impl<T: Element> BufferLease<T> for PinnedLease<'_, T> {
    fn view(&self) -> CorrFilterResult<BufferView<'_, T>> {
        let storage = self
            .storage
            .as_ref()
            .ok_or(CorrFilterError::UseAfterRelease { what: WHAT })?;
        Ok(BufferView::from_parts(storage, self.shape, self.channels))
    }

    fn view_mut(&mut self) -> CorrFilterResult<BufferViewMut<'_, T>> {
        let storage = self
            .storage
            .as_mut()
            .ok_or(CorrFilterError::UseAfterRelease { what: WHAT })?;
        Ok(BufferViewMut::from_parts(
            Pin::get_mut(storage.as_mut()),
            self.shape,
            self.channels,
        ))
    }

    fn release(&mut self) -> bool {
        self.release_inner(false)
    }

    fn is_released(&self) -> bool {
        self.storage.is_none()
    }
}

impl<T> Drop for PinnedLease<'_, T> {
    fn drop(&mut self) {
        self.release_inner(true);
    }
}
