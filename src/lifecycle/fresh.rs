//! Fresh allocation per lease.

use crate::buffer::{Buffer, BufferView, BufferViewMut, Element, Shape};
use crate::lifecycle::{BufferLease, BufferLifecycle, Counters, LifecycleStats, StrategyKind};
use crate::util::{CorrFilterError, CorrFilterResult};
use std::marker::PhantomData;

/// Allocates a new zeroed buffer for every lease and drops it on release.
#[derive(Debug)]
pub struct FreshAllocator<T> {
    shape: Shape,
    channels: usize,
    counters: Counters,
    _elem: PhantomData<fn() -> T>,
}

impl<T: Element> FreshAllocator<T> {
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

impl<T: Element> BufferLifecycle<T> for FreshAllocator<T> {
    type Lease<'a>
        = FreshLease<'a, T>
    where
        Self: 'a;

    fn kind(&self) -> StrategyKind {
        StrategyKind::Fresh
    }

    fn shape(&self) -> Shape {
        self.shape
    }

    fn channels(&self) -> usize {
        self.channels
    }

    fn lease(&self) -> CorrFilterResult<FreshLease<'_, T>> {
        let buffer = Buffer::with_shape(self.shape, self.channels)?;
        self.counters.acquire(false);
        Ok(FreshLease {
            buffer: Some(buffer),
            counters: &self.counters,
        })
    }

    fn stats(&self) -> LifecycleStats {
        self.counters.snapshot()
    }
}

/// Lease on a freshly allocated buffer.
#[derive(Debug)]
pub struct FreshLease<'a, T> {
    buffer: Option<Buffer<T>>,
    counters: &'a Counters,
}

impl<T> FreshLease<'_, T> {
    fn release_inner(&mut self, on_drop: bool) -> bool {
        match self.buffer.take() {
            Some(buffer) => {
                drop(buffer);
                self.counters.release(on_drop);
                self.counters.free(1);
                true
            }
            None => false,
        }
    }
}

impl<T: Element> BufferLease<T> for FreshLease<'_, T> {
    fn view(&self) -> CorrFilterResult<BufferView<'_, T>> {
        self.buffer
            .as_ref()
            .map(Buffer::view)
            .ok_or(CorrFilterError::UseAfterRelease {
                what: "fresh lease",
            })
    }

    fn view_mut(&mut self) -> CorrFilterResult<BufferViewMut<'_, T>> {
        self.buffer
            .as_mut()
            .map(Buffer::view_mut)
            .ok_or(CorrFilterError::UseAfterRelease {
                what: "fresh lease",
            })
    }

    fn release(&mut self) -> bool {
        self.release_inner(false)
    }

    fn is_released(&self) -> bool {
        self.buffer.is_none()
    }
}

impl<T> Drop for FreshLease<'_, T> {
    fn drop(&mut self) {
        self.release_inner(true);
    }
}
