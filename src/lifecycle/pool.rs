//! Bounded pool of reusable fixed-shape buffers.
//!
//! `acquire` pops a previously released buffer or allocates a new one.
//! `release` keeps a buffer only while the pool holds fewer than `capacity`
//! buffers and the buffer has exactly the pool's shape and channel count;
//! anything else is dropped. The mutex guards only the push and pop, never
//! numeric work. Reused buffers keep their previous contents.

use crate::buffer::{Buffer, BufferView, BufferViewMut, Element, Shape};
use crate::lifecycle::{BufferLease, BufferLifecycle, Counters, LifecycleStats, StrategyKind};
use crate::trace::trace_event;
use crate::util::{CorrFilterError, CorrFilterResult};
use parking_lot::Mutex;

/// Thread-safe bounded buffer pool.
#[derive(Debug)]
pub struct BufferPool<T> {
    shape: Shape,
    channels: usize,
    capacity: usize,
    slots: Mutex<Vec<Buffer<T>>>,
    counters: Counters,
}

impl<T: Element> BufferPool<T> {
    /// Creates an empty pool of single-channel buffers.
    pub fn new(shape: Shape, capacity: usize) -> Self {
        Self::with_channels(shape, 1, capacity)
    }

    /// Creates an empty pool of buffers with `channels` interleaved channels.
    pub fn with_channels(shape: Shape, channels: usize, capacity: usize) -> Self {
        Self {
            shape,
            channels,
            capacity,
            slots: Mutex::new(Vec::with_capacity(capacity)),
            counters: Counters::default(),
        }
    }

    /// Pre-allocates up to `count` buffers (bounded by capacity).
    pub fn with_prefill(self, count: usize) -> CorrFilterResult<Self> {
        let count = count.min(self.capacity);
        {
            let mut slots = self.slots.lock();
            while slots.len() < count {
                slots.push(Buffer::with_shape(self.shape, self.channels)?);
            }
        }
        Ok(self)
    }

    /// Returns the maximum number of retained buffers.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of buffers currently retained.
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    /// Returns true when no buffer is retained.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Takes a retained buffer or allocates a new one.
    pub fn acquire(&self) -> CorrFilterResult<Buffer<T>> {
        let reused = self.slots.lock().pop();
        match reused {
            Some(buffer) => {
                self.counters.acquire(true);
                Ok(buffer)
            }
            None => {
                let buffer = Buffer::with_shape(self.shape, self.channels)?;
                self.counters.acquire(false);
                Ok(buffer)
            }
        }
    }

    /// Returns `buffer` to the pool. Returns true when it was retained.
    ///
    /// Buffers of the wrong shape or arriving while the pool is full are
    /// dropped; this never fails.
    pub fn release(&self, buffer: Buffer<T>) -> bool {
        self.counters.release(false);
        self.put_back(buffer)
    }

    /// Drops every retained buffer.
    pub fn clear(&self) {
        let drained: Vec<Buffer<T>> = std::mem::take(&mut *self.slots.lock());
        self.counters.free(drained.len());
    }

    fn put_back(&self, buffer: Buffer<T>) -> bool {
        if buffer.shape() != self.shape || buffer.channels() != self.channels {
            trace_event!(
                "pool_discard",
                reason = "shape",
                rows = buffer.rows(),
                cols = buffer.cols()
            );
            self.counters.discard();
            self.counters.free(1);
            return false;
        }
        let rejected = {
            let mut slots = self.slots.lock();
            if slots.len() < self.capacity {
                slots.push(buffer);
                None
            } else {
                Some(buffer)
            }
        };
        match rejected {
            None => true,
            Some(buffer) => {
                trace_event!("pool_discard", reason = "full", capacity = self.capacity);
                drop(buffer);
                self.counters.discard();
                self.counters.free(1);
                false
            }
        }
    }
}

impl<T: Element> BufferLifecycle<T> for BufferPool<T> {
    type Lease<'a>
        = PoolLease<'a, T>
    where
        Self: 'a;

    fn kind(&self) -> StrategyKind {
        StrategyKind::Pool
    }

    fn shape(&self) -> Shape {
        self.shape
    }

    fn channels(&self) -> usize {
        self.channels
    }

    fn lease(&self) -> CorrFilterResult<PoolLease<'_, T>> {
        Ok(PoolLease {
            pool: self,
            buffer: Some(self.acquire()?),
        })
    }

    fn stats(&self) -> LifecycleStats {
        self.counters.snapshot()
    }
}

/// Lease that returns its buffer to the pool on release or drop.
#[derive(Debug)]
pub struct PoolLease<'a, T: Element> {
    pool: &'a BufferPool<T>,
    buffer: Option<Buffer<T>>,
}

impl<T: Element> PoolLease<'_, T> {
    /// Detaches the buffer from the lease without returning it to the pool.
    pub fn into_buffer(mut self) -> CorrFilterResult<Buffer<T>> {
        self.buffer.take().ok_or(CorrFilterError::UseAfterRelease {
            what: "pool lease",
        })
    }

    fn release_inner(&mut self, on_drop: bool) -> bool {
        match self.buffer.take() {
            Some(buffer) => {
                self.pool.counters.release(on_drop);
                self.pool.put_back(buffer);
                true
            }
            None => false,
        }
    }
}

impl<T: Element> BufferLease<T> for PoolLease<'_, T> {
    fn view(&self) -> CorrFilterResult<BufferView<'_, T>> {
        self.buffer
            .as_ref()
            .map(Buffer::view)
            .ok_or(CorrFilterError::UseAfterRelease { what: "pool lease" })
    }

    fn view_mut(&mut self) -> CorrFilterResult<BufferViewMut<'_, T>> {
        self.buffer
            .as_mut()
            .map(Buffer::view_mut)
            .ok_or(CorrFilterError::UseAfterRelease { what: "pool lease" })
    }

    fn release(&mut self) -> bool {
        self.release_inner(false)
    }

    fn is_released(&self) -> bool {
        self.buffer.is_none()
    }
}

impl<T: Element> Drop for PoolLease<'_, T> {
    fn drop(&mut self) {
        self.release_inner(true);
    }
}
