//! Raw allocations outside the vector allocator path.
//!
//! An [`UnmanagedBuffer`] owns memory obtained from [`std::alloc::alloc`].
//! [`UnmanagedBuffer::close`] frees it exactly once; further calls are no-ops
//! and every view afterwards fails with `UseAfterRelease`. A buffer that is
//! dropped while still open is freed by `Drop` and logged as a leak.

use crate::buffer::{BufferView, BufferViewMut, Element, Shape};
use crate::lifecycle::{BufferLease, BufferLifecycle, Counters, LifecycleStats, StrategyKind};
use crate::trace::trace_warn;
use crate::util::{CorrFilterError, CorrFilterResult};
use std::alloc::{alloc, dealloc, Layout};
use std::marker::PhantomData;
use std::ptr::NonNull;

const WHAT: &str = "unmanaged buffer";

/// Hands out raw-allocated buffers of one shape.
#[derive(Debug)]
pub struct UnmanagedAllocator<T> {
    shape: Shape,
    channels: usize,
    counters: Counters,
    _elem: PhantomData<fn() -> T>,
}

impl<T: Element> UnmanagedAllocator<T> {
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

impl<T: Element> BufferLifecycle<T> for UnmanagedAllocator<T> {
    type Lease<'a>
        = UnmanagedBuffer<'a, T>
    where
        Self: 'a;

    fn kind(&self) -> StrategyKind {
        StrategyKind::Unmanaged
    }

    fn shape(&self) -> Shape {
        self.shape
    }

    fn channels(&self) -> usize {
        self.channels
    }

    fn lease(&self) -> CorrFilterResult<UnmanagedBuffer<'_, T>> {
        let buffer =
            UnmanagedBuffer::allocate_inner(self.shape, self.channels, Some(&self.counters))?;
        self.counters.acquire(false);
        Ok(buffer)
    }

    fn stats(&self) -> LifecycleStats {
        self.counters.snapshot()
    }
}

/// Buffer backed by a raw allocation with explicit, idempotent close.
#[derive(Debug)]
pub struct UnmanagedBuffer<'a, T> {
    ptr: Option<NonNull<T>>,
    len: usize,
    layout: Layout,
    shape: Shape,
    channels: usize,
    counters: Option<&'a Counters>,
}

// SAFETY: the buffer uniquely owns its allocation, like `Box<[T]>`.
unsafe impl<T: Send> Send for UnmanagedBuffer<'_, T> {}
// SAFETY: `&self` methods only hand out shared slices of the allocation.
unsafe impl<T: Sync> Sync for UnmanagedBuffer<'_, T> {}

impl<T: Element> UnmanagedBuffer<'static, T> {
    /// Allocates a standalone buffer filled with `T::default()`.
    pub fn allocate(shape: Shape, channels: usize) -> CorrFilterResult<Self> {
        Self::allocate_inner(shape, channels, None)
    }
}

impl<'a, T: Element> UnmanagedBuffer<'a, T> {
    fn allocate_inner(
        shape: Shape,
        channels: usize,
        counters: Option<&'a Counters>,
    ) -> CorrFilterResult<Self> {
        let len = shape.storage_len(channels)?;
        let bytes = len.saturating_mul(std::mem::size_of::<T>());
        let layout =
            Layout::array::<T>(len).map_err(|_| CorrFilterError::AllocationFailed { bytes })?;
        if layout.size() == 0 {
            return Err(CorrFilterError::AllocationFailed { bytes });
        }

        // SAFETY: `layout` has non-zero size. Every slot is initialized before
        // the pointer is exposed.
        let ptr = unsafe {
            let raw = alloc(layout).cast::<T>();
            let ptr = NonNull::new(raw).ok_or(CorrFilterError::AllocationFailed { bytes })?;
            for i in 0..len {
                ptr.as_ptr().add(i).write(T::default());
            }
            ptr
        };

        Ok(Self {
            ptr: Some(ptr),
            len,
            layout,
            shape,
            channels,
            counters,
        })
    }

    /// Returns the buffer shape.
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Returns true once the allocation has been freed.
    pub fn is_closed(&self) -> bool {
        self.ptr.is_none()
    }

    /// Frees the allocation. Returns true only for the call that freed it.
    pub fn close(&mut self) -> bool {
        self.close_inner(false)
    }

    fn slice(&self) -> CorrFilterResult<&[T]> {
        let ptr = self.ptr.ok_or(CorrFilterError::UseAfterRelease { what: WHAT })?;
        // SAFETY: `ptr` is live and holds `len` initialized elements; the
        // returned borrow is tied to `&self`.
        Ok(unsafe { std::slice::from_raw_parts(ptr.as_ptr(), self.len) })
    }

    fn slice_mut(&mut self) -> CorrFilterResult<&mut [T]> {
        let ptr = self.ptr.ok_or(CorrFilterError::UseAfterRelease { what: WHAT })?;
        // SAFETY: as in `slice`, and `&mut self` guarantees exclusivity.
        Ok(unsafe { std::slice::from_raw_parts_mut(ptr.as_ptr(), self.len) })
    }
}

impl<T> UnmanagedBuffer<'_, T> {
    fn close_inner(&mut self, on_drop: bool) -> bool {
        let Some(ptr) = self.ptr.take() else {
            return false;
        };
        // SAFETY: `ptr` came from `alloc(self.layout)` and is freed only here,
        // after `take()` cleared it. Elements are `Copy` and need no drop.
        unsafe { dealloc(ptr.as_ptr().cast::<u8>(), self.layout) };
        if let Some(counters) = self.counters {
            counters.release(on_drop);
            counters.free(1);
        }
        true
    }
}

impl<T: Element> BufferLease<T> for UnmanagedBuffer<'_, T> {
    fn view(&self) -> CorrFilterResult<BufferView<'_, T>> {
        Ok(BufferView::from_parts(self.slice()?, self.shape, self.channels))
    }

    fn view_mut(&mut self) -> CorrFilterResult<BufferViewMut<'_, T>> {
        let (shape, channels) = (self.shape, self.channels);
        Ok(BufferViewMut::from_parts(self.slice_mut()?, shape, channels))
    }

    fn release(&mut self) -> bool {
        self.close()
    }

    fn is_released(&self) -> bool {
        self.is_closed()
    }
}

impl<T> Drop for UnmanagedBuffer<'_, T> {
    fn drop(&mut self) {
        if self.ptr.is_some() {
            trace_warn!(
                "unmanaged_leak",
                bytes = self.layout.size(),
                rows = self.shape.rows(),
                cols = self.shape.cols()
            );
        }
        self.close_inner(true);
    }
}
