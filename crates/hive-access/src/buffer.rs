//! Scoped transient buffers.
//!
//! Reads and terminated writes stage their payload in a [`ScopedBuffer`]
//! obtained from a [`BufferAllocator`]. A buffer is requested at exactly the
//! size needed and handed back when it is dropped, so it never outlives the
//! call that allocated it, whichever way that call returns.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::{AccessError, AccessResult};

/// Source of transient buffers.
pub trait BufferAllocator: Send + Sync {
    /// Allocate a zero-filled buffer of exactly `size` bytes.
    fn allocate(&self, size: usize) -> AccessResult<ScopedBuffer>;
}

/// A zero-filled byte buffer released on drop.
pub struct ScopedBuffer {
    data: Vec<u8>,
    /// Outstanding-byte counter of the allocator that issued this buffer.
    outstanding: Option<Arc<AtomicUsize>>,
}

impl ScopedBuffer {
    /// Allocate a buffer not tied to any allocator's accounting.
    pub fn zeroed(size: usize) -> AccessResult<Self> {
        let mut data = Vec::new();
        data.try_reserve_exact(size)
            .map_err(|_| AccessError::OutOfMemory { requested: size })?;
        data.resize(size, 0);
        Ok(Self {
            data,
            outstanding: None,
        })
    }

    fn tracked(size: usize, outstanding: Arc<AtomicUsize>) -> AccessResult<Self> {
        let mut buf = Self::zeroed(size)?;
        outstanding.fetch_add(size, Ordering::SeqCst);
        buf.outstanding = Some(outstanding);
        Ok(buf)
    }
}

impl Deref for ScopedBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl DerefMut for ScopedBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl Drop for ScopedBuffer {
    fn drop(&mut self) {
        if let Some(outstanding) = self.outstanding.take() {
            outstanding.fetch_sub(self.data.len(), Ordering::SeqCst);
        }
    }
}

impl std::fmt::Debug for ScopedBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedBuffer")
            .field("len", &self.data.len())
            .finish()
    }
}

/// Heap allocator that accounts for every byte it hands out.
///
/// `outstanding()` is the number of bytes in buffers that have not been
/// dropped yet. With a limit set, a request that would push it past the
/// limit fails with `OutOfMemory`.
#[derive(Debug, Default)]
pub struct TrackingAllocator {
    outstanding: Arc<AtomicUsize>,
    allocations: AtomicUsize,
    limit: Option<usize>,
}

impl TrackingAllocator {
    /// An allocator without a limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// An allocator that refuses to have more than `limit` bytes outstanding.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    /// Bytes currently held by live buffers.
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }

    /// Number of successful allocations so far.
    pub fn allocations(&self) -> usize {
        self.allocations.load(Ordering::SeqCst)
    }
}

impl BufferAllocator for TrackingAllocator {
    fn allocate(&self, size: usize) -> AccessResult<ScopedBuffer> {
        if let Some(limit) = self.limit {
            if self.outstanding().saturating_add(size) > limit {
                return Err(AccessError::OutOfMemory { requested: size });
            }
        }
        let buf = ScopedBuffer::tracked(size, Arc::clone(&self.outstanding))?;
        self.allocations.fetch_add(1, Ordering::SeqCst);
        Ok(buf)
    }
}
