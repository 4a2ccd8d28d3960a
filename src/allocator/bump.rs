//! Arena allocator (spec §4.1): bump-pointer allocation over a single
//! contiguous buffer acquired once, at VM init, and reclaimed wholesale.
//!
//! Each region that bumps — the nursery, and each of the two graduate
//! semi-spaces — owns one `BumpArena`. There is no per-object free; a young
//! GC evacuates every live object elsewhere first, then calls `reset`.

use crate::error::{GcError, Result};
use crate::object::header::{RegionTag, HEADER_ALIGN};
use crate::util::Alignment;
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Bump-pointer arena over a single owned buffer.
///
/// Allocation is one atomic fetch-and-add (CAS retry loop) so concurrent
/// mutator threads can allocate into the same nursery without a lock; the
/// buffer itself is only ever mutated through `alloc` (disjoint ranges) and
/// `reset` (which requires the caller to hold off all allocators, i.e. be
/// inside a safepoint).
pub struct BumpArena {
    buffer: UnsafeCell<Box<[u8]>>,
    base: usize,
    capacity: usize,
    top: AtomicUsize,
    region: RegionTag,
    label: &'static str,
}

// `UnsafeCell<Box<[u8]>>` is only ever resized in `reset`, which is `unsafe`
// and documented as callable only under a safepoint; concurrent `alloc`
// calls touch disjoint byte ranges of the same buffer via raw pointers.
unsafe impl Sync for BumpArena {}

impl BumpArena {
    /// Allocate a new arena with `capacity` usable bytes for `region`.
    /// `label` is used only in `OutOfMemory` error messages.
    pub fn new(capacity: usize, region: RegionTag, label: &'static str) -> Self {
        // Over-allocate by one alignment unit so an aligned `base` can
        // always be carved out of the raw buffer regardless of where the
        // global allocator happened to place it.
        let raw = vec![0u8; capacity + HEADER_ALIGN].into_boxed_slice();
        let raw_start = raw.as_ptr() as usize;
        let base = Alignment::align_up(raw_start, HEADER_ALIGN);
        Self {
            buffer: UnsafeCell::new(raw),
            base,
            capacity,
            top: AtomicUsize::new(0),
            region,
            label,
        }
    }

    pub fn region(&self) -> RegionTag {
        self.region
    }

    /// Bump-allocate `size` bytes, rounded up to `HEADER_ALIGN`. Returns
    /// `OutOfMemory` when the remaining space cannot hold the request —
    /// never panics, never blocks.
    pub fn alloc(&self, size: usize) -> Result<*mut u8> {
        let aligned = Alignment::align_up(size, HEADER_ALIGN);
        let mut cur = self.top.load(Ordering::Relaxed);
        loop {
            let new_top = cur
                .checked_add(aligned)
                .ok_or_else(|| GcError::oom(size, self.label))?;
            if new_top > self.capacity {
                return Err(GcError::oom(size, self.label));
            }
            match self
                .top
                .compare_exchange_weak(cur, new_top, Ordering::SeqCst, Ordering::Relaxed)
            {
                Ok(_) => return Ok((self.base + cur) as *mut u8),
                Err(actual) => cur = actual,
            }
        }
    }

    /// Clear the cursor and zero the buffer. Reclamation is wholesale: this
    /// is only sound once every live object has been evacuated out of the
    /// arena, never for per-object frees.
    ///
    /// # Safety
    /// The caller must guarantee no other thread is concurrently calling
    /// `alloc` on this arena, and that nothing still holds a pointer into
    /// it — i.e. this runs only from inside a completed young GC.
    pub unsafe fn reset(&self) {
        (*self.buffer.get()).fill(0);
        self.top.store(0, Ordering::SeqCst);
    }

    pub fn used(&self) -> usize {
        self.top.load(Ordering::Relaxed)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn remaining(&self) -> usize {
        self.capacity - self.used()
    }

    pub fn is_empty(&self) -> bool {
        self.used() == 0
    }
}
