//! The `newer` forwarding protocol for resizable containers (§4.8, §5).
//!
//! Arrays and dicts are fixed-capacity once allocated; growing one
//! allocates a new, larger container and leaves the old one behind with
//! `newer` pointing at it. Any holder of a stale pointer chases `newer`
//! to the current version before acting on it.
//!
//! In single-threaded builds this is a plain pointer: nothing mutates it
//! concurrently, so a normal field suffices. In multi-threaded builds
//! `newer` is the publication point a resize uses to hand off to readers
//! that may be mid-access, so it is an `AtomicPtr` with release stores and
//! acquire loads. The `AcquireCounter` plays the same single-/multi-
//! threaded double role for the per-container reader count described in
//! the concurrency model. This mirrors the teacher's own note (Design
//! Notes, "Dynamic dispatch") that a "shared-ref acquisition" capability
//! should be a no-op in single-threaded mode and an acquire/retry loop in
//! multi-threaded mode.

use crate::object::header::ObjectHeader;
use std::ptr;

#[cfg(not(feature = "multi-threaded"))]
mod backend {
    use super::*;
    use std::cell::Cell;

    pub struct NewerSlot(Cell<*mut ObjectHeader>);

    impl NewerSlot {
        pub fn new() -> Self {
            Self(Cell::new(ptr::null_mut()))
        }

        pub fn load(&self) -> *mut ObjectHeader {
            self.0.get()
        }

        pub fn store(&self, new: *mut ObjectHeader) {
            self.0.set(new);
        }
    }

    pub struct AcquireCounter(Cell<usize>);

    impl AcquireCounter {
        pub fn new() -> Self {
            Self(Cell::new(0))
        }

        /// No-op acquisition in single-threaded mode: there is no reader
        /// concurrent with a resize, so this always succeeds immediately.
        pub fn acquire(&self) {
            self.0.set(self.0.get() + 1);
        }

        pub fn release(&self) {
            self.0.set(self.0.get() - 1);
        }

        pub fn count(&self) -> usize {
            self.0.get()
        }
    }
}

#[cfg(feature = "multi-threaded")]
mod backend {
    use super::*;
    use crossbeam_utils::Backoff;
    use std::sync::atomic::{AtomicPtr, AtomicUsize, Ordering};

    pub struct NewerSlot(AtomicPtr<ObjectHeader>);

    impl NewerSlot {
        pub fn new() -> Self {
            Self(AtomicPtr::new(ptr::null_mut()))
        }

        /// Acquire load: observing `null` here means all of the writes
        /// made before the corresponding `store` are visible too.
        pub fn load(&self) -> *mut ObjectHeader {
            self.0.load(Ordering::Acquire)
        }

        /// Release store: publishes a resize. Acts as the fence readers
        /// rely on before they act on the new container.
        pub fn store(&self, new: *mut ObjectHeader) {
            self.0.store(new, Ordering::Release);
        }
    }

    pub struct AcquireCounter(AtomicUsize);

    impl AcquireCounter {
        pub fn new() -> Self {
            Self(AtomicUsize::new(0))
        }

        /// Acquire by incrementing the reader count. Callers must re-check
        /// `NewerSlot::load` after this succeeds: if a newer forwarder
        /// appeared between their load and this `fetch_add`, they must
        /// `release()` and retry against the newest forwarder instead of
        /// trusting stale data (§5, per-container atomic counter).
        pub fn acquire(&self) {
            self.0.fetch_add(1, Ordering::Acquire);
        }

        /// Spin with an architectural pause/yield hint between retries,
        /// for callers that looped because a newer forwarder appeared.
        pub fn backoff_spin(backoff: &Backoff) {
            backoff.spin();
        }

        pub fn release(&self) {
            self.0.fetch_sub(1, Ordering::Release);
        }

        pub fn count(&self) -> usize {
            self.0.load(Ordering::Relaxed)
        }
    }
}

pub use backend::{AcquireCounter, NewerSlot};

impl Default for NewerSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for AcquireCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Follow `slot` to the newest forwarder, returning the original pointer
/// when `newer` is null. Used by both readers chasing a stale pointer and
/// the young GC's `copy_young` when it must rewrite a root/child reference
/// to the current version of a resized container before evacuating it.
///
/// # Safety
/// `obj` must point at a valid `ObjectHeader` whose `newer`-bearing
/// type-specific header immediately follows it, and every `newer` pointer
/// reachable from it must itself satisfy that invariant (the chain is
/// finite per invariant 6).
pub unsafe fn chase_newest(mut obj: *mut ObjectHeader, load_newer: impl Fn(*mut ObjectHeader) -> *mut ObjectHeader) -> *mut ObjectHeader {
    loop {
        let next = load_newer(obj);
        if next.is_null() {
            return obj;
        }
        obj = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chase_newest_stops_at_null() {
        // A two-hop chain: a -> b -> null, modeled with a side table since
        // we have no real headers allocated in this unit test.
        use std::collections::HashMap;
        let a = 1usize as *mut ObjectHeader;
        let b = 2usize as *mut ObjectHeader;
        let mut chain: HashMap<*mut ObjectHeader, *mut ObjectHeader> = HashMap::new();
        chain.insert(a, b);
        let result = unsafe {
            chase_newest(a, |p| *chain.get(&p).unwrap_or(&ptr::null_mut()))
        };
        assert_eq!(result, b);
    }

    #[test]
    fn newer_slot_defaults_to_null() {
        let slot = NewerSlot::new();
        assert!(slot.load().is_null());
    }

    #[test]
    fn acquire_counter_tracks_balance() {
        let counter = AcquireCounter::new();
        counter.acquire();
        counter.acquire();
        assert_eq!(counter.count(), 2);
        counter.release();
        assert_eq!(counter.count(), 1);
    }
}
