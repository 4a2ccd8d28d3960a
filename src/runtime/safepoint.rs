//! Stop-the-world safepoint coordinator (spec §5, multi-threaded mode
//! only). Two VM-wide counters drive the protocol: `in_flight` counts
//! mutator threads that are not currently paused at a safepoint, and `stw`
//! is non-zero while a GC is executing.
//!
//! A mutator thread calls [`SafepointManager::thread_enter`] once on entry
//! to its thread environment and [`SafepointManager::poll`] at every call
//! boundary and the top of every blocking shared-container access. A
//! thread that wants to collect calls [`SafepointManager::acquire_stw`],
//! which blocks until it is the sole winner and every other mutator has
//! reached a safepoint, and releases on drop.
//!
//! In single-threaded builds every one of these is a no-op: there is only
//! one mutator and it never reaches a point where a concurrent collector
//! could be running, so the counters would never actually synchronise
//! anything. This mirrors `forwarding::{NewerSlot, AcquireCounter}`'s
//! single-/multi-threaded dual backend.

#[cfg(not(feature = "multi-threaded"))]
mod backend {
    pub struct SafepointManager;

    impl SafepointManager {
        pub fn new() -> Self {
            Self
        }

        pub fn thread_enter(&self) {}
        pub fn thread_exit(&self) {}
        pub fn poll(&self) {}
        pub fn enter(&self) {}
        pub fn exit(&self) {}

        /// Always false: there is only ever one mutator and it never
        /// shares the heap with a concurrent collector.
        pub fn is_collecting(&self) -> bool {
            false
        }
    }
}

#[cfg(feature = "multi-threaded")]
mod backend {
    use crossbeam_utils::Backoff;
    use std::cell::Cell;
    use std::sync::atomic::{AtomicIsize, AtomicUsize, Ordering};

    thread_local! {
        /// Depth of nested stop-the-world acquisitions on this thread. A GC
        /// triggered while one is already running on the same thread bumps
        /// this instead of re-running the acquisition protocol (spec §5:
        /// "Recursive GC entries on the same thread bump a per-thread
        /// gc_in_progress_counter and do not re-synchronise").
        static GC_DEPTH: Cell<u32> = Cell::new(0);
    }

    pub struct SafepointManager {
        in_flight: AtomicIsize,
        stw: AtomicUsize,
    }

    impl SafepointManager {
        pub fn new() -> Self {
            Self {
                in_flight: AtomicIsize::new(0),
                stw: AtomicUsize::new(0),
            }
        }

        /// Register the calling thread as an active mutator.
        pub fn thread_enter(&self) {
            self.in_flight.fetch_add(1, Ordering::AcqRel);
        }

        /// Deregister the calling thread.
        pub fn thread_exit(&self) {
            self.in_flight.fetch_sub(1, Ordering::AcqRel);
        }

        /// Execute a safepoint: leave in-flight, spin while a GC is
        /// running, rejoin, and re-check in case another GC raced in
        /// underneath. A no-op fast path when no GC is in progress.
        pub fn poll(&self) {
            if self.stw.load(Ordering::Acquire) == 0 {
                return;
            }
            let backoff = Backoff::new();
            loop {
                self.in_flight.fetch_sub(1, Ordering::Release);
                while self.stw.load(Ordering::Acquire) > 0 {
                    backoff.spin();
                }
                self.in_flight.fetch_add(1, Ordering::Acquire);
                if self.stw.load(Ordering::Acquire) == 0 {
                    break;
                }
            }
        }

        /// Acquire stop-the-world on the calling thread: leave in-flight,
        /// then race to be the first to bump `stw` from zero. The winner
        /// waits for every other mutator to leave in-flight and returns;
        /// a loser rolls back, rejoins in-flight, waits for the winning
        /// collector to finish, and retries.
        pub fn enter(&self) {
            let depth = GC_DEPTH.with(|d| {
                let v = d.get();
                d.set(v + 1);
                v
            });
            if depth > 0 {
                return;
            }
            let backoff = Backoff::new();
            loop {
                self.in_flight.fetch_sub(1, Ordering::Release);
                let was_zero = self.stw.fetch_add(1, Ordering::AcqRel) == 0;
                if was_zero {
                    while self.in_flight.load(Ordering::Acquire) != 0 {
                        backoff.spin();
                    }
                    return;
                }
                self.stw.fetch_sub(1, Ordering::AcqRel);
                self.in_flight.fetch_add(1, Ordering::Release);
                while self.stw.load(Ordering::Acquire) > 0 {
                    backoff.spin();
                }
            }
        }

        /// Release stop-the-world acquired by `enter`.
        pub fn exit(&self) {
            let depth = GC_DEPTH.with(|d| {
                let v = d.get() - 1;
                d.set(v);
                v
            });
            if depth > 0 {
                return;
            }
            self.stw.store(0, Ordering::Release);
            self.in_flight.fetch_add(1, Ordering::Release);
        }

        /// Whether a GC currently holds stop-the-world. Exposed for
        /// diagnostics and tests; a mutator should call `poll`, not this,
        /// to actually wait one out.
        pub fn is_collecting(&self) -> bool {
            self.stw.load(Ordering::Relaxed) > 0
        }

        #[cfg(test)]
        pub fn in_flight_count(&self) -> isize {
            self.in_flight.load(Ordering::Relaxed)
        }
    }
}

pub use backend::SafepointManager;

impl Default for SafepointManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SafepointManager {
    /// Lifecycle bookkeeping only, called by `Runtime::start`; the
    /// counters themselves need no setup.
    pub fn start(&self) -> crate::error::Result<()> {
        Ok(())
    }

    /// Lifecycle bookkeeping only, called by `Runtime::stop`.
    pub fn stop(&self) -> crate::error::Result<()> {
        Ok(())
    }

    /// Acquire stop-the-world for the duration of the returned guard,
    /// releasing it on drop. The collection-trigger points in
    /// `gc::GarbageCollector` hold one of these across a young/old/compact
    /// cycle.
    pub fn acquire_stw(&self) -> StwGuard<'_> {
        self.enter();
        StwGuard { manager: self }
    }
}

/// RAII guard releasing stop-the-world on drop, including on an early
/// return via `?` from within the guarded collection cycle.
pub struct StwGuard<'a> {
    manager: &'a SafepointManager,
}

impl Drop for StwGuard<'_> {
    fn drop(&mut self) {
        self.manager.exit();
    }
}

#[cfg(all(test, feature = "multi-threaded"))]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn a_lone_thread_acquires_stw_immediately() {
        let manager = SafepointManager::new();
        manager.thread_enter();
        {
            let _stw = manager.acquire_stw();
            assert!(manager.is_collecting());
            assert_eq!(manager.in_flight_count(), 0);
        }
        assert!(!manager.is_collecting());
        assert_eq!(manager.in_flight_count(), 1);
    }

    #[test]
    fn nested_stw_acquisition_on_the_same_thread_does_not_deadlock() {
        let manager = SafepointManager::new();
        manager.thread_enter();
        let _outer = manager.acquire_stw();
        let _inner = manager.acquire_stw();
        assert!(manager.is_collecting());
        drop(_inner);
        assert!(manager.is_collecting());
        drop(_outer);
        assert!(!manager.is_collecting());
    }

    #[test]
    fn a_polling_mutator_waits_out_a_concurrent_collector() {
        let manager = Arc::new(SafepointManager::new());
        manager.thread_enter();
        let mutator_manager = manager.clone();
        let observed_stw = Arc::new(AtomicBool::new(false));
        let observed_stw_writer = observed_stw.clone();

        let collector = thread::spawn({
            let manager = manager.clone();
            move || {
                let _stw = manager.acquire_stw();
                thread::sleep(Duration::from_millis(20));
            }
        });

        // Give the collector a head start so it wins the race to acquire
        // stw before the mutator registers and polls.
        thread::sleep(Duration::from_millis(5));
        mutator_manager.thread_enter();
        if mutator_manager.is_collecting() {
            observed_stw_writer.store(true, Ordering::Relaxed);
        }
        mutator_manager.poll();
        mutator_manager.thread_exit();

        collector.join().unwrap();
        assert!(observed_stw.load(Ordering::Relaxed));
        assert!(!manager.is_collecting());
    }
}
