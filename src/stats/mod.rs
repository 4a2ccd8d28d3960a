//! GC performance monitoring: pause times, cycle counts, memory usage.
//!
//! `GcStats` is the central repository the collector records into after
//! every cycle; `GarbageCollector::diagnostics()` reads it to build the
//! embedder-facing snapshot.

pub mod histogram;
pub mod metrics;
pub mod timer;

pub use histogram::Histogram;
pub use metrics::GcMetrics;
pub use timer::GcTimer;

use crate::gc::GcKind;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub struct GcStats {
    young_cycles: AtomicU64,
    old_cycles: AtomicU64,
    compact_cycles: AtomicU64,
    promoted_objects: AtomicU64,
    promoted_bytes: AtomicU64,
    swept_objects: AtomicU64,
    swept_bytes: AtomicU64,
    pause_times: Arc<Histogram>,
    heap_used: AtomicUsize,
    start_time: std::time::Instant,
}

impl GcStats {
    pub fn new() -> Self {
        Self {
            young_cycles: AtomicU64::new(0),
            old_cycles: AtomicU64::new(0),
            compact_cycles: AtomicU64::new(0),
            promoted_objects: AtomicU64::new(0),
            promoted_bytes: AtomicU64::new(0),
            swept_objects: AtomicU64::new(0),
            swept_bytes: AtomicU64::new(0),
            pause_times: Arc::new(Histogram::new()),
            heap_used: AtomicUsize::new(0),
            start_time: std::time::Instant::now(),
        }
    }

    pub fn pause_times(&self) -> Arc<Histogram> {
        self.pause_times.clone()
    }

    pub fn record_cycle(&self, kind: GcKind, duration: Duration) {
        match kind {
            GcKind::Young => self.young_cycles.fetch_add(1, Ordering::Relaxed),
            GcKind::Old => self.old_cycles.fetch_add(1, Ordering::Relaxed),
            GcKind::Compact => self.compact_cycles.fetch_add(1, Ordering::Relaxed),
        };
        self.pause_times.record(duration.as_nanos() as u64);
    }

    pub fn record_promotion(&self, objects: u64, bytes: u64) {
        self.promoted_objects.fetch_add(objects, Ordering::Relaxed);
        self.promoted_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_sweep(&self, objects: u64, bytes: u64) {
        self.swept_objects.fetch_add(objects, Ordering::Relaxed);
        self.swept_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_heap_used(&self, bytes: usize) {
        self.heap_used.store(bytes, Ordering::Relaxed);
    }

    pub fn total_cycles(&self) -> u64 {
        self.young_cycles.load(Ordering::Relaxed)
            + self.old_cycles.load(Ordering::Relaxed)
            + self.compact_cycles.load(Ordering::Relaxed)
    }

    pub fn summary(&self) -> GcSummary {
        GcSummary {
            young_cycles: self.young_cycles.load(Ordering::Relaxed),
            old_cycles: self.old_cycles.load(Ordering::Relaxed),
            compact_cycles: self.compact_cycles.load(Ordering::Relaxed),
            promoted_objects: self.promoted_objects.load(Ordering::Relaxed),
            promoted_bytes: self.promoted_bytes.load(Ordering::Relaxed),
            swept_objects: self.swept_objects.load(Ordering::Relaxed),
            swept_bytes: self.swept_bytes.load(Ordering::Relaxed),
            avg_pause_ms: self.pause_times.mean() as f64 / 1_000_000.0,
            max_pause_ms: self.pause_times.max() as f64 / 1_000_000.0,
            p99_pause_ms: self.pause_times.p99() as f64 / 1_000_000.0,
            heap_used_bytes: self.heap_used.load(Ordering::Relaxed),
            uptime_secs: self.start_time.elapsed().as_secs(),
        }
    }

    pub fn reset(&self) {
        self.young_cycles.store(0, Ordering::Relaxed);
        self.old_cycles.store(0, Ordering::Relaxed);
        self.compact_cycles.store(0, Ordering::Relaxed);
        self.promoted_objects.store(0, Ordering::Relaxed);
        self.promoted_bytes.store(0, Ordering::Relaxed);
        self.swept_objects.store(0, Ordering::Relaxed);
        self.swept_bytes.store(0, Ordering::Relaxed);
        self.pause_times.clear();
    }
}

impl Default for GcStats {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default, Clone)]
pub struct GcSummary {
    pub young_cycles: u64,
    pub old_cycles: u64,
    pub compact_cycles: u64,
    pub promoted_objects: u64,
    pub promoted_bytes: u64,
    pub swept_objects: u64,
    pub swept_bytes: u64,
    pub avg_pause_ms: f64,
    pub max_pause_ms: f64,
    pub p99_pause_ms: f64,
    pub heap_used_bytes: usize,
    pub uptime_secs: u64,
}
