//! Garbage collection: allocation dispatch (spec §4.3) and the three
//! collection tiers it falls back through.
//!
//! - [`young`]: copying evacuation out of the nursery and graduate
//!   "from" space (§4.4). Triggered by a failed nursery bump-allocation;
//!   never triggers itself.
//! - [`old`]: mark-sweep over tenure (§4.5). Triggered by a failed
//!   direct-to-tenure (large-object) allocation.
//! - [`compact`]: slide compaction over tenure (§4.6). Triggered when a
//!   post-old-gc tenure allocation still fails — fragmentation, not
//!   exhaustion.
//!
//! Each of the three `run_*_gc` entry points acquires stop-the-world for
//! its duration via `GarbageCollector::safepoint` (spec §5); in
//! single-threaded builds this is a no-op handshake.

pub mod compact;
pub mod old;
pub mod young;

use crate::config::GcConfig;
use crate::error::Result;
use crate::heap::Heap;
use crate::logging::{self, GcEvent};
use crate::object::{ArrayObj, DictObj, ObjectHeader, RegionTag, StringObj};
use crate::roots::RootSources;
use crate::runtime::safepoint::SafepointManager;
use crate::stats::GcStats;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Which collection tier ran — the axis `GcStats::record_cycle` and the
/// logged `GcEvent`s are broken down by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GcKind {
    Young,
    Old,
    Compact,
}

/// Owns the heap and the allocation/collection machinery built on top of
/// it. Does not own roots — every entry point that might need to run a
/// collection takes a `RootSources` borrowed from the embedder for the
/// duration of the call, matching the "GC has no roots of its own" shape
/// the rest of this module follows.
pub struct GarbageCollector {
    heap: Heap,
    config: Arc<GcConfig>,
    stats: GcStats,
    cycle: AtomicU64,
    safepoint: SafepointManager,
}

impl GarbageCollector {
    pub fn new(config: GcConfig) -> Result<Self> {
        config.validate()?;
        let config = Arc::new(config);
        let heap = Heap::new(config.clone())?;
        Ok(Self {
            heap,
            config,
            stats: GcStats::new(),
            cycle: AtomicU64::new(0),
            safepoint: SafepointManager::new(),
        })
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn config(&self) -> &GcConfig {
        &self.config
    }

    pub fn stats(&self) -> &GcStats {
        &self.stats
    }

    /// The stop-the-world coordinator (spec §5). A no-op handshake in
    /// single-threaded builds; see `runtime::safepoint`.
    pub fn safepoint(&self) -> &SafepointManager {
        &self.safepoint
    }

    pub fn alloc_string(&self, roots: &mut RootSources, bytes: &[u8]) -> Result<*mut StringObj> {
        let total = StringObj::total_size(bytes.len());
        let (ptr, region) = self.alloc_raw(roots, total)?;
        unsafe {
            let sp = ptr as *mut StringObj;
            StringObj::init(sp, region, bytes);
            self.heap.link_new(sp as *mut ObjectHeader);
            Ok(sp)
        }
    }

    pub fn alloc_array(&self, roots: &mut RootSources, capacity: u32) -> Result<*mut ArrayObj> {
        let total = ArrayObj::total_size(capacity);
        let (ptr, region) = self.alloc_raw(roots, total)?;
        unsafe {
            let ap = ptr as *mut ArrayObj;
            ArrayObj::init(ap, region, capacity);
            self.heap.link_new(ap as *mut ObjectHeader);
            Ok(ap)
        }
    }

    pub fn alloc_dict(&self, roots: &mut RootSources, capacity: u32) -> Result<*mut DictObj> {
        let total = DictObj::total_size(capacity);
        let (ptr, region) = self.alloc_raw(roots, total)?;
        unsafe {
            let dp = ptr as *mut DictObj;
            DictObj::init(dp, region, capacity);
            self.heap.link_new(dp as *mut ObjectHeader);
            Ok(dp)
        }
    }

    /// Allocation dispatch (§4.3). Requests at or above `lop_threshold`
    /// route straight to tenure with the `[old gc, compact gc, fail]`
    /// retry schedule; everything else bump-allocates in the nursery,
    /// retrying once after a young GC. A young GC never runs another young
    /// GC — graduate allocation failures inside it fall back to a plain
    /// tenure copy instead (see `gc::young`), not back into this schedule.
    fn alloc_raw(&self, roots: &mut RootSources, total: usize) -> Result<(*mut u8, RegionTag)> {
        if total >= self.config.lop_threshold {
            if let Ok(p) = self.heap.tenure.alloc(total) {
                return Ok((p, RegionTag::Tenure));
            }
            logging::log_event(GcEvent::AllocationFailure {
                region: "tenure",
                requested: total,
            });
            self.run_old_gc(roots)?;
            if let Ok(p) = self.heap.tenure.alloc(total) {
                return Ok((p, RegionTag::Tenure));
            }
            self.run_compact_gc(roots)?;
            self.heap.tenure.alloc(total).map(|p| (p, RegionTag::Tenure))
        } else {
            if let Ok(p) = self.heap.nursery.alloc(total) {
                return Ok((p, RegionTag::Nursery));
            }
            logging::log_event(GcEvent::AllocationFailure {
                region: "nursery",
                requested: total,
            });
            self.run_young_gc(roots)?;
            self.heap.nursery.alloc(total).map(|p| (p, RegionTag::Nursery))
        }
    }

    fn next_cycle(&self) -> u64 {
        self.cycle.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn run_young_gc(&self, roots: &mut RootSources) -> Result<young::Outcome> {
        let _stw = self.safepoint.acquire_stw();
        let cycle = self.next_cycle();
        logging::log_event(GcEvent::YoungGcStart {
            cycle,
            reason: "nursery_full",
        });
        let start = Instant::now();
        let outcome = young::run(&self.heap, &self.config, roots)?;
        let duration = start.elapsed();

        if self.config.stats_enabled {
            self.stats.record_cycle(GcKind::Young, duration);
            self.stats
                .record_promotion(outcome.promoted_objects, outcome.promoted_bytes);
        }
        logging::log_event(GcEvent::YoungGcEnd {
            cycle,
            duration_us: duration.as_secs_f64() * 1_000_000.0,
            promoted: outcome.promoted_objects as usize,
        });
        if self.config.verbose {
            logging::log_event(GcEvent::PromotionStats {
                cycle,
                promoted_objects: outcome.promoted_objects as usize,
                promoted_bytes: outcome.promoted_bytes as usize,
            });
            let rem_size = unsafe { self.heap.remembered_set.iter().count() };
            logging::log_event(GcEvent::RememberedSetSize {
                cycle,
                size: rem_size,
            });
        }
        Ok(outcome)
    }

    pub fn run_old_gc(&self, roots: &RootSources) -> Result<old::Outcome> {
        let _stw = self.safepoint.acquire_stw();
        let cycle = self.next_cycle();
        logging::log_event(GcEvent::OldGcStart { cycle });
        let start = Instant::now();
        let outcome = old::run(&self.heap, roots)?;
        let duration = start.elapsed();

        if self.config.stats_enabled {
            self.stats.record_cycle(GcKind::Old, duration);
            self.stats
                .record_sweep(outcome.freed_objects, outcome.freed_bytes);
        }
        logging::log_event(GcEvent::SweepStats {
            cycle,
            freed_objects: outcome.freed_objects as usize,
            freed_bytes: outcome.freed_bytes as usize,
        });
        Ok(outcome)
    }

    pub fn run_compact_gc(&self, roots: &mut RootSources) -> Result<compact::Outcome> {
        let _stw = self.safepoint.acquire_stw();
        let cycle = self.next_cycle();
        logging::log_event(GcEvent::CompactGcStart { cycle });
        let start = Instant::now();
        let outcome = compact::run(&self.heap, roots)?;
        let duration = start.elapsed();

        if self.config.stats_enabled {
            self.stats.record_cycle(GcKind::Compact, duration);
        }
        logging::log_event(GcEvent::CompactStats {
            cycle,
            objects_moved: outcome.objects_moved as usize,
            duration_us: duration.as_secs_f64() * 1_000_000.0,
        });
        Ok(outcome)
    }
}
