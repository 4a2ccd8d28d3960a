//! Structured logging for GC cycles.
//!
//! A leveled event log, useful for performance analysis, debugging, and
//! production monitoring. Events are pushed to a global logger
//! (`lazy_static`, mirroring the teacher's singleton) and can be drained
//! for inspection or emitted as human-readable or JSON lines.
//!
//! Log levels, from least to most verbose: ERROR, WARN, INFO, DEBUG, TRACE.

use lazy_static::lazy_static;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

/// One emitted event. Variants name the phases of this collector
/// (nursery/graduate young GC, tenure old GC, slide compaction) rather
/// than a generic "cycle start/end" pair, so a log reader can tell which
/// tier ran without cross-referencing a separate field.
#[derive(Debug, Clone)]
pub enum GcEvent {
    YoungGcStart { cycle: u64, reason: &'static str },
    YoungGcEnd { cycle: u64, duration_us: f64, promoted: usize },
    OldGcStart { cycle: u64 },
    SweepStats { cycle: u64, freed_objects: usize, freed_bytes: usize },
    CompactGcStart { cycle: u64 },
    CompactStats { cycle: u64, objects_moved: usize, duration_us: f64 },
    PromotionStats { cycle: u64, promoted_objects: usize, promoted_bytes: usize },
    BarrierFired { kind: &'static str },
    AllocationFailure { region: &'static str, requested: usize },
    RememberedSetSize { cycle: u64, size: usize },
}

impl GcEvent {
    fn level(&self) -> LogLevel {
        match self {
            GcEvent::AllocationFailure { .. } => LogLevel::Warn,
            GcEvent::YoungGcStart { .. }
            | GcEvent::OldGcStart { .. }
            | GcEvent::CompactGcStart { .. }
            | GcEvent::YoungGcEnd { .. }
            | GcEvent::SweepStats { .. }
            | GcEvent::CompactStats { .. }
            | GcEvent::PromotionStats { .. } => LogLevel::Info,
            GcEvent::BarrierFired { .. } | GcEvent::RememberedSetSize { .. } => LogLevel::Debug,
        }
    }

    fn human(&self) -> String {
        match self {
            GcEvent::YoungGcStart { cycle, reason } => {
                format!("young gc #{cycle} start (reason: {reason})")
            }
            GcEvent::YoungGcEnd { cycle, duration_us, promoted } => {
                format!("young gc #{cycle} done in {duration_us:.1}us, {promoted} promoted")
            }
            GcEvent::OldGcStart { cycle } => format!("old gc #{cycle} start"),
            GcEvent::SweepStats { cycle, freed_objects, freed_bytes } => format!(
                "old gc #{cycle} swept {freed_objects} objects, {freed_bytes} bytes reclaimed"
            ),
            GcEvent::CompactGcStart { cycle } => format!("compact gc #{cycle} start"),
            GcEvent::CompactStats { cycle, objects_moved, duration_us } => format!(
                "compact gc #{cycle} moved {objects_moved} objects in {duration_us:.1}us"
            ),
            GcEvent::PromotionStats { cycle, promoted_objects, promoted_bytes } => format!(
                "gc #{cycle} promoted {promoted_objects} objects ({promoted_bytes} bytes) to tenure"
            ),
            GcEvent::BarrierFired { kind } => format!("{kind} barrier fired"),
            GcEvent::AllocationFailure { region, requested } => {
                format!("allocation of {requested} bytes failed in {region}")
            }
            GcEvent::RememberedSetSize { cycle, size } => {
                format!("gc #{cycle} remembered set size = {size}")
            }
        }
    }

    fn json(&self) -> serde_json::Value {
        match self {
            GcEvent::YoungGcStart { cycle, reason } => {
                json!({"event": "young_gc_start", "cycle": cycle, "reason": reason})
            }
            GcEvent::YoungGcEnd { cycle, duration_us, promoted } => {
                json!({"event": "young_gc_end", "cycle": cycle, "duration_us": duration_us, "promoted": promoted})
            }
            GcEvent::OldGcStart { cycle } => json!({"event": "old_gc_start", "cycle": cycle}),
            GcEvent::SweepStats { cycle, freed_objects, freed_bytes } => {
                json!({"event": "sweep_stats", "cycle": cycle, "freed_objects": freed_objects, "freed_bytes": freed_bytes})
            }
            GcEvent::CompactGcStart { cycle } => json!({"event": "compact_gc_start", "cycle": cycle}),
            GcEvent::CompactStats { cycle, objects_moved, duration_us } => {
                json!({"event": "compact_stats", "cycle": cycle, "objects_moved": objects_moved, "duration_us": duration_us})
            }
            GcEvent::PromotionStats { cycle, promoted_objects, promoted_bytes } => {
                json!({"event": "promotion_stats", "cycle": cycle, "promoted_objects": promoted_objects, "promoted_bytes": promoted_bytes})
            }
            GcEvent::BarrierFired { kind } => json!({"event": "barrier_fired", "kind": kind}),
            GcEvent::AllocationFailure { region, requested } => {
                json!({"event": "allocation_failure", "region": region, "requested": requested})
            }
            GcEvent::RememberedSetSize { cycle, size } => {
                json!({"event": "remembered_set_size", "cycle": cycle, "size": size})
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct GcLoggerConfig {
    pub level: LogLevel,
    pub console: bool,
    pub json: bool,
    pub retain_history: bool,
}

impl Default for GcLoggerConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            console: false,
            json: false,
            retain_history: true,
        }
    }
}

pub struct GcLogger {
    config: GcLoggerConfig,
    events: Mutex<Vec<(Instant, GcEvent)>>,
    enabled: AtomicBool,
}

impl GcLogger {
    pub fn new(config: GcLoggerConfig) -> Self {
        Self {
            config,
            events: Mutex::new(Vec::new()),
            enabled: AtomicBool::new(true),
        }
    }

    pub fn log(&self, event: GcEvent) {
        if !self.enabled.load(Ordering::Relaxed) || event.level() > self.config.level {
            return;
        }

        if self.config.console {
            if self.config.json {
                eprintln!("{}", event.json());
            } else {
                eprintln!("[{:?}] {}", event.level(), event.human());
            }
        }

        if self.config.retain_history {
            self.events.lock().unwrap().push((Instant::now(), event));
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn get_events(&self) -> Vec<GcEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|(_, e)| e.clone())
            .collect()
    }

    pub fn clear_events(&self) {
        self.events.lock().unwrap().clear();
    }

    pub fn event_count(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}

lazy_static! {
    static ref GLOBAL_LOGGER: Mutex<GcLogger> = Mutex::new(GcLogger::new(GcLoggerConfig::default()));
}

/// Emit an event through the process-wide logger.
pub fn log_event(event: GcEvent) {
    GLOBAL_LOGGER.lock().unwrap().log(event);
}

/// Replace the global logger's configuration.
pub fn configure_logger(config: GcLoggerConfig) {
    *GLOBAL_LOGGER.lock().unwrap() = GcLogger::new(config);
}

pub fn get_event_count() -> usize {
    GLOBAL_LOGGER.lock().unwrap().event_count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_event_recorded_at_default_level() {
        let logger = GcLogger::new(GcLoggerConfig::default());
        logger.log(GcEvent::YoungGcStart { cycle: 1, reason: "nursery_full" });
        assert_eq!(logger.event_count(), 1);
    }

    #[test]
    fn trace_level_event_filtered_by_default() {
        let logger = GcLogger::new(GcLoggerConfig::default());
        logger.log(GcEvent::BarrierFired { kind: "array" }); // Debug > Info
        assert_eq!(logger.event_count(), 0);
    }

    #[test]
    fn disabled_logger_drops_everything() {
        let logger = GcLogger::new(GcLoggerConfig::default());
        logger.set_enabled(false);
        logger.log(GcEvent::OldGcStart { cycle: 1 });
        assert_eq!(logger.event_count(), 0);
    }

    #[test]
    fn clear_events_empties_history() {
        let logger = GcLogger::new(GcLoggerConfig::default());
        logger.log(GcEvent::OldGcStart { cycle: 1 });
        logger.clear_events();
        assert_eq!(logger.event_count(), 0);
    }
}
