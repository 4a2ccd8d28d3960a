//! Configuration knobs recognized by the memory manager.
//!
//! `GcConfig` is validated once at VM creation (`GcConfig::validate`) and
//! then treated as immutable for the lifetime of the heap. Values can also
//! be seeded from the environment via `GcConfig::from_env`, following the
//! teacher's `FGC_*` convention (here `VMGC_*`).

use crate::error::ConfigError;
use std::mem::size_of;

pub const KB: usize = 1024;
pub const MB: usize = 1024 * KB;

/// Word size used for alignment throughout the allocators.
pub const WORD_SIZE: usize = size_of::<usize>();

/// Configuration record described in the external interfaces section:
/// `nursery_size`, `graduate_size`, `tenure_size`, `lop_threshold`,
/// `promotion_threshold`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GcConfig {
    /// Bytes of the nursery arena. Default ~2 MiB.
    pub nursery_size: usize,

    /// Bytes of each graduate semi-space (there are two). Default ~256 KiB.
    pub graduate_size: usize,

    /// Bytes of the tenure free-list region. Default ~256 MiB, ~64 MiB on
    /// constrained targets (selected by `GcConfig::constrained()`).
    pub tenure_size: usize,

    /// Object size at or above which an allocation routes directly to
    /// tenure instead of the nursery. Default ~32 KiB.
    pub lop_threshold: usize,

    /// Number of young GCs a survivor tolerates before it is promoted to
    /// tenure instead of copied again within the graduate tier. Default 2.
    pub promotion_threshold: u8,

    /// Maximum number of pinned globals. FFI pin operations beyond this
    /// raise `GcError::PinOverflow`.
    pub max_pinned_globals: usize,

    /// Maximum number of pinned locals per call frame.
    pub max_pinned_locals: usize,

    /// Maximum number of temporary slots per call frame scanned as roots.
    pub max_frame_temporaries: usize,

    /// Emit one `GcEvent` log line per completed phase (young GC, old GC,
    /// compaction) in addition to the per-cycle summary.
    pub verbose: bool,

    /// Retain cycle statistics (`stats::GcStats`) across the heap's
    /// lifetime. Disabling this saves the small bookkeeping cost on
    /// allocation-heavy workloads that never call `diagnostics()`.
    pub stats_enabled: bool,
}

impl Default for GcConfig {
    fn default() -> Self {
        Self {
            nursery_size: 2 * MB,
            graduate_size: 256 * KB,
            tenure_size: 256 * MB,
            lop_threshold: 32 * KB,
            promotion_threshold: 2,
            max_pinned_globals: 1024,
            max_pinned_locals: 256,
            max_frame_temporaries: 256,
            verbose: false,
            stats_enabled: true,
        }
    }
}

impl GcConfig {
    /// A configuration sized for constrained targets (embedded, mobile):
    /// a 64 MiB tenure region instead of 256 MiB, everything else default.
    pub fn constrained() -> Self {
        Self {
            tenure_size: 64 * MB,
            ..Self::default()
        }
    }

    /// Validate the configuration, returning the first violated
    /// constraint. Mirrors `fgc::config::GcConfig::validate`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nursery_size == 0 || self.nursery_size % WORD_SIZE != 0 {
            return Err(ConfigError::InvalidNurserySize(self.nursery_size));
        }
        if self.graduate_size == 0 || self.graduate_size % WORD_SIZE != 0 {
            return Err(ConfigError::InvalidGraduateSize(self.graduate_size));
        }
        const MIN_TENURE: usize = 64 * KB;
        if self.tenure_size < MIN_TENURE {
            return Err(ConfigError::InvalidTenureSize {
                min: MIN_TENURE,
                got: self.tenure_size,
            });
        }
        if self.lop_threshold > self.tenure_size {
            return Err(ConfigError::InvalidLopThreshold {
                lop: self.lop_threshold,
                tenure: self.tenure_size,
            });
        }
        if self.promotion_threshold == 0 || self.promotion_threshold > 15 {
            return Err(ConfigError::InvalidPromotionThreshold(
                self.promotion_threshold,
            ));
        }
        if self.max_pinned_globals == 0 {
            return Err(ConfigError::InvalidPinCapacity(self.max_pinned_globals));
        }
        if self.max_pinned_locals == 0 {
            return Err(ConfigError::InvalidPinCapacity(self.max_pinned_locals));
        }
        Ok(())
    }

    /// Build a configuration from `VMGC_*` environment variables, falling
    /// back to `Default` for anything unset or unparsable. Recognized:
    /// `VMGC_NURSERY_SIZE`, `VMGC_GRADUATE_SIZE`, `VMGC_TENURE_SIZE`,
    /// `VMGC_LOP_THRESHOLD`, `VMGC_PROMOTION_THRESHOLD`, `VMGC_VERBOSE`.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("VMGC_NURSERY_SIZE") {
            if let Ok(n) = v.parse() {
                cfg.nursery_size = n;
            }
        }
        if let Ok(v) = std::env::var("VMGC_GRADUATE_SIZE") {
            if let Ok(n) = v.parse() {
                cfg.graduate_size = n;
            }
        }
        if let Ok(v) = std::env::var("VMGC_TENURE_SIZE") {
            if let Ok(n) = v.parse() {
                cfg.tenure_size = n;
            }
        }
        if let Ok(v) = std::env::var("VMGC_LOP_THRESHOLD") {
            if let Ok(n) = v.parse() {
                cfg.lop_threshold = n;
            }
        }
        if let Ok(v) = std::env::var("VMGC_PROMOTION_THRESHOLD") {
            if let Ok(n) = v.parse() {
                cfg.promotion_threshold = n;
            }
        }
        if let Ok(v) = std::env::var("VMGC_VERBOSE") {
            cfg.verbose = v == "1" || v.eq_ignore_ascii_case("true");
        }

        cfg
    }

    /// Rough worst-case heap footprint: nursery + both graduate semi-spaces
    /// + tenure. Useful for embedders sizing a process memory budget.
    pub fn estimated_footprint(&self) -> usize {
        self.nursery_size + 2 * self.graduate_size + self.tenure_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(GcConfig::default().validate().is_ok());
    }

    #[test]
    fn constrained_config_validates() {
        assert!(GcConfig::constrained().validate().is_ok());
    }

    #[test]
    fn rejects_zero_promotion_threshold() {
        let mut cfg = GcConfig::default();
        cfg.promotion_threshold = 0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidPromotionThreshold(0))
        ));
    }

    #[test]
    fn rejects_lop_threshold_above_tenure() {
        let mut cfg = GcConfig::default();
        cfg.lop_threshold = cfg.tenure_size + 1;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidLopThreshold { .. })
        ));
    }

    #[test]
    fn rejects_misaligned_nursery() {
        let mut cfg = GcConfig::default();
        cfg.nursery_size = 3;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidNurserySize(3))
        ));
    }

    #[test]
    fn footprint_sums_all_regions() {
        let cfg = GcConfig::default();
        assert_eq!(
            cfg.estimated_footprint(),
            cfg.nursery_size + 2 * cfg.graduate_size + cfg.tenure_size
        );
    }
}
