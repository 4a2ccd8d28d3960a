//! Error types surfaced by the memory manager.
//!
//! Fallible entry points in `api` return `Result<T, GcError>`. The VM layer
//! is expected to translate `GcError` into its own error buffer (message,
//! file, line) via `Env::set_error` — see `runtime::frame::Env`.

use thiserror::Error;

/// Errors the memory manager can raise.
///
/// Variants map directly onto the `Kind` table in the external interface
/// section: `OutOfMemory`, `OutOfRange`, `KeyNotFound`, `PinOverflow`. The
/// remaining variants are internal/programming errors — invariant
/// violations that are bugs in the collector or its caller, never in
/// ordinary mutator behavior.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GcError {
    /// Allocation failed after the full retry schedule for its region.
    #[error("out of memory: requested {requested} bytes in {region}")]
    OutOfMemory {
        requested: usize,
        region: &'static str,
    },

    /// Array or dict index outside `[0, size)`.
    #[error("index {index} out of range (size {size})")]
    OutOfRange { index: u32, size: u32 },

    /// Dict lookup, removal, or global-table lookup on an absent key.
    #[error("key not found")]
    KeyNotFound,

    /// A pin operation exceeded its compile-time maximum.
    #[error("too many pinned variables (limit {limit})")]
    PinOverflow { limit: usize },

    /// A configuration value failed validation.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// An internal invariant was violated (e.g. an unknown object kind
    /// encountered during a sweep). These are programming errors; see
    /// [`GcError::is_bug`].
    #[error("internal error: {0}")]
    Internal(String),

    /// An operation was attempted while the collector was in a state that
    /// does not permit it (e.g. mutator access during a stop-the-world
    /// pause on a thread that never reached its safepoint).
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A structural check over heap metadata failed — free-list header
    /// corruption, a live-list cycle, or similar.
    #[error("corrupted heap: {0}")]
    CorruptedHeap(String),
}

impl GcError {
    /// True for conditions the caller can reasonably recover from by
    /// unwinding to the interpreter's error handler (out-of-memory,
    /// out-of-range, key-not-found, pin overflow, bad configuration).
    ///
    /// False for conditions that indicate a bug in the collector itself.
    pub fn is_recoverable(&self) -> bool {
        !self.is_bug()
    }

    /// True when this variant represents an internal invariant violation
    /// rather than ordinary mutator misuse. Callers may choose to
    /// `debug_assert!(false)` or abort in debug builds when this is true,
    /// matching the error-handling design's "programming errors ... may
    /// abort the process in debug builds".
    pub fn is_bug(&self) -> bool {
        matches!(self, GcError::Internal(_) | GcError::CorruptedHeap(_))
    }

    pub(crate) fn oom(requested: usize, region: &'static str) -> Self {
        GcError::OutOfMemory { requested, region }
    }

    pub(crate) fn out_of_range(index: u32, size: u32) -> Self {
        GcError::OutOfRange { index, size }
    }
}

/// Errors specific to validating a [`crate::config::GcConfig`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("nursery_size must be nonzero and pointer-aligned, got {0}")]
    InvalidNurserySize(usize),

    #[error("graduate_size must be nonzero and pointer-aligned, got {0}")]
    InvalidGraduateSize(usize),

    #[error("tenure_size must be at least {min}, got {got}")]
    InvalidTenureSize { min: usize, got: usize },

    #[error("lop_threshold ({lop}) must not exceed tenure_size ({tenure})")]
    InvalidLopThreshold { lop: usize, tenure: usize },

    #[error("promotion_threshold must be between 1 and 15, got {0}")]
    InvalidPromotionThreshold(u8),

    #[error("pin table capacity must be nonzero, got {0}")]
    InvalidPinCapacity(usize),
}

impl From<ConfigError> for GcError {
    fn from(e: ConfigError) -> Self {
        GcError::Configuration(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GcError>;

/// `ensure!(cond, err)` returns `Err(err)` from the enclosing function when
/// `cond` is false. Mirrors the teacher's `ensure!`/`bail!` helpers.
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !($cond) {
            return Err($err);
        }
    };
}

macro_rules! bail {
    ($err:expr) => {
        return Err($err)
    };
}

pub(crate) use bail;
pub(crate) use ensure;
