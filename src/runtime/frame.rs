//! Call frames and the per-thread execution environment (spec §4.9, §6,
//! §7).
//!
//! A `Frame` is pushed per bytecode call and holds the two root sources
//! root enumeration walks per-frame: the temporary value stack and any
//! locals the frame has pinned for FFI. `Env` is the per-thread handle an
//! embedder holds: the call-frame stack plus the error buffer every
//! fallible entry point writes into instead of raising ("errors are
//! reported, not thrown" — spec §7).

use crate::error::GcError;
use crate::runtime::pin::PinTable;
use crate::value::Value;

/// One call frame's root-bearing state.
pub struct Frame {
    /// Value stack used for bytecode temporaries. `len()` is the frame's
    /// `tmpvar_size`; growth is bounded by `max_temporaries`.
    temporaries: Vec<Value>,
    max_temporaries: usize,
    local_pins: PinTable,
}

impl Frame {
    pub fn new(max_temporaries: usize, max_local_pins: usize) -> Self {
        Self {
            temporaries: Vec::new(),
            max_temporaries,
            local_pins: PinTable::new(max_local_pins),
        }
    }

    pub fn push_temporary(&mut self, val: Value) -> Result<(), GcError> {
        if self.temporaries.len() >= self.max_temporaries {
            return Err(GcError::OutOfRange {
                index: self.max_temporaries as u32,
                size: self.max_temporaries as u32,
            });
        }
        self.temporaries.push(val);
        Ok(())
    }

    pub fn pop_temporary(&mut self) -> Option<Value> {
        self.temporaries.pop()
    }

    pub fn set_temporary(&mut self, slot: usize, val: Value) -> Result<(), GcError> {
        self.temporaries
            .get_mut(slot)
            .map(|s| *s = val)
            .ok_or(GcError::OutOfRange {
                index: slot as u32,
                size: self.temporaries.len() as u32,
            })
    }

    pub fn tmpvar_size(&self) -> usize {
        self.temporaries.len()
    }

    pub fn pin_local(&mut self, val: Value) -> Result<usize, GcError> {
        self.local_pins.pin(val)
    }

    pub fn unpin_local(&mut self) {
        self.local_pins.unpin();
    }

    pub fn pinned_count(&self) -> usize {
        self.local_pins.len()
    }

    /// Root enumeration source: temporaries first, then pinned locals
    /// (spec §4.9 steps 2/3).
    pub fn roots(&self) -> impl Iterator<Item = Value> + '_ {
        self.temporaries.iter().copied().chain(self.local_pins.roots())
    }

    pub fn rewrite(&mut self, mut f: impl FnMut(Value) -> Value) {
        for slot in self.temporaries.iter_mut() {
            *slot = f(*slot);
        }
        self.local_pins.rewrite(f);
    }
}

/// The error buffer every fallible entry point writes on failure instead
/// of raising (spec §7, §6 `get_error_message`/`get_error_file`/
/// `get_error_line`).
#[derive(Debug, Clone, Default)]
pub struct ErrorInfo {
    pub message: String,
    pub file: String,
    pub line: i32,
}

/// Per-thread execution state: the call-frame stack and the error buffer.
/// Owns nothing GC-managed directly — frames and pins hold `Value`s, whose
/// heap references stay valid only as long as the `Heap` they came from.
pub struct Env {
    frames: Vec<Frame>,
    error: ErrorInfo,
    max_temporaries: usize,
    max_local_pins: usize,
}

impl Env {
    pub fn new(max_temporaries: usize, max_local_pins: usize) -> Self {
        Self {
            frames: Vec::new(),
            error: ErrorInfo::default(),
            max_temporaries,
            max_local_pins,
        }
    }

    pub fn push_frame(&mut self) {
        self.frames
            .push(Frame::new(self.max_temporaries, self.max_local_pins));
    }

    pub fn pop_frame(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    pub fn current_frame(&mut self) -> Option<&mut Frame> {
        self.frames.last_mut()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frames_mut(&mut self) -> &mut [Frame] {
        &mut self.frames
    }

    /// Record a `GcError` into the error buffer at `file:line`, mirroring
    /// the "report, don't throw" convention (spec §7).
    pub fn set_error(&mut self, err: &GcError, file: &str, line: i32) {
        self.error = ErrorInfo {
            message: err.to_string(),
            file: file.to_string(),
            line,
        };
    }

    pub fn clear_error(&mut self) {
        self.error = ErrorInfo::default();
    }

    pub fn get_error_message(&self) -> &str {
        &self.error.message
    }

    pub fn get_error_file(&self) -> &str {
        &self.error.file
    }

    pub fn get_error_line(&self) -> i32 {
        self.error.line
    }
}
