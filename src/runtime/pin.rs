//! FFI pinning (spec §6: `pin_global`/`unpin_global`/`pin_local`/
//! `unpin_local`).
//!
//! Embedders pin a value before handing its address to native code that
//! outlives the current bytecode instruction, so a GC running in between
//! can't collect or move it without the pin site finding out. Pins are
//! taken and released in strict LIFO order around the native call that
//! needs them — the same discipline the spec's wording ("pinned ... up to
//! pinned_count") implies: root enumeration only ever needs to walk a
//! contiguous prefix, not a sparse set of live handles. A plain `Vec`
//! acting as a stack captures that directly, bounded by a compile-time
//! maximum (`max_pinned_globals`/`max_pinned_locals`); pinning past it is
//! `GcError::PinOverflow`, not a panic.
//!
//! One `PinTable` implementation serves both the VM-wide global pin table
//! and each call frame's local pin table — `spec` never distinguishes them
//! beyond scope.

use crate::error::{GcError, Result};
use crate::value::Value;

pub struct PinTable {
    slots: Vec<Value>,
    capacity: usize,
}

impl PinTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::new(),
            capacity,
        }
    }

    /// Pin `val`, returning a handle (its slot index) for `unpin`/`get`.
    pub fn pin(&mut self, val: Value) -> Result<usize> {
        if self.slots.len() >= self.capacity {
            return Err(GcError::PinOverflow {
                limit: self.capacity,
            });
        }
        self.slots.push(val);
        Ok(self.slots.len() - 1)
    }

    /// Release the most recently taken pin. Panics-free no-op on an empty
    /// table: an unpin with no matching pin is caller misuse, not a state
    /// this type needs to report through `GcError`.
    pub fn unpin(&mut self) {
        self.slots.pop();
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Every currently pinned value — root enumeration source (spec §4.9
    /// steps 3/4: "every pinned local/global slot up to pinned_count").
    pub fn roots(&self) -> impl Iterator<Item = Value> + '_ {
        self.slots.iter().copied()
    }

    /// Rewrite every pinned slot in place (post-GC pointer fixup).
    pub fn rewrite(&mut self, mut f: impl FnMut(Value) -> Value) {
        for slot in self.slots.iter_mut() {
            *slot = f(*slot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pin_past_capacity_overflows() {
        let mut t = PinTable::new(1);
        t.pin(Value::Int(1)).unwrap();
        assert_eq!(t.pin(Value::Int(2)), Err(GcError::PinOverflow { limit: 1 }));
    }

    #[test]
    fn unpin_shrinks_the_stack() {
        let mut t = PinTable::new(4);
        t.pin(Value::Int(1)).unwrap();
        t.pin(Value::Int(2)).unwrap();
        t.unpin();
        assert_eq!(t.len(), 1);
        assert_eq!(t.roots().collect::<Vec<_>>(), vec![Value::Int(1)]);
    }

    #[test]
    fn rewrite_updates_pinned_values() {
        let mut t = PinTable::new(4);
        t.pin(Value::Int(1)).unwrap();
        t.rewrite(|v| match v {
            Value::Int(n) => Value::Int(n + 100),
            other => other,
        });
        assert_eq!(t.roots().collect::<Vec<_>>(), vec![Value::Int(101)]);
    }
}
