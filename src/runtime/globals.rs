//! The VM's global symbol table (spec §6: `check_global`/`get_global`/
//! `set_global`, resizing "at ¾ occupancy like dicts").
//!
//! Global names are compile-time/host strings baked into the bytecode, not
//! `StringObj` instances living in one of the three GC regions — so this is
//! backed by `indexmap::IndexMap<Box<str>, Value>` rather than a `DictObj`
//! layout. `IndexMap` already gives stable insertion-order iteration (what
//! root enumeration needs) and grows on its own; there is no separate
//! ¾-occupancy check to hand-roll here; see `DESIGN.md`.

use crate::error::{GcError, Result};
use crate::value::Value;
use indexmap::IndexMap;

pub struct GlobalTable {
    table: IndexMap<Box<str>, Value>,
}

impl GlobalTable {
    pub fn new() -> Self {
        Self {
            table: IndexMap::new(),
        }
    }

    /// `check_global`: does a binding for `name` exist.
    pub fn check(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    /// `get_global`: the current value of `name`, or `KeyNotFound`.
    pub fn get(&self, name: &str) -> Result<Value> {
        self.table.get(name).copied().ok_or(GcError::KeyNotFound)
    }

    /// `set_global`: create or overwrite a binding.
    pub fn set(&mut self, name: &str, val: Value) {
        match self.table.get_mut(name) {
            Some(slot) => *slot = val,
            None => {
                self.table.insert(name.into(), val);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Every bound value, in insertion order — root enumeration source
    /// (spec §4.9 step 1: "every non-empty/non-removed slot").
    pub fn roots(&self) -> impl Iterator<Item = Value> + '_ {
        self.table.values().copied()
    }

    /// Rewrite every slot in place (post-GC pointer fixup).
    pub fn rewrite(&mut self, mut f: impl FnMut(Value) -> Value) {
        for slot in self.table.values_mut() {
            *slot = f(*slot);
        }
    }
}

impl Default for GlobalTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::FuncRef;

    #[test]
    fn unset_name_is_not_checked_and_errors_on_get() {
        let g = GlobalTable::new();
        assert!(!g.check("x"));
        assert_eq!(g.get("x"), Err(GcError::KeyNotFound));
    }

    #[test]
    fn set_then_get_round_trips() {
        let mut g = GlobalTable::new();
        g.set("x", Value::Int(42));
        assert!(g.check("x"));
        assert_eq!(g.get("x"), Ok(Value::Int(42)));
    }

    #[test]
    fn set_overwrites_existing_binding() {
        let mut g = GlobalTable::new();
        g.set("x", Value::Int(1));
        g.set("x", Value::Int(2));
        assert_eq!(g.get("x"), Ok(Value::Int(2)));
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn roots_visits_every_bound_value() {
        let mut g = GlobalTable::new();
        g.set("a", Value::Int(1));
        g.set("b", Value::Func(FuncRef(3)));
        let seen: Vec<_> = g.roots().collect();
        assert_eq!(seen, vec![Value::Int(1), Value::Func(FuncRef(3))]);
    }

    #[test]
    fn rewrite_updates_every_slot() {
        let mut g = GlobalTable::new();
        g.set("a", Value::Int(1));
        g.set("b", Value::Int(2));
        g.rewrite(|v| match v {
            Value::Int(n) => Value::Int(n * 10),
            other => other,
        });
        assert_eq!(g.get("a"), Ok(Value::Int(10)));
        assert_eq!(g.get("b"), Ok(Value::Int(20)));
    }
}
