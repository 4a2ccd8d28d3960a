//! External interface (spec §6): the operations an interpreter or FFI
//! caller drives the memory manager through. [`Vm`] owns the heap, the
//! global symbol table, and the VM-wide pin table; each caller thread
//! owns an [`Env`] registered with [`Vm::create_env`] and addressed
//! afterward by the [`EnvHandle`] it returns.
//!
//! Every operation that can allocate or grow a container borrows the
//! full `RootSources` for the duration of the call, so a GC triggered
//! mid-operation sees every thread's roots, not just the caller's.
//!
//! `RootSources` is built inline at each call site (`globals`/`envs`/
//! `global_pins` borrowed directly, never through a `&mut self` helper)
//! so the borrow checker can see it as disjoint from the simultaneous
//! `self.gc` borrow each of these methods also needs.

use crate::config::GcConfig;
use crate::error::{GcError, Result};
use crate::gc::GarbageCollector;
use crate::heap::HeapStats;
use crate::object::string_obj::HASH_UNCOMPUTED;
use crate::object::{ArrayObj, DictObj, KeySlot, ObjectHeader, StringObj};
use crate::roots::RootSources;
use crate::runtime::frame::Env;
use crate::runtime::globals::GlobalTable;
use crate::runtime::pin::PinTable;
use crate::value::Value;
use indexmap::IndexMap;

/// Index into `Vm::envs` — the "environment handle" spec.md §6 passes to
/// every operation.
pub type EnvHandle = usize;

/// Heap utilization snapshot returned by [`Vm::health_check`]. Observability,
/// not a functional feature — carried from the teacher's
/// `GarbageCollector::health_check` (see `DESIGN.md`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GcHealth {
    Healthy,
    /// Tenure is above 80% occupied.
    Pressured,
    /// Tenure is above 95% occupied — compaction is imminent or already
    /// failing to help.
    Critical,
}

pub struct Vm {
    gc: GarbageCollector,
    globals: GlobalTable,
    global_pins: PinTable,
    envs: Vec<Env>,
}

impl Vm {
    pub fn new(config: GcConfig) -> Result<Self> {
        let max_pinned_globals = config.max_pinned_globals;
        let gc = GarbageCollector::new(config)?;
        Ok(Self {
            gc,
            globals: GlobalTable::new(),
            global_pins: PinTable::new(max_pinned_globals),
            envs: Vec::new(),
        })
    }

    /// Register a new per-thread environment and return its handle. In
    /// multi-threaded mode this is the "entry to a thread environment"
    /// point of spec §5: it registers the calling thread as an active
    /// mutator with the safepoint coordinator.
    pub fn create_env(&mut self) -> EnvHandle {
        let cfg = self.gc.config();
        let max_temps = cfg.max_frame_temporaries;
        let max_pins = cfg.max_pinned_locals;
        self.envs.push(Env::new(max_temps, max_pins));
        self.gc.safepoint().thread_enter();
        self.envs.len() - 1
    }

    /// Execute a safepoint (spec §5): pause the calling thread here if a
    /// GC is currently stopping the world, resuming once it completes. The
    /// embedder's interpreter loop calls this at call boundaries and
    /// before a blocking read or write on a shared container. A no-op in
    /// single-threaded builds.
    pub fn poll_safepoint(&self) {
        self.gc.safepoint().poll();
    }

    fn env_mut(&mut self, env: EnvHandle) -> Result<&mut Env> {
        self.envs
            .get_mut(env)
            .ok_or_else(|| GcError::Internal(format!("unknown env handle {env}")))
    }

    // ---- Allocation (spec §6 "Allocation") ----

    pub fn make_string(&mut self, data: &[u8], hash: u64) -> Result<Value> {
        let mut roots = RootSources {
            globals: &mut self.globals,
            envs: &mut self.envs,
            global_pins: &mut self.global_pins,
        };
        let sp = self.gc.alloc_string(&mut roots, data)?;
        if hash != HASH_UNCOMPUTED {
            unsafe { StringObj::set_hash(sp, hash) };
        }
        Ok(Value::Str(sp as *mut ObjectHeader))
    }

    pub fn make_empty_array(&mut self) -> Result<Value> {
        let mut roots = RootSources {
            globals: &mut self.globals,
            envs: &mut self.envs,
            global_pins: &mut self.global_pins,
        };
        let ap = self.gc.alloc_array(&mut roots, 0)?;
        Ok(Value::Array(ap as *mut ObjectHeader))
    }

    pub fn make_empty_dict(&mut self) -> Result<Value> {
        let mut roots = RootSources {
            globals: &mut self.globals,
            envs: &mut self.envs,
            global_pins: &mut self.global_pins,
        };
        let dp = self.gc.alloc_dict(&mut roots, 2)?;
        Ok(Value::Dict(dp as *mut ObjectHeader))
    }

    // ---- Array operations (spec §6 "Array operations") ----

    fn array_ptr(v: Value) -> Result<*mut ArrayObj> {
        match v {
            Value::Array(h) => Ok(unsafe { ArrayObj::newest(h as *mut ArrayObj) }),
            _ => Err(GcError::InvalidState("value is not an array".into())),
        }
    }

    pub fn array_get_size(&self, arr: Value) -> Result<u32> {
        let a = Self::array_ptr(arr)?;
        Ok(unsafe { (*a).size })
    }

    pub fn array_get_elem(&self, arr: Value, i: u32) -> Result<Value> {
        let a = Self::array_ptr(arr)?;
        unsafe {
            if i >= (*a).size {
                return Err(GcError::out_of_range(i, (*a).size));
            }
            Ok(*ArrayObj::slot_ptr(a, i))
        }
    }

    /// `set_elem(&arr, i, val)`: grows via forwarding if `i >= alloc_size`;
    /// `size = max(size, i + 1)` afterward.
    pub fn array_set_elem(&mut self, arr: &mut Value, i: u32, val: Value) -> Result<()> {
        let mut a = Self::array_ptr(*arr)?;
        unsafe {
            if i >= (*a).alloc_size {
                a = self.grow_array(a, i + 1)?;
                *arr = Value::Array(a as *mut ObjectHeader);
            }
            *ArrayObj::slot_ptr(a, i) = val;
            crate::barrier::array_write_barrier(self.gc.heap(), a, i, val);
            (*a).size = (*a).size.max(i + 1);
        }
        Ok(())
    }

    pub fn array_resize(&mut self, arr: &mut Value, n: u32) -> Result<()> {
        let mut a = Self::array_ptr(*arr)?;
        unsafe {
            if n > (*a).alloc_size {
                a = self.grow_array(a, n)?;
                *arr = Value::Array(a as *mut ObjectHeader);
            }
            (*a).size = n;
        }
        Ok(())
    }

    pub fn array_shallow_copy(&mut self, src: Value) -> Result<Value> {
        let a = Self::array_ptr(src)?;
        let (cap, used) = unsafe { ((*a).alloc_size, (*a).size) };
        let new_a = {
            let mut roots = RootSources {
                globals: &mut self.globals,
                envs: &mut self.envs,
                global_pins: &mut self.global_pins,
            };
            self.gc.alloc_array(&mut roots, cap)?
        };
        unsafe {
            for idx in 0..used {
                let val = *ArrayObj::slot_ptr(a, idx);
                *ArrayObj::slot_ptr(new_a, idx) = val;
                crate::barrier::array_write_barrier(self.gc.heap(), new_a, idx, val);
            }
            (*new_a).size = used;
        }
        Ok(Value::Array(new_a as *mut ObjectHeader))
    }

    /// Forwarding growth (spec §4.8): allocate a new array at `new_cap`
    /// (doubling, at least `min_cap`), copy live slots with a write
    /// barrier each, publish `old.newer`.
    ///
    /// # Safety
    /// `old` must point at a valid, initialized `ArrayObj`.
    unsafe fn grow_array(&mut self, old: *mut ArrayObj, min_cap: u32) -> Result<*mut ArrayObj> {
        let new_cap = next_capacity((*old).alloc_size, min_cap);
        let new_a = {
            let mut roots = RootSources {
                globals: &mut self.globals,
                envs: &mut self.envs,
                global_pins: &mut self.global_pins,
            };
            self.gc.alloc_array(&mut roots, new_cap)?
        };
        for idx in 0..(*old).size {
            let val = *ArrayObj::slot_ptr(old, idx);
            *ArrayObj::slot_ptr(new_a, idx) = val;
            crate::barrier::array_write_barrier(self.gc.heap(), new_a, idx, val);
        }
        (*new_a).size = (*old).size;
        (*old).newer.store(new_a as *mut ObjectHeader);
        Ok(new_a)
    }

    // ---- Dict operations (spec §6 "Dict operations") ----

    fn dict_ptr(v: Value) -> Result<*mut DictObj> {
        match v {
            Value::Dict(h) => Ok(unsafe { DictObj::newest(h as *mut DictObj) }),
            _ => Err(GcError::InvalidState("value is not a dict".into())),
        }
    }

    pub fn dict_get_size(&self, dict: Value) -> Result<u32> {
        let d = Self::dict_ptr(dict)?;
        Ok(unsafe { (*d).size })
    }

    pub fn dict_has_key(&self, dict: Value, key: &[u8]) -> Result<bool> {
        let d = Self::dict_ptr(dict)?;
        unsafe { Ok(dict_find(d, key).1.is_some()) }
    }

    /// Iterates non-empty, non-removed slots in table order.
    pub fn dict_get_key_by_index(&self, dict: Value, i: u32) -> Result<Value> {
        let d = Self::dict_ptr(dict)?;
        unsafe {
            let slot = nth_occupied(d, i).ok_or(GcError::KeyNotFound)?;
            match *DictObj::key_ptr(d, slot) {
                KeySlot::Occupied(h) => Ok(Value::Str(h)),
                _ => unreachable!("nth_occupied only returns occupied slots"),
            }
        }
    }

    pub fn dict_get_value_by_index(&self, dict: Value, i: u32) -> Result<Value> {
        let d = Self::dict_ptr(dict)?;
        unsafe {
            let slot = nth_occupied(d, i).ok_or(GcError::KeyNotFound)?;
            Ok(*DictObj::value_ptr(d, slot))
        }
    }

    pub fn dict_get_elem(&self, dict: Value, key: &[u8]) -> Result<Value> {
        let d = Self::dict_ptr(dict)?;
        unsafe {
            let (_, found) = dict_find(d, key);
            let slot = found.ok_or(GcError::KeyNotFound)?;
            Ok(*DictObj::value_ptr(d, slot))
        }
    }

    /// `set_elem(&dict, key, val)`: replaces on key match, else inserts a
    /// fresh `StringObj` key; triggers forwarding growth at ¾ occupancy.
    pub fn dict_set_elem(&mut self, dict: &mut Value, key: &[u8], val: Value) -> Result<()> {
        let mut d = Self::dict_ptr(*dict)?;
        unsafe {
            let (found_slot, found) = dict_find(d, key);
            if found.is_some() {
                *DictObj::value_ptr(d, found_slot) = val;
                crate::barrier::dict_write_barrier(self.gc.heap(), d, val);
                return Ok(());
            }

            if (*d).needs_growth_for_insert() {
                d = self.grow_dict(d)?;
                *dict = Value::Dict(d as *mut ObjectHeader);
            }

            let key_header = {
                let mut roots = RootSources {
                    globals: &mut self.globals,
                    envs: &mut self.envs,
                    global_pins: &mut self.global_pins,
                };
                self.gc.alloc_string(&mut roots, key)?
            };
            let (insert_slot, _) = dict_find(d, key);
            *DictObj::key_ptr(d, insert_slot) = KeySlot::Occupied(key_header as *mut ObjectHeader);
            *DictObj::value_ptr(d, insert_slot) = val;
            (*d).size += 1;
            crate::barrier::dict_write_barrier(self.gc.heap(), d, Value::Str(key_header as *mut ObjectHeader));
            crate::barrier::dict_write_barrier(self.gc.heap(), d, val);
        }
        Ok(())
    }

    pub fn dict_remove_elem(&mut self, dict: Value, key: &[u8]) -> Result<()> {
        let d = Self::dict_ptr(dict)?;
        unsafe {
            let (_, found) = dict_find(d, key);
            let slot = found.ok_or(GcError::KeyNotFound)?;
            *DictObj::key_ptr(d, slot) = KeySlot::Removed;
            *DictObj::value_ptr(d, slot) = Value::Int(0);
            (*d).size -= 1;
        }
        Ok(())
    }

    pub fn dict_shallow_copy(&mut self, src: Value) -> Result<Value> {
        let d = Self::dict_ptr(src)?;
        let cap = unsafe { (*d).alloc_size };
        let new_d = {
            let mut roots = RootSources {
                globals: &mut self.globals,
                envs: &mut self.envs,
                global_pins: &mut self.global_pins,
            };
            self.gc.alloc_dict(&mut roots, cap)?
        };
        unsafe {
            for idx in 0..cap {
                if let KeySlot::Occupied(kh) = *DictObj::key_ptr(d, idx) {
                    let val = *DictObj::value_ptr(d, idx);
                    *DictObj::key_ptr(new_d, idx) = KeySlot::Occupied(kh);
                    *DictObj::value_ptr(new_d, idx) = val;
                    crate::barrier::dict_write_barrier(self.gc.heap(), new_d, Value::Str(kh));
                    crate::barrier::dict_write_barrier(self.gc.heap(), new_d, val);
                }
            }
            (*new_d).size = (*d).size;
        }
        Ok(Value::Dict(new_d as *mut ObjectHeader))
    }

    /// Forwarding growth for dicts: double the capacity and rehash every
    /// occupied slot (spec §4.8 step 1: "2x for dicts").
    ///
    /// # Safety
    /// `old` must point at a valid, initialized `DictObj`.
    unsafe fn grow_dict(&mut self, old: *mut DictObj) -> Result<*mut DictObj> {
        let new_cap = (*old).alloc_size * 2;
        let new_d = {
            let mut roots = RootSources {
                globals: &mut self.globals,
                envs: &mut self.envs,
                global_pins: &mut self.global_pins,
            };
            self.gc.alloc_dict(&mut roots, new_cap)?
        };
        for idx in 0..(*old).alloc_size {
            if let KeySlot::Occupied(kh) = *DictObj::key_ptr(old, idx) {
                let val = *DictObj::value_ptr(old, idx);
                let hash = StringObj::hash(kh as *mut StringObj);
                let slot = dict_probe_empty(new_d, hash);
                *DictObj::key_ptr(new_d, slot) = KeySlot::Occupied(kh);
                *DictObj::value_ptr(new_d, slot) = val;
                (*new_d).size += 1;
                crate::barrier::dict_write_barrier(self.gc.heap(), new_d, Value::Str(kh));
                crate::barrier::dict_write_barrier(self.gc.heap(), new_d, val);
            }
        }
        (*old).newer.store(new_d as *mut ObjectHeader);
        Ok(new_d)
    }

    // ---- Global symbol table (spec §6 "Global symbol table") ----

    pub fn check_global(&self, name: &str) -> bool {
        self.globals.check(name)
    }

    pub fn get_global(&self, name: &str) -> Result<Value> {
        self.globals.get(name)
    }

    pub fn set_global(&mut self, name: &str, val: Value) {
        self.globals.set(name, val);
    }

    // ---- FFI pinning (spec §6 "FFI pinning") ----

    pub fn pin_global(&mut self, val: Value) -> Result<usize> {
        self.global_pins.pin(val)
    }

    pub fn unpin_global(&mut self) {
        self.global_pins.unpin();
    }

    pub fn pin_local(&mut self, env: EnvHandle, val: Value) -> Result<usize> {
        let env = self.env_mut(env)?;
        let frame = env
            .current_frame()
            .ok_or_else(|| GcError::InvalidState("no active call frame".into()))?;
        frame.pin_local(val)
    }

    pub fn unpin_local(&mut self, env: EnvHandle) -> Result<()> {
        let env = self.env_mut(env)?;
        let frame = env
            .current_frame()
            .ok_or_else(|| GcError::InvalidState("no active call frame".into()))?;
        frame.unpin_local();
        Ok(())
    }

    // ---- Error reporting (spec §6 "Error reporting") ----
    //
    // The error buffer and its accessors live on `Env` itself
    // (`runtime::frame::Env::set_error`/`get_error_message`/`get_error_file`/
    // `get_error_line`) — the bytecode source position behind a failure is
    // known only to the interpreter driving this API, which is out of this
    // crate's scope (spec.md §1).

    pub fn env(&mut self, env: EnvHandle) -> Result<&mut Env> {
        self.env_mut(env)
    }

    // ---- Diagnostics (spec §6 ambient supplement) ----

    pub fn heap_stats(&self) -> HeapStats {
        self.gc.heap().stats()
    }

    pub fn diagnostics(&self) -> IndexMap<String, String> {
        let stats = self.gc.heap().stats();
        let summary = self.gc.stats().summary();
        let mut map = IndexMap::new();
        map.insert("nursery_used".into(), stats.nursery_used.to_string());
        map.insert("nursery_capacity".into(), stats.nursery_capacity.to_string());
        map.insert("graduate_used".into(), stats.graduate_used.to_string());
        map.insert("graduate_capacity".into(), stats.graduate_capacity.to_string());
        map.insert("tenure_used".into(), stats.tenure_used.to_string());
        map.insert("tenure_capacity".into(), stats.tenure_capacity.to_string());
        map.insert("total_cycles".into(), self.gc.stats().total_cycles().to_string());
        map.insert("young_cycles".into(), summary.young_cycles.to_string());
        map.insert("old_cycles".into(), summary.old_cycles.to_string());
        map.insert("compact_cycles".into(), summary.compact_cycles.to_string());
        map.insert("promoted_objects".into(), summary.promoted_objects.to_string());
        map.insert("promoted_bytes".into(), summary.promoted_bytes.to_string());
        map
    }

    pub fn health_check(&self) -> GcHealth {
        let stats = self.gc.heap().stats();
        let tenure_ratio = stats.tenure_used as f64 / stats.tenure_capacity.max(1) as f64;
        if tenure_ratio >= 0.95 {
            GcHealth::Critical
        } else if tenure_ratio >= 0.80 {
            GcHealth::Pressured
        } else {
            GcHealth::Healthy
        }
    }

    pub fn gc(&self) -> &GarbageCollector {
        &self.gc
    }
}

/// Smallest capacity `>= min_cap`, doubling `current` (spec §4.8 step 1:
/// "2x growth for arrays"). `current == 0` (a fresh empty array) starts
/// doubling from 1.
fn next_capacity(current: u32, min_cap: u32) -> u32 {
    let mut cap = current.max(1);
    while cap < min_cap {
        cap = cap.saturating_mul(2);
    }
    cap
}

/// `StringObj::hash` remaps a real `0` hash to `1`; match that remap when
/// comparing a freshly computed probe hash against a stored one.
fn hash_with_sentinel(h: u64) -> u64 {
    if h == HASH_UNCOMPUTED {
        1
    } else {
        h
    }
}

/// Linear-probe lookup: returns `(slot_for_insertion_or_match,
/// Some(slot)_if_occupied_match)`.
///
/// # Safety
/// `d` must point at a valid, initialized `DictObj`.
unsafe fn dict_find(d: *mut DictObj, key: &[u8]) -> (u32, Option<u32>) {
    let cap = (*d).alloc_size;
    let mask = cap - 1;
    let key_hash = hash_with_sentinel(crate::object::string_obj::fnv1a(key));
    let mut idx = (key_hash as u32) & mask;
    let mut first_tombstone: Option<u32> = None;
    for _ in 0..cap {
        match *DictObj::key_ptr(d, idx) {
            KeySlot::Empty => return (first_tombstone.unwrap_or(idx), None),
            KeySlot::Removed => {
                if first_tombstone.is_none() {
                    first_tombstone = Some(idx);
                }
            }
            KeySlot::Occupied(kh) => {
                let ks = kh as *mut StringObj;
                if StringObj::hash(ks) == key_hash && StringObj::as_bytes(ks) == key {
                    return (idx, Some(idx));
                }
            }
        }
        idx = (idx + 1) & mask;
    }
    (first_tombstone.unwrap_or(idx), None)
}

/// # Safety
/// `d` must point at a valid, initialized `DictObj` that is not full.
unsafe fn dict_probe_empty(d: *mut DictObj, hash: u64) -> u32 {
    let cap = (*d).alloc_size;
    let mask = cap - 1;
    let mut idx = (hash as u32) & mask;
    loop {
        if (*DictObj::key_ptr(d, idx)).is_empty() {
            return idx;
        }
        idx = (idx + 1) & mask;
    }
}

/// `i`-th non-empty, non-removed slot in table order (spec §6
/// `get_key_by_index`/`get_value_by_index`).
///
/// # Safety
/// `d` must point at a valid, initialized `DictObj`.
unsafe fn nth_occupied(d: *mut DictObj, i: u32) -> Option<u32> {
    let mut seen = 0u32;
    for slot in 0..(*d).alloc_size {
        if (*DictObj::key_ptr(d, slot)).is_occupied() {
            if seen == i {
                return Some(slot);
            }
            seen += 1;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_vm() -> Vm {
        Vm::new(GcConfig::default()).unwrap()
    }

    fn header_of(v: Value) -> *mut ObjectHeader {
        v.header_ptr().unwrap()
    }

    #[test]
    fn make_string_round_trips_bytes() {
        let mut vm = small_vm();
        let s = vm.make_string(b"hello", 0).unwrap();
        let h = header_of(s) as *mut StringObj;
        unsafe { assert_eq!(StringObj::as_bytes(h), b"hello") };
    }

    #[test]
    fn array_set_elem_grows_and_publishes_forwarding() {
        let mut vm = small_vm();
        let mut arr = vm.make_empty_array().unwrap();
        let original = header_of(arr);
        vm.array_set_elem(&mut arr, 5, Value::Int(42)).unwrap();
        assert_eq!(vm.array_get_size(arr).unwrap(), 6);
        assert_eq!(vm.array_get_elem(arr, 5).unwrap(), Value::Int(42));
        assert_ne!(header_of(arr), original);
    }

    #[test]
    fn array_get_elem_out_of_range_errors() {
        let mut vm = small_vm();
        let arr = vm.make_empty_array().unwrap();
        assert!(matches!(vm.array_get_elem(arr, 0), Err(GcError::OutOfRange { .. })));
    }

    #[test]
    fn array_shallow_copy_is_independent_of_the_original() {
        let mut vm = small_vm();
        let mut arr = vm.make_empty_array().unwrap();
        vm.array_set_elem(&mut arr, 0, Value::Int(1)).unwrap();
        let copy = vm.array_shallow_copy(arr).unwrap();
        vm.array_set_elem(&mut arr, 0, Value::Int(2)).unwrap();
        assert_eq!(vm.array_get_elem(copy, 0).unwrap(), Value::Int(1));
    }

    #[test]
    fn dict_set_then_get_round_trips() {
        let mut vm = small_vm();
        let mut dict = vm.make_empty_dict().unwrap();
        vm.dict_set_elem(&mut dict, b"key", Value::Int(7)).unwrap();
        assert!(vm.dict_has_key(dict, b"key").unwrap());
        assert_eq!(vm.dict_get_elem(dict, b"key").unwrap(), Value::Int(7));
        assert_eq!(vm.dict_get_size(dict).unwrap(), 1);
    }

    #[test]
    fn dict_remove_then_lookup_fails() {
        let mut vm = small_vm();
        let mut dict = vm.make_empty_dict().unwrap();
        vm.dict_set_elem(&mut dict, b"key", Value::Int(1)).unwrap();
        vm.dict_remove_elem(dict, b"key").unwrap();
        assert!(!vm.dict_has_key(dict, b"key").unwrap());
        assert!(matches!(vm.dict_get_elem(dict, b"key"), Err(GcError::KeyNotFound)));
    }

    #[test]
    fn dict_growth_preserves_every_entry() {
        let mut vm = small_vm();
        let mut dict = vm.make_empty_dict().unwrap();
        for i in 0..20u32 {
            let key = format!("k{i}");
            vm.dict_set_elem(&mut dict, key.as_bytes(), Value::Int(i as i64)).unwrap();
        }
        for i in 0..20u32 {
            let key = format!("k{i}");
            assert_eq!(vm.dict_get_elem(dict, key.as_bytes()).unwrap(), Value::Int(i as i64));
        }
    }

    #[test]
    fn dict_get_key_and_value_by_index_match_table_order() {
        let mut vm = small_vm();
        let mut dict = vm.make_empty_dict().unwrap();
        vm.dict_set_elem(&mut dict, b"a", Value::Int(1)).unwrap();
        let key0 = vm.dict_get_key_by_index(dict, 0).unwrap();
        let val0 = vm.dict_get_value_by_index(dict, 0).unwrap();
        let key_header = header_of(key0) as *mut StringObj;
        unsafe { assert_eq!(StringObj::as_bytes(key_header), b"a") };
        assert_eq!(val0, Value::Int(1));
    }

    #[test]
    fn global_table_round_trips() {
        let mut vm = small_vm();
        assert!(!vm.check_global("x"));
        vm.set_global("x", Value::Int(9));
        assert!(vm.check_global("x"));
        assert_eq!(vm.get_global("x").unwrap(), Value::Int(9));
    }

    #[test]
    fn pin_local_requires_an_active_frame() {
        let mut vm = small_vm();
        let env = vm.create_env();
        assert!(matches!(vm.pin_local(env, Value::Int(1)), Err(GcError::InvalidState(_))));
        vm.env(env).unwrap().push_frame();
        assert!(vm.pin_local(env, Value::Int(1)).is_ok());
    }

    #[test]
    fn pin_global_respects_configured_capacity() {
        let mut vm = Vm::new(GcConfig {
            max_pinned_globals: 1,
            ..GcConfig::default()
        })
        .unwrap();
        vm.pin_global(Value::Int(1)).unwrap();
        assert!(matches!(vm.pin_global(Value::Int(2)), Err(GcError::PinOverflow { .. })));
    }

    #[test]
    fn health_check_reports_healthy_for_a_fresh_heap() {
        let vm = small_vm();
        assert_eq!(vm.health_check(), GcHealth::Healthy);
    }
}
