//! Dict object: open-addressed hash table with linear probing, a
//! power-of-two capacity, and a `Value` table parallel to the key table,
//! both stored inline immediately after the fixed fields.
//!
//! A key slot is one of three states — empty, removed (tombstone), or
//! occupied by a string. The source this spec was distilled from encodes
//! those three states as special discriminant values packed into the
//! key's own tag; here they are modeled directly as a three-variant enum,
//! which expresses the same occupancy semantics without relying on
//! otherwise-invalid tag bits (see `DESIGN.md`).

use crate::forwarding::{AcquireCounter, NewerSlot};
use crate::object::header::{ObjectHeader, RegionTag, HEADER_ALIGN};
use crate::object::ObjKind;
use crate::util::Alignment;
use crate::value::Value;
use std::mem::size_of;
use std::ptr;

#[derive(Clone, Copy)]
pub enum KeySlot {
    Empty,
    Removed,
    /// Header of a `StringObj`. A valid key is always a string; its
    /// cached hash is materialized lazily on first lookup/comparison.
    Occupied(*mut ObjectHeader),
}

impl KeySlot {
    pub fn is_empty(&self) -> bool {
        matches!(self, KeySlot::Empty)
    }

    pub fn is_removed(&self) -> bool {
        matches!(self, KeySlot::Removed)
    }

    pub fn is_occupied(&self) -> bool {
        matches!(self, KeySlot::Occupied(_))
    }

    pub fn string_header(&self) -> Option<*mut ObjectHeader> {
        match self {
            KeySlot::Occupied(h) => Some(*h),
            _ => None,
        }
    }
}

#[repr(C)]
pub struct DictObj {
    pub header: ObjectHeader,
    /// Power-of-two capacity, at least 2 (invariant 4).
    pub alloc_size: u32,
    /// Occupied (non-empty, non-removed) entry count.
    pub size: u32,
    pub newer: NewerSlot,
    #[cfg(feature = "multi-threaded")]
    pub counter: AcquireCounter,
}

impl DictObj {
    pub const FIXED_SIZE: usize = size_of::<DictObj>();

    pub fn total_size(alloc_size: u32) -> usize {
        let table_bytes = alloc_size as usize * (size_of::<KeySlot>() + size_of::<Value>());
        Alignment::align_up(Self::FIXED_SIZE + table_bytes, HEADER_ALIGN)
    }

    /// # Safety
    /// `at` must be valid for writes of `Self::total_size(alloc_size)`
    /// bytes. `alloc_size` must be a power of two `>= 2` (invariant 4).
    pub unsafe fn init(at: *mut DictObj, region: RegionTag, alloc_size: u32) {
        debug_assert!(alloc_size >= 2 && alloc_size.is_power_of_two());
        let total = Self::total_size(alloc_size) as u32;
        ObjectHeader::init(at as *mut ObjectHeader, ObjKind::Dict, region, total);
        ptr::addr_of_mut!((*at).alloc_size).write(alloc_size);
        ptr::addr_of_mut!((*at).size).write(0);
        ptr::addr_of_mut!((*at).newer).write(NewerSlot::new());
        #[cfg(feature = "multi-threaded")]
        ptr::addr_of_mut!((*at).counter).write(AcquireCounter::new());
        for i in 0..alloc_size {
            ptr::write(Self::key_ptr(at, i), KeySlot::Empty);
            ptr::write(Self::value_ptr(at, i), Value::Int(0));
        }
    }

    /// # Safety
    /// `d` must point at a valid, initialized `DictObj`; `i` must be
    /// `< alloc_size`.
    pub unsafe fn key_ptr(d: *mut DictObj, i: u32) -> *mut KeySlot {
        ((d as *mut u8).add(Self::FIXED_SIZE) as *mut KeySlot).add(i as usize)
    }

    /// # Safety
    /// `d` must point at a valid, initialized `DictObj`; `i` must be
    /// `< alloc_size`.
    pub unsafe fn value_ptr(d: *mut DictObj, i: u32) -> *mut Value {
        let keys_bytes = (*d).alloc_size as usize * size_of::<KeySlot>();
        (((d as *mut u8).add(Self::FIXED_SIZE).add(keys_bytes)) as *mut Value).add(i as usize)
    }

    /// # Safety
    /// `d` must point at a valid, initialized `DictObj`.
    pub unsafe fn newest(d: *mut DictObj) -> *mut DictObj {
        crate::forwarding::chase_newest(d as *mut ObjectHeader, |h| {
            (*(h as *mut DictObj)).newer.load()
        }) as *mut DictObj
    }

    /// ¾-occupancy resize threshold (invariant 5), checked against the
    /// size the table would have *after* the pending insertion the caller
    /// is about to perform, not its current size. Checking the current
    /// size instead would let a dict reach `size == alloc_size` once the
    /// inserting call returns — at the minimum capacity of 2 this happens
    /// on the very second insert, and a fully occupied table breaks the
    /// probe-always-terminates guarantee the next lookup or insert relies
    /// on. Call this before writing the new key, not after.
    pub fn needs_growth_for_insert(&self) -> bool {
        (self.size as u64 + 1) * 4 > self.alloc_size as u64 * 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_sets_all_slots_empty() {
        let total = DictObj::total_size(4);
        let mut buf = vec![0u8; total];
        let dp = buf.as_mut_ptr() as *mut DictObj;
        unsafe {
            DictObj::init(dp, RegionTag::Nursery, 4);
            assert_eq!((*dp).alloc_size, 4);
            assert_eq!((*dp).size, 0);
            for i in 0..4 {
                assert!((*DictObj::key_ptr(dp, i)).is_empty());
            }
        }
    }

    #[test]
    fn needs_growth_for_insert_fires_before_the_table_fills_up() {
        let total = DictObj::total_size(4);
        let mut buf = vec![0u8; total];
        let dp = buf.as_mut_ptr() as *mut DictObj;
        unsafe {
            DictObj::init(dp, RegionTag::Nursery, 4);
            (*dp).size = 2;
            assert!(!(*dp).needs_growth_for_insert());
            (*dp).size = 3;
            assert!((*dp).needs_growth_for_insert());
        }
    }

    #[test]
    fn needs_growth_for_insert_fires_on_the_second_insert_at_minimum_capacity() {
        let total = DictObj::total_size(2);
        let mut buf = vec![0u8; total];
        let dp = buf.as_mut_ptr() as *mut DictObj;
        unsafe {
            DictObj::init(dp, RegionTag::Nursery, 2);
            assert!(!(*dp).needs_growth_for_insert());
            (*dp).size = 1;
            assert!((*dp).needs_growth_for_insert());
        }
    }
}
