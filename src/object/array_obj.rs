//! Array object: header + capacity/length + a `Value` table stored inline
//! immediately after the fixed fields, plus the forwarding/acquisition
//! machinery used when the array is grown (§4.8, §5).

use crate::forwarding::{AcquireCounter, NewerSlot};
use crate::object::header::{ObjectHeader, RegionTag, HEADER_ALIGN};
use crate::object::ObjKind;
use crate::util::Alignment;
use crate::value::Value;
use std::mem::size_of;
use std::ptr;

#[repr(C)]
pub struct ArrayObj {
    pub header: ObjectHeader,
    /// Capacity — number of `Value` slots backing this array.
    pub alloc_size: u32,
    /// Used length; `size <= alloc_size` always holds.
    pub size: u32,
    pub newer: NewerSlot,
    #[cfg(feature = "multi-threaded")]
    pub counter: AcquireCounter,
}

impl ArrayObj {
    pub const FIXED_SIZE: usize = size_of::<ArrayObj>();

    pub fn total_size(alloc_size: u32) -> usize {
        Alignment::align_up(
            Self::FIXED_SIZE + alloc_size as usize * size_of::<Value>(),
            HEADER_ALIGN,
        )
    }

    /// # Safety
    /// `at` must be valid for writes of `Self::total_size(alloc_size)`
    /// bytes.
    pub unsafe fn init(at: *mut ArrayObj, region: RegionTag, alloc_size: u32) {
        let total = Self::total_size(alloc_size) as u32;
        ObjectHeader::init(at as *mut ObjectHeader, ObjKind::Array, region, total);
        ptr::addr_of_mut!((*at).alloc_size).write(alloc_size);
        ptr::addr_of_mut!((*at).size).write(0);
        ptr::addr_of_mut!((*at).newer).write(NewerSlot::new());
        #[cfg(feature = "multi-threaded")]
        ptr::addr_of_mut!((*at).counter).write(AcquireCounter::new());
        for i in 0..alloc_size {
            ptr::write(Self::slot_ptr(at, i), Value::Int(0));
        }
    }

    /// # Safety
    /// `a` must point at a valid, initialized `ArrayObj`; `i` must be
    /// `< alloc_size`.
    pub unsafe fn slot_ptr(a: *mut ArrayObj, i: u32) -> *mut Value {
        ((a as *mut u8).add(Self::FIXED_SIZE) as *mut Value).add(i as usize)
    }

    /// # Safety
    /// `a` must point at a valid, initialized `ArrayObj`.
    pub unsafe fn newest(a: *mut ArrayObj) -> *mut ArrayObj {
        crate::forwarding::chase_newest(a as *mut ObjectHeader, |h| {
            (*(h as *mut ArrayObj)).newer.load()
        }) as *mut ArrayObj
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_zeroes_slots_and_size() {
        let total = ArrayObj::total_size(4);
        let mut buf = vec![0u8; total];
        let ap = buf.as_mut_ptr() as *mut ArrayObj;
        unsafe {
            ArrayObj::init(ap, RegionTag::Nursery, 4);
            assert_eq!((*ap).alloc_size, 4);
            assert_eq!((*ap).size, 0);
            for i in 0..4 {
                assert_eq!(*ArrayObj::slot_ptr(ap, i), Value::Int(0));
            }
        }
    }

    #[test]
    fn newest_follows_empty_chain_to_self() {
        let total = ArrayObj::total_size(1);
        let mut buf = vec![0u8; total];
        let ap = buf.as_mut_ptr() as *mut ArrayObj;
        unsafe {
            ArrayObj::init(ap, RegionTag::Nursery, 1);
            assert_eq!(ArrayObj::newest(ap), ap);
        }
    }
}
