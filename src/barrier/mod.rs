//! Write barriers and the remembered set (spec §4.7).
//!
//! Every store that replaces or inserts a reference value into an array or
//! dict slot must go through [`array_write_barrier`] or
//! [`dict_write_barrier`]. The barrier is a no-op except in the one case
//! that actually threatens the young collector's soundness: a tenured
//! container taking on a reference to a non-tenured (nursery or graduate)
//! object. In that case the container is flagged and linked into
//! [`crate::heap::Heap::remembered_set`], so a young GC can find it as an
//! extra root without having to scan the entire tenured region.
//!
use crate::heap::Heap;
use crate::object::array_obj::ArrayObj;
use crate::object::dict_obj::DictObj;
use crate::object::header::{ObjectHeader, RegionTag};
use crate::value::Value;

/// Write barrier for an array element store at `arr[_index] = val`.
///
/// # Safety
/// `arr` must point at a valid, initialized `ArrayObj`.
pub unsafe fn array_write_barrier(heap: &Heap, arr: *mut ArrayObj, _index: u32, val: Value) {
    record_reference(heap, arr as *mut ObjectHeader, val);
}

/// Write barrier for a dict value store.
///
/// # Safety
/// `dict` must point at a valid, initialized `DictObj`.
pub unsafe fn dict_write_barrier(heap: &Heap, dict: *mut DictObj, val: Value) {
    record_reference(heap, dict as *mut ObjectHeader, val);
}

/// Shared logic: tenured container, not yet in the remembered set, taking
/// on a reference to a non-tenured object.
unsafe fn record_reference(heap: &Heap, container: *mut ObjectHeader, val: Value) {
    if (*container).region != RegionTag::Tenure || (*container).rem_flag {
        return;
    }
    let Some(target) = val.header_ptr() else {
        return;
    };
    if (*target).region == RegionTag::Tenure {
        return;
    }
    (*container).rem_flag = true;
    heap.remembered_set.push_front(container);
}
