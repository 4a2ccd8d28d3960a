//! Compacting garbage collection (spec §4.6): slide compaction over the
//! tenure region, used when mark-sweep alone leaves tenure fragmented
//! enough that a large allocation still can't find a big-enough hole.
//!
//! Every currently-used tenure block is packed down to a dense prefix in
//! address order, and every reference anywhere in the heap that pointed
//! at a moved object — live lists, the remembered set, roots, and every
//! surviving object's own child slots — is rewritten to the new address.

use crate::allocator::freelist::HEADER_SIZE as FREELIST_HEADER_SIZE;
use crate::error::Result;
use crate::heap::Heap;
use crate::object::{ArrayObj, DictObj, KeySlot, ObjKind, ObjectHeader};
use crate::roots::RootSources;
use crate::value::Value;
use std::collections::HashMap;

#[derive(Debug, Default, Clone, Copy)]
pub struct Outcome {
    pub objects_moved: u64,
    pub bytes_reclaimed: u64,
}

pub fn run(heap: &Heap, roots: &mut RootSources) -> Result<Outcome> {
    unsafe {
        let mut used_blocks: Vec<(usize, usize)> = Vec::new();
        heap.tenure.walk_blocks(|payload, size, used| {
            if used {
                used_blocks.push((payload, size));
            }
        });

        let original_high_water = heap.tenure.high_water();

        let mut mapping: HashMap<usize, usize> = HashMap::with_capacity(used_blocks.len());
        let mut new_headers = Vec::with_capacity(used_blocks.len());
        let mut offset = 0usize;
        for &(old_payload, size) in &used_blocks {
            let new_payload = heap.tenure.write_header_at(offset, size, true);
            if new_payload != old_payload {
                std::ptr::copy(old_payload as *const u8, new_payload as *mut u8, size);
            }
            mapping.insert(old_payload, new_payload);
            new_headers.push(new_payload as *mut ObjectHeader);
            offset += FREELIST_HEADER_SIZE + size;
        }
        heap.tenure.set_high_water(offset);
        heap.tenure.zero_tail(offset, original_high_water);

        // Old prev/next/rem_prev/rem_next links all point at pre-move
        // addresses; rebuilding from the new headers is simpler and safer
        // than patching them in place.
        heap.tenure_list.clear();
        heap.remembered_set.clear();
        for &h in &new_headers {
            heap.tenure_list.push_front(h);
            if (*h).rem_flag {
                heap.remembered_set.push_front(h);
            }
        }

        roots.rewrite(|v| remap_value(v, &mapping));
        for list in [&heap.nursery_list, &heap.graduate_list, &heap.tenure_list] {
            for h in list.iter() {
                rewrite_children(h, &mapping);
            }
        }

        Ok(Outcome {
            objects_moved: new_headers.len() as u64,
            bytes_reclaimed: original_high_water.saturating_sub(offset) as u64,
        })
    }
}

unsafe fn remap_value(v: Value, mapping: &HashMap<usize, usize>) -> Value {
    match v.header_ptr() {
        Some(h) => match mapping.get(&(h as usize)) {
            Some(&new_addr) => v.with_header(new_addr as *mut ObjectHeader),
            None => v,
        },
        None => v,
    }
}

unsafe fn rewrite_children(h: *mut ObjectHeader, mapping: &HashMap<usize, usize>) {
    match (*h).kind {
        ObjKind::Str => {}
        ObjKind::Array => {
            let a = h as *mut ArrayObj;
            for i in 0..(*a).alloc_size {
                let slot = ArrayObj::slot_ptr(a, i);
                *slot = remap_value(*slot, mapping);
            }
        }
        ObjKind::Dict => {
            let d = h as *mut DictObj;
            for i in 0..(*d).alloc_size {
                let kp = DictObj::key_ptr(d, i);
                if let KeySlot::Occupied(kh) = *kp {
                    if let Some(&new_addr) = mapping.get(&(kh as usize)) {
                        *kp = KeySlot::Occupied(new_addr as *mut ObjectHeader);
                    }
                }
                let vp = DictObj::value_ptr(d, i);
                *vp = remap_value(*vp, mapping);
            }
        }
    }
}
