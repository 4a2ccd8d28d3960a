//! Old garbage collection (spec §4.5): classic mark-sweep over the tenure
//! region.
//!
//! Marking walks the whole reachable graph regardless of region — a root
//! may reach a tenured object only through a still-live nursery or
//! graduate object — but only the tenure live list is ever swept; the
//! other two regions are reclaimed solely by a young GC.

use crate::error::Result;
use crate::heap::Heap;
use crate::object::{ArrayObj, DictObj, KeySlot, ObjKind, ObjectHeader};
use crate::roots::RootSources;

#[derive(Debug, Default, Clone, Copy)]
pub struct Outcome {
    pub freed_objects: u64,
    pub freed_bytes: u64,
}

pub fn run(heap: &Heap, roots: &RootSources) -> Result<Outcome> {
    unsafe {
        clear_marks(heap);

        let mut stack = Vec::new();
        roots.visit(|v| {
            if let Some(h) = v.header_ptr() {
                mark_one(h, &mut stack);
            }
        });
        while let Some(h) = stack.pop() {
            scan_children(h, &mut stack);
        }

        Ok(sweep(heap))
    }
}

/// Step 1: clear `is_marked` across all three region lists — a tenured
/// object's liveness from a prior cycle says nothing about this one.
unsafe fn clear_marks(heap: &Heap) {
    for list in [&heap.nursery_list, &heap.graduate_list, &heap.tenure_list] {
        for h in list.iter() {
            (*h).is_marked = false;
        }
    }
}

unsafe fn resolve_newest(h: *mut ObjectHeader) -> *mut ObjectHeader {
    match (*h).kind {
        ObjKind::Array => ArrayObj::newest(h as *mut ArrayObj) as *mut ObjectHeader,
        ObjKind::Dict => DictObj::newest(h as *mut DictObj) as *mut ObjectHeader,
        ObjKind::Str => h,
    }
}

unsafe fn mark_one(h: *mut ObjectHeader, stack: &mut Vec<*mut ObjectHeader>) {
    let h = resolve_newest(h);
    if !(*h).is_marked {
        (*h).is_marked = true;
        stack.push(h);
    }
}

/// Step 2: recursive mark, chasing `newer` first and skipping empty/
/// removed dict slots.
unsafe fn scan_children(h: *mut ObjectHeader, stack: &mut Vec<*mut ObjectHeader>) {
    match (*h).kind {
        ObjKind::Str => {}
        ObjKind::Array => {
            let a = h as *mut ArrayObj;
            for i in 0..(*a).alloc_size {
                let v = *ArrayObj::slot_ptr(a, i);
                if let Some(ch) = v.header_ptr() {
                    mark_one(ch, stack);
                }
            }
        }
        ObjKind::Dict => {
            let d = h as *mut DictObj;
            for i in 0..(*d).alloc_size {
                if let KeySlot::Occupied(kh) = *DictObj::key_ptr(d, i) {
                    mark_one(kh, stack);
                    let v = *DictObj::value_ptr(d, i);
                    if let Some(vh) = v.header_ptr() {
                        mark_one(vh, stack);
                    }
                }
            }
        }
    }
}

/// Step 3: sweep the tenure live list, freeing every unmarked block and
/// unlinking it from the remembered set if it was flagged.
unsafe fn sweep(heap: &Heap) -> Outcome {
    let dead: Vec<*mut ObjectHeader> = heap.tenure_list.iter().filter(|&h| !(*h).is_marked).collect();

    let mut freed_objects = 0u64;
    let mut freed_bytes = 0u64;
    for h in dead {
        freed_objects += 1;
        freed_bytes += (*h).size as u64;
        if (*h).rem_flag {
            heap.remembered_set.unlink(h);
        }
        heap.tenure_list.unlink(h);
        heap.tenure.free(h as *mut u8);
    }

    Outcome {
        freed_objects,
        freed_bytes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GcConfig;
    use crate::object::header::RegionTag;
    use crate::runtime::frame::Env;
    use crate::runtime::globals::GlobalTable;
    use crate::runtime::pin::PinTable;
    use crate::value::Value;
    use std::sync::Arc;

    unsafe fn alloc_tenure_array(heap: &Heap, cap: u32) -> *mut ArrayObj {
        let total = ArrayObj::total_size(cap);
        let p = heap.tenure.alloc(total).unwrap();
        let a = p as *mut ArrayObj;
        ArrayObj::init(a, RegionTag::Tenure, cap);
        heap.tenure_list.push_front(a as *mut ObjectHeader);
        a
    }

    unsafe fn alloc_nursery_array(heap: &Heap, cap: u32) -> *mut ArrayObj {
        let total = ArrayObj::total_size(cap);
        let p = heap.nursery.alloc(total).unwrap();
        let a = p as *mut ArrayObj;
        ArrayObj::init(a, RegionTag::Nursery, cap);
        heap.link_new(a as *mut ObjectHeader);
        a
    }

    #[test]
    fn unreachable_tenure_object_is_freed_and_reused() {
        let heap = Heap::new(Arc::new(GcConfig::default())).unwrap();
        unsafe {
            let live = alloc_tenure_array(&heap, 1);
            let dead = alloc_tenure_array(&heap, 1);

            let mut globals = GlobalTable::new();
            globals.set("g", Value::Array(live as *mut ObjectHeader));
            let mut envs: [Env; 0] = [];
            let mut pins = PinTable::new(4);
            let sources = RootSources {
                globals: &mut globals,
                envs: &mut envs,
                global_pins: &mut pins,
            };

            let outcome = run(&heap, &sources).unwrap();
            assert_eq!(outcome.freed_objects, 1);

            let seen: Vec<_> = heap.tenure_list.iter().collect();
            assert_eq!(seen, vec![live as *mut ObjectHeader]);

            let reused = heap.tenure.alloc(ArrayObj::total_size(1)).unwrap();
            assert_eq!(reused, dead as *mut u8);
        }
    }

    #[test]
    fn tenured_object_reachable_only_through_nursery_chain_survives() {
        let heap = Heap::new(Arc::new(GcConfig::default())).unwrap();
        unsafe {
            let tenured_child = alloc_tenure_array(&heap, 0);
            let root_in_nursery = alloc_nursery_array(&heap, 1);
            (*root_in_nursery).size = 1;
            *ArrayObj::slot_ptr(root_in_nursery, 0) = Value::Array(tenured_child as *mut ObjectHeader);

            let mut globals = GlobalTable::new();
            globals.set("g", Value::Array(root_in_nursery as *mut ObjectHeader));
            let mut envs: [Env; 0] = [];
            let mut pins = PinTable::new(4);
            let sources = RootSources {
                globals: &mut globals,
                envs: &mut envs,
                global_pins: &mut pins,
            };

            let outcome = run(&heap, &sources).unwrap();
            assert_eq!(outcome.freed_objects, 0);
            let seen: Vec<_> = heap.tenure_list.iter().collect();
            assert_eq!(seen, vec![tenured_child as *mut ObjectHeader]);
        }
    }

    #[test]
    fn sweeping_a_remembered_container_unlinks_it_from_the_remembered_set() {
        let heap = Heap::new(Arc::new(GcConfig::default())).unwrap();
        unsafe {
            let container = alloc_tenure_array(&heap, 1);
            let header = container as *mut ObjectHeader;
            (*header).rem_flag = true;
            heap.remembered_set.push_front(header);

            let mut globals = GlobalTable::new();
            let mut envs: [Env; 0] = [];
            let mut pins = PinTable::new(4);
            let sources = RootSources {
                globals: &mut globals,
                envs: &mut envs,
                global_pins: &mut pins,
            };

            let outcome = run(&heap, &sources).unwrap();
            assert_eq!(outcome.freed_objects, 1);
            assert!(heap.remembered_set.is_empty());
        }
    }
}
