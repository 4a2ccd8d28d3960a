//! Root enumeration (spec §4.9): the ordered walk a GC cycle uses to find
//! every `Value` that must be treated as live without being reachable
//! through another managed object.
//!
//! Exact order:
//! 1. every non-empty/non-removed slot in the VM's global symbol table
//! 2. for each call frame, every temporary slot up to `tmpvar_size`
//! 3. for each call frame, every pinned local slot up to `pinned_count`
//! 4. every pinned global slot up to the VM's `pinned_count`
//! 5. during young GC only, every container in the remembered set
//!
//! Steps 1-4 are all "a `Value` sits in a slot we own and can overwrite" —
//! [`RootSources::visit`] reads them, [`RootSources::rewrite`] is what a
//! copying young GC uses to publish each root's post-evacuation address.
//! Step 5 is different in kind: a remembered-set entry is a *container*
//! whose own child slots need scanning, not a slot holding one `Value`, so
//! it's exposed separately via [`remembered_set_containers`] for
//! `gc::young` to walk with its `ArrayObj`/`DictObj` knowledge.

use crate::heap::Heap;
use crate::object::header::ObjectHeader;
use crate::runtime::frame::Env;
use crate::runtime::globals::GlobalTable;
use crate::runtime::pin::PinTable;
use crate::value::Value;

/// Borrowed handle to every place-based root source (steps 1-4). Built
/// fresh by the collector at the start of a cycle from the VM's owned
/// state; it borrows rather than owns so a GC can interleave reading and
/// rewriting without cloning frame stacks.
pub struct RootSources<'a> {
    pub globals: &'a mut GlobalTable,
    pub envs: &'a mut [Env],
    pub global_pins: &'a mut PinTable,
}

impl<'a> RootSources<'a> {
    /// Read every place-based root in spec order, without mutating any of
    /// them. Used by the old generation's mark phase, which only needs to
    /// discover what's reachable.
    pub fn visit(&self, mut visit: impl FnMut(Value)) {
        for v in self.globals.roots() {
            visit(v);
        }
        for env in self.envs.iter() {
            for frame in env.frames() {
                for v in frame.roots() {
                    visit(v);
                }
            }
        }
        for v in self.global_pins.roots() {
            visit(v);
        }
    }

    /// Rewrite every place-based root in place via `f`. Used by a copying
    /// young GC: `f` evacuates/promotes the value (following the
    /// forwarding protocol, §4.8) and returns its new address, which is
    /// written back into the original slot.
    pub fn rewrite(&mut self, mut f: impl FnMut(Value) -> Value) {
        self.globals.rewrite(&mut f);
        for env in self.envs.iter_mut() {
            for frame in env.frames_mut() {
                frame.rewrite(&mut f);
            }
        }
        self.global_pins.rewrite(&mut f);
    }
}

/// Step 5: every tenured container currently in the remembered set,
/// treated as an extra root during a young GC. Each container's own
/// array/dict slots must be scanned and any young/graduate references
/// they hold evacuated — the container itself is already tenured and
/// never moves.
///
/// # Safety
/// Must only be called during a stop-the-world phase (no concurrent
/// `Heap::remembered_set` mutation), matching `LiveList::iter`'s own
/// safety requirement.
pub unsafe fn remembered_set_containers(heap: &Heap) -> impl Iterator<Item = *mut ObjectHeader> + '_ {
    heap.remembered_set.iter()
}
