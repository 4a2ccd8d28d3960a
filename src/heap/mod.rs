//! Heap management: the three GC regions (spec §3, §4.1, §4.2) and the
//! intrusive live lists threaded through their objects.
//!
//! - **Nursery**: one [`BumpArena`].
//! - **Graduate**: two [`BumpArena`]s, `graduate[0]`/`graduate[1]`, one of
//!   which is always "from" and the other "to"; a young GC copies survivors
//!   from one into the other and then flips which is which.
//! - **Tenure**: one [`FreeList`].
//!
//! Each region has a live list (`LiveList<RegionLink>`); tenured containers
//! known to reference a young object additionally sit in the
//! `remembered_set` (`LiveList<RememberedLink>`), per spec §4.7.

pub mod live_list;

pub use live_list::{LiveList, RegionLink, RememberedLink};

use crate::allocator::{BumpArena, FreeList};
use crate::config::GcConfig;
use crate::error::Result;
use crate::object::header::{ObjectHeader, RegionTag};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Owns the three regions' backing storage and live lists. Does not itself
/// implement allocation dispatch or collection (spec §4.3-§4.6) — those
/// live in `gc`, which calls into this struct's allocators and lists.
pub struct Heap {
    pub nursery: BumpArena,
    /// Index 0/1 graduate semi-spaces; `graduate_from_idx` says which is
    /// currently "from".
    pub graduate: [BumpArena; 2],
    graduate_from_idx: AtomicUsize,
    pub tenure: FreeList,

    pub nursery_list: LiveList<RegionLink>,
    pub graduate_list: LiveList<RegionLink>,
    pub tenure_list: LiveList<RegionLink>,
    pub remembered_set: LiveList<RememberedLink>,

    config: Arc<GcConfig>,
}

impl Heap {
    pub fn new(config: Arc<GcConfig>) -> Result<Self> {
        let graduate_half = config.graduate_size / 2;
        Ok(Self {
            nursery: BumpArena::new(config.nursery_size, RegionTag::Nursery, "nursery"),
            graduate: [
                BumpArena::new(graduate_half, RegionTag::Graduate, "graduate"),
                BumpArena::new(graduate_half, RegionTag::Graduate, "graduate"),
            ],
            graduate_from_idx: AtomicUsize::new(0),
            tenure: FreeList::new(config.tenure_size, "tenure"),
            nursery_list: LiveList::new(),
            graduate_list: LiveList::new(),
            tenure_list: LiveList::new(),
            remembered_set: LiveList::new(),
            config,
        })
    }

    pub fn config(&self) -> &GcConfig {
        &self.config
    }

    pub fn graduate_from(&self) -> &BumpArena {
        &self.graduate[self.graduate_from_idx.load(Ordering::Acquire)]
    }

    pub fn graduate_to(&self) -> &BumpArena {
        &self.graduate[1 - self.graduate_from_idx.load(Ordering::Acquire)]
    }

    /// Flip which graduate semi-space is "from" — the last step of a young
    /// GC (spec §4.4 step 5), once the old from-space has been unwound.
    pub fn flip_graduate_spaces(&self) {
        self.graduate_from_idx
            .fetch_xor(1, Ordering::AcqRel);
    }

    /// Link a freshly allocated (or evacuated/promoted) object into the
    /// live list of its header's current region.
    ///
    /// # Safety
    /// `header` must be valid and not already linked into a live list.
    pub unsafe fn link_new(&self, header: *mut ObjectHeader) {
        match (*header).region {
            RegionTag::Nursery => self.nursery_list.push_front(header),
            RegionTag::Graduate => self.graduate_list.push_front(header),
            RegionTag::Tenure => self.tenure_list.push_front(header),
        }
    }

    /// Unwind the nursery arena and drop its live list wholesale (spec
    /// §4.4 step 5: nursery reclamation is always total after a young GC).
    ///
    /// # Safety
    /// Every live nursery object must already have been evacuated
    /// elsewhere; no concurrent allocation or list mutation may be in
    /// flight.
    pub unsafe fn reset_nursery(&self) {
        self.nursery.reset();
        self.nursery_list.clear();
    }

    /// Unwind the graduate "from" arena after a young GC has copied its
    /// survivors out.
    ///
    /// # Safety
    /// Every live object in the from-space must already have been copied
    /// to the to-space or promoted to tenure; no concurrent allocation may
    /// be in flight.
    pub unsafe fn reset_graduate_from(&self) {
        self.graduate_from().reset();
    }

    pub fn stats(&self) -> HeapStats {
        HeapStats {
            nursery_used: self.nursery.used(),
            nursery_capacity: self.nursery.capacity(),
            graduate_used: self.graduate_from().used() + self.graduate_to().used(),
            graduate_capacity: self.graduate[0].capacity() + self.graduate[1].capacity(),
            tenure_used: self.tenure.high_water(),
            tenure_capacity: self.tenure.capacity(),
        }
    }
}

/// Snapshot of per-region occupancy, surfaced through the public API's
/// diagnostics (spec §6).
#[derive(Debug, Default, Clone, Copy)]
pub struct HeapStats {
    pub nursery_used: usize,
    pub nursery_capacity: usize,
    pub graduate_used: usize,
    pub graduate_capacity: usize,
    pub tenure_used: usize,
    pub tenure_capacity: usize,
}
