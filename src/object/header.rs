//! The common header embedded at the start of every managed object.
//!
//! Layout (on a 64-bit target):
//! ```text
//! ┌───────────┬────────────┬──────────┬──────────┬──────────────────┐
//! │ kind (1B) │ region(1B) │ marked/  │ promotion│ size (4B)        │
//! │           │            │ remset   │ count(1B)│                  │
//! │           │            │ (1B each)│          │                  │
//! ├───────────┴────────────┴──────────┴──────────┴──────────────────┤
//! │ prev, next                (region live-list links, 2 words)     │
//! │ rem_prev, rem_next         (remembered-set links, 2 words)      │
//! │ forward                    (evacuation/promotion target)        │
//! └───────────────────────────────────────────────────────────────── ┘
//! ```
//!
//! All list links are raw pointers rather than indices. The remembered set
//! and the live lists are only ever walked during a stop-the-world phase,
//! so no atomic discipline is needed on these fields (see the concurrency
//! model's note that "the remembered set is not accessed outside STW").

use std::mem::size_of;
use std::ptr;

/// What a managed object actually is. Drives both the size computation at
/// allocation time and the dispatch used when a collector walks child
/// references.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjKind {
    Str = 0,
    Array = 1,
    Dict = 2,
}

/// Which of the three regions currently owns an object. Ordered so that
/// region monotonicity (an object's region never decreases) can be
/// checked with a plain `>=` comparison.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RegionTag {
    Nursery = 0,
    Graduate = 1,
    Tenure = 2,
}

#[repr(C)]
pub struct ObjectHeader {
    pub kind: ObjKind,
    pub region: RegionTag,
    pub is_marked: bool,
    pub rem_flag: bool,
    pub promotion_count: u8,
    _pad: [u8; 3],
    /// Total size in bytes of the object, header included. Needed by the
    /// tenure compactor's sequential block walk.
    pub size: u32,
    pub prev: *mut ObjectHeader,
    pub next: *mut ObjectHeader,
    pub rem_prev: *mut ObjectHeader,
    pub rem_next: *mut ObjectHeader,
    /// Set during evacuation/promotion/sweep-relocation; null otherwise.
    pub forward: *mut ObjectHeader,
}

pub const HEADER_SIZE: usize = size_of::<ObjectHeader>();
pub const HEADER_ALIGN: usize = std::mem::align_of::<usize>();

impl ObjectHeader {
    /// Initialize a freshly allocated header in place. `at` must point at
    /// a block of at least `size` bytes, aligned to `HEADER_ALIGN`.
    ///
    /// # Safety
    /// `at` must be valid for writes of `size_of::<ObjectHeader>()` bytes
    /// and not currently hold a live `ObjectHeader`.
    pub unsafe fn init(at: *mut ObjectHeader, kind: ObjKind, region: RegionTag, size: u32) {
        ptr::write(
            at,
            ObjectHeader {
                kind,
                region,
                is_marked: false,
                rem_flag: false,
                promotion_count: 0,
                _pad: [0; 3],
                size,
                prev: ptr::null_mut(),
                next: ptr::null_mut(),
                rem_prev: ptr::null_mut(),
                rem_next: ptr::null_mut(),
                forward: ptr::null_mut(),
            },
        );
    }

    /// Pointer to the first byte after the header — where the object's
    /// type-specific fields and payload begin.
    ///
    /// # Safety
    /// `header` must point at a valid, initialized `ObjectHeader`.
    pub unsafe fn payload_ptr(header: *mut ObjectHeader) -> *mut u8 {
        (header as *mut u8).add(HEADER_SIZE)
    }

    /// Bytes available after the header, i.e. `size - HEADER_SIZE`.
    ///
    /// # Safety
    /// `header` must point at a valid, initialized `ObjectHeader`.
    pub unsafe fn payload_size(header: *const ObjectHeader) -> usize {
        (*header).size as usize - HEADER_SIZE
    }

    /// Record that this object has survived one more young collection,
    /// saturating rather than overflowing (our plain `u8` saturates at
    /// 255, well above any realistic `promotion_threshold`).
    ///
    /// # Safety
    /// `header` must point at a valid, initialized `ObjectHeader`.
    pub unsafe fn bump_promotion_count(header: *mut ObjectHeader) {
        (*header).promotion_count = (*header).promotion_count.saturating_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_zeroes_links_and_forward() {
        let mut buf = [0u8; 128];
        let hp = buf.as_mut_ptr() as *mut ObjectHeader;
        unsafe {
            ObjectHeader::init(hp, ObjKind::Array, RegionTag::Nursery, 64);
            assert_eq!((*hp).size, 64);
            assert!((*hp).prev.is_null());
            assert!((*hp).forward.is_null());
            assert_eq!((*hp).promotion_count, 0);
            assert_eq!(ObjectHeader::payload_size(hp), 64 - HEADER_SIZE);
        }
    }

    #[test]
    fn region_ordering_models_monotonicity() {
        assert!(RegionTag::Tenure > RegionTag::Graduate);
        assert!(RegionTag::Graduate > RegionTag::Nursery);
    }

    #[test]
    fn promotion_count_saturates() {
        let mut buf = [0u8; 128];
        let hp = buf.as_mut_ptr() as *mut ObjectHeader;
        unsafe {
            ObjectHeader::init(hp, ObjKind::Array, RegionTag::Nursery, 64);
            (*hp).promotion_count = 255;
            ObjectHeader::bump_promotion_count(hp);
            assert_eq!((*hp).promotion_count, 255);
        }
    }
}
