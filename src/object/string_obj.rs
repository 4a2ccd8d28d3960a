//! String object: header + cached length/hash + an immutable byte payload
//! stored inline immediately after the header.

use crate::object::header::{ObjectHeader, RegionTag, HEADER_ALIGN};
use crate::util::Alignment;
use std::mem::size_of;
use std::ptr;

/// Hash value meaning "not yet computed". A real FNV-1a hash of 0 is
/// remapped to 1 when materialized, so `0` unambiguously means "lazy".
pub const HASH_UNCOMPUTED: u64 = 0;

#[repr(C)]
pub struct StringObj {
    pub header: ObjectHeader,
    pub len: u32,
    hash: u64,
}

impl StringObj {
    pub const FIXED_SIZE: usize = size_of::<StringObj>();

    /// Total bytes this string will occupy, header and payload included,
    /// rounded up to `HEADER_ALIGN`.
    pub fn total_size(len: usize) -> usize {
        Alignment::align_up(Self::FIXED_SIZE + len, HEADER_ALIGN)
    }

    /// # Safety
    /// `at` must be valid for writes of `Self::total_size(bytes.len())`
    /// bytes.
    pub unsafe fn init(at: *mut StringObj, region: RegionTag, bytes: &[u8]) {
        let total = Self::total_size(bytes.len()) as u32;
        ObjectHeader::init(at as *mut ObjectHeader, crate::object::ObjKind::Str, region, total);
        ptr::addr_of_mut!((*at).len).write(bytes.len() as u32);
        ptr::addr_of_mut!((*at).hash).write(HASH_UNCOMPUTED);
        let payload = Self::payload_ptr(at);
        ptr::copy_nonoverlapping(bytes.as_ptr(), payload, bytes.len());
    }

    /// # Safety
    /// `s` must point at a valid, initialized `StringObj`.
    pub unsafe fn payload_ptr(s: *mut StringObj) -> *mut u8 {
        (s as *mut u8).add(Self::FIXED_SIZE)
    }

    /// # Safety
    /// `s` must point at a valid, initialized `StringObj` whose payload
    /// outlives the returned borrow.
    pub unsafe fn as_bytes<'a>(s: *const StringObj) -> &'a [u8] {
        let len = (*s).len as usize;
        std::slice::from_raw_parts(Self::payload_ptr(s as *mut StringObj), len)
    }

    /// Seed the cached hash with a caller-supplied value, skipping lazy
    /// materialization (spec §6 `make_string`'s `hash` argument). `0`
    /// leaves it uncomputed, matching `init`'s default.
    ///
    /// # Safety
    /// `s` must point at a valid, initialized `StringObj`.
    pub unsafe fn set_hash(s: *mut StringObj, hash: u64) {
        (*s).hash = hash;
    }

    /// Materialize (and cache) the FNV-1a hash of this string's bytes.
    ///
    /// # Safety
    /// `s` must point at a valid, initialized `StringObj`.
    pub unsafe fn hash(s: *mut StringObj) -> u64 {
        if (*s).hash != HASH_UNCOMPUTED {
            return (*s).hash;
        }
        let bytes = Self::as_bytes(s);
        let mut h = fnv1a(bytes);
        if h == HASH_UNCOMPUTED {
            h = 1;
        }
        (*s).hash = h;
        h
    }
}

/// Standard FNV-1a over raw bytes (64-bit variant).
pub fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;
    let mut hash = OFFSET_BASIS;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}
