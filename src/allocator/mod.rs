//! Allocator module: the two concrete allocation strategies the heap's
//! three regions are built from (spec §4.1, §4.2).
//!
//! - [`bump::BumpArena`]: bump-pointer arena backing the nursery and each
//!   graduate semi-space. O(1) allocation, wholesale reclamation.
//! - [`freelist::FreeList`]: first-fit, non-splitting allocator backing the
//!   tenure region, with per-block size-word headers mark-sweep and
//!   compaction walk directly.
//!
pub mod bump;
pub mod freelist;

pub use bump::BumpArena;
pub use freelist::FreeList;

// Allocation dispatch across the nursery/graduate/tenure regions (§4.3) is
// owned by `heap::Heap`, which composes a `BumpArena` per bump region and
// one `FreeList` for tenure rather than a standalone `Allocator` facade.
