//! The GC-managed object model: the common header plus the three
//! concrete object layouts (`String`, `Array`, `Dict`) built on top of it.

pub mod array_obj;
pub mod dict_obj;
pub mod header;
pub mod string_obj;

pub use array_obj::ArrayObj;
pub use dict_obj::{DictObj, KeySlot};
pub use header::{ObjKind, ObjectHeader, RegionTag, HEADER_ALIGN, HEADER_SIZE};
pub use string_obj::StringObj;
