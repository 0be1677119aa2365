//! Garbage collector metadata
//!
//! The header word every heap object carries, the object heap owned by a
//! loaded program, and the root regions the collector scans. The collection
//! algorithm itself lives outside this crate.

mod header;
mod heap;
mod roots;

pub use header::{
    HeaderWord, FORWARDED_SENTINEL, MARK_BIT, MAX_REF_COUNT, RC_MASK, RC_ONE, RC_SHIFT,
    REACHABLE_MASK, TYPE_ID_MASK, UNUSED_MASK, YOUNG_BIT,
};
pub use heap::{Heap, HeapError, HeapObject, ObjectRef};
pub use roots::{RootError, RootRegion, RootSet};
