//! Runtime type model
//!
//! Dense IDs, reference masks, type descriptors, the reserved descriptor
//! table, and the flat tables a loaded program indexes by ID.

mod descriptor;
mod ids;
mod mask;
mod table;
mod well_known;

pub use descriptor::{FieldLayout, LayoutKind, SizeInfo, StringRepr, TypeDescriptor, TypeKind};
pub use ids::{
    FieldId, InvokeId, PropertyId, RegexId, TypeId, VirtualInvokeId, MAX_TYPE_ID, TYPE_ID_BITS,
};
pub use mask::{
    round_up_to_word, MaskError, MaskSlot, MaskSymbol, RefMask, UNION_UNIVERSAL_CONTENT_SIZE,
    UNION_UNIVERSAL_MASK, UNION_UNIVERSAL_SIZE, WORD_SIZE,
};
pub use table::{FieldDescriptor, FieldTable, TableError, TypeTable};
pub use well_known::{
    well_known_descriptors, well_known_id, BYTE_BUFFER_LEAF_SIZE, STRING_K_REPRS,
    WELL_KNOWN_TYPE_NAMES,
};
