//! Pre-seeded descriptors for the 26 reserved type IDs

use once_cell::sync::Lazy;

use super::descriptor::{FieldLayout, SizeInfo, StringRepr, TypeDescriptor, TypeKind};
use super::ids::TypeId;
use super::mask::RefMask;

/// Reserved type names and their fixed IDs, in ID order.
pub const WELL_KNOWN_TYPE_NAMES: [(&str, TypeId); 26] = [
    ("None", TypeId::NONE),
    ("Nothing", TypeId::NOTHING),
    ("Bool", TypeId::BOOL),
    ("Nat", TypeId::NAT),
    ("Int", TypeId::INT),
    ("BigNat", TypeId::BIG_NAT),
    ("BigInt", TypeId::BIG_INT),
    ("Float", TypeId::FLOAT),
    ("Decimal", TypeId::DECIMAL),
    ("Rational", TypeId::RATIONAL),
    ("String", TypeId::STRING),
    ("@ByteBufferLeaf", TypeId::BYTE_BUFFER_LEAF),
    ("@ByteBufferNode", TypeId::BYTE_BUFFER_NODE),
    ("ByteBuffer", TypeId::BYTE_BUFFER),
    ("DateTime", TypeId::DATE_TIME),
    ("TickTime", TypeId::TICK_TIME),
    ("LogicalTime", TypeId::LOGICAL_TIME),
    ("UUID", TypeId::UUID),
    ("ContentHash", TypeId::CONTENT_HASH),
    ("Regex", TypeId::REGEX),
    ("@StringK16", TypeId::STRING_K16),
    ("@StringK32", TypeId::STRING_K32),
    ("@StringK64", TypeId::STRING_K64),
    ("@StringK96", TypeId::STRING_K96),
    ("@StringK128", TypeId::STRING_K128),
    ("@StringTree", TypeId::STRING_TREE),
];

/// Fixed-capacity string representations, smallest first.
pub const STRING_K_REPRS: [(TypeId, u32); 5] = [
    (TypeId::STRING_K16, 16),
    (TypeId::STRING_K32, 32),
    (TypeId::STRING_K64, 64),
    (TypeId::STRING_K96, 96),
    (TypeId::STRING_K128, 128),
];

/// Bytes in a `@ByteBufferLeaf` payload.
pub const BYTE_BUFFER_LEAF_SIZE: u64 = 256;

static WELL_KNOWN: Lazy<Vec<TypeDescriptor>> = Lazy::new(build_well_known);

/// The reserved descriptors, indexed by their TypeID.
pub fn well_known_descriptors() -> &'static [TypeDescriptor] {
    &WELL_KNOWN
}

/// Look up a reserved type name.
pub fn well_known_id(name: &str) -> Option<TypeId> {
    WELL_KNOWN_TYPE_NAMES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|&(_, tid)| tid)
}

fn mask(text: &str) -> RefMask {
    // Only called with the literal masks below.
    RefMask::parse(text).unwrap_or_default()
}

fn inline(bytes: u64, inlinedmask: &str) -> SizeInfo {
    SizeInfo {
        heapsize: bytes,
        inlinedatasize: bytes,
        assigndatasize: bytes,
        heapmask: None,
        inlinedmask: mask(inlinedmask),
    }
}

fn build_well_known() -> Vec<TypeDescriptor> {
    WELL_KNOWN_TYPE_NAMES
        .iter()
        .map(|&(name, tid)| {
            let (size, kind) = match tid {
                TypeId::BOOL => (SizeInfo::register(8, 1), TypeKind::Register),
                TypeId::NONE
                | TypeId::NOTHING
                | TypeId::NAT
                | TypeId::INT
                | TypeId::FLOAT
                | TypeId::DECIMAL
                | TypeId::TICK_TIME
                | TypeId::LOGICAL_TIME
                | TypeId::REGEX => (SizeInfo::register(8, 8), TypeKind::Register),
                TypeId::BIG_NAT | TypeId::BIG_INT => (inline(16, "4"), TypeKind::BigNum),
                TypeId::RATIONAL => (inline(24, "41"), TypeKind::Struct(FieldLayout::default())),
                TypeId::DATE_TIME | TypeId::UUID => {
                    (inline(16, "11"), TypeKind::Struct(FieldLayout::default()))
                }
                TypeId::STRING => (
                    SizeInfo {
                        heapsize: 0,
                        inlinedatasize: 16,
                        assigndatasize: 16,
                        heapmask: None,
                        inlinedmask: mask("3"),
                    },
                    TypeKind::String,
                ),
                TypeId::BYTE_BUFFER_LEAF => (
                    SizeInfo::reference(BYTE_BUFFER_LEAF_SIZE + 8, None),
                    TypeKind::Ref(FieldLayout::default()),
                ),
                TypeId::BYTE_BUFFER_NODE => (
                    SizeInfo::reference(24, Some(mask("22"))),
                    TypeKind::Ref(FieldLayout::default()),
                ),
                TypeId::BYTE_BUFFER => (
                    SizeInfo::reference(24, Some(mask("2"))),
                    TypeKind::Ref(FieldLayout::default()),
                ),
                TypeId::CONTENT_HASH => (
                    SizeInfo::reference(64, None),
                    TypeKind::Ref(FieldLayout::default()),
                ),
                TypeId::STRING_TREE => (
                    SizeInfo::reference(24, Some(mask("22"))),
                    TypeKind::StringRepr(StringRepr::Tree),
                ),
                _ => {
                    let capacity = STRING_K_REPRS
                        .iter()
                        .find(|(k, _)| *k == tid)
                        .map(|&(_, cap)| cap)
                        .unwrap_or(0);
                    (
                        SizeInfo::reference(u64::from(capacity), None),
                        TypeKind::StringRepr(StringRepr::KRepr { capacity }),
                    )
                }
            };
            TypeDescriptor::new(tid, name, size, kind)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::types::descriptor::LayoutKind;
    use crate::vm::types::mask::round_up_to_word;

    #[test]
    fn test_descriptors_sit_at_their_ids() {
        let table = well_known_descriptors();
        assert_eq!(table.len(), 26);
        for (idx, desc) in table.iter().enumerate() {
            assert_eq!(desc.tid.index(), idx, "{} out of place", desc.name);
        }
    }

    #[test]
    fn test_names_resolve() {
        assert_eq!(well_known_id("Bool"), Some(TypeId::BOOL));
        assert_eq!(well_known_id("@StringTree"), Some(TypeId::STRING_TREE));
        assert_eq!(well_known_id("Main::Foo"), None);
    }

    #[test]
    fn test_bool_assigns_one_byte() {
        let bool_desc = &well_known_descriptors()[TypeId::BOOL.index()];
        assert_eq!(bool_desc.size.inlinedatasize, 8);
        assert_eq!(bool_desc.size.assigndatasize, 1);
    }

    #[test]
    fn test_inline_masks_cover_slots() {
        for desc in well_known_descriptors() {
            assert_eq!(
                desc.size.inlinedmask.covered_bytes() as u64,
                round_up_to_word(desc.size.inlinedatasize),
                "{}",
                desc.name
            );
        }
    }

    #[test]
    fn test_k_repr_capacities() {
        let table = well_known_descriptors();
        for (tid, capacity) in STRING_K_REPRS {
            let desc = &table[tid.index()];
            assert_eq!(desc.layout(), LayoutKind::Ref);
            assert_eq!(desc.size.heapsize, u64::from(capacity));
            assert_eq!(desc.kind, TypeKind::StringRepr(StringRepr::KRepr { capacity }));
        }
    }
}
