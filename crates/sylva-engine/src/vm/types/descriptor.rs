//! Runtime type descriptors
//!
//! One [`TypeDescriptor`] exists per loaded type. The variant-specific data
//! lives in [`TypeKind`], so code that needs e.g. the entry type of a partial
//! vector matches on the kind instead of casting.

use std::fmt;

use super::ids::{FieldId, TypeId};
use super::mask::{MaskSymbol, RefMask, WORD_SIZE};

/// Physical layout family of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutKind {
    /// Fixed-size scalar stored by value
    Register,
    /// Inline composite without identity
    Struct,
    /// A struct wrapped behind a pointer slot
    BoxedStruct,
    /// String value slot
    String,
    /// Big number value slot
    BigNum,
    /// Heap object with identity
    Ref,
    /// Union whose members are all references
    UnionRef,
    /// Union stored inline with a type tag word
    UnionInline,
    /// Union wide enough for any value
    UnionUniversal,
}

impl fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LayoutKind::Register => "Register",
            LayoutKind::Struct => "Struct",
            LayoutKind::BoxedStruct => "BoxedStruct",
            LayoutKind::String => "String",
            LayoutKind::BigNum => "BigNum",
            LayoutKind::Ref => "Ref",
            LayoutKind::UnionRef => "UnionRef",
            LayoutKind::UnionInline => "UnionInline",
            LayoutKind::UnionUniversal => "UnionUniversal",
        };
        f.write_str(name)
    }
}

/// Size and trace information of a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeInfo {
    /// Bytes of the heap-resident form, excluding the header word
    pub heapsize: u64,
    /// Bytes the type occupies in a storage slot (including any inline tag)
    pub inlinedatasize: u64,
    /// Bytes copied on assignment (1 for `Bool`, otherwise `inlinedatasize`)
    pub assigndatasize: u64,
    /// Trace mask for the heap form; `None` when it holds no pointers
    pub heapmask: Option<RefMask>,
    /// Trace mask for the inline form, covering all of `inlinedatasize`
    pub inlinedmask: RefMask,
}

impl SizeInfo {
    /// Layout of a single scalar word.
    pub fn register(inline: u64, assign: u64) -> Self {
        Self {
            heapsize: 0,
            inlinedatasize: inline,
            assigndatasize: assign,
            heapmask: None,
            inlinedmask: RefMask::from_symbols(vec![MaskSymbol::Skip; words(inline)]),
        }
    }

    /// Layout of a heap object referenced through one pointer word.
    pub fn reference(heapsize: u64, heapmask: Option<RefMask>) -> Self {
        Self {
            heapsize,
            inlinedatasize: WORD_SIZE as u64,
            assigndatasize: WORD_SIZE as u64,
            heapmask,
            inlinedmask: RefMask::from_symbols(vec![MaskSymbol::Pointer]),
        }
    }

    /// Whether the heap form needs tracing at all.
    pub fn heap_has_pointers(&self) -> bool {
        self.heapmask.as_ref().is_some_and(|m| m.has_pointers())
    }
}

fn words(bytes: u64) -> usize {
    bytes.div_ceil(WORD_SIZE as u64) as usize
}

/// Which backing representation a string-family type is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringRepr {
    /// Fixed-capacity heap buffer holding up to `capacity` bytes
    KRepr {
        /// Capacity in bytes
        capacity: u32,
    },
    /// Concatenation tree for long strings
    Tree,
}

/// Field layout of a struct or entity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldLayout {
    /// Field IDs in declaration order
    pub fields: Vec<FieldId>,
    /// Byte offset of each field in the same order
    pub offsets: Vec<u64>,
}

impl FieldLayout {
    /// Byte offset of a field, if the layout contains it.
    pub fn offset_of(&self, field: FieldId) -> Option<u64> {
        self.fields
            .iter()
            .position(|&f| f == field)
            .map(|idx| self.offsets[idx])
    }
}

/// Variant-specific part of a type descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    /// Scalar register value
    Register,
    /// Inline struct
    Struct(FieldLayout),
    /// Boxed struct wrapping `oftype`
    BoxedStruct {
        /// The wrapped struct type
        oftype: TypeId,
    },
    /// The `String` value type
    String,
    /// A string backing representation
    StringRepr(StringRepr),
    /// Big number value type
    BigNum,
    /// Heap entity
    Ref(FieldLayout),
    /// Small list chunk of 4 or 8 entries
    PartialVector {
        /// Element type
        entrytype: TypeId,
        /// Element capacity
        capacity: u32,
    },
    /// Tree node of a large list
    ListTree {
        /// Element type
        entrytype: TypeId,
    },
    /// Tree node of a map
    MapTree {
        /// Key type
        keytype: TypeId,
        /// Value type
        valuetype: TypeId,
    },
    /// Reference-only union
    UnionRef {
        /// Member types
        subtypes: Vec<TypeId>,
    },
    /// Inline tagged union
    UnionInline {
        /// Member types
        subtypes: Vec<TypeId>,
    },
    /// Universal union
    UnionUniversal {
        /// Member types
        subtypes: Vec<TypeId>,
    },
}

impl TypeKind {
    /// Layout family of this kind.
    pub fn layout(&self) -> LayoutKind {
        match self {
            TypeKind::Register => LayoutKind::Register,
            TypeKind::Struct(_) => LayoutKind::Struct,
            TypeKind::BoxedStruct { .. } => LayoutKind::BoxedStruct,
            TypeKind::String => LayoutKind::String,
            TypeKind::BigNum => LayoutKind::BigNum,
            TypeKind::StringRepr(_)
            | TypeKind::Ref(_)
            | TypeKind::PartialVector { .. }
            | TypeKind::ListTree { .. }
            | TypeKind::MapTree { .. } => LayoutKind::Ref,
            TypeKind::UnionRef { .. } => LayoutKind::UnionRef,
            TypeKind::UnionInline { .. } => LayoutKind::UnionInline,
            TypeKind::UnionUniversal { .. } => LayoutKind::UnionUniversal,
        }
    }

    /// Short name of the declaration kind, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            TypeKind::Register => "Register",
            TypeKind::Struct(_) => "Struct",
            TypeKind::BoxedStruct { .. } => "BoxedStruct",
            TypeKind::String => "String",
            TypeKind::StringRepr(_) => "StringRepr",
            TypeKind::BigNum => "BigNum",
            TypeKind::Ref(_) => "Ref",
            TypeKind::PartialVector { .. } => "PartialVector",
            TypeKind::ListTree { .. } => "ListTree",
            TypeKind::MapTree { .. } => "MapTree",
            TypeKind::UnionRef { .. } => "UnionRef",
            TypeKind::UnionInline { .. } => "UnionInline",
            TypeKind::UnionUniversal { .. } => "UnionUniversal",
        }
    }
}

/// Runtime type descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    /// Index of this descriptor in the type table
    pub tid: TypeId,
    /// Display name
    pub name: String,
    /// Size and mask information
    pub size: SizeInfo,
    /// Variant-specific data
    pub kind: TypeKind,
}

impl TypeDescriptor {
    /// Create a descriptor.
    pub fn new(tid: TypeId, name: impl Into<String>, size: SizeInfo, kind: TypeKind) -> Self {
        Self {
            tid,
            name: name.into(),
            size,
            kind,
        }
    }

    /// Layout family.
    #[inline]
    pub fn layout(&self) -> LayoutKind {
        self.kind.layout()
    }

    /// Whether values of this type can be heap allocated with a header word.
    pub fn has_heap_form(&self) -> bool {
        matches!(
            self.layout(),
            LayoutKind::Ref | LayoutKind::BoxedStruct
        )
    }

    /// Whether the inline form contains anything the collector must visit.
    pub fn inline_has_pointers(&self) -> bool {
        self.size.inlinedmask.has_pointers()
    }

    /// Member types when this is any union kind.
    pub fn union_members(&self) -> Option<&[TypeId]> {
        match &self.kind {
            TypeKind::UnionRef { subtypes }
            | TypeKind::UnionInline { subtypes }
            | TypeKind::UnionUniversal { subtypes } => Some(subtypes),
            _ => None,
        }
    }

    /// Field layout when this is a struct or entity.
    pub fn field_layout(&self) -> Option<&FieldLayout> {
        match &self.kind {
            TypeKind::Struct(layout) | TypeKind::Ref(layout) => Some(layout),
            _ => None,
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.tid, self.name, self.kind.kind_name())
    }
}
