//! Dense runtime identifiers
//!
//! Every name the front end emits is interned into one of these ID spaces
//! during assembly loading. IDs index flat tables directly.

use std::fmt;

/// Number of usable TypeID bits in an object header word.
pub const TYPE_ID_BITS: u32 = 20;

/// Largest TypeID representable in a header word.
pub const MAX_TYPE_ID: u32 = (1 << TYPE_ID_BITS) - 1;

/// Dense type identifier, an index into the type table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u32);

impl TypeId {
    /// `None`
    pub const NONE: TypeId = TypeId(0);
    /// `Nothing`
    pub const NOTHING: TypeId = TypeId(1);
    /// `Bool`
    pub const BOOL: TypeId = TypeId(2);
    /// `Nat`
    pub const NAT: TypeId = TypeId(3);
    /// `Int`
    pub const INT: TypeId = TypeId(4);
    /// `BigNat`
    pub const BIG_NAT: TypeId = TypeId(5);
    /// `BigInt`
    pub const BIG_INT: TypeId = TypeId(6);
    /// `Float`
    pub const FLOAT: TypeId = TypeId(7);
    /// `Decimal`
    pub const DECIMAL: TypeId = TypeId(8);
    /// `Rational`
    pub const RATIONAL: TypeId = TypeId(9);
    /// `String`
    pub const STRING: TypeId = TypeId(10);
    /// `@ByteBufferLeaf`
    pub const BYTE_BUFFER_LEAF: TypeId = TypeId(11);
    /// `@ByteBufferNode`
    pub const BYTE_BUFFER_NODE: TypeId = TypeId(12);
    /// `ByteBuffer`
    pub const BYTE_BUFFER: TypeId = TypeId(13);
    /// `DateTime`
    pub const DATE_TIME: TypeId = TypeId(14);
    /// `TickTime`
    pub const TICK_TIME: TypeId = TypeId(15);
    /// `LogicalTime`
    pub const LOGICAL_TIME: TypeId = TypeId(16);
    /// `UUID`
    pub const UUID: TypeId = TypeId(17);
    /// `ContentHash`
    pub const CONTENT_HASH: TypeId = TypeId(18);
    /// `Regex`
    pub const REGEX: TypeId = TypeId(19);
    /// `@StringK16`
    pub const STRING_K16: TypeId = TypeId(20);
    /// `@StringK32`
    pub const STRING_K32: TypeId = TypeId(21);
    /// `@StringK64`
    pub const STRING_K64: TypeId = TypeId(22);
    /// `@StringK96`
    pub const STRING_K96: TypeId = TypeId(23);
    /// `@StringK128`
    pub const STRING_K128: TypeId = TypeId(24);
    /// `@StringTree`
    pub const STRING_TREE: TypeId = TypeId(25);

    /// Number of reserved IDs; user-declared types start here.
    pub const FIRST_DYNAMIC: u32 = 26;

    /// Wrap a raw index.
    #[inline]
    pub const fn new(raw: u32) -> Self {
        TypeId(raw)
    }

    /// Raw index value.
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Index into the type table.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Whether this is one of the 26 pre-seeded IDs.
    #[inline]
    pub const fn is_well_known(self) -> bool {
        self.0 < Self::FIRST_DYNAMIC
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

macro_rules! dense_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            /// Wrap a raw index.
            #[inline]
            pub const fn new(raw: u32) -> Self {
                $name(raw)
            }

            /// Raw index value.
            #[inline]
            pub const fn as_u32(self) -> u32 {
                self.0
            }

            /// Index into the owning table.
            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "#{}", self.0)
            }
        }
    };
}

dense_id!(
    /// Record property identifier.
    PropertyId
);
dense_id!(
    /// Entity/struct field identifier, an index into the field table.
    FieldId
);
dense_id!(
    /// Callable identifier, an index into the invoke table.
    InvokeId
);
dense_id!(
    /// Virtual callable identifier.
    VirtualInvokeId
);
dense_id!(
    /// Index into the loaded regex table.
    RegexId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_known_boundary() {
        assert!(TypeId::STRING_TREE.is_well_known());
        assert!(!TypeId::new(TypeId::FIRST_DYNAMIC).is_well_known());
        assert_eq!(TypeId::STRING_TREE.as_u32() + 1, TypeId::FIRST_DYNAMIC);
    }

    #[test]
    fn test_max_type_id_fits_header() {
        assert_eq!(MAX_TYPE_ID, 0xF_FFFF);
    }

    #[test]
    fn test_display() {
        assert_eq!(TypeId::REGEX.to_string(), "#19");
        assert_eq!(FieldId::new(3).to_string(), "#3");
    }
}
