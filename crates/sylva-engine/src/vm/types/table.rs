//! Flat, ID-indexed type and field tables
//!
//! Both tables are sized once from the name registry and filled during load.
//! After load they are only read.

use thiserror::Error;

use super::descriptor::TypeDescriptor;
use super::ids::{FieldId, TypeId};
use super::well_known::well_known_descriptors;

/// Errors raised when filling a table slot
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    /// The ID does not fit the table
    #[error("{table} slot {index} is out of range (table size {len})")]
    OutOfRange {
        /// Which table
        table: &'static str,
        /// Requested slot
        index: usize,
        /// Table size
        len: usize,
    },

    /// The slot already holds a declaration
    #[error("{table} slot {index} is declared twice")]
    Duplicate {
        /// Which table
        table: &'static str,
        /// Slot index
        index: usize,
    },
}

/// Table of type descriptors, indexed by [`TypeId`].
#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    slots: Vec<Option<TypeDescriptor>>,
}

impl TypeTable {
    /// Create a table of `len` slots with the reserved descriptors seeded.
    ///
    /// `len` is clamped up so the reserved IDs always fit.
    pub fn new(len: usize) -> Self {
        let seeded = well_known_descriptors();
        let mut slots: Vec<Option<TypeDescriptor>> = Vec::with_capacity(len.max(seeded.len()));
        slots.extend(seeded.iter().cloned().map(Some));
        slots.resize(len.max(seeded.len()), None);
        Self { slots }
    }

    /// Store a descriptor at its own ID.
    pub fn insert(&mut self, desc: TypeDescriptor) -> Result<(), TableError> {
        let index = desc.tid.index();
        let len = self.slots.len();
        let slot = self.slots.get_mut(index).ok_or(TableError::OutOfRange {
            table: "type",
            index,
            len,
        })?;
        if slot.is_some() {
            return Err(TableError::Duplicate {
                table: "type",
                index,
            });
        }
        *slot = Some(desc);
        Ok(())
    }

    /// Descriptor for an ID, if one was loaded.
    #[inline]
    pub fn get(&self, tid: TypeId) -> Option<&TypeDescriptor> {
        self.slots.get(tid.index()).and_then(Option::as_ref)
    }

    /// Whether a descriptor exists for an ID.
    pub fn contains(&self, tid: TypeId) -> bool {
        self.get(tid).is_some()
    }

    /// Number of slots (the size of the type ID space).
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the table has no slots.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of slots holding a descriptor.
    pub fn populated(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// IDs that were interned but never given a descriptor.
    pub fn missing(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_none())
            .map(|(idx, _)| TypeId::new(idx as u32))
    }

    /// Iterate over loaded descriptors in ID order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeDescriptor> + '_ {
        self.slots.iter().filter_map(Option::as_ref)
    }
}

/// Declared field of an entity or struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Field ID
    pub fkey: FieldId,
    /// Declared field name
    pub name: String,
    /// Declared type
    pub declared_type: TypeId,
    /// Whether the field may be absent
    pub is_optional: bool,
}

/// Table of field descriptors, indexed by [`FieldId`].
#[derive(Debug, Clone, Default)]
pub struct FieldTable {
    slots: Vec<Option<FieldDescriptor>>,
}

impl FieldTable {
    /// Create an empty table with `len` slots.
    pub fn new(len: usize) -> Self {
        Self {
            slots: vec![None; len],
        }
    }

    /// Store a field at its own ID.
    pub fn insert(&mut self, field: FieldDescriptor) -> Result<(), TableError> {
        let index = field.fkey.index();
        let len = self.slots.len();
        let slot = self.slots.get_mut(index).ok_or(TableError::OutOfRange {
            table: "field",
            index,
            len,
        })?;
        if slot.is_some() {
            return Err(TableError::Duplicate {
                table: "field",
                index,
            });
        }
        *slot = Some(field);
        Ok(())
    }

    /// Field for an ID.
    pub fn get(&self, fkey: FieldId) -> Option<&FieldDescriptor> {
        self.slots.get(fkey.index()).and_then(Option::as_ref)
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the table has no slots.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::types::descriptor::{SizeInfo, TypeKind};

    fn register(tid: u32, name: &str) -> TypeDescriptor {
        TypeDescriptor::new(TypeId::new(tid), name, SizeInfo::register(8, 8), TypeKind::Register)
    }

    #[test]
    fn test_new_table_is_seeded() {
        let table = TypeTable::new(26);
        assert_eq!(table.len(), 26);
        assert_eq!(table.populated(), 26);
        assert_eq!(table.get(TypeId::STRING).map(|d| d.name.as_str()), Some("String"));
    }

    #[test]
    fn test_small_len_still_fits_reserved_ids() {
        let table = TypeTable::new(0);
        assert_eq!(table.len(), 26);
    }

    #[test]
    fn test_insert_dynamic_type() {
        let mut table = TypeTable::new(28);
        table.insert(register(26, "Main::A")).unwrap();
        assert!(table.contains(TypeId::new(26)));
        assert!(!table.contains(TypeId::new(27)));
        assert_eq!(table.missing().collect::<Vec<_>>(), vec![TypeId::new(27)]);
    }

    #[test]
    fn test_insert_rejects_duplicate() {
        let mut table = TypeTable::new(27);
        table.insert(register(26, "Main::A")).unwrap();
        let err = table.insert(register(26, "Main::A")).unwrap_err();
        assert_eq!(err, TableError::Duplicate { table: "type", index: 26 });
    }

    #[test]
    fn test_insert_rejects_reserved_slot() {
        let mut table = TypeTable::new(26);
        assert!(table.insert(register(3, "Nat")).is_err());
    }

    #[test]
    fn test_insert_rejects_out_of_range() {
        let mut table = TypeTable::new(26);
        let err = table.insert(register(40, "Main::Far")).unwrap_err();
        assert!(matches!(err, TableError::OutOfRange { index: 40, .. }));
    }

    #[test]
    fn test_field_table() {
        let mut fields = FieldTable::new(2);
        fields
            .insert(FieldDescriptor {
                fkey: FieldId::new(1),
                name: "x".to_string(),
                declared_type: TypeId::INT,
                is_optional: false,
            })
            .unwrap();
        assert_eq!(fields.get(FieldId::new(1)).map(|f| f.name.as_str()), Some("x"));
        assert!(fields.get(FieldId::new(0)).is_none());
        assert!(fields
            .insert(FieldDescriptor {
                fkey: FieldId::new(5),
                name: "y".to_string(),
                declared_type: TypeId::INT,
                is_optional: true,
            })
            .is_err());
    }
}
