//! Representation flavors for collection types
//!
//! A flavor records which physical types back a logical list or map: two
//! partial-vector tiers for small collections and a tree for large ones. List
//! flavors are keyed by entry type, map flavors by the (key, value) pair.

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::vm::types::TypeId;

/// Errors raised when registering a flavor
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlavorError {
    /// A list flavor for this entry type already exists
    #[error("duplicate list flavor for entry type {entry}")]
    DuplicateList {
        /// Entry type
        entry: TypeId,
    },

    /// A map flavor for this key/value pair already exists
    #[error("duplicate map flavor for ({key}, {value})")]
    DuplicateMap {
        /// Key type
        key: TypeId,
        /// Value type
        value: TypeId,
    },
}

/// Physical representation choice for one list type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListFlavor {
    /// Logical list type
    pub ltype: TypeId,
    /// Physical representation type
    pub reprtype: TypeId,
    /// Element type
    pub entrytype: TypeId,
    /// 4-element partial vector
    pub pv4type: TypeId,
    /// 8-element partial vector
    pub pv8type: TypeId,
    /// Tree representation
    pub treetype: TypeId,
}

/// Physical representation choice for one map type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapFlavor {
    /// Logical map type
    pub mtype: TypeId,
    /// Physical representation type
    pub reprtype: TypeId,
    /// Key type
    pub keytype: TypeId,
    /// Value type
    pub valuetype: TypeId,
    /// Entry tuple type
    pub tupletype: TypeId,
    /// Tree representation
    pub treetype: TypeId,
}

/// Registry of list and map flavors.
#[derive(Debug, Clone, Default)]
pub struct FlavorRegistry {
    lists: FxHashMap<TypeId, ListFlavor>,
    maps: FxHashMap<(TypeId, TypeId), MapFlavor>,
}

impl FlavorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a list flavor under its entry type.
    pub fn register_list(&mut self, flavor: ListFlavor) -> Result<(), FlavorError> {
        let entry = flavor.entrytype;
        if self.lists.contains_key(&entry) {
            return Err(FlavorError::DuplicateList { entry });
        }
        tracing::debug!(ltype = %flavor.ltype, entry = %entry, "registered list flavor");
        self.lists.insert(entry, flavor);
        Ok(())
    }

    /// Register a map flavor under its key/value pair.
    pub fn register_map(&mut self, flavor: MapFlavor) -> Result<(), FlavorError> {
        let key = (flavor.keytype, flavor.valuetype);
        if self.maps.contains_key(&key) {
            return Err(FlavorError::DuplicateMap {
                key: key.0,
                value: key.1,
            });
        }
        tracing::debug!(mtype = %flavor.mtype, key = %key.0, value = %key.1, "registered map flavor");
        self.maps.insert(key, flavor);
        Ok(())
    }

    /// List flavor for an entry type.
    pub fn list(&self, entry: TypeId) -> Option<&ListFlavor> {
        self.lists.get(&entry)
    }

    /// Map flavor for a key/value pair.
    pub fn map(&self, key: TypeId, value: TypeId) -> Option<&MapFlavor> {
        self.maps.get(&(key, value))
    }

    /// Number of list flavors.
    pub fn list_count(&self) -> usize {
        self.lists.len()
    }

    /// Number of map flavors.
    pub fn map_count(&self) -> usize {
        self.maps.len()
    }
}
