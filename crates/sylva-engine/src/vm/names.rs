//! Name registry: symbolic names to dense IDs
//!
//! One table per namespace. The type namespace deduplicates and is pre-seeded
//! with the reserved type names. The property, field, invoke and
//! virtual-invoke namespaces are append-only: the Nth name pushed gets ID N
//! even when the text repeats an earlier entry, and lookups by text resolve to
//! the most recent entry.

use rustc_hash::FxHashMap;
use std::fmt;
use thiserror::Error;

use crate::vm::types::{
    FieldId, InvokeId, PropertyId, TypeId, VirtualInvokeId, MAX_TYPE_ID, WELL_KNOWN_TYPE_NAMES,
};

/// A name namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Type names (deduplicated)
    Type,
    /// Record property names
    Property,
    /// Entity field names
    Field,
    /// Callable names
    Invoke,
    /// Virtual callable names
    VirtualInvoke,
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Namespace::Type => "type",
            Namespace::Property => "property",
            Namespace::Field => "field",
            Namespace::Invoke => "invoke",
            Namespace::VirtualInvoke => "virtual invoke",
        })
    }
}

/// Errors raised while interning
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    /// More types than fit in a header word
    #[error("type ID space exhausted interning {name:?} (max {max})")]
    TypeIdSpaceExhausted {
        /// Name that did not fit
        name: String,
        /// Largest representable ID
        max: u32,
    },
}

/// Single namespace: text to ID plus the reverse vector.
#[derive(Debug, Clone, Default)]
struct NameTable {
    map: FxHashMap<String, u32>,
    names: Vec<String>,
}

impl NameTable {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            map: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            names: Vec::with_capacity(capacity),
        }
    }

    /// Return the existing ID or allocate the next one.
    fn intern(&mut self, name: &str) -> u32 {
        if let Some(&id) = self.map.get(name) {
            return id;
        }
        self.push(name).0
    }

    /// Always allocate the next ID. Reports whether the text was already present.
    fn push(&mut self, name: &str) -> (u32, bool) {
        let id = self.names.len() as u32;
        self.names.push(name.to_string());
        let repeated = self.map.insert(name.to_string(), id).is_some();
        (id, repeated)
    }

    fn lookup(&self, name: &str) -> Option<u32> {
        self.map.get(name).copied()
    }

    fn resolve(&self, id: u32) -> Option<&str> {
        self.names.get(id as usize).map(String::as_str)
    }

    fn len(&self) -> usize {
        self.names.len()
    }
}

/// Registry of every interned name in a loaded program.
#[derive(Debug, Clone)]
pub struct NameRegistry {
    types: NameTable,
    properties: NameTable,
    fields: NameTable,
    invokes: NameTable,
    vinvokes: NameTable,
}

impl NameRegistry {
    /// Create a registry with the reserved type names already interned.
    pub fn new() -> Self {
        let mut types = NameTable::with_capacity(WELL_KNOWN_TYPE_NAMES.len());
        for (name, tid) in WELL_KNOWN_TYPE_NAMES {
            let id = types.intern(name);
            debug_assert_eq!(id, tid.as_u32());
        }
        Self {
            types,
            properties: NameTable::default(),
            fields: NameTable::default(),
            invokes: NameTable::default(),
            vinvokes: NameTable::default(),
        }
    }

    /// Intern a name into a namespace and return the raw ID.
    pub fn intern(&mut self, namespace: Namespace, name: &str) -> Result<u32, NameError> {
        Ok(match namespace {
            Namespace::Type => self.intern_type(name)?.as_u32(),
            Namespace::Property => self.push_property(name).as_u32(),
            Namespace::Field => self.push_field(name).as_u32(),
            Namespace::Invoke => self.push_invoke(name).as_u32(),
            Namespace::VirtualInvoke => self.push_vinvoke(name).as_u32(),
        })
    }

    /// Intern a type name, returning the existing ID on repeats.
    pub fn intern_type(&mut self, name: &str) -> Result<TypeId, NameError> {
        if let Some(id) = self.types.lookup(name) {
            return Ok(TypeId::new(id));
        }
        if self.types.len() as u64 > u64::from(MAX_TYPE_ID) {
            return Err(NameError::TypeIdSpaceExhausted {
                name: name.to_string(),
                max: MAX_TYPE_ID,
            });
        }
        Ok(TypeId::new(self.types.intern(name)))
    }

    /// Append a property name.
    pub fn push_property(&mut self, name: &str) -> PropertyId {
        PropertyId::new(push_logged(&mut self.properties, Namespace::Property, name))
    }

    /// Append a field name.
    pub fn push_field(&mut self, name: &str) -> FieldId {
        FieldId::new(push_logged(&mut self.fields, Namespace::Field, name))
    }

    /// Append an invoke name.
    pub fn push_invoke(&mut self, name: &str) -> InvokeId {
        InvokeId::new(push_logged(&mut self.invokes, Namespace::Invoke, name))
    }

    /// Append a virtual invoke name.
    pub fn push_vinvoke(&mut self, name: &str) -> VirtualInvokeId {
        VirtualInvokeId::new(push_logged(
            &mut self.vinvokes,
            Namespace::VirtualInvoke,
            name,
        ))
    }

    /// Look up a raw ID by namespace and text.
    pub fn lookup(&self, namespace: Namespace, name: &str) -> Option<u32> {
        self.table(namespace).lookup(name)
    }

    /// Text of an ID in a namespace.
    pub fn resolve(&self, namespace: Namespace, id: u32) -> Option<&str> {
        self.table(namespace).resolve(id)
    }

    /// Number of IDs allocated in a namespace.
    pub fn count(&self, namespace: Namespace) -> usize {
        self.table(namespace).len()
    }

    /// ID of a type name.
    pub fn type_id(&self, name: &str) -> Option<TypeId> {
        self.types.lookup(name).map(TypeId::new)
    }

    /// ID of a field name (latest entry when repeated).
    pub fn field_id(&self, name: &str) -> Option<FieldId> {
        self.fields.lookup(name).map(FieldId::new)
    }

    /// ID of a property name (latest entry when repeated).
    pub fn property_id(&self, name: &str) -> Option<PropertyId> {
        self.properties.lookup(name).map(PropertyId::new)
    }

    /// ID of an invoke name (latest entry when repeated).
    pub fn invoke_id(&self, name: &str) -> Option<InvokeId> {
        self.invokes.lookup(name).map(InvokeId::new)
    }

    /// ID of a virtual invoke name.
    pub fn vinvoke_id(&self, name: &str) -> Option<VirtualInvokeId> {
        self.vinvokes.lookup(name).map(VirtualInvokeId::new)
    }

    /// Name of a type ID.
    pub fn type_name(&self, tid: TypeId) -> Option<&str> {
        self.types.resolve(tid.as_u32())
    }

    /// Name of a property ID, used when displaying records.
    pub fn property_name(&self, pid: PropertyId) -> Option<&str> {
        self.properties.resolve(pid.as_u32())
    }

    /// Name of a field ID.
    pub fn field_name(&self, fid: FieldId) -> Option<&str> {
        self.fields.resolve(fid.as_u32())
    }

    /// Name of an invoke ID.
    pub fn invoke_name(&self, iid: InvokeId) -> Option<&str> {
        self.invokes.resolve(iid.as_u32())
    }

    fn table(&self, namespace: Namespace) -> &NameTable {
        match namespace {
            Namespace::Type => &self.types,
            Namespace::Property => &self.properties,
            Namespace::Field => &self.fields,
            Namespace::Invoke => &self.invokes,
            Namespace::VirtualInvoke => &self.vinvokes,
        }
    }
}

impl Default for NameRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn push_logged(table: &mut NameTable, namespace: Namespace, name: &str) -> u32 {
    let (id, repeated) = table.push(name);
    if repeated {
        tracing::warn!(%namespace, name, id, "name declared more than once; keeping both IDs");
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_known_names_are_preseeded() {
        let names = NameRegistry::new();
        for (name, tid) in WELL_KNOWN_TYPE_NAMES {
            assert_eq!(names.type_id(name), Some(tid));
        }
        assert_eq!(names.count(Namespace::Type), 26);
    }

    #[test]
    fn test_well_known_ids_survive_dynamic_interning() {
        let mut names = NameRegistry::new();
        names.intern_type("Main::Foo").unwrap();
        assert_eq!(names.intern_type("Int").unwrap(), TypeId::INT);
        assert_eq!(names.intern_type("@StringTree").unwrap(), TypeId::STRING_TREE);
    }

    #[test]
    fn test_type_interning_is_idempotent() {
        let mut names = NameRegistry::new();
        let a = names.intern_type("Main::A").unwrap();
        let b = names.intern_type("Main::B").unwrap();
        let a2 = names.intern_type("Main::A").unwrap();
        assert_eq!(a, TypeId::new(26));
        assert_eq!(b, TypeId::new(27));
        assert_eq!(a, a2);
        assert_eq!(names.type_name(b), Some("Main::B"));
    }

    #[test]
    fn test_fields_are_append_only() {
        let mut names = NameRegistry::new();
        assert_eq!(names.push_field("x"), FieldId::new(0));
        assert_eq!(names.push_field("y"), FieldId::new(1));
        assert_eq!(names.push_field("x"), FieldId::new(2));
        assert_eq!(names.count(Namespace::Field), 3);
        // lookups see the latest entry
        assert_eq!(names.field_id("x"), Some(FieldId::new(2)));
        assert_eq!(names.field_name(FieldId::new(0)), Some("x"));
    }

    #[test]
    fn test_property_reverse_map() {
        let mut names = NameRegistry::new();
        let p = names.intern(Namespace::Property, "f").unwrap();
        let q = names.intern(Namespace::Property, "g").unwrap();
        assert_eq!((p, q), (0, 1));
        assert_eq!(names.property_name(PropertyId::new(1)), Some("g"));
        assert_eq!(names.property_name(PropertyId::new(7)), None);
    }

    #[test]
    fn test_invoke_namespaces_are_separate() {
        let mut names = NameRegistry::new();
        assert_eq!(names.push_invoke("main"), InvokeId::new(0));
        assert_eq!(names.push_vinvoke("main"), VirtualInvokeId::new(0));
        assert_eq!(names.push_invoke("main"), InvokeId::new(1));
        assert_eq!(names.lookup(Namespace::VirtualInvoke, "main"), Some(0));
        assert_eq!(names.resolve(Namespace::Invoke, 1), Some("main"));
    }
}
