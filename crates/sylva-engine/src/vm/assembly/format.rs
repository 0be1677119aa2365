//! Assembly document format
//!
//! Serde model of the JSON document the front end emits. Every array is
//! optional; an absent or `null` array reads as empty. Names are kept as text
//! here and resolved to IDs by the loader.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Read `null` as the type's default.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A whole assembly document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AssemblyDocument {
    /// Original source files, kept for diagnostics
    #[serde(default, deserialize_with = "nullable")]
    pub src: Vec<SourceRecord>,

    /// Trace mask of the global buffer
    #[serde(default, deserialize_with = "nullable")]
    pub cmask: String,

    /// Byte size of the global buffer
    #[serde(default, deserialize_with = "nullable")]
    pub cbuffsize: u64,

    /// Type names to intern
    #[serde(default, deserialize_with = "nullable")]
    pub typenames: Vec<String>,

    /// Record property names, in ID order
    #[serde(default, deserialize_with = "nullable")]
    pub propertynames: Vec<String>,

    /// Field names, in ID order
    #[serde(default, deserialize_with = "nullable")]
    pub fieldnames: Vec<String>,

    /// Invoke names, in ID order
    #[serde(default, deserialize_with = "nullable")]
    pub invokenames: Vec<String>,

    /// Virtual invoke names, in ID order
    #[serde(default, deserialize_with = "nullable")]
    pub vinvokenames: Vec<String>,

    /// Field descriptors
    #[serde(default, deserialize_with = "nullable")]
    pub fielddecls: Vec<FieldRecord>,

    /// Type descriptors
    #[serde(default, deserialize_with = "nullable")]
    pub typedecls: Vec<TypeRecord>,

    /// Boxed struct wrappers
    #[serde(default, deserialize_with = "nullable")]
    pub boxeddecls: Vec<BoxedRecord>,

    /// List representation choices
    #[serde(default, deserialize_with = "nullable")]
    pub listflavors: Vec<ListFlavorRecord>,

    /// Map representation choices
    #[serde(default, deserialize_with = "nullable")]
    pub mapflavors: Vec<MapFlavorRecord>,

    /// Callable declarations
    #[serde(default, deserialize_with = "nullable")]
    pub invdecls: Vec<InvokeRecord>,

    /// Literal placements
    #[serde(default, deserialize_with = "nullable")]
    pub litdecls: Vec<LiteralRecord>,

    /// Per-type validation patterns
    #[serde(default, deserialize_with = "nullable")]
    pub validators: Vec<ValidatorRecord>,

    /// Regex table
    #[serde(default, deserialize_with = "nullable")]
    pub regexes: Vec<RegexRecord>,

    /// Computed constant placements
    #[serde(default, deserialize_with = "nullable")]
    pub constdecls: Vec<ConstantRecord>,
}

/// One source file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceRecord {
    /// File name
    pub fname: String,
    /// Full text
    pub contents: String,
}

/// A field descriptor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldRecord {
    /// Field name as interned
    pub fkey: String,
    /// Declared field name
    pub fname: String,
    /// Declared type name
    #[serde(rename = "declaredType")]
    pub declared_type: String,
    /// Whether the field may be absent
    #[serde(rename = "isOptional", default)]
    pub is_optional: bool,
}

/// Size and mask information of a declared type.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SizeInfoRecord {
    /// Heap form bytes, excluding the header word
    #[serde(default)]
    pub heapsize: u64,
    /// Inline slot bytes
    pub inlinedatasize: u64,
    /// Bytes copied on assignment
    pub assigndatasize: u64,
    /// Heap trace mask, `null` for no pointers
    #[serde(default)]
    pub heapmask: Option<String>,
    /// Inline trace mask
    pub inlinedmask: String,
}

/// A type declaration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TypeRecord {
    /// Type name as interned
    pub tkey: String,
    /// Display name, defaults to `tkey`
    #[serde(default)]
    pub name: Option<String>,
    /// Size information
    pub sizeinfo: SizeInfoRecord,
    /// Kind-specific part
    #[serde(flatten)]
    pub kind: TypeKindRecord,
}

/// Kind-specific part of a type declaration, tagged by `tkind`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "tkind")]
pub enum TypeKindRecord {
    /// Scalar
    Register,
    /// Inline struct
    Struct {
        /// Field names in layout order
        #[serde(default)]
        fields: Vec<String>,
        /// Byte offset of each field
        #[serde(default)]
        fieldoffsets: Vec<u64>,
    },
    /// Heap entity
    Ref {
        /// Field names in layout order
        #[serde(default)]
        fields: Vec<String>,
        /// Byte offset of each field
        #[serde(default)]
        fieldoffsets: Vec<u64>,
    },
    /// Big number
    BigNum,
    /// Small list chunk
    PartialVector {
        /// Element type name
        entrytype: String,
        /// Element capacity (4 or 8)
        capacity: u32,
    },
    /// List tree node
    ListTree {
        /// Element type name
        entrytype: String,
    },
    /// Map tree node
    MapTree {
        /// Key type name
        keytype: String,
        /// Value type name
        valuetype: String,
    },
    /// Reference union
    UnionRef {
        /// Member type names
        subtypes: Vec<String>,
    },
    /// Inline union
    UnionInline {
        /// Member type names
        subtypes: Vec<String>,
    },
    /// Universal union
    UnionUniversal {
        /// Member type names
        subtypes: Vec<String>,
    },
}

/// A boxed struct wrapper.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoxedRecord {
    /// Boxed type name as interned
    pub tkey: String,
    /// Display name
    pub name: String,
    /// Wrapped struct type name
    pub oftype: String,
}

/// List flavor selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListFlavorRecord {
    /// Logical list type
    pub ltype: String,
    /// Physical representation type
    pub reprtype: String,
    /// Element type
    pub entrytype: String,
    /// 4-element partial vector type
    pub pv4type: String,
    /// 8-element partial vector type
    pub pv8type: String,
    /// Tree type
    pub treetype: String,
}

/// Map flavor selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MapFlavorRecord {
    /// Logical map type
    pub ltype: String,
    /// Physical representation type
    pub reprtype: String,
    /// Key type
    pub keytype: String,
    /// Value type
    pub valuetype: String,
    /// Entry tuple type
    pub tupletype: String,
    /// Tree type
    pub treetype: String,
}

/// Source position record.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpanRecord {
    /// Line
    #[serde(default)]
    pub line: u32,
    /// Column
    #[serde(default)]
    pub column: u32,
    /// Byte position
    #[serde(default)]
    pub pos: u32,
    /// Byte length
    #[serde(default)]
    pub span: u32,
}

/// A parameter of a callable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParamRecord {
    /// Parameter name
    pub name: String,
    /// Parameter type name
    pub ptype: String,
}

/// A primitive's lambda code argument.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PCodeRecord {
    /// Invoke name of the lambda body
    pub code: String,
    /// Captured argument positions
    #[serde(default)]
    pub cargpos: Vec<u32>,
}

/// A callable declaration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvokeRecord {
    /// Invoke name as interned
    pub ikey: String,
    /// Display name
    pub name: String,
    /// Declaring source file
    #[serde(rename = "srcFile", default)]
    pub src_file: String,
    /// Start of the declaration
    #[serde(rename = "sinfoStart", default)]
    pub sinfo_start: SpanRecord,
    /// End of the declaration
    #[serde(rename = "sinfoEnd", default)]
    pub sinfo_end: SpanRecord,
    /// Whether the callable is recursive
    #[serde(default)]
    pub recursive: bool,
    /// Parameters in order
    #[serde(default)]
    pub params: Vec<ParamRecord>,
    /// Result type name
    #[serde(rename = "resultType")]
    pub result_type: String,
    /// Kind-specific part
    #[serde(flatten)]
    pub kind: InvokeKindRecord,
}

/// Kind-specific part of a callable, tagged by `ikind`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "ikind")]
pub enum InvokeKindRecord {
    /// Callable with an interpreted body
    Body {
        /// Declared in user code rather than the core library
        #[serde(rename = "isUserCode", default)]
        is_user_code: bool,
        /// Scalar frame bytes
        #[serde(rename = "scalarstackBytes", default)]
        scalarstack_bytes: u64,
        /// Mixed frame bytes
        #[serde(rename = "mixedstackBytes", default)]
        mixedstack_bytes: u64,
        /// Trace mask of the mixed frame
        #[serde(rename = "mixedMask", default)]
        mixed_mask: String,
        /// Number of mask slots
        #[serde(rename = "maskSlots", default)]
        mask_slots: u32,
        /// Argument mask size
        #[serde(rename = "argmaskSize", default)]
        argmask_size: u32,
        /// Parameter placement, opaque to the loader
        #[serde(default)]
        paraminfo: Vec<serde_json::Value>,
        /// Result placement, opaque to the loader
        #[serde(rename = "resultArg", default)]
        result_arg: serde_json::Value,
        /// Instructions, opaque to the loader
        #[serde(default)]
        body: Vec<serde_json::Value>,
    },
    /// Built-in operation
    Primitive {
        /// Type the primitive is declared on
        #[serde(default)]
        enclosingtype: Option<String>,
        /// Implementation key
        implkeyname: String,
        /// Template bindings: name to type name
        #[serde(default)]
        binds: BTreeMap<String, String>,
        /// Lambda arguments
        #[serde(default)]
        pcodes: BTreeMap<String, PCodeRecord>,
    },
}

/// A literal placed in the global buffer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LiteralRecord {
    /// Byte offset in the global buffer
    pub offset: u64,
    /// Declared type name
    #[serde(rename = "type")]
    pub ty: String,
    /// Literal text
    pub value: String,
}

/// A computed constant placed in the global buffer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConstantRecord {
    /// Byte offset in the global buffer
    pub offset: u64,
    /// Invoke name of the initializer
    pub invoke: String,
    /// Declared type name
    #[serde(rename = "type")]
    pub ty: String,
}

/// A regex table entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegexRecord {
    /// Literal text the program refers to the regex by
    pub restr: String,
    /// Pattern compiled for matching
    pub pattern: String,
}

/// A validator attached to a type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidatorRecord {
    /// Validated type name
    pub vtype: String,
    /// Validation regex
    pub regex: RegexRecord,
}
