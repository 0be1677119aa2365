//! Callable declarations
//!
//! The invoke table is filled by the loader and consumed by the interpreter.
//! Instruction bodies are kept as opaque JSON records; only the frame layout
//! and signature are interpreted here.

use std::collections::BTreeMap;

use crate::vm::types::{InvokeId, RefMask, TableError, TypeId};

/// Source position of a declaration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceSpan {
    /// Line
    pub line: u32,
    /// Column
    pub column: u32,
    /// Byte position
    pub pos: u32,
    /// Byte length
    pub span: u32,
}

/// A declared parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeParam {
    /// Parameter name
    pub name: String,
    /// Parameter type
    pub ptype: TypeId,
}

/// Lambda argument of a primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PCode {
    /// Callable implementing the lambda
    pub code: InvokeId,
    /// Captured argument positions
    pub cargpos: Vec<u32>,
}

/// Frame layout and body of an interpreted callable.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyInfo {
    /// Declared in user code rather than the core library
    pub is_user_code: bool,
    /// Scalar frame bytes
    pub scalarstack_bytes: u64,
    /// Mixed frame bytes
    pub mixedstack_bytes: u64,
    /// Trace mask of the mixed frame
    pub mixed_mask: RefMask,
    /// Number of mask slots
    pub mask_slots: u32,
    /// Argument mask size
    pub argmask_size: u32,
    /// Parameter placement records
    pub paraminfo: Vec<serde_json::Value>,
    /// Result placement record
    pub result_arg: serde_json::Value,
    /// Instruction records
    pub ops: Vec<serde_json::Value>,
}

/// Binding data of a built-in callable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimitiveInfo {
    /// Type the primitive is declared on
    pub enclosingtype: Option<TypeId>,
    /// Implementation key
    pub implkeyname: String,
    /// Template bindings
    pub binds: BTreeMap<String, TypeId>,
    /// Lambda arguments
    pub pcodes: BTreeMap<String, PCode>,
}

/// Kind-specific part of a callable.
#[derive(Debug, Clone, PartialEq)]
pub enum InvokeKind {
    /// Interpreted body
    Body(BodyInfo),
    /// Built-in operation
    Primitive(PrimitiveInfo),
}

/// A loaded callable declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct InvokeDecl {
    /// Index in the invoke table
    pub ikey: InvokeId,
    /// Display name
    pub name: String,
    /// Declaring source file
    pub src_file: String,
    /// Start of the declaration
    pub start: SourceSpan,
    /// End of the declaration
    pub end: SourceSpan,
    /// Whether the callable is recursive
    pub recursive: bool,
    /// Parameters
    pub params: Vec<InvokeParam>,
    /// Result type
    pub result_type: TypeId,
    /// Body or primitive data
    pub kind: InvokeKind,
}

impl InvokeDecl {
    /// Whether this is a built-in.
    pub fn is_primitive(&self) -> bool {
        matches!(self.kind, InvokeKind::Primitive(_))
    }

    /// Body data of an interpreted callable.
    pub fn body(&self) -> Option<&BodyInfo> {
        match &self.kind {
            InvokeKind::Body(body) => Some(body),
            InvokeKind::Primitive(_) => None,
        }
    }

    /// Whether the callable was written by the user.
    pub fn is_user_code(&self) -> bool {
        self.body().is_some_and(|b| b.is_user_code)
    }
}

/// Table of callables, indexed by [`InvokeId`].
#[derive(Debug, Clone, Default)]
pub struct InvokeTable {
    slots: Vec<Option<InvokeDecl>>,
}

impl InvokeTable {
    /// Create an empty table of `len` slots.
    pub fn new(len: usize) -> Self {
        Self {
            slots: vec![None; len],
        }
    }

    /// Store a declaration at its own ID.
    pub fn insert(&mut self, decl: InvokeDecl) -> Result<(), TableError> {
        let index = decl.ikey.index();
        let len = self.slots.len();
        let slot = self.slots.get_mut(index).ok_or(TableError::OutOfRange {
            table: "invoke",
            index,
            len,
        })?;
        if slot.is_some() {
            return Err(TableError::Duplicate {
                table: "invoke",
                index,
            });
        }
        *slot = Some(decl);
        Ok(())
    }

    /// Declaration for an ID.
    pub fn get(&self, ikey: InvokeId) -> Option<&InvokeDecl> {
        self.slots.get(ikey.index()).and_then(Option::as_ref)
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the table has no slots.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Iterate over loaded declarations.
    pub fn iter(&self) -> impl Iterator<Item = &InvokeDecl> + '_ {
        self.slots.iter().filter_map(Option::as_ref)
    }
}
