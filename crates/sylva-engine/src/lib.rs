//! Sylva Engine
//!
//! Core of the Sylva virtual machine: loads a compiled assembly document and
//! builds the runtime type and object model the interpreter executes against.
//!
//! # Example
//!
//! ```rust,ignore
//! use sylva_engine::{AssemblyLoader, TypeId};
//!
//! let program = AssemblyLoader::new().load_str(r#"{ "cbuffsize": 0, "cmask": "" }"#)?;
//! assert_eq!(program.types().len(), 26);
//! assert_eq!(program.display_type(TypeId::INT), "Int");
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// VM module: type table, object model, GC metadata, and assembly loading
pub mod vm;

// ============================================================================
// Re-exports from VM
// ============================================================================

pub use vm::assembly::{
    AssemblyDocument, AssemblyLoader, LoadError, LoadPhase, LoadResult, LoadedProgram,
    LoaderConfig, ProgramSummary, SourceMap,
};
pub use vm::constant::{
    ConstantError, ConstantRequest, DeferredInitializer, Initializer, NoInitializer,
    PendingConstant,
};
pub use vm::gc::{HeaderWord, Heap, HeapError, ObjectRef};
pub use vm::names::{NameRegistry, Namespace};
pub use vm::trap::{SourceLocation, Trap, TrapKind};
pub use vm::types::{LayoutKind, RefMask, TypeDescriptor, TypeId, TypeKind, TypeTable};
