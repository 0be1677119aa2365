//! Assembly loading
//!
//! An assembly is the JSON document the front end emits for a whole program.
//! [`AssemblyLoader`] turns it into a [`LoadedProgram`]: interned names, the
//! type table, collection flavors, callables, and the initialized global
//! buffer.

mod config;
mod error;
mod format;
mod loader;
mod program;

pub use config::LoaderConfig;
pub use error::{LoadError, LoadPhase, LoadResult};
pub use format::{
    AssemblyDocument, BoxedRecord, ConstantRecord, FieldRecord, InvokeKindRecord, InvokeRecord,
    ListFlavorRecord, LiteralRecord, MapFlavorRecord, PCodeRecord, ParamRecord, RegexRecord,
    SizeInfoRecord, SourceRecord, SpanRecord, TypeKindRecord, TypeRecord, ValidatorRecord,
};
pub use loader::AssemblyLoader;
pub use program::{LoadedProgram, ProgramSummary, SourceMap};
