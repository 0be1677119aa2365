//! Assembly loading from files, bytes, and text.

use std::path::Path;

use sylva_engine::{
    AssemblyDocument, AssemblyLoader, DeferredInitializer, LoadedProgram, NoInitializer,
    PendingConstant,
};

use crate::error::RuntimeError;
use crate::RuntimeOptions;

/// A loaded program and the constants left for an interpreter.
#[derive(Debug)]
pub struct LoadedAssembly {
    /// The loaded program
    pub program: LoadedProgram,
    /// Constants recorded but not evaluated, in load order
    pub pending: Vec<PendingConstant>,
}

/// Load an assembly JSON file from disk.
pub fn load_assembly_file(
    path: &Path,
    options: &RuntimeOptions,
) -> Result<LoadedAssembly, RuntimeError> {
    tracing::debug!(path = %path.display(), "reading assembly");
    let bytes = std::fs::read(path)?;
    load_assembly_bytes(&bytes, options)
}

/// Load an assembly from raw JSON bytes.
pub fn load_assembly_bytes(
    bytes: &[u8],
    options: &RuntimeOptions,
) -> Result<LoadedAssembly, RuntimeError> {
    let doc: AssemblyDocument = serde_json::from_slice(bytes)?;
    load_assembly_document(doc, options)
}

/// Load an assembly from JSON text.
pub fn load_assembly_str(
    json: &str,
    options: &RuntimeOptions,
) -> Result<LoadedAssembly, RuntimeError> {
    load_assembly_bytes(json.as_bytes(), options)
}

/// Load a parsed assembly document.
pub fn load_assembly_document(
    doc: AssemblyDocument,
    options: &RuntimeOptions,
) -> Result<LoadedAssembly, RuntimeError> {
    let loader = AssemblyLoader::with_config(options.loader.clone());
    if options.defer_constants {
        let mut deferred = DeferredInitializer::default();
        let program = loader.load_document(doc, &mut deferred)?;
        Ok(LoadedAssembly {
            program,
            pending: deferred.pending,
        })
    } else {
        let program = loader.load_document(doc, &mut NoInitializer)?;
        Ok(LoadedAssembly {
            program,
            pending: Vec::new(),
        })
    }
}
