//! Sylva Runtime
//!
//! Entry points for loading assembly documents from disk or memory, and the
//! single top-level checkpoint that turns runtime traps into exit codes.
//!
//! # Example
//!
//! ```rust,ignore
//! use sylva_runtime::{Runtime, RuntimeOptions};
//!
//! let rt = Runtime::new();
//! let loaded = rt.load_file("app.asm.json".as_ref())?;
//! println!("{}", loaded.program.summary());
//! ```

#![warn(missing_docs)]

pub mod checkpoint;
pub mod error;
pub mod loader;

use std::path::Path;

use sylva_engine::LoaderConfig;

pub use checkpoint::{checkpoint, CheckpointOutcome};
pub use error::RuntimeError;
pub use loader::{
    load_assembly_bytes, load_assembly_document, load_assembly_file, load_assembly_str,
    LoadedAssembly,
};

/// Options for loading assemblies.
#[derive(Debug, Clone, Default)]
pub struct RuntimeOptions {
    /// Loader configuration
    pub loader: LoaderConfig,
    /// Record computed constants instead of faulting when no interpreter is attached
    pub defer_constants: bool,
}

/// Loads assemblies with a fixed set of options.
#[derive(Debug, Clone, Default)]
pub struct Runtime {
    options: RuntimeOptions,
}

impl Runtime {
    /// Create a runtime with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a runtime with explicit options.
    pub fn with_options(options: RuntimeOptions) -> Self {
        Self { options }
    }

    /// The active options.
    pub fn options(&self) -> &RuntimeOptions {
        &self.options
    }

    /// Load an assembly file.
    pub fn load_file(&self, path: &Path) -> Result<LoadedAssembly, RuntimeError> {
        load_assembly_file(path, &self.options)
    }

    /// Load an assembly from bytes.
    pub fn load_bytes(&self, bytes: &[u8]) -> Result<LoadedAssembly, RuntimeError> {
        load_assembly_bytes(bytes, &self.options)
    }

    /// Load an assembly from text.
    pub fn load_str(&self, json: &str) -> Result<LoadedAssembly, RuntimeError> {
        load_assembly_str(json, &self.options)
    }

    /// Load a file under the checkpoint, so a failed load becomes a fault report.
    pub fn check_file(&self, path: &Path) -> CheckpointOutcome<LoadedAssembly> {
        checkpoint(|| self.load_file(path))
    }
}
