//! Runtime error types.

use sylva_engine::{LoadError, Trap};

/// Errors that can occur while loading or running an assembly.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// File I/O error
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// The input is not a JSON assembly document
    #[error("Invalid assembly JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The assembly failed to load
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    /// Execution trapped
    #[error("Trap: {0}")]
    Trap(#[from] Trap),
}

impl From<RuntimeError> for Trap {
    /// Everything except an explicit trap is an unconditional fault.
    fn from(err: RuntimeError) -> Self {
        match err {
            RuntimeError::Trap(trap) => trap,
            other => Trap::fault(other.to_string()),
        }
    }
}
