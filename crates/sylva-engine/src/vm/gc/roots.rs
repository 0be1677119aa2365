//! GC root registration
//!
//! The only root region a loaded program owns is the global constant buffer.
//! It is registered once, at load start, with its size and trace mask, and
//! stays registered for the lifetime of the program.

use thiserror::Error;

use crate::vm::types::RefMask;

/// Errors raised when registering roots
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RootError {
    /// The global region was already registered
    #[error("global root region is already registered")]
    AlreadyRegistered,

    /// The mask describes more bytes than the region holds
    #[error("global mask covers {covered} bytes but the buffer holds {size}")]
    MaskExceedsRegion {
        /// Bytes described by the mask
        covered: usize,
        /// Bytes in the region
        size: usize,
    },
}

/// A byte region the collector scans using a reference mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootRegion {
    /// Region size in bytes
    pub size: usize,
    /// Trace mask, walked from the start of the region
    pub mask: RefMask,
}

/// Root set of a loaded program.
#[derive(Debug, Clone, Default)]
pub struct RootSet {
    global: Option<RootRegion>,
}

impl RootSet {
    /// Create an empty root set.
    pub fn new() -> Self {
        Self { global: None }
    }

    /// Register the global constant buffer.
    pub fn register_global(&mut self, size: usize, mask: RefMask) -> Result<(), RootError> {
        if self.global.is_some() {
            return Err(RootError::AlreadyRegistered);
        }
        let covered = mask.covered_bytes();
        if covered > size {
            return Err(RootError::MaskExceedsRegion { covered, size });
        }
        self.global = Some(RootRegion { size, mask });
        Ok(())
    }

    /// The registered global region.
    pub fn global(&self) -> Option<&RootRegion> {
        self.global.as_ref()
    }

    /// Number of registered regions.
    pub fn len(&self) -> usize {
        usize::from(self.global.is_some())
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
