//! Loader configuration

use crate::vm::defaults::{
    DEFAULT_MAX_GLOBAL_BUFFER, DEFAULT_MAX_HEAP_BYTES, DEFAULT_RETAIN_SOURCES,
    DEFAULT_VERIFY_MASKS,
};

/// Configuration for [`AssemblyLoader`](super::AssemblyLoader).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Largest accepted `cbuffsize` in bytes (default: 64 MiB)
    pub max_global_buffer: usize,
    /// Parse every declared mask and check it against the declared sizes (default: true)
    pub verify_masks: bool,
    /// Keep `src` texts for diagnostics (default: true)
    pub retain_sources: bool,
    /// Heap limit for objects allocated during load, 0 = unlimited (default: 0)
    pub max_heap_bytes: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        LoaderConfig {
            max_global_buffer: DEFAULT_MAX_GLOBAL_BUFFER,
            verify_masks: DEFAULT_VERIFY_MASKS,
            retain_sources: DEFAULT_RETAIN_SOURCES,
            max_heap_bytes: DEFAULT_MAX_HEAP_BYTES,
        }
    }
}

impl LoaderConfig {
    /// Default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the global buffer limit.
    pub fn with_max_global_buffer(mut self, bytes: usize) -> Self {
        self.max_global_buffer = bytes;
        self
    }

    /// Enable or disable mask verification.
    pub fn with_verify_masks(mut self, verify: bool) -> Self {
        self.verify_masks = verify;
        self
    }

    /// Enable or disable keeping source texts.
    pub fn with_retain_sources(mut self, retain: bool) -> Self {
        self.retain_sources = retain;
        self
    }

    /// Set the load-time heap limit.
    pub fn with_max_heap_bytes(mut self, bytes: usize) -> Self {
        self.max_heap_bytes = bytes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LoaderConfig::default();
        assert_eq!(config.max_global_buffer, 64 * 1024 * 1024);
        assert!(config.verify_masks);
        assert!(config.retain_sources);
        assert_eq!(config.max_heap_bytes, 0);
    }

    #[test]
    fn test_builder() {
        let config = LoaderConfig::new()
            .with_max_global_buffer(1024)
            .with_verify_masks(false)
            .with_retain_sources(false)
            .with_max_heap_bytes(4096);
        assert_eq!(config.max_global_buffer, 1024);
        assert!(!config.verify_masks);
        assert!(!config.retain_sources);
        assert_eq!(config.max_heap_bytes, 4096);
    }
}
