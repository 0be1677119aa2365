//! Default constants for loader configuration.

/// Default upper bound on the global constant buffer (64 MiB).
pub const DEFAULT_MAX_GLOBAL_BUFFER: usize = 64 * 1024 * 1024;

/// Whether declared masks are checked against declared sizes by default.
pub const DEFAULT_VERIFY_MASKS: bool = true;

/// Whether source texts are kept for diagnostics by default.
pub const DEFAULT_RETAIN_SOURCES: bool = true;

/// Default heap limit for objects allocated during load (0 = unlimited).
pub const DEFAULT_MAX_HEAP_BYTES: usize = 0;
