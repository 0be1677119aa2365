//! Subcommand implementations. Each returns the process exit code.

pub mod check;
pub mod header;
pub mod types;
