//! Runtime trap taxonomy
//!
//! A trap is a language-level runtime fault. It travels as an ordinary error
//! value up to the single recovery checkpoint, which reads its category code.

use std::fmt;
use thiserror::Error;

/// Category of a runtime trap. The integer codes are a stable contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrapKind {
    /// Unconditional runtime fault
    Fault,
    /// Language-level assertion failure
    Assertion,
    /// Explicit abort statement
    Abort,
}

impl TrapKind {
    /// Integer category code.
    pub const fn code(self) -> i32 {
        match self {
            TrapKind::Fault => 5,
            TrapKind::Assertion => 2,
            TrapKind::Abort => 3,
        }
    }

    /// Kind for a category code.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            5 => Some(TrapKind::Fault),
            2 => Some(TrapKind::Assertion),
            3 => Some(TrapKind::Abort),
            _ => None,
        }
    }
}

impl fmt::Display for TrapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TrapKind::Fault => "fault",
            TrapKind::Assertion => "assertion failed",
            TrapKind::Abort => "abort",
        })
    }
}

/// Source position attached to a trap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    /// Source file name
    pub file: String,
    /// 1-based line
    pub line: u32,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// A runtime trap.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}{}", at_suffix(.location))]
pub struct Trap {
    /// Category
    pub kind: TrapKind,
    /// Human-readable description
    pub message: String,
    /// Where the trap was raised, when known
    pub location: Option<SourceLocation>,
}

fn at_suffix(location: &Option<SourceLocation>) -> String {
    location
        .as_ref()
        .map(|loc| format!(" (at {loc})"))
        .unwrap_or_default()
}

impl Trap {
    /// Create a trap of a kind.
    pub fn new(kind: TrapKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            location: None,
        }
    }

    /// Unconditional fault.
    pub fn fault(message: impl Into<String>) -> Self {
        Self::new(TrapKind::Fault, message)
    }

    /// Assertion failure.
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::new(TrapKind::Assertion, message)
    }

    /// Explicit abort.
    pub fn abort(message: impl Into<String>) -> Self {
        Self::new(TrapKind::Abort, message)
    }

    /// Attach a source position.
    pub fn at(mut self, file: impl Into<String>, line: u32) -> Self {
        self.location = Some(SourceLocation {
            file: file.into(),
            line,
        });
        self
    }

    /// Category code of this trap.
    pub fn code(&self) -> i32 {
        self.kind.code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(TrapKind::Fault.code(), 5);
        assert_eq!(TrapKind::Assertion.code(), 2);
        assert_eq!(TrapKind::Abort.code(), 3);
    }

    #[test]
    fn test_from_code() {
        for kind in [TrapKind::Fault, TrapKind::Assertion, TrapKind::Abort] {
            assert_eq!(TrapKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(TrapKind::from_code(0), None);
    }

    #[test]
    fn test_display_with_location() {
        let trap = Trap::assertion("x > 0").at("main.bsq", 12);
        assert_eq!(trap.to_string(), "assertion failed: x > 0 (at main.bsq:12)");
        assert_eq!(Trap::abort("stop").to_string(), "abort: stop");
        assert_eq!(trap.code(), 2);
    }
}
