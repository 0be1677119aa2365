//! Load-time errors
//!
//! Every failure while loading an assembly is fatal: the partially built
//! program is dropped and the error is returned to the caller.

use std::fmt;
use thiserror::Error;

use crate::vm::constant::ConstantError;
use crate::vm::flavor::FlavorError;
use crate::vm::gc::HeapError;
use crate::vm::literal::LiteralError;
use crate::vm::names::{NameError, Namespace};
use crate::vm::regex_table::RegexError;
use crate::vm::types::{MaskError, TableError};

/// Loader phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LoadPhase {
    /// `src`
    Sources,
    /// `cbuffsize` and `cmask`
    GlobalBuffer,
    /// Name lists and `fielddecls`
    Names,
    /// `typedecls`
    Types,
    /// `boxeddecls`
    BoxedTypes,
    /// `listflavors`
    ListFlavors,
    /// `mapflavors`
    MapFlavors,
    /// `invdecls`
    Invokes,
    /// `regexes`
    Regexes,
    /// `litdecls`
    Literals,
    /// `validators`
    Validators,
    /// `constdecls`
    Constants,
}

impl fmt::Display for LoadPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LoadPhase::Sources => "sources",
            LoadPhase::GlobalBuffer => "global buffer",
            LoadPhase::Names => "names",
            LoadPhase::Types => "types",
            LoadPhase::BoxedTypes => "boxed types",
            LoadPhase::ListFlavors => "list flavors",
            LoadPhase::MapFlavors => "map flavors",
            LoadPhase::Invokes => "invokes",
            LoadPhase::Regexes => "regexes",
            LoadPhase::Literals => "literals",
            LoadPhase::Validators => "validators",
            LoadPhase::Constants => "constants",
        })
    }
}

/// Fatal assembly load errors
#[derive(Debug, Error)]
pub enum LoadError {
    /// The document is not valid assembly JSON
    #[error("malformed assembly document: {0}")]
    Parse(#[from] serde_json::Error),

    /// `cbuffsize` exceeds the configured limit
    #[error("global buffer of {size} bytes exceeds the limit of {max} bytes")]
    GlobalBufferTooLarge {
        /// Requested size
        size: u64,
        /// Configured limit
        max: usize,
    },

    /// A name was not interned
    #[error("unknown {namespace} name {name:?} in {context}")]
    UnknownName {
        /// Namespace looked up
        namespace: Namespace,
        /// The name
        name: String,
        /// Where the reference appeared
        context: String,
    },

    /// A type is referenced before its descriptor is loaded
    #[error("type {name:?} referenced in {context} has no loaded descriptor")]
    MissingDescriptor {
        /// Type name
        name: String,
        /// Where the reference appeared
        context: String,
    },

    /// A referenced type has the wrong kind
    #[error("type {name:?} referenced in {context} is {found}, expected {expected}")]
    WrongKind {
        /// Type name
        name: String,
        /// Where the reference appeared
        context: String,
        /// Required kind
        expected: &'static str,
        /// Actual kind
        found: &'static str,
    },

    /// A declaration is internally inconsistent
    #[error("invalid declaration of {name:?}: {reason}")]
    InvalidDeclaration {
        /// Declared name
        name: String,
        /// What is wrong
        reason: String,
    },

    /// A mask string does not parse
    #[error("invalid mask in {context}: {source}")]
    InvalidMask {
        /// Owning declaration
        context: String,
        /// Parse error
        #[source]
        source: MaskError,
    },

    /// A mask does not cover its declared size
    #[error("mask in {context} covers {covered} bytes, expected {expected}")]
    MaskCoverage {
        /// Owning declaration
        context: String,
        /// Bytes the mask describes
        covered: usize,
        /// Bytes required
        expected: String,
    },

    /// Interning failed
    #[error(transparent)]
    Names(#[from] NameError),

    /// Filling a table failed
    #[error(transparent)]
    Table(#[from] TableError),

    /// Heap setup failed
    #[error(transparent)]
    Heap(#[from] HeapError),

    /// Flavor registration failed
    #[error(transparent)]
    Flavor(#[from] FlavorError),

    /// A regex did not compile
    #[error(transparent)]
    Regex(#[from] RegexError),

    /// A literal could not be decoded
    #[error("literal at offset {offset} ({ty}): {source}")]
    Literal {
        /// Destination offset
        offset: u64,
        /// Declared type name
        ty: String,
        /// Decode error
        #[source]
        source: LiteralError,
    },

    /// A constant could not be evaluated
    #[error("constant at offset {offset}: {source}")]
    Constant {
        /// Destination offset
        offset: u64,
        /// Evaluation error
        #[source]
        source: ConstantError,
    },
}

/// Result type of the loader.
pub type LoadResult<T> = Result<T, LoadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phases_are_ordered() {
        assert!(LoadPhase::Sources < LoadPhase::GlobalBuffer);
        assert!(LoadPhase::MapFlavors < LoadPhase::Invokes);
        assert!(LoadPhase::Regexes < LoadPhase::Literals);
        assert!(LoadPhase::Validators < LoadPhase::Constants);
    }

    #[test]
    fn test_messages() {
        let err = LoadError::UnknownName {
            namespace: Namespace::Type,
            name: "Main::X".to_string(),
            context: "listflavors".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "unknown type name \"Main::X\" in listflavors"
        );
        let err = LoadError::GlobalBufferTooLarge { size: 10, max: 4 };
        assert_eq!(
            err.to_string(),
            "global buffer of 10 bytes exceeds the limit of 4 bytes"
        );
    }
}
