//! Literal decoding into the global buffer
//!
//! A literal is the front end's text for a constant plus its declared type.
//! Numbers carry one trailing type-suffix character (`42n`, `-7i`, `1.5f`),
//! strings carry their outer quotes, and regexes are referenced by their
//! exact literal text.

use std::fmt;
use thiserror::Error;

use crate::vm::gc::{Heap, HeapError};
use crate::vm::globals::{GlobalError, GlobalStore};
use crate::vm::regex_table::RegexTable;
use crate::vm::string::{
    select_k_repr_for_size, StringSlot, MAX_INLINE_STRING, MAX_K_REPR_STRING,
};
use crate::vm::types::{RegexId, TypeId, TypeTable};

/// Errors raised while decoding a literal
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LiteralError {
    /// Literals of this type are never emitted
    #[error("type {tid} has no literal form")]
    NotLiteralType {
        /// Declared type
        tid: TypeId,
    },

    /// Rational literals are not supported
    #[error("rational literal {text:?} is not supported")]
    RationalUnsupported {
        /// Literal text
        text: String,
    },

    /// Numeric text did not parse
    #[error("invalid {kind} literal {text:?}")]
    InvalidNumber {
        /// Target kind
        kind: &'static str,
        /// Literal text
        text: String,
    },

    /// String literal without its outer quotes
    #[error("string literal {text:?} is not quoted")]
    UnquotedString {
        /// Literal text
        text: String,
    },

    /// Strings above 128 bytes need a tree representation
    #[error("string literal of {len} bytes exceeds the {max}-byte limit")]
    StringTooLong {
        /// Length after quote stripping
        len: usize,
        /// Longest supported length
        max: usize,
    },

    /// No regex has this literal text
    #[error("unknown regex literal {text:?}")]
    UnknownRegex {
        /// Literal text
        text: String,
    },

    /// A string representation type has no descriptor
    #[error("missing descriptor for string representation {tid}")]
    MissingRepr {
        /// Representation type
        tid: TypeId,
    },

    /// Writing the global buffer failed
    #[error(transparent)]
    Global(#[from] GlobalError),

    /// Allocating the string object failed
    #[error(transparent)]
    Heap(#[from] HeapError),
}

/// A literal after parsing, before placement.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// `None` or `Nothing`: nothing is stored
    Unit,
    /// Boolean
    Bool(bool),
    /// Natural number
    Nat(u64),
    /// Integer
    Int(i64),
    /// Big natural number
    BigNat(u128),
    /// Big integer
    BigInt(i128),
    /// Float or decimal
    Float(f64),
    /// String bytes, quotes removed
    String(String),
    /// Regex handle
    Regex(RegexId),
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Unit => f.write_str("none"),
            LiteralValue::Bool(b) => write!(f, "{b}"),
            LiteralValue::Nat(n) => write!(f, "{n}"),
            LiteralValue::Int(i) => write!(f, "{i}"),
            LiteralValue::BigNat(n) => write!(f, "{n}"),
            LiteralValue::BigInt(i) => write!(f, "{i}"),
            LiteralValue::Float(x) => write!(f, "{x}"),
            LiteralValue::String(s) => write!(f, "{s:?}"),
            LiteralValue::Regex(id) => write!(f, "regex{id}"),
        }
    }
}

/// Drop the trailing type-suffix character.
fn strip_suffix(text: &str) -> &str {
    match text.char_indices().next_back() {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn number<T: std::str::FromStr>(kind: &'static str, text: &str) -> Result<T, LiteralError> {
    strip_suffix(text)
        .parse()
        .map_err(|_| LiteralError::InvalidNumber {
            kind,
            text: text.to_string(),
        })
}

fn unquote(text: &str) -> Result<&str, LiteralError> {
    text.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .ok_or_else(|| LiteralError::UnquotedString {
            text: text.to_string(),
        })
}

/// Parse a literal's text for its declared type.
pub fn parse_literal(
    tid: TypeId,
    text: &str,
    regexes: &RegexTable,
) -> Result<LiteralValue, LiteralError> {
    Ok(match tid {
        TypeId::NONE | TypeId::NOTHING => LiteralValue::Unit,
        TypeId::BOOL => LiteralValue::Bool(text == "true"),
        TypeId::NAT => LiteralValue::Nat(number("Nat", text)?),
        TypeId::INT => LiteralValue::Int(number("Int", text)?),
        TypeId::BIG_NAT => LiteralValue::BigNat(number("BigNat", text)?),
        TypeId::BIG_INT => LiteralValue::BigInt(number("BigInt", text)?),
        TypeId::FLOAT => LiteralValue::Float(number("Float", text)?),
        TypeId::DECIMAL => LiteralValue::Float(number("Decimal", text)?),
        TypeId::RATIONAL => {
            return Err(LiteralError::RationalUnsupported {
                text: text.to_string(),
            })
        }
        TypeId::STRING => {
            let body = unquote(text)?;
            if body.len() > MAX_K_REPR_STRING {
                return Err(LiteralError::StringTooLong {
                    len: body.len(),
                    max: MAX_K_REPR_STRING,
                });
            }
            LiteralValue::String(body.to_string())
        }
        TypeId::REGEX => LiteralValue::Regex(regexes.lookup(text).ok_or_else(|| {
            LiteralError::UnknownRegex {
                text: text.to_string(),
            }
        })?),
        other => return Err(LiteralError::NotLiteralType { tid: other }),
    })
}

/// Writes literals into the global buffer, allocating string objects as needed.
pub struct LiteralDecoder<'a> {
    store: &'a mut GlobalStore,
    heap: &'a mut Heap,
    types: &'a TypeTable,
    regexes: &'a RegexTable,
}

impl<'a> LiteralDecoder<'a> {
    /// Create a decoder over the load-time state.
    pub fn new(
        store: &'a mut GlobalStore,
        heap: &'a mut Heap,
        types: &'a TypeTable,
        regexes: &'a RegexTable,
    ) -> Self {
        Self {
            store,
            heap,
            types,
            regexes,
        }
    }

    /// Decode `text` as `tid` and store it at `offset`.
    pub fn decode(
        &mut self,
        offset: u64,
        tid: TypeId,
        text: &str,
    ) -> Result<LiteralValue, LiteralError> {
        let value = parse_literal(tid, text, self.regexes)?;
        self.store_value(offset, &value)?;
        Ok(value)
    }

    fn store_value(&mut self, offset: u64, value: &LiteralValue) -> Result<(), LiteralError> {
        match value {
            LiteralValue::Unit => {}
            LiteralValue::Bool(b) => self.store.write(offset, &[u8::from(*b)])?,
            LiteralValue::Nat(n) => self.store.write(offset, &n.to_ne_bytes())?,
            LiteralValue::Int(i) => self.store.write(offset, &i.to_ne_bytes())?,
            LiteralValue::BigNat(n) => self.store.write(offset, &n.to_ne_bytes())?,
            LiteralValue::BigInt(i) => self.store.write(offset, &i.to_ne_bytes())?,
            LiteralValue::Float(x) => self.store.write(offset, &x.to_ne_bytes())?,
            LiteralValue::Regex(id) => {
                self.store
                    .write(offset, &u64::from(id.as_u32()).to_ne_bytes())?
            }
            LiteralValue::String(s) => {
                let slot = self.string_slot(s.as_bytes())?;
                self.store.write(offset, &slot.encode())?;
            }
        }
        Ok(())
    }

    fn string_slot(&mut self, bytes: &[u8]) -> Result<StringSlot, LiteralError> {
        if bytes.is_empty() {
            return Ok(StringSlot::Empty);
        }
        if bytes.len() <= MAX_INLINE_STRING {
            if let Some(slot) = StringSlot::inline(bytes) {
                return Ok(slot);
            }
        }
        let (repr, _) =
            select_k_repr_for_size(bytes.len()).ok_or(LiteralError::StringTooLong {
                len: bytes.len(),
                max: MAX_K_REPR_STRING,
            })?;
        let desc = self
            .types
            .get(repr)
            .ok_or(LiteralError::MissingRepr { tid: repr })?;
        let obj = self.heap.allocate(desc, bytes)?;
        Ok(StringSlot::Heap {
            obj,
            len: bytes.len() as u64,
        })
    }
}
