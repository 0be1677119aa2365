//! Reference masks for precise garbage collection
//!
//! A reference mask describes which words of an inline or heap layout the
//! collector has to visit. It is a string over five symbols, consumed left to
//! right, implicitly terminated by a zero byte:
//!
//! | symbol | meaning                                   | width    |
//! |--------|-------------------------------------------|----------|
//! | `1`    | skip one word                             | 8 bytes  |
//! | `2`    | one traced pointer                        | 8 bytes  |
//! | `3`    | a string slot                             | 16 bytes |
//! | `4`    | a big-number slot                         | 16 bytes |
//! | `5`    | a tagged-union header word                | 8 bytes  |
//!
//! A union symbol covers only the tag word; the union content is described by
//! the symbols that follow it (see [`UNION_UNIVERSAL_MASK`]).

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Size of a machine word in a storage slot.
pub const WORD_SIZE: usize = 8;

/// Content bytes of a universal union (excluding the tag word).
pub const UNION_UNIVERSAL_CONTENT_SIZE: usize = 32;

/// Total bytes of a universal union slot.
pub const UNION_UNIVERSAL_SIZE: usize = 40;

/// Fixed mask of a universal union slot: tag word followed by four skip words.
pub const UNION_UNIVERSAL_MASK: &str = "51111";

/// Errors produced while parsing a reference mask
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MaskError {
    /// A character outside the mask alphabet
    #[error("invalid mask symbol {symbol:?} at position {position}")]
    InvalidSymbol {
        /// Offending character
        symbol: char,
        /// Character index in the mask string
        position: usize,
    },
}

/// One symbol of the mask alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaskSymbol {
    /// `1`: scalar word, not traced
    Skip,
    /// `2`: heap pointer word
    Pointer,
    /// `3`: string slot (inline bytes or heap reference)
    String,
    /// `4`: big number slot
    BigNum,
    /// `5`: tagged-union tag word
    Union,
}

impl MaskSymbol {
    /// Decode a single mask byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'1' => Some(MaskSymbol::Skip),
            b'2' => Some(MaskSymbol::Pointer),
            b'3' => Some(MaskSymbol::String),
            b'4' => Some(MaskSymbol::BigNum),
            b'5' => Some(MaskSymbol::Union),
            _ => None,
        }
    }

    /// Encoded byte for this symbol.
    pub fn as_byte(self) -> u8 {
        match self {
            MaskSymbol::Skip => b'1',
            MaskSymbol::Pointer => b'2',
            MaskSymbol::String => b'3',
            MaskSymbol::BigNum => b'4',
            MaskSymbol::Union => b'5',
        }
    }

    /// Bytes of storage this symbol consumes.
    pub fn width(self) -> usize {
        match self {
            MaskSymbol::Skip | MaskSymbol::Pointer | MaskSymbol::Union => WORD_SIZE,
            MaskSymbol::String | MaskSymbol::BigNum => 2 * WORD_SIZE,
        }
    }

    /// Whether the collector must look at this slot.
    pub fn is_traced(self) -> bool {
        !matches!(self, MaskSymbol::Skip)
    }
}

/// A traced slot found while walking a mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskSlot {
    /// Byte offset of the slot from the start of the described region
    pub offset: usize,
    /// What kind of slot lives there
    pub kind: MaskSymbol,
}

/// Parsed reference mask.
///
/// `Option<RefMask>::None` is used wherever a layout has no pointers at all,
/// which lets the collector skip the object entirely.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct RefMask {
    symbols: Box<[MaskSymbol]>,
}

impl RefMask {
    /// Parse a mask string. Parsing stops at the first zero byte.
    pub fn parse(text: &str) -> Result<Self, MaskError> {
        let mut symbols = Vec::with_capacity(text.len());
        for (position, byte) in text.bytes().enumerate() {
            if byte == 0 {
                break;
            }
            match MaskSymbol::from_byte(byte) {
                Some(symbol) => symbols.push(symbol),
                None => {
                    return Err(MaskError::InvalidSymbol {
                        symbol: text[position..].chars().next().unwrap_or('\u{fffd}'),
                        position,
                    })
                }
            }
        }
        Ok(Self {
            symbols: symbols.into_boxed_slice(),
        })
    }

    /// Build a mask from symbols.
    pub fn from_symbols(symbols: Vec<MaskSymbol>) -> Self {
        Self {
            symbols: symbols.into_boxed_slice(),
        }
    }

    /// Mask of the universal union slot.
    pub fn union_universal() -> Self {
        Self::from_symbols(vec![
            MaskSymbol::Union,
            MaskSymbol::Skip,
            MaskSymbol::Skip,
            MaskSymbol::Skip,
            MaskSymbol::Skip,
        ])
    }

    /// The symbols in order.
    pub fn symbols(&self) -> &[MaskSymbol] {
        &self.symbols
    }

    /// Number of symbols (excluding the terminator).
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Whether the mask has no symbols at all.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Total bytes described by this mask.
    pub fn covered_bytes(&self) -> usize {
        self.symbols.iter().map(|s| s.width()).sum()
    }

    /// Whether any slot needs tracing.
    pub fn has_pointers(&self) -> bool {
        self.symbols.iter().any(|s| s.is_traced())
    }

    /// Iterate over traced slots with their byte offsets.
    pub fn walk(&self) -> impl Iterator<Item = MaskSlot> + '_ {
        let mut offset = 0;
        self.symbols.iter().filter_map(move |&kind| {
            let slot = MaskSlot { offset, kind };
            offset += kind.width();
            kind.is_traced().then_some(slot)
        })
    }

    /// Zero-terminated byte encoding, as read by the collector.
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes: Vec<u8> = self.symbols.iter().map(|s| s.as_byte()).collect();
        bytes.push(0);
        bytes
    }
}

impl FromStr for RefMask {
    type Err = MaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RefMask::parse(s)
    }
}

impl fmt::Display for RefMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for symbol in self.symbols.iter() {
            write!(f, "{}", symbol.as_byte() as char)?;
        }
        Ok(())
    }
}

/// Round a byte count up to whole words.
#[inline]
pub fn round_up_to_word(bytes: u64) -> u64 {
    let word = WORD_SIZE as u64;
    bytes.div_ceil(word) * word
}
