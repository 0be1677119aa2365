//! String value slots
//!
//! A `String` occupies a 16-byte slot in one of three forms:
//!
//! - all zero: the canonical empty string
//! - inline (1 to 15 bytes): data in `[0, len)`, byte 15 holds `len`
//! - heap: `[0, 8)` an [`ObjectRef`] to a K-representation, `[8, 16)` the
//!   length as little-endian `u64`
//!
//! Heap lengths never reach 2^56, so byte 15 is non-zero exactly for inline
//! strings.

use crate::vm::gc::ObjectRef;
use crate::vm::types::{TypeId, STRING_K_REPRS};

/// Bytes in a string slot.
pub const STRING_SLOT_SIZE: usize = 16;

/// Longest string stored inline.
pub const MAX_INLINE_STRING: usize = STRING_SLOT_SIZE - 1;

/// Longest string that fits a fixed-capacity representation.
pub const MAX_K_REPR_STRING: usize = 128;

/// Decoded string slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringSlot {
    /// The shared empty string
    Empty,
    /// Bytes held in the slot itself
    Inline {
        /// Slot bytes, valid up to `len`
        bytes: [u8; MAX_INLINE_STRING],
        /// Length, 1 to 15
        len: u8,
    },
    /// Bytes held in a heap object
    Heap {
        /// The K-representation object
        obj: ObjectRef,
        /// Length in bytes
        len: u64,
    },
}

impl StringSlot {
    /// Inline slot for a short string; `None` when empty or too long.
    pub fn inline(text: &[u8]) -> Option<Self> {
        if text.is_empty() || text.len() > MAX_INLINE_STRING {
            return None;
        }
        let mut bytes = [0u8; MAX_INLINE_STRING];
        bytes[..text.len()].copy_from_slice(text);
        Some(StringSlot::Inline {
            bytes,
            len: text.len() as u8,
        })
    }

    /// Length in bytes.
    pub fn len(&self) -> u64 {
        match self {
            StringSlot::Empty => 0,
            StringSlot::Inline { len, .. } => u64::from(*len),
            StringSlot::Heap { len, .. } => *len,
        }
    }

    /// Whether this is the empty string.
    pub fn is_empty(&self) -> bool {
        matches!(self, StringSlot::Empty)
    }

    /// Slot bytes.
    pub fn encode(&self) -> [u8; STRING_SLOT_SIZE] {
        let mut out = [0u8; STRING_SLOT_SIZE];
        match self {
            StringSlot::Empty => {}
            StringSlot::Inline { bytes, len } => {
                out[..MAX_INLINE_STRING].copy_from_slice(bytes);
                out[MAX_INLINE_STRING] = *len;
            }
            StringSlot::Heap { obj, len } => {
                out[..8].copy_from_slice(&obj.raw().to_ne_bytes());
                out[8..].copy_from_slice(&len.to_le_bytes());
            }
        }
        out
    }

    /// Decode slot bytes. `None` for a malformed slot.
    pub fn decode(slot: &[u8; STRING_SLOT_SIZE]) -> Option<Self> {
        if slot.iter().all(|&b| b == 0) {
            return Some(StringSlot::Empty);
        }
        let tag = slot[MAX_INLINE_STRING];
        if tag != 0 {
            let len = usize::from(tag);
            if len > MAX_INLINE_STRING {
                return None;
            }
            return StringSlot::inline(&slot[..len]);
        }
        let mut word = [0u8; 8];
        word.copy_from_slice(&slot[..8]);
        let obj = ObjectRef::from_raw(u64::from_ne_bytes(word))?;
        word.copy_from_slice(&slot[8..]);
        Some(StringSlot::Heap {
            obj,
            len: u64::from_le_bytes(word),
        })
    }
}

/// Smallest fixed-capacity representation holding `len` bytes.
///
/// Returns the representation's TypeID and capacity, or `None` above 128.
pub fn select_k_repr_for_size(len: usize) -> Option<(TypeId, u32)> {
    STRING_K_REPRS
        .iter()
        .copied()
        .find(|&(_, capacity)| len <= capacity as usize)
}
