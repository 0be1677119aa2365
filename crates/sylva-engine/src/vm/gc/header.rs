//! GC object header word
//!
//! Every heap object is preceded by one 64-bit metadata word:
//!
//! ```text
//!  63                       24 23  22  21 20 19             0
//! ┌───────────────────────────┬────┬─────┬─────┬────────────────┐
//! │ reference count (40 bits) │mark│young│ --  │ TypeID (20)    │
//! └───────────────────────────┴────┴─────┴─────┴────────────────┘
//! ```
//!
//! The reference count and the mark bit together define reachability. The
//! all-zero word is the forwarding sentinel a copying step writes over a moved
//! object; the heap never allocates TypeID 0, so a live header is never zero.

use std::fmt;

use crate::vm::types::{TypeId, MAX_TYPE_ID};

/// Bit position of the lowest reference-count bit.
pub const RC_SHIFT: u32 = 24;

/// Reference count field.
pub const RC_MASK: u64 = 0xFFFF_FFFF_FF00_0000;

/// One reference, pre-shifted.
pub const RC_ONE: u64 = 1 << RC_SHIFT;

/// Largest storable reference count.
pub const MAX_REF_COUNT: u64 = RC_MASK >> RC_SHIFT;

/// Mark bit.
pub const MARK_BIT: u64 = 1 << 23;

/// Young-generation bit.
pub const YOUNG_BIT: u64 = 1 << 22;

/// Unused bits between the young bit and the TypeID.
pub const UNUSED_MASK: u64 = 0b11 << 20;

/// TypeID field.
pub const TYPE_ID_MASK: u64 = MAX_TYPE_ID as u64;

/// Bits that keep an object alive when any is set.
pub const REACHABLE_MASK: u64 = RC_MASK | MARK_BIT;

/// Word written over a forwarded object.
pub const FORWARDED_SENTINEL: u64 = 0;

/// Packed GC header word.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeaderWord(u64);

impl HeaderWord {
    /// Build a header from its fields. `ref_count` is truncated to 40 bits.
    pub fn new(tid: TypeId, ref_count: u64, marked: bool, young: bool) -> Self {
        debug_assert!(tid.as_u32() <= MAX_TYPE_ID, "TypeID {tid} does not fit");
        let mut word = (ref_count << RC_SHIFT) & RC_MASK;
        if marked {
            word |= MARK_BIT;
        }
        if young {
            word |= YOUNG_BIT;
        }
        word |= u64::from(tid.as_u32()) & TYPE_ID_MASK;
        HeaderWord(word)
    }

    /// Header of a freshly bump-allocated object.
    #[inline]
    pub fn young(tid: TypeId) -> Self {
        Self::new(tid, 0, false, true)
    }

    /// Header of an old object kept alive by a root rather than a count.
    #[inline]
    pub fn old_root(tid: TypeId) -> Self {
        Self::new(tid, 0, true, false)
    }

    /// Header of an old object holding one heap reference.
    #[inline]
    pub fn old_heap(tid: TypeId) -> Self {
        Self::new(tid, 1, false, false)
    }

    /// The forwarding sentinel.
    #[inline]
    pub const fn forwarded() -> Self {
        HeaderWord(FORWARDED_SENTINEL)
    }

    /// Reinterpret a raw word.
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        HeaderWord(raw)
    }

    /// Raw 64-bit value.
    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// TypeID of the object.
    #[inline]
    pub fn type_id(self) -> TypeId {
        TypeId::new((self.0 & TYPE_ID_MASK) as u32)
    }

    /// Current reference count.
    #[inline]
    pub fn reference_count(self) -> u64 {
        (self.0 & RC_MASK) >> RC_SHIFT
    }

    /// Replace the reference count. Returns `false` if it does not fit.
    pub fn set_reference_count(&mut self, count: u64) -> bool {
        if count > MAX_REF_COUNT {
            return false;
        }
        self.0 = (self.0 & !RC_MASK) | (count << RC_SHIFT);
        true
    }

    /// Add one reference. Returns the new count, or `None` on overflow.
    pub fn increment_ref_count(&mut self) -> Option<u64> {
        let next = self.reference_count().checked_add(1)?;
        self.set_reference_count(next).then_some(next)
    }

    /// Drop one reference. Returns the new count, or `None` if it was zero.
    pub fn decrement_ref_count(&mut self) -> Option<u64> {
        let next = self.reference_count().checked_sub(1)?;
        self.set_reference_count(next);
        Some(next)
    }

    /// Whether the mark bit is set.
    #[inline]
    pub fn is_marked(self) -> bool {
        self.0 & MARK_BIT != 0
    }

    /// Set or clear the mark bit.
    #[inline]
    pub fn set_marked(&mut self, marked: bool) {
        if marked {
            self.0 |= MARK_BIT;
        } else {
            self.0 &= !MARK_BIT;
        }
    }

    /// Whether the object is still in the young generation.
    #[inline]
    pub fn is_young(self) -> bool {
        self.0 & YOUNG_BIT != 0
    }

    /// Move the object to the old generation.
    #[inline]
    pub fn promote(&mut self) {
        self.0 &= !YOUNG_BIT;
    }

    /// Whether a count or the mark keeps the object alive.
    #[inline]
    pub fn is_reachable(self) -> bool {
        self.0 & REACHABLE_MASK != 0
    }

    /// Neither counted nor marked.
    #[inline]
    pub fn is_unreachable(self) -> bool {
        !self.is_reachable()
    }

    /// Whether this is the forwarding sentinel.
    #[inline]
    pub fn is_forwarded(self) -> bool {
        self.0 == FORWARDED_SENTINEL
    }
}

impl fmt::Debug for HeaderWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeaderWord")
            .field("raw", &format_args!("{:#018x}", self.0))
            .field("rc", &self.reference_count())
            .field("marked", &self.is_marked())
            .field("young", &self.is_young())
            .field("tid", &self.type_id().as_u32())
            .finish()
    }
}

impl fmt::Display for HeaderWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_forwarded() {
            return f.write_str("forwarded");
        }
        write!(
            f,
            "rc={} mark={} young={} tid={}",
            self.reference_count(),
            u8::from(self.is_marked()),
            u8::from(self.is_young()),
            self.type_id().as_u32()
        )
    }
}
