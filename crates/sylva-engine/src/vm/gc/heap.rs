//! Heap of GC-managed objects
//!
//! Objects live in an index-addressed arena owned by the loaded program and
//! are freed as a unit when it is dropped. Each object carries a
//! [`HeaderWord`] and a zero-initialized payload of the type's `heapsize`.

use std::num::NonZeroU64;
use thiserror::Error;

use super::header::HeaderWord;
use super::roots::{RootError, RootSet};
use crate::vm::types::{MaskSymbol, RefMask, TypeDescriptor, TypeId, WORD_SIZE};

/// Errors raised by the heap
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeapError {
    /// TypeID 0 would produce the forwarding sentinel
    #[error("cannot allocate an object of TypeID 0")]
    NullTypeId,

    /// The type is stored inline only
    #[error("type {name} ({tid}) has no heap form")]
    NoHeapForm {
        /// Type ID
        tid: TypeId,
        /// Type name
        name: String,
    },

    /// Initial payload larger than the type's heap size
    #[error("payload of {len} bytes does not fit {name} (heapsize {heapsize})")]
    PayloadTooLarge {
        /// Type name
        name: String,
        /// Payload bytes
        len: usize,
        /// Declared heap size
        heapsize: u64,
    },

    /// The configured heap limit would be exceeded
    #[error("heap limit of {limit} bytes exceeded")]
    LimitExceeded {
        /// Configured limit
        limit: usize,
    },

    /// Root registration failed
    #[error(transparent)]
    Root(#[from] RootError),
}

/// Handle to a heap object. Raw value 0 is the null reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectRef(NonZeroU64);

impl ObjectRef {
    /// Decode a stored reference word; 0 is null.
    #[inline]
    pub fn from_raw(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(ObjectRef)
    }

    /// Word stored in a pointer slot.
    #[inline]
    pub fn raw(self) -> u64 {
        self.0.get()
    }

    #[inline]
    fn index(self) -> usize {
        (self.0.get() - 1) as usize
    }

    fn from_index(index: usize) -> Self {
        // index + 1 is never zero
        ObjectRef(NonZeroU64::MIN.saturating_add(index as u64))
    }
}

/// One heap object.
#[derive(Debug, Clone)]
pub struct HeapObject {
    /// GC metadata
    pub header: HeaderWord,
    /// Payload, `heapsize` bytes
    pub data: Box<[u8]>,
}

/// Object heap of a loaded program.
#[derive(Debug, Default)]
pub struct Heap {
    objects: Vec<HeapObject>,
    roots: RootSet,
    allocated_bytes: usize,
    /// 0 = unlimited
    max_heap_bytes: usize,
}

impl Heap {
    /// Create an empty, unlimited heap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum heap size in bytes (0 = unlimited).
    pub fn set_max_heap_size(&mut self, bytes: usize) {
        self.max_heap_bytes = bytes;
    }

    /// Allocate a young object of `desc` and copy `payload` to its start.
    pub fn allocate(
        &mut self,
        desc: &TypeDescriptor,
        payload: &[u8],
    ) -> Result<ObjectRef, HeapError> {
        if desc.tid == TypeId::NONE {
            return Err(HeapError::NullTypeId);
        }
        if !desc.has_heap_form() {
            return Err(HeapError::NoHeapForm {
                tid: desc.tid,
                name: desc.name.clone(),
            });
        }
        let size = desc.size.heapsize as usize;
        if payload.len() > size {
            return Err(HeapError::PayloadTooLarge {
                name: desc.name.clone(),
                len: payload.len(),
                heapsize: desc.size.heapsize,
            });
        }
        let total = size + WORD_SIZE;
        if self.max_heap_bytes > 0 && self.allocated_bytes + total > self.max_heap_bytes {
            return Err(HeapError::LimitExceeded {
                limit: self.max_heap_bytes,
            });
        }

        let mut data = vec![0u8; size].into_boxed_slice();
        data[..payload.len()].copy_from_slice(payload);
        self.objects.push(HeapObject {
            header: HeaderWord::young(desc.tid),
            data,
        });
        self.allocated_bytes += total;

        let obj = ObjectRef::from_index(self.objects.len() - 1);
        tracing::trace!(obj = obj.raw(), tid = %desc.tid, size, "allocated");
        Ok(obj)
    }

    /// Object behind a reference.
    pub fn get(&self, obj: ObjectRef) -> Option<&HeapObject> {
        self.objects.get(obj.index())
    }

    /// Header of an object.
    pub fn header(&self, obj: ObjectRef) -> Option<HeaderWord> {
        self.get(obj).map(|o| o.header)
    }

    /// Mutable header of an object.
    pub fn header_mut(&mut self, obj: ObjectRef) -> Option<&mut HeaderWord> {
        self.objects.get_mut(obj.index()).map(|o| &mut o.header)
    }

    /// Payload of an object.
    pub fn data(&self, obj: ObjectRef) -> Option<&[u8]> {
        self.get(obj).map(|o| &*o.data)
    }

    /// Register the global constant buffer as a root region.
    pub fn register_global_roots(&mut self, size: usize, mask: RefMask) -> Result<(), HeapError> {
        self.roots.register_global(size, mask)?;
        Ok(())
    }

    /// Registered roots.
    pub fn roots(&self) -> &RootSet {
        &self.roots
    }

    /// Object references held by the global buffer, found by walking its mask.
    ///
    /// Pointer slots hold an [`ObjectRef`] word. String slots hold one in
    /// their first word when in heap form (last byte zero, first word set).
    pub fn global_roots(&self, buffer: &[u8]) -> Vec<ObjectRef> {
        let Some(region) = self.roots.global() else {
            return Vec::new();
        };
        region
            .mask
            .walk()
            .filter_map(|slot| {
                let word = read_word(buffer, slot.offset)?;
                match slot.kind {
                    MaskSymbol::Pointer => ObjectRef::from_raw(word),
                    MaskSymbol::String => {
                        let tag = *buffer.get(slot.offset + 2 * WORD_SIZE - 1)?;
                        if tag == 0 {
                            ObjectRef::from_raw(word)
                        } else {
                            None
                        }
                    }
                    _ => None,
                }
            })
            .filter(|obj| obj.index() < self.objects.len())
            .collect()
    }

    /// Get total bytes allocated, headers included.
    pub fn allocated_bytes(&self) -> usize {
        self.allocated_bytes
    }

    /// Get number of live allocations.
    pub fn allocation_count(&self) -> usize {
        self.objects.len()
    }

    /// Iterate over all objects.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectRef, &HeapObject)> + '_ {
        self.objects
            .iter()
            .enumerate()
            .map(|(idx, o)| (ObjectRef::from_index(idx), o))
    }
}

fn read_word(buffer: &[u8], offset: usize) -> Option<u64> {
    let bytes = buffer.get(offset..offset + WORD_SIZE)?;
    let mut word = [0u8; WORD_SIZE];
    word.copy_from_slice(bytes);
    Some(u64::from_ne_bytes(word))
}
