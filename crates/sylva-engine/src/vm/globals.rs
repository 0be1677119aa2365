//! Global constant buffer
//!
//! One zero-initialized byte buffer holding every global literal and constant,
//! paired with the trace mask that tells the collector where its pointers are.
//! Values are written at offsets chosen by the front end.

use thiserror::Error;

use crate::vm::types::RefMask;

/// Errors raised by global buffer access
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GlobalError {
    /// The access runs past the end of the buffer
    #[error("global access [{offset}, {offset}+{len}) is outside the {size}-byte buffer")]
    OutOfBounds {
        /// Start offset
        offset: u64,
        /// Access length
        len: usize,
        /// Buffer size
        size: usize,
    },
}

/// The global constant buffer.
#[derive(Debug, Clone, Default)]
pub struct GlobalStore {
    buffer: Box<[u8]>,
    mask: RefMask,
}

impl GlobalStore {
    /// Allocate a zeroed buffer of `size` bytes.
    pub fn new(size: usize, mask: RefMask) -> Self {
        Self {
            buffer: vec![0u8; size].into_boxed_slice(),
            mask,
        }
    }

    /// Buffer size in bytes.
    pub fn size(&self) -> usize {
        self.buffer.len()
    }

    /// Trace mask.
    pub fn mask(&self) -> &RefMask {
        &self.mask
    }

    /// Whole buffer.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    fn range(&self, offset: u64, len: usize) -> Result<std::ops::Range<usize>, GlobalError> {
        let out_of_bounds = || GlobalError::OutOfBounds {
            offset,
            len,
            size: self.buffer.len(),
        };
        let start = usize::try_from(offset).map_err(|_| out_of_bounds())?;
        let end = start.checked_add(len).ok_or_else(out_of_bounds)?;
        if end > self.buffer.len() {
            return Err(out_of_bounds());
        }
        Ok(start..end)
    }

    /// Copy `bytes` into the buffer at `offset`.
    pub fn write(&mut self, offset: u64, bytes: &[u8]) -> Result<(), GlobalError> {
        let range = self.range(offset, bytes.len())?;
        self.buffer[range].copy_from_slice(bytes);
        Ok(())
    }

    /// Mutable view of `len` bytes at `offset`.
    pub fn slot_mut(&mut self, offset: u64, len: usize) -> Result<&mut [u8], GlobalError> {
        let range = self.range(offset, len)?;
        Ok(&mut self.buffer[range])
    }

    /// View of `len` bytes at `offset`.
    pub fn read(&self, offset: u64, len: usize) -> Result<&[u8], GlobalError> {
        let range = self.range(offset, len)?;
        Ok(&self.buffer[range])
    }

    /// Read a fixed-size array.
    pub fn read_array<const N: usize>(&self, offset: u64) -> Result<[u8; N], GlobalError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read(offset, N)?);
        Ok(out)
    }

    /// Read a one-byte boolean.
    pub fn read_bool(&self, offset: u64) -> Result<bool, GlobalError> {
        Ok(self.read(offset, 1)?[0] != 0)
    }

    /// Read a native-endian `u64`.
    pub fn read_u64(&self, offset: u64) -> Result<u64, GlobalError> {
        self.read_array(offset).map(u64::from_ne_bytes)
    }

    /// Read a native-endian `i64`.
    pub fn read_i64(&self, offset: u64) -> Result<i64, GlobalError> {
        self.read_array(offset).map(i64::from_ne_bytes)
    }

    /// Read a native-endian `f64`.
    pub fn read_f64(&self, offset: u64) -> Result<f64, GlobalError> {
        self.read_array(offset).map(f64::from_ne_bytes)
    }

    /// Read a native-endian `u128`.
    pub fn read_u128(&self, offset: u64) -> Result<u128, GlobalError> {
        self.read_array(offset).map(u128::from_ne_bytes)
    }

    /// Read a native-endian `i128`.
    pub fn read_i128(&self, offset: u64) -> Result<i128, GlobalError> {
        self.read_array(offset).map(i128::from_ne_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_store_is_zeroed() {
        let store = GlobalStore::new(32, RefMask::default());
        assert_eq!(store.size(), 32);
        assert!(store.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_write_and_read_back() {
        let mut store = GlobalStore::new(32, RefMask::default());
        store.write(8, &42u64.to_ne_bytes()).unwrap();
        store.write(16, &(-7i64).to_ne_bytes()).unwrap();
        store.write(24, &[1]).unwrap();
        assert_eq!(store.read_u64(8).unwrap(), 42);
        assert_eq!(store.read_i64(16).unwrap(), -7);
        assert!(store.read_bool(24).unwrap());
        assert_eq!(store.read_u64(0).unwrap(), 0);
    }

    #[test]
    fn test_out_of_bounds() {
        let mut store = GlobalStore::new(8, RefMask::default());
        assert_eq!(
            store.write(4, &[0u8; 8]),
            Err(GlobalError::OutOfBounds {
                offset: 4,
                len: 8,
                size: 8
            })
        );
        assert!(store.read_u64(u64::MAX).is_err());
        assert!(store.read(8, 0).is_ok());
    }

    #[test]
    fn test_empty_store() {
        let store = GlobalStore::new(0, RefMask::default());
        assert_eq!(store.size(), 0);
        assert!(store.read_bool(0).is_err());
    }
}
