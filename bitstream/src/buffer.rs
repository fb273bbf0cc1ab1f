//! Growable, bit-addressable byte storage.

use std::fmt;

use crate::error::{BitError, BitResult};

/// Capacity used when the first write lands on an unallocated buffer.
pub const DEFAULT_CAPACITY_BYTES: usize = 16;

/// A growable byte store with a write length and a read cursor, both in bits.
///
/// Storage is kept zero-filled up to [`capacity`](Self::capacity), so
/// [`as_bytes`](Self::as_bytes) always exposes the full allocation. Bits are
/// addressed MSB-first within each byte.
///
/// Invariant: `cursor <= bit_len <= capacity * 8`.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct BitBuffer {
    /// Backing storage; its length is the capacity.
    bytes: Vec<u8>,
    /// Number of committed bits.
    bit_len: usize,
    /// Next bit to read.
    cursor: usize,
}

impl BitBuffer {
    /// Creates an empty, unallocated buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a buffer with `bytes` of zero-filled capacity.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::ZeroCapacity`] if `bytes == 0`.
    pub fn with_capacity(bytes: usize) -> BitResult<Self> {
        let mut buffer = Self::new();
        buffer.allocate(bytes)?;
        Ok(buffer)
    }

    /// Wraps finalized bytes for reading. Every bit of `bytes` is readable.
    #[must_use]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let bit_len = bytes.len() * 8;
        Self {
            bytes,
            bit_len,
            cursor: 0,
        }
    }

    /// Wraps finalized bytes whose last `bytes.len() * 8 - bit_len` bits are padding.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::EndOfBuffer`] if `bit_len` exceeds the bytes provided.
    pub fn from_parts(bytes: Vec<u8>, bit_len: usize) -> BitResult<Self> {
        let available = bytes.len() * 8;
        if bit_len > available {
            return Err(BitError::EndOfBuffer {
                requested: bit_len,
                available,
            });
        }
        Ok(Self {
            bytes,
            bit_len,
            cursor: 0,
        })
    }

    /// Returns the capacity in bytes.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    /// Returns the number of committed bits.
    #[must_use]
    pub const fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// Returns the read cursor position in bits.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Returns the number of committed bits not yet read.
    #[must_use]
    pub const fn bits_remaining(&self) -> usize {
        self.bit_len - self.cursor
    }

    /// Returns `true` if no bits have been committed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bit_len == 0
    }

    /// Returns the number of bytes needed to hold every committed bit.
    #[must_use]
    pub const fn committed_byte_len(&self) -> usize {
        self.bit_len.div_ceil(8)
    }

    /// Performs the first allocation.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::ZeroCapacity`] if `size == 0` and
    /// [`BitError::AlreadyAllocated`] if the buffer already owns storage.
    pub fn allocate(&mut self, size: usize) -> BitResult<()> {
        if size == 0 {
            return Err(BitError::ZeroCapacity);
        }
        if !self.bytes.is_empty() {
            return Err(BitError::AlreadyAllocated {
                capacity: self.bytes.len(),
            });
        }
        self.bytes = vec![0; size];
        Ok(())
    }

    /// Doubles the capacity, keeping every byte.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::NotAllocated`] if the capacity is zero.
    pub fn double_size(&mut self) -> BitResult<()> {
        if self.bytes.is_empty() {
            return Err(BitError::NotAllocated);
        }
        let new_size = self.bytes.len() * 2;
        self.bytes.resize(new_size, 0);
        Ok(())
    }

    /// Resizes the storage to exactly `new_size` bytes.
    ///
    /// New capacity is zero-filled. Shrinking is allowed down to the
    /// committed byte length.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::WouldTruncate`] if committed bits would be lost.
    pub fn resize_to(&mut self, new_size: usize) -> BitResult<()> {
        if new_size * 8 < self.bit_len {
            return Err(BitError::WouldTruncate {
                requested_bytes: new_size,
                committed_bits: self.bit_len,
            });
        }
        self.bytes.resize(new_size, 0);
        Ok(())
    }

    /// Ensures `additional` more bits fit for a fixed-width write of at most 65 bits.
    ///
    /// Grows like `Vec::push`: allocation failure aborts.
    pub(crate) fn reserve_bits(&mut self, additional: usize) {
        debug_assert!(additional <= 65);
        let needed_bytes = self.bit_len.saturating_add(additional).div_ceil(8);
        let size = self.grown_size(needed_bytes);
        if size != self.bytes.len() {
            self.bytes.resize(size, 0);
        }
    }

    /// Ensures `additional` more bits fit, allocating or doubling as needed.
    ///
    /// On failure the buffer is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::CapacityOverflow`] if the total bit length does not
    /// fit in `usize` or the storage cannot be allocated.
    pub(crate) fn try_reserve_bits(&mut self, additional: usize) -> BitResult<()> {
        let overflow = BitError::CapacityOverflow {
            bit_len: self.bit_len,
            additional,
        };
        let needed = self
            .bit_len
            .checked_add(additional)
            .ok_or_else(|| overflow.clone())?;
        let size = self.grown_size(needed.div_ceil(8));
        let current = self.bytes.len();
        if size != current {
            self.bytes
                .try_reserve_exact(size - current)
                .map_err(|_| overflow)?;
            self.bytes.resize(size, 0);
        }
        Ok(())
    }

    /// Storage size holding `needed_bytes`: the default on first use, then doubling.
    fn grown_size(&self, needed_bytes: usize) -> usize {
        let current = self.bytes.len();
        if current == 0 {
            return needed_bytes.max(DEFAULT_CAPACITY_BYTES);
        }
        let mut size = current;
        while size < needed_bytes {
            size = size.saturating_mul(2);
        }
        size
    }

    /// Appends one bit. Capacity must already be reserved.
    pub(crate) fn push_bit_unchecked(&mut self, bit: bool) {
        let byte_idx = self.bit_len / 8;
        let mask = 0x80u8 >> (self.bit_len % 8);
        if bit {
            self.bytes[byte_idx] |= mask;
        } else {
            self.bytes[byte_idx] &= !mask;
        }
        self.bit_len += 1;
    }

    /// Advances the read cursor. Callers must have checked `bits_remaining`.
    pub(crate) fn advance_cursor(&mut self, bits: usize) {
        debug_assert!(self.cursor + bits <= self.bit_len);
        self.cursor += bits;
    }

    /// Drops committed bits past `bit_len`, zeroing their storage.
    ///
    /// Does nothing if `bit_len` is not below the committed length. The read
    /// cursor is clamped to the new length.
    pub fn truncate(&mut self, bit_len: usize) {
        if bit_len >= self.bit_len {
            return;
        }
        for idx in bit_len..self.bit_len {
            self.bytes[idx / 8] &= !(0x80u8 >> (idx % 8));
        }
        self.bit_len = bit_len;
        self.cursor = self.cursor.min(bit_len);
    }

    /// Returns the committed bit at `index`, if any.
    #[must_use]
    pub fn bit(&self, index: usize) -> Option<bool> {
        if index >= self.bit_len {
            return None;
        }
        Some((self.bytes[index / 8] >> (7 - index % 8)) & 1 == 1)
    }

    /// Moves the read cursor to `position`.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::EndOfBuffer`] if `position` is past the committed bits.
    pub fn set_cursor(&mut self, position: usize) -> BitResult<()> {
        if position > self.bit_len {
            return Err(BitError::EndOfBuffer {
                requested: position,
                available: self.bit_len,
            });
        }
        self.cursor = position;
        Ok(())
    }

    /// Returns the full backing storage, including unused capacity.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the bytes that hold committed bits.
    #[must_use]
    pub fn committed_bytes(&self) -> &[u8] {
        &self.bytes[..self.committed_byte_len()]
    }

    /// Trims storage to the committed bytes and returns them.
    ///
    /// Bits after `bit_len` in the last byte are zero unless the buffer was
    /// built with [`from_parts`](Self::from_parts).
    #[must_use]
    pub fn finish(mut self) -> Vec<u8> {
        self.bytes.truncate(self.committed_byte_len());
        self.bytes
    }

    /// Renders the committed bits as `'0'`/`'1'` characters.
    #[must_use]
    pub fn bit_string(&self) -> String {
        (0..self.bit_len)
            .map(|idx| if self.bit(idx) == Some(true) { '1' } else { '0' })
            .collect()
    }
}

impl fmt::Debug for BitBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitBuffer")
            .field("capacity", &self.bytes.len())
            .field("bit_len", &self.bit_len)
            .field("cursor", &self.cursor)
            .field("bits", &self.bit_string())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_is_unallocated() {
        let buffer = BitBuffer::new();
        assert_eq!(buffer.capacity(), 0);
        assert!(buffer.is_empty());
        assert_eq!(buffer.bit_string(), "");
    }

    #[test]
    fn allocate_zero_fails() {
        let mut buffer = BitBuffer::new();
        assert_eq!(buffer.allocate(0), Err(BitError::ZeroCapacity));
    }

    #[test]
    fn allocate_twice_fails() {
        let mut buffer = BitBuffer::new();
        buffer.allocate(4).unwrap();
        assert_eq!(
            buffer.allocate(4),
            Err(BitError::AlreadyAllocated { capacity: 4 })
        );
    }

    #[test]
    fn double_size_requires_allocation() {
        let mut buffer = BitBuffer::new();
        assert_eq!(buffer.double_size(), Err(BitError::NotAllocated));
        buffer.allocate(3).unwrap();
        buffer.double_size().unwrap();
        assert_eq!(buffer.capacity(), 6);
        assert!(buffer.as_bytes().iter().all(|b| *b == 0));
    }

    #[test]
    fn resize_preserves_and_zero_fills() {
        let mut buffer = BitBuffer::with_capacity(1).unwrap();
        buffer.reserve_bits(4);
        for bit in [true, false, true, true] {
            buffer.push_bit_unchecked(bit);
        }
        buffer.resize_to(4).unwrap();
        assert_eq!(buffer.as_bytes(), &[0b1011_0000, 0, 0, 0]);
        buffer.resize_to(1).unwrap();
        assert_eq!(buffer.as_bytes(), &[0b1011_0000]);
        assert_eq!(
            buffer.resize_to(0),
            Err(BitError::WouldTruncate {
                requested_bytes: 0,
                committed_bits: 4,
            })
        );
    }

    #[test]
    fn reserve_allocates_default_then_doubles() {
        let mut buffer = BitBuffer::new();
        buffer.reserve_bits(1);
        assert_eq!(buffer.capacity(), DEFAULT_CAPACITY_BYTES);
        buffer.try_reserve_bits(DEFAULT_CAPACITY_BYTES * 8 + 1).unwrap();
        assert_eq!(buffer.capacity(), DEFAULT_CAPACITY_BYTES * 2);
    }

    #[test]
    fn from_parts_rejects_overlong_bit_len() {
        let err = BitBuffer::from_parts(vec![0xFF], 9).unwrap_err();
        assert!(err.is_end_of_buffer());
        let buffer = BitBuffer::from_parts(vec![0xFF], 3).unwrap();
        assert_eq!(buffer.bit_string(), "111");
    }

    #[test]
    fn finish_trims_to_committed_bytes() {
        let mut buffer = BitBuffer::with_capacity(8).unwrap();
        buffer.reserve_bits(9);
        for _ in 0..9 {
            buffer.push_bit_unchecked(true);
        }
        assert_eq!(buffer.committed_bytes(), &[0xFF, 0x80]);
        assert_eq!(buffer.finish(), vec![0xFF, 0x80]);
    }

    #[test]
    fn set_cursor_bounds() {
        let mut buffer = BitBuffer::from_bytes(vec![0xAA]);
        buffer.set_cursor(8).unwrap();
        assert_eq!(buffer.bits_remaining(), 0);
        assert!(buffer.set_cursor(9).is_err());
        assert_eq!(buffer.cursor(), 8);
    }

    #[test]
    fn truncate_zeroes_dropped_bits() {
        let mut buffer = BitBuffer::with_capacity(2).unwrap();
        buffer.reserve_bits(12);
        for _ in 0..12 {
            buffer.push_bit_unchecked(true);
        }
        buffer.truncate(3);
        assert_eq!(buffer.bit_len(), 3);
        assert_eq!(buffer.as_bytes(), &[0b1110_0000, 0]);
        buffer.truncate(10);
        assert_eq!(buffer.bit_len(), 3);
    }

    #[test]
    fn debug_shows_bits() {
        let buffer = BitBuffer::from_bytes(vec![0b1000_0001]);
        let debug = format!("{buffer:?}");
        assert!(debug.contains("10000001"));
    }
}
