//! Bit-level append operations.

use crate::buffer::BitBuffer;
use crate::error::{BitError, BitResult};

impl BitBuffer {
    /// Appends a single bit, growing the buffer if needed.
    pub fn write_bool(&mut self, value: bool) {
        self.reserve_bits(1);
        self.push_bit_unchecked(value);
    }

    /// Appends up to 64 bits from an unsigned integer, MSB first.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::InvalidBitCount`] if `bits > 64`.
    /// Returns [`BitError::ValueOutOfRange`] if `value` doesn't fit in `bits`.
    pub fn write_bits(&mut self, value: u64, bits: u32) -> BitResult<()> {
        if bits > 64 {
            return Err(BitError::InvalidBitCount {
                bits,
                min_bits: 0,
                max_bits: 64,
            });
        }
        if bits == 0 {
            return Ok(());
        }
        if bits < 64 && value >= (1u64 << bits) {
            return Err(BitError::ValueOutOfRange { value, bits });
        }

        self.reserve_bits(bits as usize);
        for i in (0..bits).rev() {
            self.push_bit_unchecked((value >> i) & 1 == 1);
        }
        Ok(())
    }

    /// Appends `count` one bits.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::CapacityOverflow`] if the buffer cannot grow by
    /// `count` bits; nothing is written.
    pub fn write_ones(&mut self, count: usize) -> BitResult<()> {
        self.try_reserve_bits(count)?;
        self.push_repeated(true, count);
        Ok(())
    }

    /// Appends `count` zero bits.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::CapacityOverflow`] if the buffer cannot grow by
    /// `count` bits; nothing is written.
    pub fn write_zeros(&mut self, count: usize) -> BitResult<()> {
        self.try_reserve_bits(count)?;
        self.push_repeated(false, count);
        Ok(())
    }

    /// Pads with `bit` until the write position is byte aligned.
    ///
    /// Returns the number of bits written.
    pub fn pad_to_byte(&mut self, bit: bool) -> usize {
        let rem = self.bit_len() % 8;
        if rem == 0 {
            return 0;
        }
        let pad = 8 - rem;
        self.reserve_bits(pad);
        self.push_repeated(bit, pad);
        pad
    }

    /// Appends the IEEE-754 bit pattern of an `f32`.
    pub fn write_f32(&mut self, value: f32) {
        self.reserve_bits(32);
        let bits = value.to_bits();
        for i in (0..32).rev() {
            self.push_bit_unchecked((bits >> i) & 1 == 1);
        }
    }

    /// Appends the IEEE-754 bit pattern of an `f64`.
    pub fn write_f64(&mut self, value: f64) {
        self.reserve_bits(64);
        let bits = value.to_bits();
        for i in (0..64).rev() {
            self.push_bit_unchecked((bits >> i) & 1 == 1);
        }
    }

    fn push_repeated(&mut self, bit: bool, count: usize) {
        for _ in 0..count {
            self.push_bit_unchecked(bit);
        }
    }
}
