//! Bit-level reads with bounded operations.
//!
//! Every read is checked against the committed bit length before the cursor
//! moves, so a failed read leaves the buffer untouched.

use crate::buffer::BitBuffer;
use crate::error::{BitError, BitResult};

impl BitBuffer {
    /// Reads a single bit as a boolean.
    pub fn read_bool(&mut self) -> BitResult<bool> {
        self.ensure_remaining(1)?;
        Ok(self.next_bit_unchecked())
    }

    /// Reads up to 64 bits as an unsigned integer, MSB first.
    pub fn read_bits(&mut self, bits: u32) -> BitResult<u64> {
        if bits > 64 {
            return Err(BitError::InvalidBitCount {
                bits,
                min_bits: 0,
                max_bits: 64,
            });
        }
        if bits == 0 {
            return Ok(0);
        }
        self.ensure_remaining(bits as usize)?;

        let mut value = 0u64;
        for _ in 0..bits {
            value = (value << 1) | u64::from(self.next_bit_unchecked());
        }
        Ok(value)
    }

    /// Skips to the next byte boundary. Skipped bits are not interpreted.
    ///
    /// Returns the number of bits skipped.
    pub fn skip_to_byte(&mut self) -> BitResult<usize> {
        let rem = self.cursor() % 8;
        if rem == 0 {
            return Ok(0);
        }
        let skip = 8 - rem;
        self.ensure_remaining(skip)?;
        self.advance_cursor(skip);
        Ok(skip)
    }

    /// Reads an `f32` from its IEEE-754 bit pattern.
    pub fn read_f32(&mut self) -> BitResult<f32> {
        self.ensure_remaining(32)?;
        let mut bits = 0u32;
        for _ in 0..32 {
            bits = (bits << 1) | u32::from(self.next_bit_unchecked());
        }
        Ok(f32::from_bits(bits))
    }

    /// Reads an `f64` from its IEEE-754 bit pattern.
    pub fn read_f64(&mut self) -> BitResult<f64> {
        let bits = self.read_bits(64)?;
        Ok(f64::from_bits(bits))
    }

    /// Fails unless at least `bits` committed bits remain unread.
    pub fn ensure_remaining(&self, bits: usize) -> BitResult<()> {
        let available = self.bits_remaining();
        if bits > available {
            return Err(BitError::EndOfBuffer {
                requested: bits,
                available,
            });
        }
        Ok(())
    }

    fn next_bit_unchecked(&mut self) -> bool {
        let bit = self.bit(self.cursor()) == Some(true);
        self.advance_cursor(1);
        bit
    }
}
