//! Growable bit buffer and variable-width integer packing for bitser.
//!
//! This crate provides [`BitBuffer`], a bit-addressable byte store that is
//! appended to during serialization and read back through a cursor during
//! deserialization, plus the integer codec that sizes every field either by an
//! explicit width or by a declared maximum value.
//!
//! # Design Principles
//!
//! - **No unsafe code** - Safety is paramount.
//! - **Bounded operations** - All reads are checked against the committed bit length.
//! - **No domain knowledge** - Strings and object graphs live in the codec crate.
//! - **Explicit errors** - All failures return structured errors, never panic.
//! - **Failed operations leave no trace** - Writes validate before appending and
//!   reads restore the cursor on failure.
//!
//! # Example
//!
//! ```
//! use bitstream::BitBuffer;
//!
//! let mut buffer = BitBuffer::new();
//! buffer.write_unsigned_max(5, 7).unwrap();
//! buffer.write_unsigned_max(1, 1).unwrap();
//! assert_eq!(buffer.bit_string(), "1011");
//!
//! let bytes = buffer.finish();
//! assert_eq!(bytes, vec![0b1011_0000]);
//!
//! let mut reader = BitBuffer::from_bytes(bytes);
//! assert_eq!(reader.read_unsigned_max(7).unwrap(), 5);
//! assert_eq!(reader.read_unsigned_max(1).unwrap(), 1);
//! ```

mod buffer;
mod error;
mod int;
mod reader;
mod writer;

pub use buffer::{BitBuffer, DEFAULT_CAPACITY_BYTES};
pub use error::{BitError, BitResult};
pub use int::{width_for_max, MAX_INT_BITS};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_roundtrip() {
        let buffer = BitBuffer::new();
        let bytes = buffer.finish();
        assert!(bytes.is_empty());

        let reader = BitBuffer::from_bytes(bytes);
        assert_eq!(reader.bits_remaining(), 0);
    }

    #[test]
    fn multiple_bools_roundtrip() {
        let mut buffer = BitBuffer::new();
        for bit in [true, false, true, true, false] {
            buffer.write_bool(bit);
        }

        let mut reader = BitBuffer::from_bytes(buffer.finish());
        assert!(reader.read_bool().unwrap());
        assert!(!reader.read_bool().unwrap());
        assert!(reader.read_bool().unwrap());
        assert!(reader.read_bool().unwrap());
        assert!(!reader.read_bool().unwrap());
    }

    #[test]
    fn mixed_roundtrip() {
        let mut buffer = BitBuffer::new();
        buffer.write_bool(true);
        buffer.write_unsigned_bits(0b1010, 4).unwrap();
        buffer.write_signed_max(-300, 1000).unwrap();
        buffer.write_ones(2).unwrap();
        buffer.pad_to_byte(true);
        buffer.write_unsigned_max(42, 100).unwrap();

        let mut reader = BitBuffer::from_bytes(buffer.finish());
        assert!(reader.read_bool().unwrap());
        assert_eq!(reader.read_unsigned_bits(4).unwrap(), 0b1010);
        assert_eq!(reader.read_signed_max(1000).unwrap(), -300);
        assert_eq!(reader.read_bits(2).unwrap(), 0b11);
        reader.skip_to_byte().unwrap();
        assert_eq!(reader.read_unsigned_max(100).unwrap(), 42);
    }

    #[test]
    fn doctest_example() {
        let mut buffer = BitBuffer::new();
        buffer.write_unsigned_max(5, 7).unwrap();
        buffer.write_unsigned_max(1, 1).unwrap();
        assert_eq!(buffer.finish(), vec![0b1011_0000]);
    }
}
