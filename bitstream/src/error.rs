//! Error types for bitstream operations.

use thiserror::Error;

/// Result type for bitstream operations.
pub type BitResult<T> = Result<T, BitError>;

/// Errors that can occur during bit-level encoding/decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BitError {
    /// Attempted to read past the last committed bit.
    #[error("attempted to read {requested} bits but only {available} bits available")]
    EndOfBuffer {
        /// Number of bits requested.
        requested: usize,
        /// Number of bits available.
        available: usize,
    },

    /// Invalid bit count for the operation.
    #[error("invalid bit count {bits}, allowed range is {min_bits}..={max_bits}")]
    InvalidBitCount {
        /// The invalid bit count provided.
        bits: u32,
        /// Minimum allowed bits for this operation.
        min_bits: u32,
        /// Maximum allowed bits for this operation.
        max_bits: u32,
    },

    /// Value exceeds the range representable by the specified number of bits.
    #[error("value {value} cannot be represented in {bits} bits")]
    ValueOutOfRange {
        /// The value (or magnitude, for signed writes) that was out of range.
        value: u64,
        /// Number of bits available.
        bits: u32,
    },

    /// Value exceeds the declared maximum.
    #[error("value {value} exceeds declared maximum {max}")]
    ExceedsMax {
        /// The value (or magnitude, for signed writes) that was out of range.
        value: u64,
        /// The declared maximum.
        max: u64,
    },

    /// A decoded signed value does not fit in `i32`.
    #[error("decoded signed magnitude {magnitude} (negative: {negative}) does not fit in i32")]
    SignedOverflow {
        /// Whether the sign bit was set.
        negative: bool,
        /// Decoded magnitude.
        magnitude: u64,
    },

    /// Allocation was requested with a zero size.
    #[error("cannot allocate a buffer of zero bytes")]
    ZeroCapacity,

    /// The buffer already owns storage.
    #[error("buffer is already allocated ({capacity} bytes)")]
    AlreadyAllocated {
        /// Current capacity in bytes.
        capacity: usize,
    },

    /// Growth was requested before the first allocation.
    #[error("buffer has no storage; allocate before growing")]
    NotAllocated,

    /// A resize would drop committed bits.
    #[error("resizing to {requested_bytes} bytes would truncate {committed_bits} committed bits")]
    WouldTruncate {
        /// Requested size in bytes.
        requested_bytes: usize,
        /// Bits already written.
        committed_bits: usize,
    },

    /// Growing by the requested bits would overflow the addressable size.
    #[error("cannot grow a {bit_len}-bit buffer by {additional} bits")]
    CapacityOverflow {
        /// Bits already written.
        bit_len: usize,
        /// Bits requested.
        additional: usize,
    },
}

impl BitError {
    /// Returns `true` for errors caused by running out of readable bits.
    #[must_use]
    pub const fn is_end_of_buffer(&self) -> bool {
        matches!(self, Self::EndOfBuffer { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_end_of_buffer() {
        let err = BitError::EndOfBuffer {
            requested: 8,
            available: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("8 bits"), "should mention requested bits");
        assert!(msg.contains("3 bits"), "should mention available bits");
        assert!(msg.contains("read"), "should mention read operation");
    }

    #[test]
    fn error_display_invalid_bit_count() {
        let err = BitError::InvalidBitCount {
            bits: 33,
            min_bits: 1,
            max_bits: 32,
        };
        let msg = err.to_string();
        assert!(msg.contains("33"), "should mention invalid count");
        assert!(msg.contains("32"), "should mention maximum");
    }

    #[test]
    fn error_display_value_out_of_range() {
        let err = BitError::ValueOutOfRange {
            value: 256,
            bits: 8,
        };
        let msg = err.to_string();
        assert!(msg.contains("256"), "should mention the value");
        assert!(msg.contains("8 bits"), "should mention bit count");
    }

    #[test]
    fn error_display_capacity_overflow() {
        let err = BitError::CapacityOverflow {
            bit_len: 3,
            additional: usize::MAX,
        };
        let msg = err.to_string();
        assert!(msg.contains("3-bit"));
        assert!(msg.contains(&usize::MAX.to_string()));
    }

    #[test]
    fn error_display_signed_overflow() {
        let err = BitError::SignedOverflow {
            negative: true,
            magnitude: 1 << 32,
        };
        let msg = err.to_string();
        assert!(msg.contains("4294967296"));
        assert!(msg.contains("negative: true"));
    }

    #[test]
    fn error_display_would_truncate() {
        let err = BitError::WouldTruncate {
            requested_bytes: 1,
            committed_bits: 12,
        };
        let msg = err.to_string();
        assert!(msg.contains("1 bytes"));
        assert!(msg.contains("12 committed bits"));
    }

    #[test]
    fn error_equality() {
        let err1 = BitError::EndOfBuffer {
            requested: 8,
            available: 3,
        };
        let err2 = BitError::EndOfBuffer {
            requested: 8,
            available: 3,
        };
        let err3 = BitError::EndOfBuffer {
            requested: 8,
            available: 4,
        };
        assert_eq!(err1, err2);
        assert_ne!(err1, err3);
        assert!(err1.is_end_of_buffer());
        assert!(!BitError::ZeroCapacity.is_end_of_buffer());
    }

    #[test]
    fn error_is_std_error() {
        fn assert_error<E: std::error::Error>() {}
        assert_error::<BitError>();
    }
}
