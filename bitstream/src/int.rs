//! Variable-width integer packing.
//!
//! Every integer field is sized either by an explicit width in
//! `1..=`[`MAX_INT_BITS`] or by a declared maximum, from which the width is
//! derived with [`width_for_max`]. The format carries no width information,
//! so reads must use exactly the parameters the writer used.
//!
//! Signed values are one sign bit (`1` = negative) followed by the magnitude.
//! A set sign bit with a zero magnitude decodes as `0`.

use crate::buffer::BitBuffer;
use crate::error::{BitError, BitResult};

/// Widest integer field supported by the codec.
pub const MAX_INT_BITS: u32 = 32;

/// Minimum number of bits that can represent every value in `0..=max_value`.
///
/// ```
/// use bitstream::width_for_max;
///
/// assert_eq!(width_for_max(0), 1);
/// assert_eq!(width_for_max(1), 1);
/// assert_eq!(width_for_max(7), 3);
/// assert_eq!(width_for_max(8), 4);
/// assert_eq!(width_for_max(u32::MAX), 32);
/// ```
#[must_use]
pub const fn width_for_max(max_value: u32) -> u32 {
    if max_value == 0 {
        1
    } else {
        u32::BITS - max_value.leading_zeros()
    }
}

const fn check_width(bits: u32) -> BitResult<()> {
    if bits == 0 || bits > MAX_INT_BITS {
        return Err(BitError::InvalidBitCount {
            bits,
            min_bits: 1,
            max_bits: MAX_INT_BITS,
        });
    }
    Ok(())
}

const fn fits_in(value: u32, bits: u32) -> bool {
    (value as u64) < (1u64 << bits)
}

impl BitBuffer {
    /// Writes `value` in exactly `bits` bits.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::InvalidBitCount`] for widths outside `1..=32` and
    /// [`BitError::ValueOutOfRange`] if `value > 2^bits - 1`.
    pub fn write_unsigned_bits(&mut self, value: u32, bits: u32) -> BitResult<()> {
        check_width(bits)?;
        if !fits_in(value, bits) {
            return Err(BitError::ValueOutOfRange {
                value: u64::from(value),
                bits,
            });
        }
        self.write_bits(u64::from(value), bits)
    }

    /// Writes `value` in the width derived from `max_value`.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::ExceedsMax`] if `value > max_value`.
    pub fn write_unsigned_max(&mut self, value: u32, max_value: u32) -> BitResult<()> {
        if value > max_value {
            return Err(BitError::ExceedsMax {
                value: u64::from(value),
                max: u64::from(max_value),
            });
        }
        self.write_bits(u64::from(value), width_for_max(max_value))
    }

    /// Writes a sign bit followed by `|value|` in `bits` bits.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::InvalidBitCount`] for widths outside `1..=32` and
    /// [`BitError::ValueOutOfRange`] if the magnitude does not fit.
    pub fn write_signed_bits(&mut self, value: i32, bits: u32) -> BitResult<()> {
        check_width(bits)?;
        let magnitude = value.unsigned_abs();
        if !fits_in(magnitude, bits) {
            return Err(BitError::ValueOutOfRange {
                value: u64::from(magnitude),
                bits,
            });
        }
        self.write_sign_magnitude(value < 0, magnitude, bits)
    }

    /// Writes a sign bit followed by `|value|` in the width derived from `max_value`.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::ExceedsMax`] if `|value| > max_value`.
    pub fn write_signed_max(&mut self, value: i32, max_value: u32) -> BitResult<()> {
        let magnitude = value.unsigned_abs();
        if magnitude > max_value {
            return Err(BitError::ExceedsMax {
                value: u64::from(magnitude),
                max: u64::from(max_value),
            });
        }
        self.write_sign_magnitude(value < 0, magnitude, width_for_max(max_value))
    }

    /// Reads an unsigned value written with [`write_unsigned_bits`](Self::write_unsigned_bits).
    pub fn read_unsigned_bits(&mut self, bits: u32) -> BitResult<u32> {
        check_width(bits)?;
        let raw = self.read_bits(bits)?;
        Ok(narrow(raw))
    }

    /// Reads an unsigned value written with [`write_unsigned_max`](Self::write_unsigned_max).
    ///
    /// A decoded value above `max_value` fails and restores the cursor.
    pub fn read_unsigned_max(&mut self, max_value: u32) -> BitResult<u32> {
        let start = self.cursor();
        let value = narrow(self.read_bits(width_for_max(max_value))?);
        if value > max_value {
            self.set_cursor(start)?;
            return Err(BitError::ExceedsMax {
                value: u64::from(value),
                max: u64::from(max_value),
            });
        }
        Ok(value)
    }

    /// Reads a signed value written with [`write_signed_bits`](Self::write_signed_bits).
    pub fn read_signed_bits(&mut self, bits: u32) -> BitResult<i32> {
        check_width(bits)?;
        let start = self.cursor();
        let (negative, magnitude) = self.read_sign_magnitude(bits)?;
        to_signed(negative, magnitude).map_err(|err| self.rewind_on_error(start, err))
    }

    /// Reads a signed value written with [`write_signed_max`](Self::write_signed_max).
    ///
    /// A decoded magnitude above `max_value` fails and restores the cursor.
    pub fn read_signed_max(&mut self, max_value: u32) -> BitResult<i32> {
        let start = self.cursor();
        let (negative, magnitude) = self.read_sign_magnitude(width_for_max(max_value))?;
        if magnitude > max_value {
            return Err(self.rewind_on_error(
                start,
                BitError::ExceedsMax {
                    value: u64::from(magnitude),
                    max: u64::from(max_value),
                },
            ));
        }
        to_signed(negative, magnitude).map_err(|err| self.rewind_on_error(start, err))
    }

    fn write_sign_magnitude(&mut self, negative: bool, magnitude: u32, bits: u32) -> BitResult<()> {
        self.reserve_bits(1 + bits as usize);
        self.write_bool(negative);
        self.write_bits(u64::from(magnitude), bits)
    }

    fn read_sign_magnitude(&mut self, bits: u32) -> BitResult<(bool, u32)> {
        self.ensure_remaining(1 + bits as usize)?;
        let negative = self.read_bool()?;
        let magnitude = narrow(self.read_bits(bits)?);
        Ok((negative, magnitude))
    }

    fn rewind_on_error(&mut self, start: usize, err: BitError) -> BitError {
        // `start` was a valid cursor position a moment ago.
        let _ = self.set_cursor(start);
        err
    }
}

/// Narrows a value read with at most 32 bits.
#[allow(clippy::cast_possible_truncation)]
const fn narrow(raw: u64) -> u32 {
    raw as u32
}

fn to_signed(negative: bool, magnitude: u32) -> BitResult<i32> {
    let wide = if negative {
        -i64::from(magnitude)
    } else {
        i64::from(magnitude)
    };
    i32::try_from(wide).map_err(|_| BitError::SignedOverflow {
        negative,
        magnitude: u64::from(magnitude),
    })
}
