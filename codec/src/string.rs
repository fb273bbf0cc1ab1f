//! String encodings.
//!
//! All three encodings start from a character count sized by the configured
//! maximum string length. None of them is tagged on the wire.
//!
//! - **ASCII**: one 8-bit unit per character. Non-ASCII characters are written
//!   as `?`.
//! - **Compressed**: one 6-bit symbol per character from [`ALPHABET`]
//!   (`a-z`, `A-Z`, `0-9`, space). Symbol 63 escapes: a `0` flag bit is
//!   followed by a 7-bit ASCII code, a `1` flag bit by a 21-bit Unicode scalar
//!   value. Lossless.
//! - **Minimal**: a presence bit. `1` is followed by an index into the
//!   session string table, sized by `table_len - 1`. `0` is followed by the
//!   fallback literal encoding, after which the string joins the table.

use std::collections::HashMap;

use bitstream::{width_for_max, BitBuffer};
use tracing::debug;

use crate::config::LiteralEncoding;
use crate::error::{LimitKind, SessionError, SessionResult};

/// Symbols of the compressed encoding, indexed by symbol value.
pub const ALPHABET: &[u8; 63] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789 ";

/// Bits per compressed symbol.
pub const SYMBOL_BITS: u32 = 6;

const ESCAPE: u32 = 63;
const ASCII_BITS: u32 = 7;
const SCALAR_BITS: u32 = 21;
const LOSSY_REPLACEMENT: u8 = b'?';

/// Session-scoped dictionary for minimal-string mode.
#[derive(Debug, Default)]
pub(crate) struct StringTable {
    indices: HashMap<String, u32>,
    entries: Vec<String>,
}

impl StringTable {
    pub(crate) fn clear(&mut self) {
        self.indices.clear();
        self.entries.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Drops entries added after the table had `len` entries.
    pub(crate) fn truncate(&mut self, len: usize) {
        for dropped in self.entries.drain(len.min(self.entries.len())..) {
            self.indices.remove(&dropped);
        }
    }

    fn insert(&mut self, value: String) -> SessionResult<()> {
        let index = u32::try_from(self.entries.len()).map_err(|_| SessionError::LimitsExceeded {
            kind: LimitKind::StringTable,
            limit: u32::MAX as usize,
            actual: self.entries.len(),
        })?;
        self.indices.entry(value.clone()).or_insert(index);
        self.entries.push(value);
        Ok(())
    }

    /// Largest valid index, or `None` for an empty table.
    fn max_index(&self) -> Option<u32> {
        let len = u32::try_from(self.entries.len()).unwrap_or(u32::MAX);
        len.checked_sub(1)
    }
}

fn write_length(buffer: &mut BitBuffer, len: usize, max_len: u32) -> SessionResult<()> {
    let value = u32::try_from(len)
        .ok()
        .filter(|value| *value <= max_len)
        .ok_or(SessionError::LimitsExceeded {
            kind: LimitKind::StringLength,
            limit: max_len as usize,
            actual: len,
        })?;
    buffer.write_unsigned_max(value, max_len)?;
    Ok(())
}

fn read_length(buffer: &mut BitBuffer, max_len: u32) -> SessionResult<usize> {
    Ok(buffer.read_unsigned_max(max_len)? as usize)
}

/// Writes `value` as ASCII, replacing non-ASCII characters with `?`.
pub(crate) fn write_ascii(buffer: &mut BitBuffer, value: &str, max_len: u32) -> SessionResult<()> {
    let len = value.chars().count();
    write_length(buffer, len, max_len)?;
    let mut replaced = 0usize;
    for ch in value.chars() {
        let byte = match u8::try_from(ch) {
            Ok(byte) if byte.is_ascii() => byte,
            _ => {
                replaced += 1;
                LOSSY_REPLACEMENT
            }
        };
        buffer.write_bits(u64::from(byte), 8)?;
    }
    if replaced > 0 {
        debug!(replaced, "non-ASCII characters replaced in ASCII string");
    }
    Ok(())
}

pub(crate) fn read_ascii(buffer: &mut BitBuffer, max_len: u32) -> SessionResult<String> {
    let len = read_length(buffer, max_len)?;
    buffer.ensure_remaining(len * 8)?;
    let mut out = String::with_capacity(len);
    for _ in 0..len {
        let code = buffer.read_unsigned_bits(8)?;
        let ch = u8::try_from(code)
            .ok()
            .filter(u8::is_ascii)
            .ok_or(SessionError::InvalidCharacter { code })?;
        out.push(char::from(ch));
    }
    Ok(out)
}

fn symbol_for(ch: char) -> Option<u32> {
    let code = ch as u32;
    match ch {
        'a'..='z' => Some(code - 'a' as u32),
        'A'..='Z' => Some(26 + code - 'A' as u32),
        '0'..='9' => Some(52 + code - '0' as u32),
        ' ' => Some(62),
        _ => None,
    }
}

/// Number of bits the compressed encoding spends on `value`'s characters.
#[must_use]
pub fn compressed_body_bits(value: &str) -> usize {
    value
        .chars()
        .map(|ch| {
            if symbol_for(ch).is_some() {
                SYMBOL_BITS as usize
            } else if ch.is_ascii() {
                (SYMBOL_BITS + 1 + ASCII_BITS) as usize
            } else {
                (SYMBOL_BITS + 1 + SCALAR_BITS) as usize
            }
        })
        .sum()
}

pub(crate) fn write_compressed(
    buffer: &mut BitBuffer,
    value: &str,
    max_len: u32,
) -> SessionResult<()> {
    write_length(buffer, value.chars().count(), max_len)?;
    for ch in value.chars() {
        if let Some(symbol) = symbol_for(ch) {
            buffer.write_unsigned_bits(symbol, SYMBOL_BITS)?;
            continue;
        }
        buffer.write_unsigned_bits(ESCAPE, SYMBOL_BITS)?;
        let wide = !ch.is_ascii();
        buffer.write_bool(wide);
        let bits = if wide { SCALAR_BITS } else { ASCII_BITS };
        buffer.write_unsigned_bits(ch as u32, bits)?;
    }
    Ok(())
}

pub(crate) fn read_compressed(buffer: &mut BitBuffer, max_len: u32) -> SessionResult<String> {
    let len = read_length(buffer, max_len)?;
    buffer.ensure_remaining(len * SYMBOL_BITS as usize)?;
    let mut out = String::with_capacity(len);
    for _ in 0..len {
        let symbol = buffer.read_unsigned_bits(SYMBOL_BITS)?;
        if symbol != ESCAPE {
            out.push(char::from(ALPHABET[symbol as usize]));
            continue;
        }
        let bits = if buffer.read_bool()? {
            SCALAR_BITS
        } else {
            ASCII_BITS
        };
        let code = buffer.read_unsigned_bits(bits)?;
        let ch = char::from_u32(code).ok_or(SessionError::InvalidCharacter { code })?;
        out.push(ch);
    }
    Ok(out)
}

fn write_literal(
    buffer: &mut BitBuffer,
    value: &str,
    max_len: u32,
    encoding: LiteralEncoding,
) -> SessionResult<()> {
    match encoding {
        LiteralEncoding::Ascii => write_ascii(buffer, value, max_len),
        LiteralEncoding::Compressed => write_compressed(buffer, value, max_len),
    }
}

fn read_literal(
    buffer: &mut BitBuffer,
    max_len: u32,
    encoding: LiteralEncoding,
) -> SessionResult<String> {
    match encoding {
        LiteralEncoding::Ascii => read_ascii(buffer, max_len),
        LiteralEncoding::Compressed => read_compressed(buffer, max_len),
    }
}

pub(crate) fn write_minimal(
    buffer: &mut BitBuffer,
    table: &mut StringTable,
    value: &str,
    max_len: u32,
    fallback: LiteralEncoding,
) -> SessionResult<()> {
    if let (Some(&index), Some(max_index)) = (table.indices.get(value), table.max_index()) {
        buffer.write_bool(true);
        buffer.write_unsigned_max(index, max_index)?;
        return Ok(());
    }
    buffer.write_bool(false);
    write_literal(buffer, value, max_len, fallback)?;
    table.insert(value.to_owned())
}

pub(crate) fn read_minimal(
    buffer: &mut BitBuffer,
    table: &mut StringTable,
    max_len: u32,
    fallback: LiteralEncoding,
) -> SessionResult<String> {
    if buffer.read_bool()? {
        let max_index = table.max_index().ok_or(SessionError::InvalidBackReference {
            index: 0,
            table_len: 0,
        })?;
        let index = buffer.read_unsigned_bits(width_for_max(max_index))?;
        return table
            .entries
            .get(index as usize)
            .cloned()
            .ok_or(SessionError::InvalidBackReference {
                index,
                table_len: table.len(),
            });
    }
    let value = read_literal(buffer, max_len, fallback)?;
    table.insert(value.clone())?;
    Ok(value)
}
