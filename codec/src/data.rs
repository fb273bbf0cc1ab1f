//! Finalized serializer output.

use std::fmt;

use bitstream::{BitBuffer, BitResult};

/// Bytes produced by a finished serialization, with their exact bit length.
///
/// The final byte is zero-padded when the bit length is not a multiple of 8.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SerializedData {
    bytes: Vec<u8>,
    bit_len: usize,
}

impl SerializedData {
    pub(crate) fn from_buffer(buffer: &BitBuffer) -> Self {
        Self {
            bytes: buffer.committed_bytes().to_vec(),
            bit_len: buffer.bit_len(),
        }
    }

    /// Returns the finalized bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the data and returns the bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Returns the number of meaningful bits.
    #[must_use]
    pub const fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// Returns the length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if nothing was written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Renders the meaningful bits as `'0'`/`'1'` characters.
    #[must_use]
    pub fn bit_string(&self) -> String {
        self.to_buffer().map(|buffer| buffer.bit_string()).unwrap_or_default()
    }

    pub(crate) fn into_buffer(self) -> BitResult<BitBuffer> {
        BitBuffer::from_parts(self.bytes, self.bit_len)
    }

    fn to_buffer(&self) -> BitResult<BitBuffer> {
        BitBuffer::from_parts(self.bytes.clone(), self.bit_len)
    }
}

/// Every bit of raw bytes is treated as meaningful.
impl From<Vec<u8>> for SerializedData {
    fn from(bytes: Vec<u8>) -> Self {
        let bit_len = bytes.len() * 8;
        Self { bytes, bit_len }
    }
}

impl From<&[u8]> for SerializedData {
    fn from(bytes: &[u8]) -> Self {
        Self::from(bytes.to_vec())
    }
}

impl AsRef<[u8]> for SerializedData {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for SerializedData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializedData")
            .field("len", &self.bytes.len())
            .field("bit_len", &self.bit_len)
            .finish()
    }
}
