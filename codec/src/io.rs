//! Byte sinks and sources for finalized streams.

use std::io::{self, Read, Write};

/// Destination for finalized bytes.
pub trait ByteSink {
    /// Writes all of `bytes` and flushes.
    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()>;
}

impl<W: Write + ?Sized> ByteSink for W {
    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.write_all(bytes)?;
        self.flush()
    }
}

/// Origin of bytes to deserialize.
pub trait ByteSource {
    /// Reads until end of input.
    fn read_bytes(&mut self) -> io::Result<Vec<u8>>;
}

impl<R: Read + ?Sized> ByteSource for R {
    fn read_bytes(&mut self) -> io::Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}
