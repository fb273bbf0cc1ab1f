//! The serialization session.
//!
//! A [`Session`] owns one [`BitBuffer`] and one string table and moves
//! through a small state machine:
//!
//! ```text
//! None -> Serializing   -> DoneSerializing
//! None -> Deserializing -> DoneDeserializing
//! any  -> Error
//! ```
//!
//! Every `add_*` operation is legal only while serializing and every `get_*`
//! operation only while deserializing. A failed operation leaves no partial
//! output behind (the buffer and string table are rolled back, or the read
//! cursor restored) and moves the session to [`SessionState::Error`], which
//! accepts nothing but inspection.

use std::fs::File;
use std::path::Path;

use bitstream::{BitBuffer, BitResult};
use tracing::{debug, warn};

use crate::config::SessionConfig;
use crate::data::SerializedData;
use crate::error::{SessionError, SessionResult};
use crate::io::{ByteSink, ByteSource};
use crate::object::TypeRegistry;
use crate::state::SessionState;
use crate::string::{self, StringTable};
use crate::value::{GraphNode, Value};

/// A single-use serializer or deserializer.
///
/// # Example
///
/// ```
/// use codec::{Session, SessionState};
///
/// let mut writer = Session::default();
/// writer.start_serializing().unwrap();
/// writer.add_unsigned_max(5, 7).unwrap();
/// writer.add_unsigned_max(1, 1).unwrap();
/// let data = writer.finalize_serializing().unwrap();
/// assert_eq!(data.as_bytes(), &[0b1011_0000]);
///
/// let mut reader = Session::default();
/// reader.start_deserializing_with(data).unwrap();
/// assert_eq!(reader.get_unsigned_max(7).unwrap(), 5);
/// assert_eq!(reader.get_unsigned_max(1).unwrap(), 1);
/// reader.finish_deserializing().unwrap();
/// assert_eq!(reader.state(), SessionState::DoneDeserializing);
/// ```
#[derive(Debug, Default)]
pub struct Session {
    state: SessionState,
    pub(crate) buffer: BitBuffer,
    pub(crate) strings: StringTable,
    pub(crate) config: SessionConfig,
    /// Current object graph nesting level.
    pub(crate) depth: usize,
    last_error: Option<SessionError>,
}

impl Session {
    /// Creates a fresh session with `config`.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    // Lifecycle

    /// Begins serializing, allocating `initial_capacity_bytes` up front.
    pub fn start_serializing(&mut self) -> SessionResult<()> {
        const OP: &str = "start_serializing";
        self.expect_state(OP, SessionState::None)?;
        let capacity = self.config.initial_capacity_bytes;
        let buffer = match capacity {
            0 => BitBuffer::new(),
            bytes => BitBuffer::with_capacity(bytes).map_err(|err| self.fail(OP, err.into()))?,
        };
        self.begin(SessionState::Serializing, buffer);
        Ok(())
    }

    /// Begins serializing into a buffer of exactly `bytes` bytes.
    ///
    /// The buffer still grows on demand.
    pub fn start_serializing_with_byte_count(&mut self, bytes: usize) -> SessionResult<()> {
        const OP: &str = "start_serializing_with_byte_count";
        self.expect_state(OP, SessionState::None)?;
        let buffer = BitBuffer::with_capacity(bytes).map_err(|err| self.fail(OP, err.into()))?;
        self.begin(SessionState::Serializing, buffer);
        Ok(())
    }

    /// Ends serialization and returns the written bytes.
    ///
    /// Bits after the last written bit in the final byte are zero.
    pub fn finalize_serializing(&mut self) -> SessionResult<SerializedData> {
        self.expect_state("finalize_serializing", SessionState::Serializing)?;
        self.state = SessionState::DoneSerializing;
        let data = SerializedData::from_buffer(&self.buffer);
        debug!(
            bits = data.bit_len(),
            bytes = data.len(),
            "serialization finalized"
        );
        Ok(data)
    }

    /// Ends serialization and writes the bytes to `sink`.
    pub fn finalize_serializing_to<S>(&mut self, sink: &mut S) -> SessionResult<SerializedData>
    where
        S: ByteSink + ?Sized,
    {
        let data = self.finalize_serializing()?;
        sink.write_bytes(data.as_bytes()).map_err(|err| {
            self.fail(
                "finalize_serializing_to",
                SessionError::io("writing to sink", &err),
            )
        })?;
        Ok(data)
    }

    /// Ends serialization and writes the bytes to the file at `path`,
    /// creating or truncating it.
    pub fn finalize_serializing_to_file(
        &mut self,
        path: impl AsRef<Path>,
    ) -> SessionResult<SerializedData> {
        const OP: &str = "finalize_serializing_to_file";
        let path = path.as_ref();
        self.expect_state(OP, SessionState::Serializing)?;
        let mut file = File::create(path).map_err(|err| {
            self.fail(OP, SessionError::io(format_args!("creating {}", path.display()), &err))
        })?;
        let data = self.finalize_serializing()?;
        file.write_bytes(data.as_bytes()).map_err(|err| {
            self.fail(OP, SessionError::io(format_args!("writing {}", path.display()), &err))
        })?;
        Ok(data)
    }

    /// Begins deserializing `data`.
    ///
    /// Raw byte vectors are read in full; [`SerializedData`] limits reads to
    /// its bit length.
    pub fn start_deserializing_with(
        &mut self,
        data: impl Into<SerializedData>,
    ) -> SessionResult<()> {
        const OP: &str = "start_deserializing_with";
        self.expect_state(OP, SessionState::None)?;
        let buffer = data
            .into()
            .into_buffer()
            .map_err(|err| self.fail(OP, err.into()))?;
        self.begin(SessionState::Deserializing, buffer);
        Ok(())
    }

    /// Reads `source` to its end and begins deserializing the bytes.
    pub fn start_deserializing_from<S>(&mut self, source: &mut S) -> SessionResult<()>
    where
        S: ByteSource + ?Sized,
    {
        const OP: &str = "start_deserializing_from";
        self.expect_state(OP, SessionState::None)?;
        let bytes = source
            .read_bytes()
            .map_err(|err| self.fail(OP, SessionError::io("reading from source", &err)))?;
        self.start_deserializing_with(bytes)
    }

    /// Reads the file at `path` and begins deserializing its bytes.
    pub fn start_deserializing_from_file(&mut self, path: impl AsRef<Path>) -> SessionResult<()> {
        const OP: &str = "start_deserializing_from_file";
        let path = path.as_ref();
        self.expect_state(OP, SessionState::None)?;
        let mut file = File::open(path).map_err(|err| {
            self.fail(OP, SessionError::io(format_args!("opening {}", path.display()), &err))
        })?;
        let bytes = file.read_bytes().map_err(|err| {
            self.fail(OP, SessionError::io(format_args!("reading {}", path.display()), &err))
        })?;
        self.start_deserializing_with(bytes)
    }

    /// Ends deserialization. Unread bits are ignored.
    pub fn finish_deserializing(&mut self) -> SessionResult<()> {
        self.expect_state("finish_deserializing", SessionState::Deserializing)?;
        self.state = SessionState::DoneDeserializing;
        debug!(
            read = self.buffer.cursor(),
            unread = self.buffer.bits_remaining(),
            "deserialization finished"
        );
        Ok(())
    }

    // Writes

    /// Appends `value` in exactly `bits` bits.
    pub fn add_unsigned_bits(&mut self, value: u32, bits: u32) -> SessionResult<()> {
        self.write_op("add_unsigned_bits", |buffer| {
            buffer.write_unsigned_bits(value, bits)
        })
    }

    /// Appends `value` in the width derived from `max_value`.
    pub fn add_unsigned_max(&mut self, value: u32, max_value: u32) -> SessionResult<()> {
        self.write_op("add_unsigned_max", |buffer| {
            buffer.write_unsigned_max(value, max_value)
        })
    }

    /// Appends a sign bit and `|value|` in `bits` bits.
    pub fn add_signed_bits(&mut self, value: i32, bits: u32) -> SessionResult<()> {
        self.write_op("add_signed_bits", |buffer| {
            buffer.write_signed_bits(value, bits)
        })
    }

    /// Appends a sign bit and `|value|` in the width derived from `max_value`.
    pub fn add_signed_max(&mut self, value: i32, max_value: u32) -> SessionResult<()> {
        self.write_op("add_signed_max", |buffer| {
            buffer.write_signed_max(value, max_value)
        })
    }

    /// Appends one bit.
    pub fn add_bool(&mut self, value: bool) -> SessionResult<()> {
        self.write_op("add_bool", |buffer| {
            buffer.write_bool(value);
            Ok(())
        })
    }

    /// Appends the IEEE-754 bit pattern of `value`.
    pub fn add_f32(&mut self, value: f32) -> SessionResult<()> {
        self.write_op("add_f32", |buffer| {
            buffer.write_f32(value);
            Ok(())
        })
    }

    /// Appends the IEEE-754 bit pattern of `value`.
    pub fn add_f64(&mut self, value: f64) -> SessionResult<()> {
        self.write_op("add_f64", |buffer| {
            buffer.write_f64(value);
            Ok(())
        })
    }

    /// Appends `count` one bits.
    pub fn add_ones(&mut self, count: usize) -> SessionResult<()> {
        self.write_op("add_ones", |buffer| buffer.write_ones(count))
    }

    /// Appends `count` zero bits.
    pub fn add_zeros(&mut self, count: usize) -> SessionResult<()> {
        self.write_op("add_zeros", |buffer| buffer.write_zeros(count))
    }

    /// Pads with one bits up to the next byte boundary. Returns the bits added.
    pub fn add_ones_to_next_full_byte(&mut self) -> SessionResult<usize> {
        self.write_op("add_ones_to_next_full_byte", |buffer| {
            Ok(buffer.pad_to_byte(true))
        })
    }

    /// Pads with `bit` up to the next byte boundary. Returns the bits added.
    pub fn add_padding_to_next_byte(&mut self, bit: bool) -> SessionResult<usize> {
        self.write_op("add_padding_to_next_byte", |buffer| {
            Ok(buffer.pad_to_byte(bit))
        })
    }

    /// Appends a length-prefixed ASCII string. Non-ASCII characters become `?`.
    pub fn add_string_ascii(&mut self, value: &str) -> SessionResult<()> {
        let max_len = self.config.max_string_len;
        self.session_write_op("add_string_ascii", |session| {
            string::write_ascii(&mut session.buffer, value, max_len)
        })
    }

    /// Appends a length-prefixed string in the 6-bit compressed alphabet.
    pub fn add_string_compressed(&mut self, value: &str) -> SessionResult<()> {
        let max_len = self.config.max_string_len;
        self.session_write_op("add_string_compressed", |session| {
            string::write_compressed(&mut session.buffer, value, max_len)
        })
    }

    /// Appends a string as a back-reference if it was written earlier in this
    /// session, otherwise as a literal that later writes can refer to.
    pub fn add_string_minimal(&mut self, value: &str) -> SessionResult<()> {
        self.session_write_op("add_string_minimal", |session| session.encode_minimal(value))
    }

    /// Appends an object graph rooted at `node`.
    pub fn add_object(&mut self, node: &dyn GraphNode) -> SessionResult<()> {
        self.session_write_op("add_object", |session| session.encode_node(node))
    }

    // Reads

    /// Reads a value written with [`add_unsigned_bits`](Self::add_unsigned_bits).
    pub fn get_unsigned_bits(&mut self, bits: u32) -> SessionResult<u32> {
        self.read_op("get_unsigned_bits", |buffer| buffer.read_unsigned_bits(bits))
    }

    /// Reads a value written with [`add_unsigned_max`](Self::add_unsigned_max).
    pub fn get_unsigned_max(&mut self, max_value: u32) -> SessionResult<u32> {
        self.read_op("get_unsigned_max", |buffer| {
            buffer.read_unsigned_max(max_value)
        })
    }

    /// Reads a value written with [`add_signed_bits`](Self::add_signed_bits).
    pub fn get_signed_bits(&mut self, bits: u32) -> SessionResult<i32> {
        self.read_op("get_signed_bits", |buffer| buffer.read_signed_bits(bits))
    }

    /// Reads a value written with [`add_signed_max`](Self::add_signed_max).
    pub fn get_signed_max(&mut self, max_value: u32) -> SessionResult<i32> {
        self.read_op("get_signed_max", |buffer| buffer.read_signed_max(max_value))
    }

    pub fn get_bool(&mut self) -> SessionResult<bool> {
        self.read_op("get_bool", BitBuffer::read_bool)
    }

    pub fn get_f32(&mut self) -> SessionResult<f32> {
        self.read_op("get_f32", BitBuffer::read_f32)
    }

    pub fn get_f64(&mut self) -> SessionResult<f64> {
        self.read_op("get_f64", BitBuffer::read_f64)
    }

    /// Skips to the next byte boundary. Returns the bits skipped.
    pub fn get_to_next_byte(&mut self) -> SessionResult<usize> {
        self.read_op("get_to_next_byte", BitBuffer::skip_to_byte)
    }

    pub fn get_string_ascii(&mut self) -> SessionResult<String> {
        let max_len = self.config.max_string_len;
        self.session_read_op("get_string_ascii", |session| {
            string::read_ascii(&mut session.buffer, max_len)
        })
    }

    pub fn get_string_compressed(&mut self) -> SessionResult<String> {
        let max_len = self.config.max_string_len;
        self.session_read_op("get_string_compressed", |session| {
            string::read_compressed(&mut session.buffer, max_len)
        })
    }

    pub fn get_string_minimal(&mut self) -> SessionResult<String> {
        self.session_read_op("get_string_minimal", Self::decode_minimal)
    }

    /// Reads an object graph, building custom objects through `registry`.
    pub fn get_object(&mut self, registry: &TypeRegistry) -> SessionResult<Value> {
        self.session_read_op("get_object", |session| session.decode_node(registry))
    }

    // Inspection

    /// Returns the live buffer, including unused capacity.
    ///
    /// Rejected once the session is in the error state.
    pub fn get_data(&mut self) -> SessionResult<&BitBuffer> {
        if self.state.is_error() {
            let state = self.state;
            return Err(self.fail(
                "get_data",
                SessionError::InvalidState {
                    operation: "get_data",
                    state,
                },
            ));
        }
        Ok(&self.buffer)
    }

    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.state.is_error()
    }

    /// Returns the error that moved the session into the error state.
    #[must_use]
    pub const fn last_error(&self) -> Option<&SessionError> {
        self.last_error.as_ref()
    }

    /// Returns the number of bits written, or available to read.
    #[must_use]
    pub const fn bits_written(&self) -> usize {
        self.buffer.bit_len()
    }

    /// Returns the read cursor position in bits.
    #[must_use]
    pub const fn bit_position(&self) -> usize {
        self.buffer.cursor()
    }

    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    // Guards

    fn begin(&mut self, state: SessionState, buffer: BitBuffer) {
        self.buffer = buffer;
        self.strings.clear();
        self.depth = 0;
        self.state = state;
        debug!(
            %state,
            capacity = self.buffer.capacity(),
            bits = self.buffer.bit_len(),
            "session started"
        );
    }

    fn expect_state(&mut self, operation: &'static str, expected: SessionState) -> SessionResult<()> {
        if self.state == expected {
            return Ok(());
        }
        let state = self.state;
        Err(self.fail(operation, SessionError::InvalidState { operation, state }))
    }

    /// Moves to the error state, keeping the first error, and hands `err` back.
    fn fail(&mut self, operation: &'static str, err: SessionError) -> SessionError {
        if !self.state.is_error() {
            warn!(operation, state = %self.state, error = %err, "session entered error state");
            self.state = SessionState::Error;
        }
        if self.last_error.is_none() {
            self.last_error = Some(err.clone());
        }
        err
    }

    fn write_op<T>(
        &mut self,
        operation: &'static str,
        op: impl FnOnce(&mut BitBuffer) -> BitResult<T>,
    ) -> SessionResult<T> {
        self.session_write_op(operation, |session| Ok(op(&mut session.buffer)?))
    }

    fn session_write_op<T>(
        &mut self,
        operation: &'static str,
        op: impl FnOnce(&mut Self) -> SessionResult<T>,
    ) -> SessionResult<T> {
        self.expect_state(operation, SessionState::Serializing)?;
        let bit_len = self.buffer.bit_len();
        let strings = self.strings.len();
        let depth = self.depth;
        op(self).map_err(|err| {
            self.buffer.truncate(bit_len);
            self.strings.truncate(strings);
            self.depth = depth;
            self.fail(operation, err)
        })
    }

    fn read_op<T>(
        &mut self,
        operation: &'static str,
        op: impl FnOnce(&mut BitBuffer) -> BitResult<T>,
    ) -> SessionResult<T> {
        self.session_read_op(operation, |session| Ok(op(&mut session.buffer)?))
    }

    fn session_read_op<T>(
        &mut self,
        operation: &'static str,
        op: impl FnOnce(&mut Self) -> SessionResult<T>,
    ) -> SessionResult<T> {
        self.expect_state(operation, SessionState::Deserializing)?;
        let cursor = self.buffer.cursor();
        let strings = self.strings.len();
        let depth = self.depth;
        op(self).map_err(|err| {
            // `cursor` was within the committed bits when the read started.
            let _ = self.buffer.set_cursor(cursor);
            self.strings.truncate(strings);
            self.depth = depth;
            self.fail(operation, err)
        })
    }
}
