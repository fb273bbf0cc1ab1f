//! Bit-packed serialization sessions for the bitser codec.
//!
//! This is the main codec crate. It builds on the bitstream crate to provide
//! a stateful [`Session`] that writes or reads a contiguous bit stream of
//! integers, floats, strings and object graphs, with no framing and no type
//! information on the wire.
//!
//! # Features
//!
//! - Integers sized by explicit width or by declared maximum
//! - ASCII, compressed (6-bit alphabet) and minimal (back-referenced) strings
//! - Tagged object graphs of arrays, sets, mappings, strings and custom types
//! - Custom types through the [`BinarySerialize`] / [`BinaryDeserialize`]
//!   capability traits and a host-owned [`TypeRegistry`]
//! - File and stream sinks/sources
//!
//! # Design Principles
//!
//! - **Symmetric** - Readers must replay the writer's calls with the same parameters.
//! - **All or nothing** - A failed operation writes nothing and moves the session to
//!   [`SessionState::Error`].
//! - **Explicit limits** - String lengths, collection sizes and nesting depth are
//!   bounded by [`SessionConfig`].

mod config;
mod data;
mod error;
mod graph;
mod io;
mod object;
mod session;
mod state;
mod string;
mod value;

pub use bitstream::{BitBuffer, BitError};
pub use config::{LiteralEncoding, SessionConfig, StringEncoding};
pub use data::SerializedData;
pub use error::{ErrorKind, LimitKind, SessionError, SessionResult};
pub use graph::ObjectTag;
pub use io::{ByteSink, ByteSource};
pub use object::{BinaryDeserialize, BinarySerialize, ObjectValue, TypeRegistry};
pub use session::Session;
pub use state::SessionState;
pub use string::{compressed_body_bits, ALPHABET, SYMBOL_BITS};
pub use value::{GraphNode, Value};
