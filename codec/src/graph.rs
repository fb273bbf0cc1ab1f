//! Tagged object graph encoding.
//!
//! Each node starts with a tag written as an unsigned value with maximum
//! [`ObjectTag::MAX_RAW`] (3 bits):
//!
//! | Tag | Raw | Body |
//! |-----|-----|------|
//! | `Array` | 0 | count, then each element |
//! | `Set` | 1 | count, then each distinct element |
//! | `Mapping` | 2 | count, then key and value per entry |
//! | `String` | 3 | string in the configured graph encoding |
//! | `Custom` | 4 | class name as a minimal string, then the object's own fields |
//!
//! Counts are sized by `max_collection_len`.

use bitstream::width_for_max;
use tracing::trace;

use crate::config::StringEncoding;
use crate::error::{LimitKind, SessionError, SessionResult};
use crate::object::{BinarySerialize, TypeRegistry};
use crate::session::Session;
use crate::string;
use crate::value::{GraphNode, Value};

/// Wire tag of an object graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectTag {
    Array = 0,
    Set = 1,
    Mapping = 2,
    String = 3,
    Custom = 4,
}

impl ObjectTag {
    /// Largest raw tag value; sizes the tag field.
    pub const MAX_RAW: u32 = 4;

    /// Returns the raw wire value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self as u32
    }

    /// Parses a raw wire value.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::Array),
            1 => Some(Self::Set),
            2 => Some(Self::Mapping),
            3 => Some(Self::String),
            4 => Some(Self::Custom),
            _ => None,
        }
    }

    /// Returns the tag `node` would be written with, or `None` if it is unsupported.
    #[must_use]
    pub fn classify(node: &dyn GraphNode) -> Option<Self> {
        Shape::of(node).map(|shape| shape.tag())
    }
}

/// A node viewed through the first capability probe that answered.
enum Shape<'a> {
    Mapping(Vec<(&'a dyn GraphNode, &'a dyn GraphNode)>),
    Set(Vec<&'a dyn GraphNode>),
    Array(Vec<&'a dyn GraphNode>),
    String(&'a str),
    Custom(&'a dyn BinarySerialize),
}

impl<'a> Shape<'a> {
    fn of(node: &'a dyn GraphNode) -> Option<Self> {
        if let Some(entries) = node.as_mapping() {
            return Some(Self::Mapping(entries));
        }
        if let Some(items) = node.as_set() {
            return Some(Self::Set(items));
        }
        if let Some(items) = node.as_array() {
            return Some(Self::Array(items));
        }
        if let Some(text) = node.as_string() {
            return Some(Self::String(text));
        }
        node.as_custom().map(Self::Custom)
    }

    const fn tag(&self) -> ObjectTag {
        match self {
            Self::Mapping(_) => ObjectTag::Mapping,
            Self::Set(_) => ObjectTag::Set,
            Self::Array(_) => ObjectTag::Array,
            Self::String(_) => ObjectTag::String,
            Self::Custom(_) => ObjectTag::Custom,
        }
    }
}

/// Position of a node inside its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Key,
    Other,
}

impl Session {
    pub(crate) fn encode_node(&mut self, node: &dyn GraphNode) -> SessionResult<()> {
        self.encode_in_slot(node, Slot::Other)
    }

    pub(crate) fn decode_node(&mut self, registry: &TypeRegistry) -> SessionResult<Value> {
        self.decode_in_slot(registry, Slot::Other)
    }

    fn encode_in_slot(&mut self, node: &dyn GraphNode, slot: Slot) -> SessionResult<()> {
        let shape = Shape::of(node).ok_or(SessionError::UnsupportedType)?;
        let tag = shape.tag();
        trace!(?tag, depth = self.depth, "encoding graph node");
        self.buffer.write_unsigned_max(tag.raw(), ObjectTag::MAX_RAW)?;
        match shape {
            Shape::Array(items) | Shape::Set(items) => self.nested(|session| {
                session.encode_count(items.len())?;
                items
                    .into_iter()
                    .try_for_each(|item| session.encode_in_slot(item, Slot::Other))
            }),
            Shape::Mapping(entries) => self.nested(|session| {
                session.encode_count(entries.len())?;
                entries.into_iter().try_for_each(|(key, value)| {
                    session.encode_in_slot(key, Slot::Key)?;
                    session.encode_in_slot(value, Slot::Other)
                })
            }),
            Shape::String(text) => self.encode_graph_string(text, slot),
            Shape::Custom(object) => self.nested(|session| {
                session.encode_minimal(object.class_name())?;
                object.serialize_into(session)
            }),
        }
    }

    fn decode_in_slot(&mut self, registry: &TypeRegistry, slot: Slot) -> SessionResult<Value> {
        let raw = self
            .buffer
            .read_unsigned_bits(width_for_max(ObjectTag::MAX_RAW))?;
        let tag = ObjectTag::from_raw(raw).ok_or(SessionError::InvalidTag { raw })?;
        trace!(?tag, depth = self.depth, "decoding graph node");
        match tag {
            ObjectTag::Array => self.nested(|session| {
                let items = session.decode_items(registry)?;
                Ok(Value::Array(items))
            }),
            ObjectTag::Set => self.nested(|session| {
                let items = session.decode_items(registry)?;
                Ok(Value::set(items))
            }),
            ObjectTag::Mapping => self.nested(|session| {
                let count = session.decode_count()?;
                let mut entries = Vec::with_capacity(count.min(session.buffer.bits_remaining()));
                for _ in 0..count {
                    let key = session.decode_in_slot(registry, Slot::Key)?;
                    let value = session.decode_in_slot(registry, Slot::Other)?;
                    entries.push((key, value));
                }
                Ok(Value::Mapping(entries))
            }),
            ObjectTag::String => self.decode_graph_string(slot).map(Value::String),
            ObjectTag::Custom => self.nested(|session| {
                let class_name = session.decode_minimal()?;
                let object = registry.construct(&class_name, session)?;
                Ok(Value::Custom(object))
            }),
        }
    }

    fn decode_items(&mut self, registry: &TypeRegistry) -> SessionResult<Vec<Value>> {
        let count = self.decode_count()?;
        let mut items = Vec::with_capacity(count.min(self.buffer.bits_remaining()));
        for _ in 0..count {
            items.push(self.decode_in_slot(registry, Slot::Other)?);
        }
        Ok(items)
    }

    /// Runs `op` one nesting level deeper.
    fn nested<T>(&mut self, op: impl FnOnce(&mut Self) -> SessionResult<T>) -> SessionResult<T> {
        let limit = self.config.max_depth;
        if self.depth >= limit {
            return Err(SessionError::DepthExceeded { limit });
        }
        self.depth += 1;
        let result = op(self);
        self.depth -= 1;
        result
    }

    fn encode_count(&mut self, count: usize) -> SessionResult<()> {
        let limit = self.config.max_collection_len;
        let value = u32::try_from(count)
            .ok()
            .filter(|value| *value <= limit)
            .ok_or(SessionError::LimitsExceeded {
                kind: LimitKind::CollectionLength,
                limit: limit as usize,
                actual: count,
            })?;
        self.buffer.write_unsigned_max(value, limit)?;
        Ok(())
    }

    fn decode_count(&mut self) -> SessionResult<usize> {
        Ok(self.buffer.read_unsigned_max(self.config.max_collection_len)? as usize)
    }

    fn graph_string_encoding(&self, slot: Slot) -> StringEncoding {
        if slot == Slot::Key && self.config.minimal_mapping_keys {
            StringEncoding::Minimal
        } else {
            self.config.graph_string_encoding
        }
    }

    fn encode_graph_string(&mut self, text: &str, slot: Slot) -> SessionResult<()> {
        let max_len = self.config.max_string_len;
        match self.graph_string_encoding(slot) {
            StringEncoding::Ascii => string::write_ascii(&mut self.buffer, text, max_len),
            StringEncoding::Compressed => string::write_compressed(&mut self.buffer, text, max_len),
            StringEncoding::Minimal => self.encode_minimal(text),
        }
    }

    fn decode_graph_string(&mut self, slot: Slot) -> SessionResult<String> {
        let max_len = self.config.max_string_len;
        match self.graph_string_encoding(slot) {
            StringEncoding::Ascii => string::read_ascii(&mut self.buffer, max_len),
            StringEncoding::Compressed => string::read_compressed(&mut self.buffer, max_len),
            StringEncoding::Minimal => self.decode_minimal(),
        }
    }

    pub(crate) fn encode_minimal(&mut self, text: &str) -> SessionResult<()> {
        string::write_minimal(
            &mut self.buffer,
            &mut self.strings,
            text,
            self.config.max_string_len,
            self.config.minimal_fallback,
        )
    }

    pub(crate) fn decode_minimal(&mut self) -> SessionResult<String> {
        string::read_minimal(
            &mut self.buffer,
            &mut self.strings,
            self.config.max_string_len,
            self.config.minimal_fallback,
        )
    }
}
