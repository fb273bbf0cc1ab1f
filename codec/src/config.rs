//! Session configuration.
//!
//! Both ends of a stream must use the same configuration: string length and
//! collection count prefixes are sized from these limits, and the string
//! encodings chosen here are not recorded on the wire.

/// Encoding used for strings inside object graphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum StringEncoding {
    /// 8 bits per character, non-ASCII replaced by `?`.
    #[default]
    Ascii,
    /// 6-bit alphabet symbols with escapes; lossless.
    Compressed,
    /// Session dictionary back-references.
    Minimal,
}

/// Encoding used by minimal-string mode for strings not yet in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum LiteralEncoding {
    /// 8 bits per character, non-ASCII replaced by `?`.
    Ascii,
    /// 6-bit alphabet symbols with escapes; lossless.
    #[default]
    Compressed,
}

/// Configuration shared by the writer and reader of a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct SessionConfig {
    /// Bytes allocated by `start_serializing`. Zero defers allocation to the first write.
    pub initial_capacity_bytes: usize,
    /// Maximum string length in characters; sizes every string length prefix.
    pub max_string_len: u32,
    /// Maximum element count of a collection; sizes every count prefix.
    pub max_collection_len: u32,
    /// Maximum object graph nesting depth.
    pub max_depth: usize,
    /// Encode string mapping keys in minimal-string mode.
    pub minimal_mapping_keys: bool,
    /// Encoding for string nodes in object graphs.
    pub graph_string_encoding: StringEncoding,
    /// Encoding for first occurrences in minimal-string mode.
    pub minimal_fallback: LiteralEncoding,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            initial_capacity_bytes: 64,
            max_string_len: u32::from(u16::MAX),
            max_collection_len: u32::from(u16::MAX),
            max_depth: 64,
            minimal_mapping_keys: false,
            graph_string_encoding: StringEncoding::Ascii,
            minimal_fallback: LiteralEncoding::Compressed,
        }
    }
}

impl SessionConfig {
    /// Creates a configuration suitable for testing with smaller values.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            initial_capacity_bytes: 4,
            max_string_len: 255,
            max_collection_len: 255,
            max_depth: 8,
            minimal_mapping_keys: false,
            graph_string_encoding: StringEncoding::Ascii,
            minimal_fallback: LiteralEncoding::Compressed,
        }
    }

    /// Creates a configuration with no restrictions (use with caution).
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            initial_capacity_bytes: 64,
            max_string_len: u32::MAX,
            max_collection_len: u32::MAX,
            max_depth: usize::MAX,
            minimal_mapping_keys: false,
            graph_string_encoding: StringEncoding::Ascii,
            minimal_fallback: LiteralEncoding::Compressed,
        }
    }

    /// Enables minimal-string encoding for string mapping keys.
    #[must_use]
    pub const fn with_minimal_mapping_keys(mut self, enabled: bool) -> Self {
        self.minimal_mapping_keys = enabled;
        self
    }

    /// Sets the encoding for string nodes in object graphs.
    #[must_use]
    pub const fn with_graph_string_encoding(mut self, encoding: StringEncoding) -> Self {
        self.graph_string_encoding = encoding;
        self
    }
}
