//! Error types for session operations.

use std::fmt;

use thiserror::Error;

use crate::state::SessionState;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors that can occur while serializing or deserializing.
///
/// Every error returned by a [`Session`](crate::Session) also moves that
/// session into [`SessionState::Error`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Operation is not valid in the current session state.
    #[error("{operation} is not valid in state {state}")]
    InvalidState {
        /// The rejected operation.
        operation: &'static str,
        /// State the session was in when the operation was attempted.
        state: SessionState,
    },

    /// Bitstream error (range violations, reads past the end, buffer sizing).
    #[error("bitstream error: {0}")]
    Bitstream(#[from] bitstream::BitError),

    /// A length or count exceeds the configured limit.
    #[error("{kind} limit exceeded: {actual} > {limit}")]
    LimitsExceeded {
        kind: LimitKind,
        limit: usize,
        actual: usize,
    },

    /// Object graph nesting exceeds the configured depth.
    #[error("object graph nesting exceeds maximum depth {limit}")]
    DepthExceeded { limit: usize },

    /// Object passed to `add_object` conforms to no serializable variant.
    #[error("object conforms to none of mapping, set, array, string or custom")]
    UnsupportedType,

    /// Decoded object tag is not part of the tag set.
    #[error("invalid object tag {raw}")]
    InvalidTag { raw: u32 },

    /// Decoded class name has no registered constructor.
    #[error("no constructor registered for class {name:?}")]
    UnknownClass { name: String },

    /// Minimal-string back-reference points outside the session table.
    #[error("string back-reference {index} outside table of {table_len} entries")]
    InvalidBackReference { index: u32, table_len: usize },

    /// Decoded character code is not valid for the string encoding.
    #[error("invalid character code 0x{code:X}")]
    InvalidCharacter { code: u32 },

    /// Byte sink or byte source failure.
    #[error("i/o error: {reason}")]
    Io { reason: String },
}

/// Coarse classification of [`SessionError`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Operation invalid for the current session state.
    State,
    /// Value exceeds its bit width, maximum or configured limit, or a resize
    /// would truncate committed data.
    Range,
    /// Read past the available bits.
    Bounds,
    /// Character data that cannot be decoded.
    Encoding,
    /// Object matches no serializable variant.
    UnsupportedType,
    /// Structurally invalid input: unknown tag, class or back-reference.
    Malformed,
    /// Byte sink or byte source failure.
    Io,
}

/// Specific limit that was exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    StringLength,
    CollectionLength,
    StringTable,
}

impl SessionError {
    /// Returns the coarse classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidState { .. } => ErrorKind::State,
            Self::Bitstream(err) if err.is_end_of_buffer() => ErrorKind::Bounds,
            Self::Bitstream(_) | Self::LimitsExceeded { .. } | Self::DepthExceeded { .. } => {
                ErrorKind::Range
            }
            Self::UnsupportedType => ErrorKind::UnsupportedType,
            Self::InvalidTag { .. }
            | Self::UnknownClass { .. }
            | Self::InvalidBackReference { .. } => ErrorKind::Malformed,
            Self::InvalidCharacter { .. } => ErrorKind::Encoding,
            Self::Io { .. } => ErrorKind::Io,
        }
    }

    pub(crate) fn io(context: impl fmt::Display, err: &std::io::Error) -> Self {
        Self::Io {
            reason: format!("{context}: {err}"),
        }
    }
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::StringLength => "string length",
            Self::CollectionLength => "collection length",
            Self::StringTable => "string table",
        };
        write!(f, "{name}")
    }
}
