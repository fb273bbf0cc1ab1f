//! Session lifecycle states.

use std::fmt;

/// Lifecycle state of a [`Session`](crate::Session).
///
/// ```text
/// None -> Serializing   -> DoneSerializing
/// None -> Deserializing -> DoneDeserializing
/// any  -> Error (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    /// Fresh session, no direction chosen yet.
    #[default]
    None,
    /// A previous operation failed; only inspection is accepted.
    Error,
    /// Accepting `add_*` writes.
    Serializing,
    /// Output has been finalized.
    DoneSerializing,
    /// Accepting `get_*` reads.
    Deserializing,
    /// Reading was finished by the caller.
    DoneDeserializing,
}

impl SessionState {
    /// Returns `true` for the terminal error state.
    #[must_use]
    pub const fn is_error(self) -> bool {
        matches!(self, Self::Error)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Error => "error",
            Self::Serializing => "serializing",
            Self::DoneSerializing => "done serializing",
            Self::Deserializing => "deserializing",
            Self::DoneDeserializing => "done deserializing",
        };
        write!(f, "{name}")
    }
}
