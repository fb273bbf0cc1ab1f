//! The serialization capability contract for user-defined types.
//!
//! A custom type writes its own fields, in an order it chooses, through the
//! ordinary [`Session`] primitives, and reconstructs itself by reading them
//! back in the same order. Nothing is introspected. The class name written
//! ahead of the fields selects the constructor from a [`TypeRegistry`] owned
//! by the host application.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::error::{SessionError, SessionResult};
use crate::session::Session;

/// Types that can write themselves into a serializing [`Session`].
pub trait BinarySerialize: fmt::Debug {
    /// Name recorded on the wire and used to find the constructor on read.
    fn class_name(&self) -> &str;

    /// Writes this value's fields in a fixed order.
    fn serialize_into(&self, session: &mut Session) -> SessionResult<()>;
}

/// Types that can rebuild themselves from a deserializing [`Session`].
pub trait BinaryDeserialize: Sized {
    /// Reads fields in exactly the order [`BinarySerialize::serialize_into`] wrote them.
    ///
    /// `registry` is passed through for fields that are themselves object graphs.
    fn deserialize_from(session: &mut Session, registry: &TypeRegistry) -> SessionResult<Self>;
}

/// Object-safe handle for custom values stored in a decoded [`Value`](crate::Value).
///
/// Implemented for every `BinarySerialize + PartialEq + Clone + 'static` type.
pub trait ObjectValue: BinarySerialize + Any {
    /// Upcasts to [`Any`] for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Upcasts to the serialization capability.
    fn as_serialize(&self) -> &dyn BinarySerialize;

    /// Structural equality against another custom value.
    fn eq_object(&self, other: &dyn ObjectValue) -> bool;

    /// Clones into a new box.
    fn clone_object(&self) -> Box<dyn ObjectValue>;
}

impl<T> ObjectValue for T
where
    T: BinarySerialize + PartialEq + Clone + 'static,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_serialize(&self) -> &dyn BinarySerialize {
        self
    }

    fn eq_object(&self, other: &dyn ObjectValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }

    fn clone_object(&self) -> Box<dyn ObjectValue> {
        Box::new(self.clone())
    }
}

impl Clone for Box<dyn ObjectValue> {
    fn clone(&self) -> Self {
        self.clone_object()
    }
}

impl PartialEq for dyn ObjectValue {
    fn eq(&self, other: &Self) -> bool {
        self.eq_object(other)
    }
}

type Constructor = fn(&mut Session, &TypeRegistry) -> SessionResult<Box<dyn ObjectValue>>;

fn construct<T>(session: &mut Session, registry: &TypeRegistry) -> SessionResult<Box<dyn ObjectValue>>
where
    T: BinaryDeserialize + ObjectValue,
{
    let value = T::deserialize_from(session, registry)?;
    Ok(Box::new(value))
}

/// Maps class names to constructors for `custom` graph nodes.
#[derive(Default, Clone)]
pub struct TypeRegistry {
    constructors: HashMap<String, Constructor>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T` under `class_name`, replacing any previous registration.
    pub fn register<T>(&mut self, class_name: impl Into<String>) -> &mut Self
    where
        T: BinaryDeserialize + ObjectValue,
    {
        let class_name = class_name.into();
        if self
            .constructors
            .insert(class_name.clone(), construct::<T>)
            .is_some()
        {
            debug!(class_name, "replaced registered constructor");
        }
        self
    }

    /// Returns `true` if a constructor is registered for `class_name`.
    #[must_use]
    pub fn contains(&self, class_name: &str) -> bool {
        self.constructors.contains_key(class_name)
    }

    /// Returns the number of registered classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }

    pub(crate) fn construct(
        &self,
        class_name: &str,
        session: &mut Session,
    ) -> SessionResult<Box<dyn ObjectValue>> {
        let constructor =
            self.constructors
                .get(class_name)
                .ok_or_else(|| SessionError::UnknownClass {
                    name: class_name.to_owned(),
                })?;
        constructor(session, self)
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("TypeRegistry")
            .field("classes", &names)
            .finish()
    }
}
