//! Object graph values and the node capability trait.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::BuildHasher;

use crate::graph::ObjectTag;
use crate::object::{BinarySerialize, ObjectValue};

/// A node that can be written by [`Session::add_object`](crate::Session::add_object).
///
/// Each probe answers whether the node can be viewed as that variant. The
/// encoder asks in a fixed order (mapping, set, array, string, custom) and
/// uses the first variant that answers. A node that answers none is
/// rejected as unsupported.
///
/// Custom types opt in by returning themselves from [`as_custom`](Self::as_custom):
///
/// ```
/// use codec::{BinarySerialize, GraphNode, Session, SessionResult};
///
/// #[derive(Debug)]
/// struct Point(i32, i32);
///
/// impl BinarySerialize for Point {
///     fn class_name(&self) -> &str {
///         "Point"
///     }
///
///     fn serialize_into(&self, session: &mut Session) -> SessionResult<()> {
///         session.add_signed_max(self.0, 1000)?;
///         session.add_signed_max(self.1, 1000)
///     }
/// }
///
/// impl GraphNode for Point {
///     fn as_custom(&self) -> Option<&dyn BinarySerialize> {
///         Some(self)
///     }
/// }
/// ```
pub trait GraphNode {
    /// Key/value pairs, if this node is a mapping.
    fn as_mapping(&self) -> Option<Vec<(&dyn GraphNode, &dyn GraphNode)>> {
        None
    }

    /// Distinct elements, if this node is a set.
    ///
    /// Implementations must not return duplicates. The encoder writes the
    /// elements as given and does not deduplicate them; only [`Value`]
    /// deduplicates its own sets.
    fn as_set(&self) -> Option<Vec<&dyn GraphNode>> {
        None
    }

    /// Ordered elements, if this node is an array.
    fn as_array(&self) -> Option<Vec<&dyn GraphNode>> {
        None
    }

    /// Text, if this node is a string.
    fn as_string(&self) -> Option<&str> {
        None
    }

    /// Self-serializing object, if this node is a custom type.
    fn as_custom(&self) -> Option<&dyn BinarySerialize> {
        None
    }
}

/// A decoded object graph.
///
/// Set and mapping equality ignore element order.
#[derive(Debug, Clone)]
pub enum Value {
    Array(Vec<Value>),
    /// Distinct elements in no particular order.
    Set(Vec<Value>),
    Mapping(Vec<(Value, Value)>),
    String(String),
    Custom(Box<dyn ObjectValue>),
}

impl Value {
    /// Builds a string node.
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    /// Builds an array node.
    pub fn array(items: impl IntoIterator<Item = Self>) -> Self {
        Self::Array(items.into_iter().collect())
    }

    /// Builds a set node, dropping duplicate elements.
    pub fn set(items: impl IntoIterator<Item = Self>) -> Self {
        let mut distinct: Vec<Self> = Vec::new();
        for item in items {
            if !distinct.contains(&item) {
                distinct.push(item);
            }
        }
        Self::Set(distinct)
    }

    /// Builds a mapping node.
    pub fn mapping(entries: impl IntoIterator<Item = (Self, Self)>) -> Self {
        Self::Mapping(entries.into_iter().collect())
    }

    /// Builds a custom node.
    pub fn custom<T: ObjectValue>(value: T) -> Self {
        Self::Custom(Box::new(value))
    }

    /// Returns the wire tag for this node.
    #[must_use]
    pub const fn tag(&self) -> ObjectTag {
        match self {
            Self::Array(_) => ObjectTag::Array,
            Self::Set(_) => ObjectTag::Set,
            Self::Mapping(_) => ObjectTag::Mapping,
            Self::String(_) => ObjectTag::String,
            Self::Custom(_) => ObjectTag::Custom,
        }
    }

    /// Returns the text of a string node.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the elements of an array or set node.
    #[must_use]
    pub fn elements(&self) -> Option<&[Self]> {
        match self {
            Self::Array(items) | Self::Set(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the entries of a mapping node.
    #[must_use]
    pub fn entries(&self) -> Option<&[(Self, Self)]> {
        match self {
            Self::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    /// Looks up a mapping entry by key.
    #[must_use]
    pub fn get(&self, key: &Self) -> Option<&Self> {
        self.entries()?
            .iter()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, value)| value)
    }

    /// Downcasts a custom node to its concrete type.
    #[must_use]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        match self {
            Self::Custom(object) => object.as_any().downcast_ref(),
            _ => None,
        }
    }
}

/// Multiset equality: each right element matches at most one left element.
fn same_members<T>(left: &[T], right: &[T], eq: impl Fn(&T, &T) -> bool) -> bool {
    if left.len() != right.len() {
        return false;
    }
    let mut used = vec![false; right.len()];
    for a in left {
        let matched = (0..right.len()).find(|&idx| !used[idx] && eq(a, &right[idx]));
        match matched {
            Some(idx) => used[idx] = true,
            None => return false,
        }
    }
    true
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Set(a), Self::Set(b)) => same_members(a, b, PartialEq::eq),
            (Self::Mapping(a), Self::Mapping(b)) => same_members(a, b, PartialEq::eq),
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Custom(a), Self::Custom(b)) => a.eq_object(b.as_ref()),
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<Self>> for Value {
    fn from(items: Vec<Self>) -> Self {
        Self::Array(items)
    }
}

impl GraphNode for Value {
    fn as_mapping(&self) -> Option<Vec<(&dyn GraphNode, &dyn GraphNode)>> {
        let entries = self.entries()?;
        Some(
            entries
                .iter()
                .map(|(key, value)| (key as &dyn GraphNode, value as &dyn GraphNode))
                .collect(),
        )
    }

    fn as_set(&self) -> Option<Vec<&dyn GraphNode>> {
        let Self::Set(items) = self else {
            return None;
        };
        let mut distinct: Vec<&Self> = Vec::with_capacity(items.len());
        for item in items {
            if !distinct.contains(&item) {
                distinct.push(item);
            }
        }
        Some(distinct.into_iter().map(|item| item as &dyn GraphNode).collect())
    }

    fn as_array(&self) -> Option<Vec<&dyn GraphNode>> {
        match self {
            Self::Array(items) => Some(items.iter().map(|item| item as &dyn GraphNode).collect()),
            _ => None,
        }
    }

    fn as_string(&self) -> Option<&str> {
        self.as_str()
    }

    fn as_custom(&self) -> Option<&dyn BinarySerialize> {
        match self {
            Self::Custom(object) => Some(object.as_serialize()),
            _ => None,
        }
    }
}

impl GraphNode for str {
    fn as_string(&self) -> Option<&str> {
        Some(self)
    }
}

impl GraphNode for String {
    fn as_string(&self) -> Option<&str> {
        Some(self)
    }
}

impl<T: GraphNode + ?Sized> GraphNode for &T {
    fn as_mapping(&self) -> Option<Vec<(&dyn GraphNode, &dyn GraphNode)>> {
        (**self).as_mapping()
    }

    fn as_set(&self) -> Option<Vec<&dyn GraphNode>> {
        (**self).as_set()
    }

    fn as_array(&self) -> Option<Vec<&dyn GraphNode>> {
        (**self).as_array()
    }

    fn as_string(&self) -> Option<&str> {
        (**self).as_string()
    }

    fn as_custom(&self) -> Option<&dyn BinarySerialize> {
        (**self).as_custom()
    }
}

impl GraphNode for Box<dyn ObjectValue> {
    fn as_custom(&self) -> Option<&dyn BinarySerialize> {
        Some(self.as_serialize())
    }
}

fn node_refs<'a, T: GraphNode + 'a>(items: impl Iterator<Item = &'a T>) -> Vec<&'a dyn GraphNode> {
    items.map(|item| item as &dyn GraphNode).collect()
}

impl<T: GraphNode> GraphNode for [T] {
    fn as_array(&self) -> Option<Vec<&dyn GraphNode>> {
        Some(node_refs(self.iter()))
    }
}

impl<T: GraphNode> GraphNode for Vec<T> {
    fn as_array(&self) -> Option<Vec<&dyn GraphNode>> {
        Some(node_refs(self.iter()))
    }
}

impl<T: GraphNode> GraphNode for BTreeSet<T> {
    fn as_set(&self) -> Option<Vec<&dyn GraphNode>> {
        Some(node_refs(self.iter()))
    }
}

impl<T: GraphNode, S: BuildHasher> GraphNode for HashSet<T, S> {
    fn as_set(&self) -> Option<Vec<&dyn GraphNode>> {
        Some(node_refs(self.iter()))
    }
}

impl<K: GraphNode, V: GraphNode> GraphNode for BTreeMap<K, V> {
    fn as_mapping(&self) -> Option<Vec<(&dyn GraphNode, &dyn GraphNode)>> {
        Some(
            self.iter()
                .map(|(key, value)| (key as &dyn GraphNode, value as &dyn GraphNode))
                .collect(),
        )
    }
}

impl<K: GraphNode, V: GraphNode, S: BuildHasher> GraphNode for HashMap<K, V, S> {
    fn as_mapping(&self) -> Option<Vec<(&dyn GraphNode, &dyn GraphNode)>> {
        Some(
            self.iter()
                .map(|(key, value)| (key as &dyn GraphNode, value as &dyn GraphNode))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_constructor_drops_duplicates() {
        let set = Value::set(["a", "b", "a"].map(Value::from));
        assert_eq!(set.elements().map(<[Value]>::len), Some(2));
    }

    #[test]
    fn set_and_mapping_equality_ignore_order() {
        let a = Value::set(["x", "y"].map(Value::from));
        let b = Value::set(["y", "x"].map(Value::from));
        assert_eq!(a, b);

        let m1 = Value::mapping([
            (Value::from("k1"), Value::from("v1")),
            (Value::from("k2"), Value::from("v2")),
        ]);
        let m2 = Value::mapping([
            (Value::from("k2"), Value::from("v2")),
            (Value::from("k1"), Value::from("v1")),
        ]);
        assert_eq!(m1, m2);
        assert_eq!(m1.get(&Value::from("k2")), Some(&Value::from("v2")));
    }

    #[test]
    fn repeated_entries_match_one_for_one() {
        let repeated = Value::mapping([
            (Value::from("k"), Value::from("1")),
            (Value::from("k"), Value::from("1")),
        ]);
        let distinct = Value::mapping([
            (Value::from("k"), Value::from("1")),
            (Value::from("j"), Value::from("2")),
        ]);
        assert_ne!(repeated, distinct);
        assert_ne!(distinct, repeated);

        let a = Value::set([Value::array([]), Value::array([])]);
        assert_eq!(a.elements().map(<[Value]>::len), Some(1));
        let set = Value::set([repeated, distinct]);
        assert_eq!(set.elements().map(<[Value]>::len), Some(2));
    }

    #[test]
    fn array_equality_is_ordered() {
        let a = Value::array(["x", "y"].map(Value::from));
        let b = Value::array(["y", "x"].map(Value::from));
        assert_ne!(a, b);
        assert_ne!(a, Value::set(["x", "y"].map(Value::from)));
    }

    #[test]
    fn value_probes_match_variant() {
        let value = Value::from("hello");
        assert_eq!(value.as_string(), Some("hello"));
        assert!(value.as_array().is_none());
        assert!(value.as_mapping().is_none());
        assert_eq!(value.tag(), ObjectTag::String);
    }

    #[test]
    fn value_set_probe_deduplicates() {
        let raw = Value::Set(vec![Value::from("a"), Value::from("a")]);
        assert_eq!(raw.as_set().map(|items| items.len()), Some(1));
    }

    #[test]
    fn std_containers_are_nodes() {
        let list = vec!["a".to_string(), "b".to_string()];
        assert_eq!(GraphNode::as_array(&list).map(|items| items.len()), Some(2));

        let set: BTreeSet<String> = ["a".to_string()].into_iter().collect();
        assert!(set.as_set().is_some());
        assert!(set.as_array().is_none());

        let map: HashMap<String, Vec<String>> = HashMap::new();
        assert_eq!(map.as_mapping().map(|entries| entries.len()), Some(0));
    }
}
