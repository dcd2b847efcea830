//! The selection tree: which fields a command requests, with which arguments.
use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;
use serde::ser::SerializeMap;

pub(crate) mod merging;
mod pretty;

pub use pretty::PrettyPrintable;

pub(crate) const ID: &str = "id";
pub(crate) const NODES: &str = "nodes";
pub(crate) const EDGES: &str = "edges";
pub(crate) const NODE: &str = "node";
pub(crate) const PAGE_INFO: &str = "pageInfo";
pub(crate) const HAS_NEXT_PAGE: &str = "hasNextPage";
pub(crate) const END_CURSOR: &str = "endCursor";
pub(crate) const FIRST: &str = "first";

/// Key of the arguments bag in the serialized form of a node.
pub const ARGUMENTS_KEY: &str = "__args";
/// Key of the wildcard-scalars marker in the serialized form of a node.
pub const ALL_SCALARS_KEY: &str = "__scalars";
/// Prefix of type-conditional branches in the serialized form of a node.
pub const TYPE_CONDITION_PREFIX: &str = "on_";

/// The key a selection is stored under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldKey {
    Field(String),
    /// An inline fragment branch, `... on TypeName { ... }`.
    TypeConditional(String),
}

impl FieldKey {
    pub fn field(name: impl Into<String>) -> Self {
        Self::Field(name.into())
    }

    pub fn type_conditional(type_name: impl Into<String>) -> Self {
        Self::TypeConditional(type_name.into())
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Field(name) | Self::TypeConditional(name) => name,
        }
    }

    pub fn as_field(&self) -> Option<&str> {
        match self {
            Self::Field(name) => Some(name),
            Self::TypeConditional(_) => None,
        }
    }
}

impl fmt::Display for FieldKey {
    /// Displays the key as it appears in the serialized form of a node.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => f.write_str(name),
            Self::TypeConditional(type_name) => write!(f, "{TYPE_CONDITION_PREFIX}{type_name}"),
        }
    }
}

/// An argument literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    String(String),
    Number(serde_json::Number),
    Boolean(bool),
    Null,
    /// A bare word, such as `USD` in `price(currency: USD)`.
    Enum(String),
    List(Vec<Value>),
    Object(IndexMap<String, Value>),
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Number(value.into())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl Serialize for Value {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::String(value) | Self::Enum(value) => serializer.serialize_str(value),
            Self::Number(value) => value.serialize(serializer),
            Self::Boolean(value) => serializer.serialize_bool(*value),
            Self::Null => serializer.serialize_unit(),
            Self::List(values) => values.serialize(serializer),
            Self::Object(fields) => fields.serialize(serializer),
        }
    }
}

/// What a key of a [`SelectionNode`] holds: either the field alone, or the field with a
/// sub-selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionValue {
    Leaf,
    Node(SelectionNode),
}

impl SelectionValue {
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf)
    }

    pub fn as_node(&self) -> Option<&SelectionNode> {
        match self {
            Self::Node(node) => Some(node),
            Self::Leaf => None,
        }
    }

    pub fn as_node_mut(&mut self) -> Option<&mut SelectionNode> {
        match self {
            Self::Node(node) => Some(node),
            Self::Leaf => None,
        }
    }
}

impl Serialize for SelectionValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Leaf => serializer.serialize_bool(true),
            Self::Node(node) => node.serialize(serializer),
        }
    }
}

/// A set of selected fields, with the arguments of the field it belongs to.
///
/// Each key holds exactly one [`SelectionValue`], so a field is never selected both as a leaf
/// and with a sub-selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionNode {
    fields: IndexMap<FieldKey, SelectionValue>,
    arguments: IndexMap<String, Value>,
    all_scalars: bool,
}

impl SelectionNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// A node selecting every scalar field of its type.
    pub fn all_scalars() -> Self {
        Self {
            all_scalars: true,
            ..Default::default()
        }
    }

    /// `pageInfo { hasNextPage endCursor }`
    pub(crate) fn page_info() -> Self {
        Self::new().with_leaf(HAS_NEXT_PAGE).with_leaf(END_CURSOR)
    }

    pub fn with_leaf(mut self, name: impl Into<String>) -> Self {
        self.insert(FieldKey::field(name), SelectionValue::Leaf);
        self
    }

    pub fn with_node(mut self, name: impl Into<String>, node: SelectionNode) -> Self {
        self.insert(FieldKey::field(name), SelectionValue::Node(node));
        self
    }

    pub fn with_type_conditional(
        mut self,
        type_name: impl Into<String>,
        node: SelectionNode,
    ) -> Self {
        self.insert(
            FieldKey::type_conditional(type_name),
            SelectionValue::Node(node),
        );
        self
    }

    pub fn with_argument(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(name.into(), value.into());
        self
    }

    /// True when the node selects nothing: no keys and no wildcard marker.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && !self.all_scalars
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn selects_all_scalars(&self) -> bool {
        self.all_scalars
    }

    pub fn set_all_scalars(&mut self, all_scalars: bool) {
        self.all_scalars = all_scalars;
    }

    pub fn fields(&self) -> impl Iterator<Item = (&FieldKey, &SelectionValue)> {
        self.fields.iter()
    }

    pub fn get(&self, key: &FieldKey) -> Option<&SelectionValue> {
        self.fields.get(key)
    }

    pub fn get_mut(&mut self, key: &FieldKey) -> Option<&mut SelectionValue> {
        self.fields.get_mut(key)
    }

    pub fn field(&self, name: &str) -> Option<&SelectionValue> {
        self.fields.get(&FieldKey::field(name))
    }

    pub fn contains_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Stores `value` under `key`, replacing what was there.
    ///
    /// Use [`SelectionNode::merge`] to combine selections instead.
    pub fn insert(&mut self, key: FieldKey, value: SelectionValue) -> Option<SelectionValue> {
        self.fields.insert(key, value)
    }

    pub fn arguments(&self) -> &IndexMap<String, Value> {
        &self.arguments
    }

    pub fn argument(&self, name: &str) -> Option<&Value> {
        self.arguments.get(name)
    }

    pub fn set_argument(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.arguments.insert(name.into(), value.into());
    }

    pub(crate) fn fields_mut(&mut self) -> &mut IndexMap<FieldKey, SelectionValue> {
        &mut self.fields
    }

    pub(crate) fn arguments_mut(&mut self) -> &mut IndexMap<String, Value> {
        &mut self.arguments
    }
}

impl Serialize for SelectionNode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let extra = usize::from(!self.arguments.is_empty()) + usize::from(self.all_scalars);
        let mut map = serializer.serialize_map(Some(self.fields.len() + extra))?;
        if !self.arguments.is_empty() {
            map.serialize_entry(ARGUMENTS_KEY, &self.arguments)?;
        }
        if self.all_scalars {
            map.serialize_entry(ALL_SCALARS_KEY, &true)?;
        }
        for (key, value) in &self.fields {
            map.serialize_entry(&key.to_string(), value)?;
        }
        map.end()
    }
}

impl fmt::Display for SelectionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pretty_print())
    }
}
