//! Lookup of types and fields in the raw schema description.
//!
//! The raw description lists, for each type, its scalar field names and its fields with their
//! target type and argument signatures. [`SchemaIndex`] derives a [`TypeDescriptor`] for a type
//! the first time it is asked for, and keeps it for as long as the index lives.
use std::path::Path;
use std::sync::OnceLock;

use indexmap::IndexMap;
use serde::Deserialize;
use serde::Serialize;

use crate::error::SelectionError;
use crate::selection::EDGES;
use crate::selection::NODE;
use crate::selection::NODES;

pub const DEFAULT_CONNECTION_SUFFIX: &str = "Connection";

/// The raw schema description, keyed by type name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct RawSchema {
    pub types: IndexMap<String, RawType>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RawType {
    #[serde(default)]
    pub scalars: Vec<String>,
    #[serde(default)]
    pub fields: IndexMap<String, RawField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RawField {
    #[serde(rename = "type")]
    pub type_name: String,
    /// Argument name to type signature, e.g. `"first": "Int"`, `"id": "ID!"`.
    #[serde(default)]
    pub args: IndexMap<String, String>,
}

/// How the node type of a connection is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum ConnectionPath {
    #[strum(to_string = "nodes")]
    Nodes,
    #[strum(to_string = "edges.node")]
    Edges,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionNode {
    pub type_name: String,
    pub path: ConnectionPath,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    /// The named target type, without list or non-null wrappers.
    pub type_name: String,
    pub is_scalar: bool,
    pub is_connection: bool,
    /// Present for connections whose node type could be resolved.
    pub connection_node: Option<ConnectionNode>,
    pub has_required_arguments: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub name: String,
    pub scalars: Vec<String>,
    pub fields: IndexMap<String, FieldDescriptor>,
}

impl TypeDescriptor {
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(name)
    }

    pub fn has_scalars(&self) -> bool {
        !self.scalars.is_empty()
    }

    pub fn is_scalar(&self, name: &str) -> bool {
        self.scalars.iter().any(|scalar| scalar == name)
    }
}

/// Read-only index over a [`RawSchema`].
///
/// Descriptors are built lazily and at most once per type, so a shared index can be used by
/// several resolutions at the same time.
#[derive(Debug)]
pub struct SchemaIndex {
    raw: RawSchema,
    connection_suffix: String,
    descriptors: IndexMap<String, OnceLock<TypeDescriptor>>,
}

impl SchemaIndex {
    pub fn new(raw: RawSchema) -> Self {
        Self::with_connection_suffix(raw, DEFAULT_CONNECTION_SUFFIX)
    }

    pub fn with_connection_suffix(raw: RawSchema, connection_suffix: impl Into<String>) -> Self {
        let descriptors = raw
            .types
            .keys()
            .map(|name| (name.clone(), OnceLock::new()))
            .collect();
        Self {
            raw,
            connection_suffix: connection_suffix.into(),
            descriptors,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, SelectionError> {
        let raw: RawSchema = serde_json::from_str(json)
            .map_err(|error| SelectionError::InvalidSchema(error.to_string()))?;
        Ok(Self::new(raw))
    }

    /// Loads a raw schema description from a JSON file, or a YAML file when the extension is
    /// `yaml` or `yml`.
    pub fn from_path(
        path: &Path,
        connection_suffix: impl Into<String>,
    ) -> Result<Self, SelectionError> {
        let contents =
            std::fs::read_to_string(path).map_err(|source| SelectionError::ReadSource {
                path: path.to_path_buf(),
                source,
            })?;
        let is_yaml = path
            .extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| matches!(extension, "yaml" | "yml"));
        let raw: RawSchema = if is_yaml {
            serde_yaml::from_str(&contents)
                .map_err(|error| SelectionError::InvalidSchema(error.to_string()))?
        } else {
            serde_json::from_str(&contents)
                .map_err(|error| SelectionError::InvalidSchema(error.to_string()))?
        };
        Ok(Self::with_connection_suffix(raw, connection_suffix))
    }

    pub fn connection_suffix(&self) -> &str {
        &self.connection_suffix
    }

    pub fn contains_type(&self, name: &str) -> bool {
        self.raw.types.contains_key(name)
    }

    /// Returns the descriptor for `name`, or `None` if the schema has no such type.
    pub fn type_descriptor(&self, name: &str) -> Option<&TypeDescriptor> {
        let (name, raw_type) = self.raw.types.get_key_value(name)?;
        let cell = self.descriptors.get(name)?;
        Some(cell.get_or_init(|| self.build_descriptor(name, raw_type)))
    }

    fn build_descriptor(&self, name: &str, raw_type: &RawType) -> TypeDescriptor {
        tracing::trace!(type_name = name, "building type descriptor");
        let fields = raw_type
            .fields
            .iter()
            .map(|(field_name, raw_field)| {
                let type_name = named_type(&raw_field.type_name).to_string();
                let is_connection = type_name.ends_with(self.connection_suffix.as_str());
                let connection_node = if is_connection {
                    self.connection_node(&type_name)
                } else {
                    None
                };
                let descriptor = FieldDescriptor {
                    name: field_name.clone(),
                    is_scalar: raw_type.scalars.contains(field_name),
                    is_connection,
                    connection_node,
                    has_required_arguments: raw_field
                        .args
                        .values()
                        .any(|signature| is_non_null(signature)),
                    type_name,
                };
                (field_name.clone(), descriptor)
            })
            .collect();
        TypeDescriptor {
            name: name.to_string(),
            scalars: raw_type.scalars.clone(),
            fields,
        }
    }

    /// Resolves the node type of a connection type, through `nodes` first and `edges.node`
    /// otherwise.
    fn connection_node(&self, connection_type: &str) -> Option<ConnectionNode> {
        let connection = self.raw.types.get(connection_type)?;
        if let Some(nodes) = connection.fields.get(NODES) {
            return Some(ConnectionNode {
                type_name: named_type(&nodes.type_name).to_string(),
                path: ConnectionPath::Nodes,
            });
        }
        let edges = connection.fields.get(EDGES)?;
        let edge = self.raw.types.get(named_type(&edges.type_name))?;
        let node = edge.fields.get(NODE)?;
        Some(ConnectionNode {
            type_name: named_type(&node.type_name).to_string(),
            path: ConnectionPath::Edges,
        })
    }
}

/// Strips list and non-null wrappers: `[Product!]!` is `Product`.
pub(crate) fn named_type(signature: &str) -> &str {
    signature.trim_matches(|c: char| c == '[' || c == ']' || c == '!' || c.is_whitespace())
}

fn is_non_null(signature: &str) -> bool {
    signature.trim_end().ends_with('!')
}
