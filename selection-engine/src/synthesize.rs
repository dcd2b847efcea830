//! Generates a complete selection for a type from schema metadata.
//!
//! Scalars are covered by the wildcard marker. Nested objects are followed up to a maximum depth,
//! and a type is never entered twice along the same path, which keeps cyclic schemas finite.
//! Connections are only followed when named in the expand list of the root call.
use crate::config::EngineConfig;
use crate::error::SelectionError;
use crate::schema::ConnectionPath;
use crate::schema::FieldDescriptor;
use crate::schema::SchemaIndex;
use crate::selection::EDGES;
use crate::selection::FieldKey;
use crate::selection::NODE;
use crate::selection::NODES;
use crate::selection::SelectionNode;
use crate::selection::SelectionValue;

pub const DEFAULT_MAX_DEPTH: usize = 2;
pub const DEFAULT_PAGE_SIZE: u32 = 25;

/// The types entered on the way from the root to the current type.
///
/// Each call links its own entry to its parent's, so sibling branches never see each other's
/// types.
struct Ancestors<'a> {
    type_name: &'a str,
    parent: Option<&'a Ancestors<'a>>,
}

impl Ancestors<'_> {
    fn contains(&self, type_name: &str) -> bool {
        let mut current = Some(self);
        while let Some(ancestors) = current {
            if ancestors.type_name == type_name {
                return true;
            }
            current = ancestors.parent;
        }
        false
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Synthesizer<'schema> {
    schema: &'schema SchemaIndex,
    page_size: u32,
    max_depth: usize,
}

impl<'schema> Synthesizer<'schema> {
    pub fn new(schema: &'schema SchemaIndex, page_size: u32, max_depth: usize) -> Self {
        Self {
            schema,
            page_size,
            max_depth,
        }
    }

    pub fn from_config(schema: &'schema SchemaIndex, config: &EngineConfig) -> Self {
        Self::new(schema, config.default_page_size, config.max_depth)
    }

    /// Builds the selection for `type_name`, following the connections named in `expand`.
    ///
    /// Fields that take required arguments are never selected. Fields whose own selection turns
    /// out empty, because of the depth limit or a cycle, are left out.
    ///
    /// # Errors
    /// Returns [`SelectionError::UnknownType`] if `type_name`, or a type reached from it, is not
    /// in the schema.
    pub fn synthesize(
        &self,
        type_name: &str,
        expand: &[String],
    ) -> Result<SelectionNode, SelectionError> {
        self.synthesize_type(type_name, expand, 0, None)
    }

    fn synthesize_type(
        &self,
        type_name: &str,
        expand: &[String],
        depth: usize,
        ancestors: Option<&Ancestors<'_>>,
    ) -> Result<SelectionNode, SelectionError> {
        let descriptor = self
            .schema
            .type_descriptor(type_name)
            .ok_or_else(|| SelectionError::UnknownType(type_name.to_string()))?;

        if ancestors.is_some_and(|ancestors| ancestors.contains(type_name)) {
            tracing::trace!(type_name, depth, "type already entered on this path");
            return Ok(SelectionNode::new());
        }
        if depth > self.max_depth {
            tracing::trace!(type_name, depth, "maximum depth reached");
            return Ok(SelectionNode::new());
        }

        let path = Ancestors {
            type_name,
            parent: ancestors,
        };
        let mut node = if descriptor.has_scalars() {
            SelectionNode::all_scalars()
        } else {
            SelectionNode::new()
        };

        for field in descriptor.fields.values() {
            if field.is_scalar {
                continue;
            }
            if field.has_required_arguments {
                tracing::trace!(type_name, field = %field.name, "skipping field with required arguments");
                continue;
            }
            let child = if field.is_connection {
                if !expand.contains(&field.name) {
                    continue;
                }
                self.synthesize_connection(type_name, field, depth, &path)?
            } else {
                self.synthesize_type(&field.type_name, &[], depth + 1, Some(&path))?
                    .into_non_empty()
            };
            match child {
                Some(child) => {
                    node.insert(FieldKey::field(&field.name), SelectionValue::Node(child));
                }
                None => {
                    tracing::trace!(type_name, field = %field.name, "skipping field with empty selection");
                }
            }
        }
        Ok(node)
    }

    /// Wraps the selection of the node type in `nodes` or `edges { node }`, with the page size
    /// and `pageInfo`.
    fn synthesize_connection(
        &self,
        type_name: &str,
        field: &FieldDescriptor,
        depth: usize,
        path: &Ancestors<'_>,
    ) -> Result<Option<SelectionNode>, SelectionError> {
        let Some(connection_node) = &field.connection_node else {
            tracing::trace!(type_name, field = %field.name, "connection has no node type");
            return Ok(None);
        };
        let Some(nodes) = self
            .synthesize_type(&connection_node.type_name, &[], depth + 1, Some(path))?
            .into_non_empty()
        else {
            return Ok(None);
        };

        let mut connection = SelectionNode::new();
        match connection_node.path {
            ConnectionPath::Nodes => {
                connection.insert(FieldKey::field(NODES), SelectionValue::Node(nodes))
            }
            ConnectionPath::Edges => connection.insert(
                FieldKey::field(EDGES),
                SelectionValue::Node(SelectionNode::new().with_node(NODE, nodes)),
            ),
        };
        connection.ensure_paginated(self.page_size);
        Ok(Some(connection))
    }
}

impl SelectionNode {
    fn into_non_empty(self) -> Option<Self> {
        (!self.is_empty()).then_some(self)
    }
}
