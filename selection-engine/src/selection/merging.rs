//! Provides methods for recursively merging selections, and for merging dot paths such as
//! `variants.nodes.sku` into a selection.
use indexmap::map::Entry;

use super::EDGES;
use super::FIRST;
use super::FieldKey;
use super::NODES;
use super::PAGE_INFO;
use super::SelectionNode;
use super::SelectionValue;
use super::Value;
use crate::error::SelectionError;
use crate::parser::is_identifier;

impl SelectionValue {
    /// Merges `other` into this value. A sub-selection always wins over a leaf.
    fn merge_into(&mut self, other: SelectionValue) {
        let SelectionValue::Node(other) = other else {
            return;
        };
        match self {
            SelectionValue::Leaf => *self = SelectionValue::Node(other),
            SelectionValue::Node(this) => this.merge(other),
        }
    }
}

impl SelectionNode {
    /// Merges `other` into this node.
    ///
    /// Arguments of `other` overwrite arguments of the same name, the wildcard markers are
    /// combined, and keys present on both sides are merged recursively.
    pub fn merge(&mut self, other: SelectionNode) {
        let SelectionNode {
            fields,
            arguments,
            all_scalars,
        } = other;
        self.arguments_mut().extend(arguments);
        if all_scalars {
            self.set_all_scalars(true);
        }
        for (key, value) in fields {
            self.merge_field(key, value);
        }
    }

    /// Merges a single key into this node.
    pub fn merge_field(&mut self, key: FieldKey, value: SelectionValue) {
        match self.fields_mut().entry(key) {
            Entry::Occupied(mut existing) => existing.get_mut().merge_into(value),
            Entry::Vacant(vacant) => {
                vacant.insert(value);
            }
        }
    }

    /// Adds the field named by a dot path such as `variants.nodes.sku`, creating the
    /// intermediate selections it goes through.
    ///
    /// A connection reached through `nodes` or `edges` always gets a `first` argument and a
    /// `pageInfo` selection. An existing selection at the end of the path is left untouched.
    ///
    /// # Errors
    /// Returns an error if a segment is not a valid field name, or if the path goes through a
    /// field that is already selected as a leaf.
    pub fn merge_path(&mut self, path: &str, page_size: u32) -> Result<(), SelectionError> {
        let segments: Vec<&str> = path.split('.').collect();
        if let Some(invalid) = segments.iter().find(|segment| !is_identifier(segment)) {
            return Err(SelectionError::InvalidPathSegment {
                path: path.to_string(),
                segment: invalid.to_string(),
            });
        }

        let mut current = self;
        for (index, segment) in segments.iter().enumerate() {
            let key = FieldKey::field(*segment);
            let Some(next) = segments.get(index + 1) else {
                current
                    .fields_mut()
                    .entry(key)
                    .or_insert(SelectionValue::Leaf);
                break;
            };

            let value = current
                .fields_mut()
                .entry(key)
                .or_insert_with(|| SelectionValue::Node(SelectionNode::new()));
            let Some(node) = value.as_node_mut() else {
                return Err(SelectionError::DescendIntoLeaf {
                    path: path.to_string(),
                    segment: segment.to_string(),
                });
            };
            if *next == NODES || *next == EDGES {
                node.ensure_paginated(page_size);
            }
            current = node;
        }
        Ok(())
    }

    /// Adds `first` and `pageInfo { hasNextPage endCursor }` to a connection selection, unless
    /// they are already there.
    pub(crate) fn ensure_paginated(&mut self, page_size: u32) {
        self.arguments_mut()
            .entry(FIRST.to_string())
            .or_insert_with(|| Value::from(page_size));
        self.fields_mut()
            .entry(FieldKey::field(PAGE_INFO))
            .or_insert_with(|| SelectionValue::Node(SelectionNode::page_info()));
    }
}
