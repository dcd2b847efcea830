//! Pretty printing utility methods
//!
//! A selection prints as a braced selection set, two spaces per indentation level. Without a
//! schema the wildcard-scalars marker prints as `*`; [`SelectionNode::to_graphql`] expands it
//! into the scalar fields of the type instead, which gives the text a request can embed.
use std::fmt;

use itertools::Itertools;

use super::FieldKey;
use super::SelectionNode;
use super::SelectionValue;
use super::Value;
use crate::schema::SchemaIndex;
use crate::schema::TypeDescriptor;

/// Pretty print trait
///
/// This trait marks a type as supporting pretty printing itself outside of a
/// Display implementation, which might be more useful for snapshots.
pub trait PrettyPrintable {
    /// Pretty print the struct
    fn pretty_print(&self) -> String {
        self.pretty_print_with_indentation(0)
    }

    /// Pretty print the struct, with indentation
    ///
    /// Each indentation level is marked with 2 spaces. The first line is not indented, so the
    /// output can follow a field name on the same line.
    fn pretty_print_with_indentation(&self, indentation: usize) -> String;
}

/// Helper method to generate indentation
fn indent_chars(indent: usize) -> String {
    "  ".repeat(indent)
}

impl PrettyPrintable for SelectionNode {
    fn pretty_print_with_indentation(&self, indentation: usize) -> String {
        let mut result = String::new();
        Printer { schema: None }.print_node(self, None, indentation, &mut result);
        result
    }
}

impl SelectionNode {
    /// Prints this selection as GraphQL selection set text for a value of type `type_name`.
    ///
    /// Wildcard markers are replaced by the scalar fields of their type, skipping scalars that
    /// take required arguments and scalars that are already selected. A wildcard whose type
    /// cannot be found in the schema prints nothing.
    pub fn to_graphql(&self, type_name: &str, schema: &SchemaIndex) -> String {
        let mut result = String::new();
        Printer {
            schema: Some(schema),
        }
        .print_node(self, Some(type_name), 0, &mut result);
        result
    }
}

struct Printer<'schema> {
    schema: Option<&'schema SchemaIndex>,
}

impl Printer<'_> {
    fn print_node(
        &self,
        node: &SelectionNode,
        type_name: Option<&str>,
        indentation: usize,
        result: &mut String,
    ) {
        let indent = indent_chars(indentation);
        let inner_indent = indent_chars(indentation + 1);
        let descriptor = self
            .schema
            .zip(type_name)
            .and_then(|(schema, type_name)| schema.type_descriptor(type_name));

        result.push_str("{\n");

        if node.selects_all_scalars() && self.schema.is_some() {
            match descriptor {
                Some(descriptor) => {
                    for scalar in expanded_scalars(node, descriptor) {
                        result.push_str(inner_indent.as_str());
                        result.push_str(scalar);
                        result.push('\n');
                    }
                }
                None => tracing::trace!(?type_name, "cannot expand scalars of unknown type"),
            }
        }

        for (key, value) in node.fields() {
            result.push_str(inner_indent.as_str());
            let child_type = match key {
                FieldKey::Field(name) => {
                    result.push_str(name);
                    descriptor
                        .and_then(|descriptor| descriptor.field(name))
                        .map(|field| field.type_name.as_str())
                }
                FieldKey::TypeConditional(type_condition) => {
                    result.push_str("... on ");
                    result.push_str(type_condition);
                    Some(type_condition.as_str())
                }
            };
            if let SelectionValue::Node(child) = value {
                if !child.arguments().is_empty() {
                    result.push('(');
                    result.push_str(
                        &child
                            .arguments()
                            .iter()
                            .map(|(name, value)| format!("{name}: {value}"))
                            .join(", "),
                    );
                    result.push(')');
                }
                result.push(' ');
                self.print_node(child, child_type, indentation + 1, result);
            }
            result.push('\n');
        }

        if node.selects_all_scalars() && self.schema.is_none() {
            result.push_str(inner_indent.as_str());
            result.push_str("*\n");
        }

        result.push_str(indent.as_str());
        result.push('}');
    }
}

fn expanded_scalars<'a>(
    node: &'a SelectionNode,
    descriptor: &'a TypeDescriptor,
) -> impl Iterator<Item = &'a str> {
    descriptor
        .scalars
        .iter()
        .map(String::as_str)
        .filter(move |scalar| !node.contains_field(scalar))
        .filter(move |scalar| {
            descriptor
                .field(scalar)
                .is_none_or(|field| !field.has_required_arguments)
        })
}

impl fmt::Display for Value {
    /// Displays the value as a GraphQL literal.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(value) => {
                f.write_str(&serde_json::to_string(value).map_err(|_| fmt::Error)?)
            }
            Self::Number(value) => write!(f, "{value}"),
            Self::Boolean(value) => write!(f, "{value}"),
            Self::Null => f.write_str("null"),
            Self::Enum(value) => f.write_str(value),
            Self::List(values) => write!(f, "[{}]", values.iter().join(", ")),
            Self::Object(fields) => write!(
                f,
                "{{{}}}",
                fields
                    .iter()
                    .map(|(name, value)| format!("{name}: {value}"))
                    .join(", ")
            ),
        }
    }
}
