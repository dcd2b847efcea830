//! ## Usage
//!
//! This crate decides which fields a command requests from a graph-shaped query API.
//! A command handler builds a [`SelectionRequest`] and hands it to a [`SelectionResolver`],
//! which combines the pieces below into a finished [`SelectionNode`]:
//!
//! - [`SchemaIndex`]: lookup of types, fields and connections in the raw schema description.
//! - [`parser`]: the small selection grammar (`id title variants { nodes { sku } }`).
//! - [`Synthesizer`]: a full selection generated from schema metadata.
//! - dot paths (`variants.nodes.sku`) merged into a base selection with
//!   [`SelectionNode::merge_path`].
//!
//! Sending the request and shaping the response are left to the caller.

#![warn(
    rustdoc::broken_intra_doc_links,
    unreachable_pub,
    unreachable_patterns,
    unused,
    unused_qualifications,
    dead_code,
    while_true,
    unconditional_panic,
    clippy::all
)]

pub mod config;
pub mod error;
pub mod parser;
pub mod resolve;
pub mod schema;
pub mod selection;
pub mod synthesize;

pub use crate::config::EngineConfig;
pub use crate::error::GrammarError;
pub use crate::error::GrammarErrorKind;
pub use crate::error::SelectionError;
pub use crate::parser::SelectionSource;
pub use crate::resolve::DisplayMode;
pub use crate::resolve::SelectionRequest;
pub use crate::resolve::SelectionResolver;
pub use crate::schema::SchemaIndex;
pub use crate::selection::FieldKey;
pub use crate::selection::SelectionNode;
pub use crate::selection::SelectionValue;
pub use crate::selection::Value;
pub use crate::synthesize::Synthesizer;
