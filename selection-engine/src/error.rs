//! Errors reported while resolving a selection.
//!
//! Every error is a usage or schema error: none of them is transient, and all of
//! them reach the command layer unchanged through [`SelectionError`].
use std::path::PathBuf;

use line_col::LineColLookup;

#[derive(Debug, thiserror::Error)]
pub enum SelectionError {
    #[error(transparent)]
    Grammar(#[from] GrammarError),

    #[error("Unknown type `{0}`")]
    UnknownType(String),

    #[error("Type `{type_name}` has no field `{field}`")]
    UnknownField { type_name: String, field: String },

    #[error("Field `{type_name}.{field}` is not a connection and cannot be included")]
    NotAConnection { type_name: String, field: String },

    #[error(
        "Connection `{type_name}.{field}` has required arguments and cannot be included automatically"
    )]
    ConnectionRequiresArguments { type_name: String, field: String },

    #[error("Cannot select `{path}`: `{segment}` is already selected as a leaf field")]
    DescendIntoLeaf { path: String, segment: String },

    #[error("Invalid field path `{path}`: `{segment}` is not a valid field name")]
    InvalidPathSegment { path: String, segment: String },

    #[error("Selection set is empty: raw mode requires an explicit selection or field paths")]
    EmptyRawSelection,

    #[error("Selection set is empty")]
    EmptySelection,

    #[error("Cannot select every field without a root type or a known resource")]
    MissingRootType,

    #[error("Unknown resource `{0}`")]
    UnknownResource(String),

    #[error("No default selection was supplied for this command")]
    MissingDefaultSelection,

    #[error("Could not read selection from `{}`: {source}", path.display())]
    ReadSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid schema description: {0}")]
    InvalidSchema(String),

    #[error(
        "Schema index treats `*{schema}` types as connections, but the configuration uses `*{config}`"
    )]
    ConnectionSuffixMismatch { schema: String, config: String },
}

/// What went wrong while tokenizing or parsing selection text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GrammarErrorKind {
    #[error("expected {expected}, found {found}")]
    Expected { expected: String, found: String },

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("invalid escape sequence `{0}`")]
    InvalidEscape(String),

    #[error("invalid number `{0}`")]
    InvalidNumber(String),

    #[error("unexpected character '{0}'")]
    UnexpectedCharacter(char),

    #[error("field `{0}` has arguments but no selection set")]
    ArgumentsWithoutSelection(String),

    #[error("selection source is empty")]
    EmptySource,

    #[error("selection selects no fields")]
    EmptySelection,

    #[error("unexpected {0} after the end of the selection set")]
    TrailingTokens(String),

    #[error("selection nests more than {0} levels deep")]
    RecursionLimitExceeded(usize),
}

/// A grammar error together with where it happened in the source.
///
/// `offset` is a byte offset; `line` and `column` are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid selection: {kind} at line {line}, column {column}")]
pub struct GrammarError {
    pub kind: GrammarErrorKind,
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl GrammarError {
    pub(crate) fn new(kind: GrammarErrorKind, offset: usize, source: &str) -> Self {
        let offset = offset.min(source.len());
        let (line, column) = LineColLookup::new(source).get(offset);
        Self {
            kind,
            offset,
            line,
            column,
        }
    }
}
