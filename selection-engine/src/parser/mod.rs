//! Parser for the selection grammar.
//!
//! ```text
//! SelectionSet   ::= "{" Selection* "}" | Selection+
//! Selection      ::= Field | InlineFragment
//! Field          ::= Name (":" Name)? Arguments? SelectionSet?
//! InlineFragment ::= "..." "on" Name SelectionSet
//! Arguments      ::= "(" (Name ":" Value)* ")"
//! Value          ::= String | Number | "true" | "false" | "null" | Name
//!                  | "[" Value* "]" | "{" (Name ":" Value)* "}"
//! ```
//!
//! The top-level selection set may omit its braces. In `alias: field` the selection is stored
//! under `field`; response shaping indexes the tree by field name only.
use std::path::Path;
use std::path::PathBuf;

use indexmap::IndexMap;

mod lexer;

pub(crate) use lexer::is_identifier;
use lexer::Token;
use lexer::TokenKind;

use crate::error::GrammarError;
use crate::error::GrammarErrorKind;
use crate::error::SelectionError;
use crate::selection::FieldKey;
use crate::selection::SelectionNode;
use crate::selection::SelectionValue;
use crate::selection::Value;

const END_OF_INPUT: &str = "end of input";

/// How deeply selection sets and list or object values may nest.
pub const DEFAULT_RECURSION_LIMIT: usize = 100;

/// Parses selection text into a selection tree.
///
/// # Errors
/// Returns a [`GrammarError`] locating the first problem in `source`.
pub fn parse_selection(source: &str) -> Result<SelectionNode, GrammarError> {
    parse_selection_with_recursion_limit(source, DEFAULT_RECURSION_LIMIT)
}

/// Parses selection text, allowing at most `recursion_limit` levels of nesting.
pub fn parse_selection_with_recursion_limit(
    source: &str,
    recursion_limit: usize,
) -> Result<SelectionNode, GrammarError> {
    let tokens = lexer::tokenize(source)
        .map_err(|(kind, offset)| GrammarError::new(kind, offset, source))?;
    Parser {
        source,
        tokens: &tokens,
        position: 0,
        depth: 0,
        recursion_limit,
    }
    .parse_document()
}

/// Where selection text comes from: given inline, or read from a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionSource {
    Inline(String),
    File(PathBuf),
}

impl SelectionSource {
    /// Interprets a command-line value: `@file:path` and `@path` refer to a file, anything else
    /// is selection text.
    pub fn parse_arg(arg: &str) -> Self {
        match arg.strip_prefix('@') {
            Some(reference) => {
                let path = reference.strip_prefix("file:").unwrap_or(reference);
                Self::File(PathBuf::from(path))
            }
            None => Self::Inline(arg.to_string()),
        }
    }

    pub fn read(&self) -> Result<String, SelectionError> {
        match self {
            Self::Inline(text) => Ok(text.clone()),
            Self::File(path) => read_source_file(path),
        }
    }

    /// Reads the source and parses it.
    pub fn parse(&self) -> Result<SelectionNode, SelectionError> {
        Ok(parse_selection(&self.read()?)?)
    }
}

fn read_source_file(path: &Path) -> Result<String, SelectionError> {
    tracing::debug!(path = %path.display(), "reading selection from file");
    std::fs::read_to_string(path).map_err(|source| SelectionError::ReadSource {
        path: path.to_path_buf(),
        source,
    })
}

struct Parser<'a> {
    source: &'a str,
    tokens: &'a [Token],
    position: usize,
    depth: usize,
    recursion_limit: usize,
}

impl Parser<'_> {
    fn parse_document(&mut self) -> Result<SelectionNode, GrammarError> {
        if self.tokens.is_empty() {
            return Err(self.error_at(GrammarErrorKind::EmptySource, 0));
        }

        let node = if self.peek_punctuation('{') {
            self.parse_selection_set()?
        } else {
            let mut node = SelectionNode::new();
            while self.peek().is_some() {
                self.parse_selection(&mut node)?;
            }
            node
        };

        if let Some(token) = self.peek() {
            return Err(self.error_at(
                GrammarErrorKind::TrailingTokens(token.kind.to_string()),
                token.offset,
            ));
        }
        if node.is_empty() {
            return Err(self.error_at(GrammarErrorKind::EmptySelection, 0));
        }
        Ok(node)
    }

    // SelectionSet ::= "{" Selection* "}"
    fn parse_selection_set(&mut self) -> Result<SelectionNode, GrammarError> {
        self.nested(|parser| {
            parser.expect_punctuation('{')?;
            let mut node = SelectionNode::new();
            while !parser.peek_punctuation('}') {
                if parser.peek().is_none() {
                    return Err(parser.expected("punctuation '}'"));
                }
                parser.parse_selection(&mut node)?;
            }
            parser.expect_punctuation('}')?;
            Ok(node)
        })
    }

    // Selection ::= Field | InlineFragment
    fn parse_selection(&mut self, parent: &mut SelectionNode) -> Result<(), GrammarError> {
        if matches!(self.peek_kind(), Some(TokenKind::Spread)) {
            self.position += 1;
            return self.parse_inline_fragment(parent);
        }
        self.parse_field(parent)
    }

    // InlineFragment ::= "..." "on" Name SelectionSet
    fn parse_inline_fragment(&mut self, parent: &mut SelectionNode) -> Result<(), GrammarError> {
        match self.peek_kind() {
            Some(TokenKind::Name(keyword)) if keyword == "on" => self.position += 1,
            _ => return Err(self.expected("keyword 'on'")),
        }
        let type_name = self.expect_name("type name")?;
        let selection_set = self.parse_selection_set()?;
        parent.merge_field(
            FieldKey::TypeConditional(type_name),
            SelectionValue::Node(selection_set),
        );
        Ok(())
    }

    // Field ::= Name (":" Name)? Arguments? SelectionSet?
    fn parse_field(&mut self, parent: &mut SelectionNode) -> Result<(), GrammarError> {
        let offset = self.current_offset();
        let mut name = self.expect_name("name")?;
        if self.peek_punctuation(':') {
            self.position += 1;
            name = self.expect_name("name")?;
        }

        let arguments = if self.peek_punctuation('(') {
            Some(self.parse_arguments()?)
        } else {
            None
        };

        let value = match (arguments, self.peek_punctuation('{')) {
            (Some(_), false) => {
                return Err(
                    self.error_at(GrammarErrorKind::ArgumentsWithoutSelection(name), offset)
                );
            }
            (arguments, true) => {
                let mut selection_set = self.parse_selection_set()?;
                for (argument, value) in arguments.into_iter().flatten() {
                    selection_set.set_argument(argument, value);
                }
                SelectionValue::Node(selection_set)
            }
            (None, false) => SelectionValue::Leaf,
        };
        parent.merge_field(FieldKey::Field(name), value);
        Ok(())
    }

    // Arguments ::= "(" (Name ":" Value)* ")"
    fn parse_arguments(&mut self) -> Result<IndexMap<String, Value>, GrammarError> {
        self.expect_punctuation('(')?;
        let mut arguments = IndexMap::new();
        while !self.peek_punctuation(')') {
            let name = self.expect_name("argument name or punctuation ')'")?;
            self.expect_punctuation(':')?;
            let value = self.parse_value()?;
            arguments.insert(name, value);
        }
        self.expect_punctuation(')')?;
        Ok(arguments)
    }

    fn parse_value(&mut self) -> Result<Value, GrammarError> {
        let Some(token) = self.peek() else {
            return Err(self.expected("value"));
        };
        let value = match &token.kind {
            TokenKind::String(value) => Value::String(value.clone()),
            TokenKind::Number(number) => Value::Number(number.clone()),
            TokenKind::Name(name) => match name.as_str() {
                "true" => Value::Boolean(true),
                "false" => Value::Boolean(false),
                "null" => Value::Null,
                _ => Value::Enum(name.clone()),
            },
            TokenKind::Punctuation('[') => return self.parse_list(),
            TokenKind::Punctuation('{') => return self.parse_object(),
            _ => return Err(self.expected("value")),
        };
        self.position += 1;
        Ok(value)
    }

    // "[" Value* "]"
    fn parse_list(&mut self) -> Result<Value, GrammarError> {
        self.nested(|parser| {
            parser.expect_punctuation('[')?;
            let mut values = Vec::new();
            while !parser.peek_punctuation(']') {
                values.push(parser.parse_value()?);
            }
            parser.expect_punctuation(']')?;
            Ok(Value::List(values))
        })
    }

    // "{" (Name ":" Value)* "}"
    fn parse_object(&mut self) -> Result<Value, GrammarError> {
        self.nested(|parser| {
            parser.expect_punctuation('{')?;
            let mut fields = IndexMap::new();
            while !parser.peek_punctuation('}') {
                let name = parser.expect_name("object field name or punctuation '}'")?;
                parser.expect_punctuation(':')?;
                fields.insert(name, parser.parse_value()?);
            }
            parser.expect_punctuation('}')?;
            Ok(Value::Object(fields))
        })
    }

    /// Runs `parse` one nesting level deeper, failing once the recursion limit is reached.
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, GrammarError>,
    ) -> Result<T, GrammarError> {
        if self.depth >= self.recursion_limit {
            return Err(self.error_at(
                GrammarErrorKind::RecursionLimitExceeded(self.recursion_limit),
                self.current_offset(),
            ));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.peek().map(|token| &token.kind)
    }

    fn peek_punctuation(&self, punctuation: char) -> bool {
        matches!(self.peek_kind(), Some(TokenKind::Punctuation(c)) if *c == punctuation)
    }

    fn expect_punctuation(&mut self, punctuation: char) -> Result<(), GrammarError> {
        if self.peek_punctuation(punctuation) {
            self.position += 1;
            Ok(())
        } else {
            Err(self.expected(&format!("punctuation '{punctuation}'")))
        }
    }

    fn expect_name(&mut self, expected: &str) -> Result<String, GrammarError> {
        match self.peek_kind() {
            Some(TokenKind::Name(name)) => {
                let name = name.clone();
                self.position += 1;
                Ok(name)
            }
            _ => Err(self.expected(expected)),
        }
    }

    fn current_offset(&self) -> usize {
        self.peek()
            .map_or(self.source.len(), |token| token.offset)
    }

    fn expected(&self, expected: &str) -> GrammarError {
        let found = self
            .peek()
            .map_or_else(|| END_OF_INPUT.to_string(), |token| token.kind.to_string());
        self.error_at(
            GrammarErrorKind::Expected {
                expected: expected.to_string(),
                found,
            },
            self.current_offset(),
        )
    }

    fn error_at(&self, kind: GrammarErrorKind, offset: usize) -> GrammarError {
        GrammarError::new(kind, offset, self.source)
    }
}
