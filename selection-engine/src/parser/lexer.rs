//! Splits selection text into tokens.
//!
//! Whitespace, commas and `#` line comments separate tokens and are otherwise ignored.
use std::fmt;

use nom::IResult;
use nom::bytes::complete::tag;
use nom::bytes::complete::take_while;
use nom::character::complete::char;
use nom::character::complete::digit1;
use nom::character::complete::one_of;
use nom::character::complete::satisfy;
use nom::combinator::all_consuming;
use nom::combinator::opt;
use nom::combinator::recognize;
use nom::sequence::pair;

use crate::error::GrammarErrorKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Name(String),
    String(String),
    Number(serde_json::Number),
    Punctuation(char),
    Spread,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "name `{name}`"),
            Self::String(_) => f.write_str("string literal"),
            Self::Number(number) => write!(f, "number `{number}`"),
            Self::Punctuation(punctuation) => write!(f, "punctuation '{punctuation}'"),
            Self::Spread => f.write_str("'...'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    /// Byte offset of the first character of the token.
    pub(crate) offset: usize,
}

/// A lexing failure and the byte offset it was detected at.
pub(crate) type LexError = (GrammarErrorKind, usize);

pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let mut tokens = Vec::new();
    let mut input = source;
    loop {
        input = skip_ignored(input);
        let offset = source.len() - input.len();
        let Some(first) = input.chars().next() else {
            return Ok(tokens);
        };
        let (remainder, kind) = match first {
            '"' => string_literal(input).map_err(|(kind, at)| (kind, offset + at))?,
            '-' | '0'..='9' => number(input).map_err(|kind| (kind, offset))?,
            '.' => spread(input)
                .map(|(remainder, _)| (remainder, TokenKind::Spread))
                .map_err(|_| (GrammarErrorKind::UnexpectedCharacter('.'), offset))?,
            '{' | '}' | '(' | ')' | ':' | '[' | ']' => punctuation(input)
                .map(|(remainder, punctuation)| (remainder, TokenKind::Punctuation(punctuation)))
                .map_err(|_| (GrammarErrorKind::UnexpectedCharacter(first), offset))?,
            _ => identifier(input)
                .map(|(remainder, name)| (remainder, TokenKind::Name(name.to_string())))
                .map_err(|_| (GrammarErrorKind::UnexpectedCharacter(first), offset))?,
        };
        tokens.push(Token { kind, offset });
        input = remainder;
    }
}

/// Consumes any amount of whitespace, commas and/or comments starting with # until the end of
/// the line.
fn skip_ignored(input: &str) -> &str {
    let mut suffix = input;
    loop {
        suffix = suffix.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
        if suffix.starts_with('#') {
            suffix = match suffix.find('\n') {
                Some(newline) => &suffix[newline + 1..],
                None => "",
            };
        } else {
            return suffix;
        }
    }
}

// Identifier ::= [a-zA-Z_] [0-9a-zA-Z_]*

pub(crate) fn is_identifier(input: &str) -> bool {
    all_consuming(identifier)(input).is_ok()
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)
}

fn punctuation(input: &str) -> IResult<&str, char> {
    one_of("{}():[]")(input)
}

fn spread(input: &str) -> IResult<&str, &str> {
    tag("...")(input)
}

// Number ::= "-"? [0-9]+ ("." [0-9]+)?

fn number(input: &str) -> Result<(&str, TokenKind), GrammarErrorKind> {
    let invalid = |end: &str| {
        let text = &input[..input.len() - end.len()];
        GrammarErrorKind::InvalidNumber(text.to_string())
    };

    let (rest, _) = opt(char::<_, nom::error::Error<&str>>('-'))(input)
        .map_err(|_| invalid(input))?;
    let (rest, _) = digit1::<_, nom::error::Error<&str>>(rest).map_err(|_| invalid(rest))?;
    let rest = match rest.strip_prefix('.') {
        // `1...` is a number followed by a spread, which the parser rejects on its own.
        Some(fraction) if !fraction.starts_with('.') => {
            digit1::<_, nom::error::Error<&str>>(fraction)
                .map_err(|_| invalid(fraction))?
                .0
        }
        _ => rest,
    };

    let text = &input[..input.len() - rest.len()];
    let number = text
        .parse::<serde_json::Number>()
        .map_err(|_| GrammarErrorKind::InvalidNumber(text.to_string()))?;
    Ok((rest, TokenKind::Number(number)))
}

// LitString ::= '"' (EscapedCharacter | [^"\\])* '"'

/// Lexes a double-quoted string. Errors carry the offset of the problem relative to `input`.
fn string_literal(input: &str) -> Result<(&str, TokenKind), LexError> {
    let mut value = String::new();
    let mut chars = input.char_indices().skip(1);
    while let Some((index, c)) = chars.next() {
        match c {
            '"' => return Ok((&input[index + 1..], TokenKind::String(value))),
            '\\' => {
                let escaped = match chars.next() {
                    Some((_, '"')) => '"',
                    Some((_, '\\')) => '\\',
                    Some((_, '/')) => '/',
                    Some((_, 'b')) => '\u{0008}',
                    Some((_, 'f')) => '\u{000C}',
                    Some((_, 'n')) => '\n',
                    Some((_, 'r')) => '\r',
                    Some((_, 't')) => '\t',
                    Some((_, 'u')) => {
                        let digits = escape_digits(&input[index + 2..]);
                        let invalid =
                            || (GrammarErrorKind::InvalidEscape(format!("\\u{digits}")), index);
                        let unit = hex_unit(&digits).ok_or_else(invalid)?;
                        chars.nth(3);
                        let code_point = match unit {
                            // A high surrogate must be followed by an escaped low surrogate.
                            0xD800..=0xDBFF => {
                                let low = input[index + 6..]
                                    .strip_prefix("\\u")
                                    .and_then(|rest| hex_unit(&escape_digits(rest)))
                                    .filter(|low| (0xDC00..=0xDFFF).contains(low))
                                    .ok_or_else(invalid)?;
                                chars.nth(5);
                                0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00)
                            }
                            unit => unit,
                        };
                        char::from_u32(code_point).ok_or_else(invalid)?
                    }
                    Some((_, other)) => {
                        return Err((GrammarErrorKind::InvalidEscape(format!("\\{other}")), index));
                    }
                    None => return Err((GrammarErrorKind::UnterminatedString, 0)),
                };
                value.push(escaped);
            }
            '\n' => return Err((GrammarErrorKind::UnterminatedString, 0)),
            c => value.push(c),
        }
    }
    Err((GrammarErrorKind::UnterminatedString, 0))
}

fn escape_digits(input: &str) -> String {
    input.chars().take(4).collect()
}

/// Reads the four hex digits of a `\u` escape.
fn hex_unit(digits: &str) -> Option<u32> {
    if digits.len() == 4 && digits.chars().all(|c| c.is_ascii_hexdigit()) {
        u32::from_str_radix(digits, 16).ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    fn name(name: &str) -> TokenKind {
        TokenKind::Name(name.to_string())
    }

    fn number(text: &str) -> TokenKind {
        TokenKind::Number(text.parse().unwrap())
    }

    #[test]
    fn test_skip_ignored() {
        assert_eq!(skip_ignored(""), "");
        assert_eq!(skip_ignored(" , ,\t\n"), "");
        assert_eq!(skip_ignored("# comment"), "");
        assert_eq!(skip_ignored("  # comment\nid"), "id");
        assert_eq!(skip_ignored("# one\n, # two\n  title # three"), "title # three");
        assert_eq!(skip_ignored("id # comment"), "id # comment");
    }

    #[test]
    fn tokenizes_selection() {
        assert_eq!(
            kinds("{ id, title price(currency: \"USD\") { amount } ... on Video { d } }"),
            vec![
                TokenKind::Punctuation('{'),
                name("id"),
                name("title"),
                name("price"),
                TokenKind::Punctuation('('),
                name("currency"),
                TokenKind::Punctuation(':'),
                TokenKind::String("USD".to_string()),
                TokenKind::Punctuation(')'),
                TokenKind::Punctuation('{'),
                name("amount"),
                TokenKind::Punctuation('}'),
                TokenKind::Spread,
                name("on"),
                name("Video"),
                TokenKind::Punctuation('{'),
                name("d"),
                TokenKind::Punctuation('}'),
                TokenKind::Punctuation('}'),
            ]
        );
    }

    #[test]
    fn records_offsets() {
        let offsets: Vec<usize> = tokenize("id\n  # skip\n  title")
            .unwrap()
            .into_iter()
            .map(|token| token.offset)
            .collect();
        assert_eq!(offsets, vec![0, 14]);
    }

    #[rstest]
    #[case("0", "0")]
    #[case("42", "42")]
    #[case("-7", "-7")]
    #[case("3.25", "3.25")]
    #[case("-0.5", "-0.5")]
    fn tokenizes_numbers(#[case] source: &str, #[case] expected: &str) {
        assert_eq!(kinds(source), vec![number(expected)]);
    }

    #[test]
    fn number_followed_by_name() {
        assert_eq!(kinds("12abc"), vec![number("12"), name("abc")]);
    }

    #[rstest]
    #[case("-", "-")]
    #[case("-x", "-")]
    #[case("1.", "1.")]
    #[case("1.x", "1.")]
    fn rejects_malformed_numbers(#[case] source: &str, #[case] text: &str) {
        assert_eq!(
            tokenize(source),
            Err((GrammarErrorKind::InvalidNumber(text.to_string()), 0))
        );
    }

    #[rstest]
    #[case(r#""plain""#, "plain")]
    #[case(r#""say \"hi\"""#, "say \"hi\"")]
    #[case(r#""a\\b\/c""#, "a\\b/c")]
    #[case(r#""\b\f\n\r\t""#, "\u{0008}\u{000C}\n\r\t")]
    #[case(r#""café""#, "café")]
    #[case(r#""éé""#, "éé")]
    #[case(r#""caf\u00e9""#, "café")]
    #[case(r#""\u00E9t\u00e9""#, "été")]
    #[case(r#""\uD83D\uDE00!""#, "😀!")]
    #[case(r#""\ud83d\ude00\u0041""#, "😀A")]
    fn tokenizes_strings(#[case] source: &str, #[case] expected: &str) {
        assert_eq!(kinds(source), vec![TokenKind::String(expected.to_string())]);
    }

    #[test]
    fn rejects_unterminated_strings() {
        assert_eq!(
            tokenize("id \"open"),
            Err((GrammarErrorKind::UnterminatedString, 3))
        );
        assert_eq!(
            tokenize("\"line\nbreak\""),
            Err((GrammarErrorKind::UnterminatedString, 0))
        );
        assert_eq!(
            tokenize("\"trailing\\"),
            Err((GrammarErrorKind::UnterminatedString, 0))
        );
    }

    #[rstest]
    #[case(r#""\x""#, r"\x", 1)]
    #[case(r#""ab\q""#, r"\q", 3)]
    #[case(r#""\u12""#, "\\u12\"", 1)]
    #[case(r#""\uzzzz""#, r"\uzzzz", 1)]
    #[case(r#""\uD800""#, r"\uD800", 1)]
    #[case(r#""\uD83D!""#, r"\uD83D", 1)]
    #[case(r#""x\uD83D\u0041""#, r"\uD83D", 2)]
    #[case(r#""\uDE00""#, r"\uDE00", 1)]
    fn rejects_invalid_escapes(#[case] source: &str, #[case] escape: &str, #[case] offset: usize) {
        assert_eq!(
            tokenize(source),
            Err((GrammarErrorKind::InvalidEscape(escape.to_string()), offset))
        );
    }

    #[rstest]
    #[case("id $x", '$', 3)]
    #[case("id .. x", '.', 3)]
    #[case("a*", '*', 1)]
    #[case("é", 'é', 0)]
    fn rejects_unexpected_characters(
        #[case] source: &str,
        #[case] character: char,
        #[case] offset: usize,
    ) {
        assert_eq!(
            tokenize(source),
            Err((GrammarErrorKind::UnexpectedCharacter(character), offset))
        );
    }

    #[rstest]
    #[case("id", true)]
    #[case("_private", true)]
    #[case("field_2", true)]
    #[case("2field", false)]
    #[case("", false)]
    #[case("a-b", false)]
    #[case("on_Video", true)]
    fn test_is_identifier(#[case] input: &str, #[case] expected: bool) {
        assert_eq!(is_identifier(input), expected);
    }
}
