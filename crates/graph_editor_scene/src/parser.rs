// SPDX-License-Identifier: MIT OR Apache-2.0
//! Recursive descent parser producing a lossless [`Document`].

use crate::document::{Document, Field, FieldValue, Number, TextString};
use crate::lexer::{Lexer, Spanned, Token};

/// Parse record text into a [`Document`]
pub fn parse(text: &str) -> Result<Document, ParseError> {
    Parser::new(text)?.parse_document()
}

/// Error raised while reading record text
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{line}:{column}: {kind}")]
pub struct ParseError {
    /// 1-based line
    pub line: usize,
    /// 1-based column
    pub column: usize,
    /// What went wrong
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub(crate) fn new(line: usize, column: usize, kind: ParseErrorKind) -> Self {
        Self { line, column, kind }
    }
}

/// Category of a [`ParseError`]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseErrorKind {
    /// A character that cannot start any token
    #[error("unexpected character {0:?}")]
    UnexpectedChar(char),

    /// String literal not closed before the end of the line
    #[error("unterminated string literal")]
    UnterminatedString,

    /// Unknown or truncated backslash escape
    #[error("invalid escape sequence `{0}`")]
    InvalidEscape(String),

    /// Escapes that decode to bytes which are not UTF-8
    #[error("string literal does not decode to UTF-8")]
    InvalidUtf8,

    /// Numeric literal that does not parse
    #[error("malformed number `{0}`")]
    MalformedNumber(String),

    /// A token that does not fit the grammar
    #[error("expected {expected}, found {found}")]
    UnexpectedToken {
        /// What the grammar allows here
        expected: &'static str,
        /// Description of the token found instead
        found: String,
    },

    /// A `}` with no open block
    #[error("unbalanced closing brace")]
    UnbalancedBrace,

    /// Input ended inside a block
    #[error("block `{0}` is never closed")]
    UnclosedBlock(String),
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Spanned,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(text);
        let current = lexer.next_token()?;
        Ok(Self { lexer, current })
    }

    /// Move to the next token, returning the one just consumed
    fn advance(&mut self) -> Result<Spanned, ParseError> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn unexpected(&self, expected: &'static str) -> ParseError {
        ParseError::new(
            self.current.line,
            self.current.column,
            ParseErrorKind::UnexpectedToken {
                expected,
                found: self.current.token.describe(),
            },
        )
    }

    fn parse_document(mut self) -> Result<Document, ParseError> {
        self.parse_fields(None)
    }

    /// Parse fields until end of input (top level) or the closing brace of `block`
    fn parse_fields(&mut self, block: Option<&str>) -> Result<Document, ParseError> {
        let mut document = Document::new();
        loop {
            match &self.current.token {
                Token::Eof => {
                    return match block {
                        Some(name) => Err(ParseError::new(
                            self.current.line,
                            self.current.column,
                            ParseErrorKind::UnclosedBlock(name.to_string()),
                        )),
                        None => Ok(document),
                    };
                }
                Token::RBrace => {
                    if block.is_none() {
                        return Err(ParseError::new(
                            self.current.line,
                            self.current.column,
                            ParseErrorKind::UnbalancedBrace,
                        ));
                    }
                    self.advance()?;
                    return Ok(document);
                }
                Token::Ident(_) => {
                    let field = self.parse_field()?;
                    document.push_field(field);
                }
                _ => return Err(self.unexpected("field name")),
            }
        }
    }

    fn parse_field(&mut self) -> Result<Field, ParseError> {
        let name = match self.advance()?.token {
            Token::Ident(name) => name,
            _ => return Err(self.unexpected("field name")),
        };

        match self.current.token {
            Token::LBrace => {
                self.advance()?;
                let body = self.parse_fields(Some(&name))?;
                Ok(Field::new(name, FieldValue::Block(body)))
            }
            Token::Colon => {
                self.advance()?;
                let value = self.parse_value(&name)?;
                Ok(Field::new(name, value))
            }
            _ => Err(self.unexpected("`:` or `{`")),
        }
    }

    fn parse_value(&mut self, name: &str) -> Result<FieldValue, ParseError> {
        let start = self.current.clone();
        match start.token {
            Token::LBrace => {
                self.advance()?;
                Ok(FieldValue::Block(self.parse_fields(Some(name))?))
            }
            Token::Str(_) => {
                let mut segments = Vec::new();
                while let Token::Str(raw) = &self.current.token {
                    segments.push(raw.clone());
                    self.advance()?;
                }
                let text = TextString::from_segments(segments)
                    .map_err(|kind| ParseError::new(start.line, start.column, kind))?;
                Ok(FieldValue::Str(text))
            }
            Token::Number(raw) => {
                self.advance()?;
                let number = Number::new(raw)
                    .map_err(|kind| ParseError::new(start.line, start.column, kind))?;
                Ok(FieldValue::Number(number))
            }
            Token::Ident(ident) => {
                self.advance()?;
                Ok(FieldValue::Ident(ident))
            }
            _ => Err(self.unexpected("a value")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_blocks() {
        let doc = parse("embedded_components {\n  id: \"camera\"\n  position {\n    z: 0.1\n  }\n}\n")
            .unwrap();
        assert_eq!(doc.len(), 1);
        let embedded = doc.get("embedded_components").and_then(FieldValue::as_block).unwrap();
        assert_eq!(embedded.get("id").and_then(FieldValue::as_str), Some("camera"));
        let position = embedded.get("position").and_then(FieldValue::as_block).unwrap();
        assert_eq!(
            position.get("z").and_then(FieldValue::as_number).map(Number::raw),
            Some("0.1")
        );
    }

    #[test]
    fn test_adjacent_strings_concatenate() {
        let doc = parse("data: \"a: 1\\n\"\n  \"b: 2\\n\"\n  \"\"\n").unwrap();
        let data = doc.get("data").and_then(FieldValue::as_text).unwrap();
        assert_eq!(data.segments().len(), 3);
        assert_eq!(data.value(), "a: 1\nb: 2\n");
    }

    #[test]
    fn test_enum_values_are_identifiers() {
        let doc = parse("type: PROPERTY_TYPE_NUMBER").unwrap();
        assert_eq!(
            doc.get("type"),
            Some(&FieldValue::Ident("PROPERTY_TYPE_NUMBER".into()))
        );
    }

    #[test]
    fn test_colon_before_block_is_accepted() {
        let doc = parse("scale: { x: 2.0 }").unwrap();
        assert!(doc.get("scale").and_then(FieldValue::as_block).is_some());
    }

    #[test]
    fn test_unclosed_block() {
        let err = parse("position {\n  x: 1.0\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnclosedBlock("position".into()));
    }

    #[test]
    fn test_unbalanced_brace() {
        let err = parse("x: 1.0\n}\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnbalancedBrace);
        assert_eq!((err.line, err.column), (2, 1));
    }

    #[test]
    fn test_missing_value() {
        let err = parse("id:\n}").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::UnexpectedToken { expected: "a value", .. }));
    }

    #[test]
    fn test_bad_escape_reports_string_position() {
        let err = parse("id: \"\\q\"").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidEscape("\\q".into()));
        assert_eq!((err.line, err.column), (1, 5));
    }

    #[test]
    fn test_error_display() {
        let err = parse("id \"x\"").unwrap_err();
        assert_eq!(err.to_string(), "1:4: expected `:` or `{`, found string literal");
    }
}
