// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tokenizer for the record text format.

use crate::document::{is_valid_number, unescape};
use crate::parser::{ParseError, ParseErrorKind};

/// A lexical token
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Field name, enum value or keyword (`PROPERTY_TYPE_NUMBER`, `true`)
    Ident(String),
    /// Numeric literal, kept exactly as written
    Number(String),
    /// String literal contents between the quotes, still escaped
    Str(String),
    /// `:`
    Colon,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// End of input
    Eof,
}

impl Token {
    /// Short human readable description used in error messages
    pub fn describe(&self) -> String {
        match self {
            Self::Ident(name) => format!("identifier `{name}`"),
            Self::Number(raw) => format!("number `{raw}`"),
            Self::Str(_) => "string literal".to_string(),
            Self::Colon => "`:`".to_string(),
            Self::LBrace => "`{`".to_string(),
            Self::RBrace => "`}`".to_string(),
            Self::Eof => "end of input".to_string(),
        }
    }
}

/// A token with the 1-based position of its first character
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    /// The token
    pub token: Token,
    /// Line of the first character
    pub line: usize,
    /// Column of the first character
    pub column: usize,
}

/// Streaming tokenizer over a source string
pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    /// Create a lexer positioned at the start of `src`
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Skip whitespace, `#` comments and the optional `,`/`;` field separators
    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                '#' => {
                    while !matches!(self.peek(), None | Some('\n')) {
                        self.bump();
                    }
                }
                ',' | ';' => {
                    self.bump();
                }
                c if c.is_whitespace() => {
                    self.bump();
                }
                _ => break,
            }
        }
    }

    /// Produce the next token
    pub fn next_token(&mut self) -> Result<Spanned, ParseError> {
        self.skip_trivia();

        let line = self.line;
        let column = self.column;
        let spanned = |token| Spanned {
            token,
            line,
            column,
        };

        let Some(c) = self.peek() else {
            return Ok(spanned(Token::Eof));
        };

        let token = match c {
            ':' => {
                self.bump();
                Token::Colon
            }
            '{' => {
                self.bump();
                Token::LBrace
            }
            '}' => {
                self.bump();
                Token::RBrace
            }
            '"' => self.lex_string(line, column)?,
            c if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => {
                self.lex_number(line, column)?
            }
            c if c.is_ascii_alphabetic() || c == '_' => Token::Ident(self.take_word().to_string()),
            other => {
                return Err(ParseError::new(
                    line,
                    column,
                    ParseErrorKind::UnexpectedChar(other),
                ))
            }
        };

        Ok(spanned(token))
    }

    fn take_word(&mut self) -> &'a str {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
            self.bump();
        }
        &self.src[start..self.pos]
    }

    fn lex_string(&mut self, line: usize, column: usize) -> Result<Token, ParseError> {
        self.bump();
        let start = self.pos;
        loop {
            match self.bump() {
                None | Some('\n') => {
                    return Err(ParseError::new(
                        line,
                        column,
                        ParseErrorKind::UnterminatedString,
                    ))
                }
                Some('"') => break,
                Some('\\') => {
                    if matches!(self.bump(), None | Some('\n')) {
                        return Err(ParseError::new(
                            line,
                            column,
                            ParseErrorKind::UnterminatedString,
                        ));
                    }
                }
                Some(_) => {}
            }
        }

        let raw = &self.src[start..self.pos - 1];
        unescape(raw).map_err(|kind| ParseError::new(line, column, kind))?;
        Ok(Token::Str(raw.to_string()))
    }

    fn lex_number(&mut self, line: usize, column: usize) -> Result<Token, ParseError> {
        let start = self.pos;
        let mut prev = None;
        while let Some(c) = self.peek() {
            let exponent_sign = matches!(c, '-' | '+') && matches!(prev, Some('e' | 'E'));
            let leading_sign = matches!(c, '-' | '+') && self.pos == start;
            if c.is_ascii_alphanumeric() || c == '.' || exponent_sign || leading_sign {
                prev = Some(c);
                self.bump();
            } else {
                break;
            }
        }

        let raw = &self.src[start..self.pos];
        if !is_valid_number(raw) {
            return Err(ParseError::new(
                line,
                column,
                ParseErrorKind::MalformedNumber(raw.to_string()),
            ));
        }
        Ok(Token::Number(raw.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(src: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(src);
        let mut out = Vec::new();
        loop {
            let spanned = lexer.next_token().unwrap();
            if spanned.token == Token::Eof {
                break;
            }
            out.push(spanned.token);
        }
        out
    }

    #[test]
    fn test_field_tokens() {
        assert_eq!(
            tokens("position {\n  z: -0.179681\n}"),
            vec![
                Token::Ident("position".into()),
                Token::LBrace,
                Token::Ident("z".into()),
                Token::Colon,
                Token::Number("-0.179681".into()),
                Token::RBrace,
            ]
        );
    }

    #[test]
    fn test_string_keeps_escapes() {
        assert_eq!(
            tokens(r#"data: "text: \"Label\"\n""#),
            vec![
                Token::Ident("data".into()),
                Token::Colon,
                Token::Str(r#"text: \"Label\"\n"#.into()),
            ]
        );
    }

    #[test]
    fn test_comments_and_separators_are_skipped() {
        assert_eq!(
            tokens("# header\nx: 1.0, y: 2.0;"),
            vec![
                Token::Ident("x".into()),
                Token::Colon,
                Token::Number("1.0".into()),
                Token::Ident("y".into()),
                Token::Colon,
                Token::Number("2.0".into()),
            ]
        );
    }

    #[test]
    fn test_exponent_numbers() {
        assert_eq!(tokens("1.5e-3"), vec![Token::Number("1.5e-3".into())]);
        assert_eq!(tokens("-inf"), vec![Token::Number("-inf".into())]);
    }

    #[test]
    fn test_positions_are_one_based() {
        let mut lexer = Lexer::new("a: 1\n  b: 2");
        let first = lexer.next_token().unwrap();
        assert_eq!((first.line, first.column), (1, 1));
        lexer.next_token().unwrap();
        lexer.next_token().unwrap();
        let b = lexer.next_token().unwrap();
        assert_eq!(b.token, Token::Ident("b".into()));
        assert_eq!((b.line, b.column), (2, 3));
    }

    #[test]
    fn test_unterminated_string() {
        let err = Lexer::new("\"abc\nx").next_token().unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnterminatedString);
        assert_eq!((err.line, err.column), (1, 1));
    }

    #[test]
    fn test_malformed_number() {
        let err = Lexer::new("1.2.3").next_token().unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MalformedNumber("1.2.3".into()));
    }

    #[test]
    fn test_unexpected_character() {
        let err = Lexer::new("  @").next_token().unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedChar('@'));
        assert_eq!(err.column, 3);
    }
}
