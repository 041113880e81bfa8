// SPDX-License-Identifier: MIT OR Apache-2.0
//! Lossless document model and the canonical writer.
//!
//! A [`Document`] keeps fields in file order, numbers as the text that was
//! written and strings as their escaped literal segments. Writing it back
//! uses the layout the engine editor saves:
//!
//! ```text
//! embedded_components {
//!   id: "camera"
//!   data: "fov: 0.7854\n"
//!   ""
//! }
//! ```
//!
//! Two spaces of indentation per block, one field per line, and one line per
//! literal segment of a multi-line string.

use crate::parser::ParseErrorKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Neg;
use std::str::FromStr;

/// Ordered list of fields, either a whole file or the body of a block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    fields: Vec<Field>,
}

impl Document {
    /// Create an empty document
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the document has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// All fields in order
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Mutable access to the fields
    pub fn fields_mut(&mut self) -> &mut Vec<Field> {
        &mut self.fields
    }

    /// Value of the first field called `name`
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.value)
    }

    /// Mutable value of the first field called `name`
    pub fn get_mut(&mut self, name: &str) -> Option<&mut FieldValue> {
        self.fields
            .iter_mut()
            .find(|f| f.name == name)
            .map(|f| &mut f.value)
    }

    /// Values of every field called `name` (repeated fields)
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FieldValue> + 'a {
        self.fields
            .iter()
            .filter(move |f| f.name == name)
            .map(|f| &f.value)
    }

    /// Append a field
    pub fn push(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.push(Field::new(name, value));
    }

    /// Append an already built field
    pub fn push_field(&mut self, field: Field) {
        self.fields.push(field);
    }

    /// Replace the first field called `name`, or append it
    pub fn set(&mut self, name: impl Into<String>, value: FieldValue) {
        let name = name.into();
        match self.get_mut(&name) {
            Some(existing) => *existing = value,
            None => self.fields.push(Field::new(name, value)),
        }
    }

    /// Remove every field called `name`, returning how many were removed
    pub fn remove(&mut self, name: &str) -> usize {
        let before = self.fields.len();
        self.fields.retain(|f| f.name != name);
        before - self.fields.len()
    }

    /// Write the canonical text form
    pub fn to_text(&self) -> String {
        self.to_string()
    }

    fn write_fields(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = "  ".repeat(depth);
        for field in &self.fields {
            match &field.value {
                FieldValue::Block(body) => {
                    writeln!(f, "{indent}{} {{", field.name)?;
                    body.write_fields(f, depth + 1)?;
                    writeln!(f, "{indent}}}")?;
                }
                FieldValue::Str(text) => {
                    write!(f, "{indent}{}: ", field.name)?;
                    for (i, segment) in text.segments().iter().enumerate() {
                        if i > 0 {
                            f.write_str(&indent)?;
                        }
                        writeln!(f, "\"{segment}\"")?;
                    }
                }
                FieldValue::Number(number) => {
                    writeln!(f, "{indent}{}: {}", field.name, number.raw())?;
                }
                FieldValue::Ident(ident) => {
                    writeln!(f, "{indent}{}: {ident}", field.name)?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_fields(f, 0)
    }
}

impl FromIterator<Field> for Document {
    fn from_iter<I: IntoIterator<Item = Field>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// A named field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Field name
    pub name: String,
    /// Field value
    pub value: FieldValue,
}

impl Field {
    /// Create a field
    pub fn new(name: impl Into<String>, value: FieldValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Value of a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    /// One or more adjacent string literals
    Str(TextString),
    /// Numeric literal
    Number(Number),
    /// Bare identifier: enum values and booleans
    Ident(String),
    /// Nested block
    Block(Document),
}

impl FieldValue {
    /// String value built from unescaped text
    pub fn string(value: impl Into<String>) -> Self {
        Self::Str(TextString::new(value))
    }

    /// Float value
    pub fn float(value: f32) -> Self {
        Self::Number(Number::from_f32(value))
    }

    /// Unsigned integer value
    pub fn uint(value: u32) -> Self {
        Self::Number(Number::from_u32(value))
    }

    /// Identifier value
    pub fn ident(value: impl Into<String>) -> Self {
        Self::Ident(value.into())
    }

    /// Decoded string, if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(text) => Some(text.value()),
            _ => None,
        }
    }

    /// The string with its literal segments, if this is a string
    pub fn as_text(&self) -> Option<&TextString> {
        match self {
            Self::Str(text) => Some(text),
            _ => None,
        }
    }

    /// The number, if this is a number
    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Self::Number(number) => Some(number),
            _ => None,
        }
    }

    /// The identifier, if this is an identifier
    pub fn as_ident(&self) -> Option<&str> {
        match self {
            Self::Ident(ident) => Some(ident),
            _ => None,
        }
    }

    /// The block body, if this is a block
    pub fn as_block(&self) -> Option<&Document> {
        match self {
            Self::Block(body) => Some(body),
            _ => None,
        }
    }

    /// Kind name used in diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Str(_) => "string",
            Self::Number(_) => "number",
            Self::Ident(_) => "identifier",
            Self::Block(_) => "block",
        }
    }
}

/// A string value together with the escaped literal segments it was written as
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextString {
    value: String,
    segments: Vec<String>,
}

impl TextString {
    /// Build from unescaped text, splitting after every newline
    ///
    /// A value ending in a newline gets a trailing empty segment, which is
    /// how nested `data` payloads are laid out.
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let segments = if value.contains('\n') {
            let mut segments: Vec<String> = value.split_inclusive('\n').map(escape).collect();
            if value.ends_with('\n') {
                segments.push(String::new());
            }
            segments
        } else {
            vec![escape(&value)]
        };
        Self { value, segments }
    }

    /// Build from escaped literal segments as they appear between quotes
    pub fn from_segments(segments: Vec<String>) -> Result<Self, ParseErrorKind> {
        if segments.is_empty() {
            return Err(ParseErrorKind::UnexpectedToken {
                expected: "string literal",
                found: "nothing".to_string(),
            });
        }
        let mut value = String::new();
        for segment in &segments {
            value.push_str(&unescape(segment)?);
        }
        Ok(Self { value, segments })
    }

    /// The decoded string
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Escaped literal segments
    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

/// A numeric literal kept exactly as written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Number {
    raw: String,
}

impl Number {
    /// Wrap literal text, rejecting anything that is not a number
    pub fn new(raw: impl Into<String>) -> Result<Self, ParseErrorKind> {
        let raw = raw.into();
        if is_valid_number(&raw) {
            Ok(Self { raw })
        } else {
            Err(ParseErrorKind::MalformedNumber(raw))
        }
    }

    /// Shortest text that reads back as the same `f32` (`1.0`, `0.01`, `1.0E-7`)
    pub fn from_f32(value: f32) -> Self {
        let raw = if value.is_nan() {
            "nan".to_string()
        } else if value == f32::INFINITY {
            "inf".to_string()
        } else if value == f32::NEG_INFINITY {
            "-inf".to_string()
        } else {
            let shortest = format!("{value:?}");
            match shortest.split_once('e') {
                Some((mantissa, exponent)) if mantissa.contains('.') => format!("{mantissa}E{exponent}"),
                Some((mantissa, exponent)) => format!("{mantissa}.0E{exponent}"),
                None => shortest,
            }
        };
        Self { raw }
    }

    /// Integer text
    pub fn from_u32(value: u32) -> Self {
        Self {
            raw: value.to_string(),
        }
    }

    /// Integer text
    pub fn from_i64(value: i64) -> Self {
        Self {
            raw: value.to_string(),
        }
    }

    /// The literal text
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Value as `f64`
    pub fn as_f64(&self) -> Option<f64> {
        parse_float(&self.raw)
    }

    /// Value as `f32`
    pub fn as_f32(&self) -> Option<f32> {
        parse_float(&self.raw)
    }

    /// Value as a signed integer, if written as one
    pub fn as_i64(&self) -> Option<i64> {
        parse_int(&self.raw)
    }

    /// Value as an unsigned 32-bit integer, if written as one and in range
    pub fn as_u32(&self) -> Option<u32> {
        self.as_i64().and_then(|v| u32::try_from(v).ok())
    }
}

fn split_sign(raw: &str) -> (bool, &str) {
    match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    }
}

fn parse_int(raw: &str) -> Option<i64> {
    let (negative, digits) = split_sign(raw);
    let magnitude = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => i64::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<i64>().ok()?,
    };
    Some(if negative { -magnitude } else { magnitude })
}

/// Parse straight into the target width so `f32` values are rounded once
fn parse_float<T>(raw: &str) -> Option<T>
where
    T: FromStr + Neg<Output = T>,
{
    let (negative, body) = split_sign(raw);
    let lower = body.to_ascii_lowercase();
    let magnitude: T = if let Some(hex) = lower.strip_prefix("0x") {
        i64::from_str_radix(hex, 16).ok()?.to_string().parse().ok()?
    } else {
        let digits = match lower.as_str() {
            "inf" | "infinity" | "nan" => lower.as_str(),
            other => {
                let digits = other.strip_suffix('f').unwrap_or(other);
                if !digits.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
                    return None;
                }
                digits
            }
        };
        digits.parse().ok()?
    };
    Some(if negative { -magnitude } else { magnitude })
}

pub(crate) fn is_valid_number(raw: &str) -> bool {
    parse_float::<f64>(raw).is_some()
}

/// Escape text for use between double quotes
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '"' => out.push_str("\\\""),
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                out.push_str(&format!("\\{:03o}", c as u32));
            }
            c if c.is_ascii() => out.push(c),
            c => {
                let mut buf = [0u8; 4];
                for byte in c.encode_utf8(&mut buf).bytes() {
                    out.push_str(&format!("\\{byte:03o}"));
                }
            }
        }
    }
    out
}

/// Decode the contents of a string literal
pub fn unescape(raw: &str) -> Result<String, ParseErrorKind> {
    let mut bytes = Vec::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0u8; 4];
            bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }

        let Some(esc) = chars.next() else {
            return Err(ParseErrorKind::InvalidEscape("\\".to_string()));
        };
        match esc {
            'n' => bytes.push(b'\n'),
            'r' => bytes.push(b'\r'),
            't' => bytes.push(b'\t'),
            'a' => bytes.push(0x07),
            'b' => bytes.push(0x08),
            'f' => bytes.push(0x0c),
            'v' => bytes.push(0x0b),
            '"' | '\'' | '\\' | '?' => bytes.push(esc as u8),
            '0'..='7' => {
                let mut value = esc.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|c| c.to_digit(8)) {
                        Some(digit) => {
                            value = value * 8 + digit;
                            chars.next();
                        }
                        None => break,
                    }
                }
                let byte = u8::try_from(value)
                    .map_err(|_| ParseErrorKind::InvalidEscape(format!("\\{value:o}")))?;
                bytes.push(byte);
            }
            'x' | 'X' => {
                let mut value = 0u32;
                let mut digits = 0;
                while digits < 2 {
                    match chars.peek().and_then(|c| c.to_digit(16)) {
                        Some(digit) => {
                            value = value * 16 + digit;
                            digits += 1;
                            chars.next();
                        }
                        None => break,
                    }
                }
                if digits == 0 {
                    return Err(ParseErrorKind::InvalidEscape(format!("\\{esc}")));
                }
                bytes.push(value as u8);
            }
            other => return Err(ParseErrorKind::InvalidEscape(format!("\\{other}"))),
        }
    }
    String::from_utf8(bytes).map_err(|_| ParseErrorKind::InvalidUtf8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    const FIXTURES: [&str; 5] = [
        include_str!("../fixtures/gameobjects/editor_camera.go"),
        include_str!("../fixtures/gameobjects/editor_camera_3D.go"),
        include_str!("../fixtures/gameobjects/node2D.go"),
        include_str!("../fixtures/gameobjects/node3D.go"),
        include_str!("../fixtures/gameobjects/node_legacy.go"),
    ];

    #[test]
    fn test_fixtures_round_trip_byte_for_byte() {
        for text in FIXTURES {
            let doc = parse(text).unwrap();
            assert_eq!(doc.to_text(), text);
        }
    }

    #[test]
    fn test_data_payload_interior_is_preserved() {
        let doc = parse(FIXTURES[3]).unwrap();
        let embedded = doc
            .get("embedded_components")
            .and_then(FieldValue::as_block)
            .unwrap();
        let data = embedded.get("data").and_then(FieldValue::as_text).unwrap();
        assert_eq!(data.segments()[8], r#"text: \"Label\"\n"#);
        assert!(data.value().contains("text: \"Label\"\n"));
        assert_eq!(data.segments().last().map(String::as_str), Some(""));
    }

    #[test]
    fn test_non_canonical_layout_is_normalised() {
        let text = "components { id: \"a\"  component: \"/s/a.script\" }  # trailing\n";
        let canonical = parse(text).unwrap().to_text();
        assert_eq!(
            canonical,
            "components {\n  id: \"a\"\n  component: \"/s/a.script\"\n}\n"
        );
        assert_eq!(parse(&canonical).unwrap().to_text(), canonical);
    }

    #[test]
    fn test_text_string_splits_after_newlines() {
        let text = TextString::new("fov: 0.7854\nnear_z: 0.1\n");
        assert_eq!(text.segments(), ["fov: 0.7854\\n", "near_z: 0.1\\n", ""]);

        let single = TextString::new("Label");
        assert_eq!(single.segments(), ["Label"]);

        let unterminated = TextString::new("a\nb");
        assert_eq!(unterminated.segments(), ["a\\n", "b"]);
    }

    #[test]
    fn test_escape_and_unescape() {
        assert_eq!(escape("say \"hi\"\n"), "say \\\"hi\\\"\\n");
        assert_eq!(escape("it's"), "it\\'s");
        assert_eq!(escape("\u{1}"), "\\001");
        assert_eq!(escape("é"), "\\303\\251");
        assert_eq!(unescape(&escape("naïve €")).unwrap(), "naïve €");
        assert_eq!(unescape("\\101\\x42\\t").unwrap(), "AB\t");
        assert_eq!(unescape("\\303\\251").unwrap(), "é");
        assert_eq!(unescape("\\377"), Err(ParseErrorKind::InvalidUtf8));
        assert_eq!(
            unescape("\\z"),
            Err(ParseErrorKind::InvalidEscape("\\z".to_string()))
        );
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(Number::from_f32(1.0).raw(), "1.0");
        assert_eq!(Number::from_f32(0.01).raw(), "0.01");
        assert_eq!(Number::from_f32(-0.179681).raw(), "-0.179681");
        assert_eq!(Number::from_f32(0.70710677).raw(), "0.70710677");
        assert_eq!(Number::from_u32(1).raw(), "1");
        assert_eq!(Number::from_f32(f32::NEG_INFINITY).raw(), "-inf");
        assert_eq!(Number::from_f32(1e-7).raw(), "1.0E-7");
        assert_eq!(Number::from_f32(-2.5e-9).raw(), "-2.5E-9");
        assert_eq!(Number::from_f32(1e20).raw(), "1.0E20");
        assert_eq!(Number::new("1.0E-7").unwrap().as_f32(), Some(1e-7));
    }

    #[test]
    fn test_number_parsing() {
        let n = Number::new("10.0").unwrap();
        assert_eq!(n.as_f32(), Some(10.0));
        assert_eq!(n.as_u32(), None);
        assert_eq!(Number::new("1").unwrap().as_u32(), Some(1));
        assert_eq!(Number::new("-1").unwrap().as_u32(), None);
        assert_eq!(Number::new("0x10").unwrap().as_i64(), Some(16));
        assert_eq!(Number::new("2.5f").unwrap().as_f32(), Some(2.5));
        assert_eq!(Number::new("1e3").unwrap().as_f64(), Some(1000.0));
        assert!(Number::new("1.2.3").is_err());
        assert!(Number::new("-").is_err());
    }

    #[test]
    fn test_set_and_remove() {
        let mut doc = Document::new();
        doc.push("x", FieldValue::float(1.0));
        doc.push("y", FieldValue::float(2.0));
        doc.set("x", FieldValue::float(3.0));
        doc.set("z", FieldValue::float(4.0));
        assert_eq!(doc.to_text(), "x: 3.0\ny: 2.0\nz: 4.0\n");
        assert_eq!(doc.remove("y"), 1);
        assert_eq!(doc.len(), 2);
    }
}
