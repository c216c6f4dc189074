//! A JSON-with-comments parser that keeps source spans.
//!
//! Add-on files are JSON with `//` and `/* */` comments and the occasional
//! trailing comma. Extraction needs both the values and the byte span of every
//! key and value, so [`parse_tree`] builds a [`Node`] tree instead of a plain
//! value. [`location_at_offset`] is the tolerant counterpart used while a file
//! is being edited: it never fails and only reports the structural path to the
//! cursor.

use std::ops::Range;

use crate::error::{Error, Result};

/// One step of a structural path: an object key or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Key(String),
    Index(usize),
}

impl Segment {
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Segment::Key(key) => Some(key),
            Segment::Index(_) => None,
        }
    }
}

impl From<&str> for Segment {
    fn from(key: &str) -> Self {
        Segment::Key(key.to_string())
    }
}

impl From<usize> for Segment {
    fn from(index: usize) -> Self {
        Segment::Index(index)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Object(Vec<Property>),
    Array(Vec<Node>),
    String(String),
    /// Numbers keep their source text; nothing here does arithmetic on them.
    Number(String),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub value: Value,
    /// Byte span in the source, delimiters included.
    pub span: Range<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub key: String,
    /// Byte span of the key, quotes included.
    pub key_span: Range<usize>,
    pub value: Node,
}

impl Property {
    /// Span of the key text without its quotes.
    pub fn key_inner_span(&self) -> Range<usize> {
        inner(&self.key_span)
    }
}

fn inner(span: &Range<usize>) -> Range<usize> {
    if span.end - span.start >= 2 {
        span.start + 1..span.end - 1
    } else {
        span.clone()
    }
}

impl Node {
    pub fn properties(&self) -> &[Property] {
        match &self.value {
            Value::Object(properties) => properties,
            _ => &[],
        }
    }

    pub fn items(&self) -> &[Node] {
        match &self.value {
            Value::Array(items) => items,
            _ => &[],
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            Value::String(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self.value, Value::Object(_))
    }

    /// Keys of an object in source order; empty for anything else.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.properties().iter().map(|property| property.key.as_str())
    }

    /// The property named `key`. Duplicate keys resolve to the last one, as a JSON value would.
    pub fn property(&self, key: &str) -> Option<&Property> {
        self.properties()
            .iter()
            .rev()
            .find(|property| property.key == key)
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.property(key).map(|property| &property.value)
    }

    fn step(&self, segment: &Segment) -> Option<&Node> {
        match segment {
            Segment::Key(key) => self.get(key),
            Segment::Index(index) => self.items().get(*index),
        }
    }

    /// The value node at the end of `path`.
    pub fn find_at_path(&self, path: &[Segment]) -> Option<&Node> {
        path.iter().try_fold(self, |node, segment| node.step(segment))
    }

    /// The property whose key is the last (key) segment of `path`.
    pub fn find_property_at_path(&self, path: &[Segment]) -> Option<&Property> {
        let (last, parents) = path.split_last()?;
        self.find_at_path(parents)?.property(last.as_key()?)
    }

    /// Span of the node without string quotes or surrounding braces.
    pub fn inner_span(&self) -> Range<usize> {
        match self.value {
            Value::String(_) | Value::Object(_) | Value::Array(_) => inner(&self.span),
            _ => self.span.clone(),
        }
    }
}

const MAX_DEPTH: usize = 256;

/// Parses `text` into a span-carrying tree.
pub fn parse_tree(text: &str) -> Result<Node> {
    let mut parser = Parser {
        bytes: text.as_bytes(),
        text,
        pos: 0,
        depth: 0,
    };

    parser.skip_trivia()?;
    let node = parser.value()?;
    parser.skip_trivia()?;

    if parser.pos < parser.bytes.len() {
        return Err(Error::parse(parser.pos, "trailing characters after value"));
    }

    Ok(node)
}

struct Parser<'a> {
    bytes: &'a [u8],
    text: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_trivia(&mut self) -> Result<()> {
        while let Some(byte) = self.peek() {
            match byte {
                b' ' | b'\t' | b'\n' | b'\r' => self.pos += 1,
                b'/' => match self.bytes.get(self.pos + 1) {
                    Some(b'/') => {
                        while self.peek().is_some_and(|b| b != b'\n') {
                            self.pos += 1;
                        }
                    }
                    Some(b'*') => {
                        let start = self.pos;
                        self.pos += 2;
                        loop {
                            match self.peek() {
                                None => return Err(Error::parse(start, "unterminated comment")),
                                Some(b'*') if self.bytes.get(self.pos + 1) == Some(&b'/') => {
                                    self.pos += 2;
                                    break;
                                }
                                Some(_) => self.pos += 1,
                            }
                        }
                    }
                    _ => return Err(Error::parse(self.pos, "unexpected '/'")),
                },
                // byte order mark
                0xEF if self.bytes[self.pos..].starts_with(&[0xEF, 0xBB, 0xBF]) => {
                    self.pos += 3
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn expect(&mut self, byte: u8) -> Result<()> {
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(Error::parse(
                self.pos,
                format!("expected '{}'", byte as char),
            ))
        }
    }

    fn value(&mut self) -> Result<Node> {
        let start = self.pos;
        let value = match self.peek() {
            Some(b'{') => self.object()?,
            Some(b'[') => self.array()?,
            Some(b'"') => Value::String(self.string()?),
            Some(b'-' | b'0'..=b'9') => self.number(),
            Some(b't') => self.literal("true", Value::Bool(true))?,
            Some(b'f') => self.literal("false", Value::Bool(false))?,
            Some(b'n') => self.literal("null", Value::Null)?,
            Some(_) => return Err(Error::parse(self.pos, "unexpected character")),
            None => return Err(Error::parse(self.pos, "unexpected end of input")),
        };

        Ok(Node {
            value,
            span: start..self.pos,
        })
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(Error::parse(self.pos, "nesting too deep"));
        }
        Ok(())
    }

    fn object(&mut self) -> Result<Value> {
        self.enter()?;
        self.expect(b'{')?;
        let mut properties = Vec::new();

        loop {
            self.skip_trivia()?;
            match self.peek() {
                Some(b'}') => {
                    self.pos += 1;
                    break;
                }
                Some(b'"') => {
                    let key_start = self.pos;
                    let key = self.string()?;
                    let key_span = key_start..self.pos;

                    self.skip_trivia()?;
                    self.expect(b':')?;
                    self.skip_trivia()?;
                    let value = self.value()?;
                    properties.push(Property {
                        key,
                        key_span,
                        value,
                    });

                    self.skip_trivia()?;
                    match self.peek() {
                        Some(b',') => self.pos += 1,
                        Some(b'}') => {}
                        _ => return Err(Error::parse(self.pos, "expected ',' or '}'")),
                    }
                }
                _ => return Err(Error::parse(self.pos, "expected property key")),
            }
        }

        self.depth -= 1;
        Ok(Value::Object(properties))
    }

    fn array(&mut self) -> Result<Value> {
        self.enter()?;
        self.expect(b'[')?;
        let mut items = Vec::new();

        loop {
            self.skip_trivia()?;
            if self.peek() == Some(b']') {
                self.pos += 1;
                break;
            }

            items.push(self.value()?);

            self.skip_trivia()?;
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b']') => {}
                _ => return Err(Error::parse(self.pos, "expected ',' or ']'")),
            }
        }

        self.depth -= 1;
        Ok(Value::Array(items))
    }

    fn string(&mut self) -> Result<String> {
        let start = self.pos;
        self.expect(b'"')?;
        let mut out = String::new();
        let mut chunk_start = self.pos;

        loop {
            match self.peek() {
                None | Some(b'\n') => return Err(Error::parse(start, "unterminated string")),
                Some(b'"') => {
                    out.push_str(&self.text[chunk_start..self.pos]);
                    self.pos += 1;
                    return Ok(out);
                }
                Some(b'\\') => {
                    out.push_str(&self.text[chunk_start..self.pos]);
                    self.pos += 1;
                    let escaped = self
                        .peek()
                        .ok_or_else(|| Error::parse(self.pos, "unterminated escape"))?;
                    self.pos += 1;
                    match escaped {
                        b'"' => out.push('"'),
                        b'\\' => out.push('\\'),
                        b'/' => out.push('/'),
                        b'b' => out.push('\u{8}'),
                        b'f' => out.push('\u{c}'),
                        b'n' => out.push('\n'),
                        b'r' => out.push('\r'),
                        b't' => out.push('\t'),
                        b'u' => out.push(self.unicode_escape()?),
                        _ => return Err(Error::parse(self.pos - 1, "invalid escape")),
                    }
                    chunk_start = self.pos;
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    fn hex4(&mut self) -> Result<u32> {
        let digits = self
            .text
            .get(self.pos..self.pos + 4)
            .ok_or_else(|| Error::parse(self.pos, "truncated unicode escape"))?;
        let code = u32::from_str_radix(digits, 16)
            .map_err(|_| Error::parse(self.pos, "invalid unicode escape"))?;
        self.pos += 4;
        Ok(code)
    }

    fn unicode_escape(&mut self) -> Result<char> {
        let high = self.hex4()?;
        let code = if (0xD800..0xDC00).contains(&high)
            && self.bytes[self.pos..].starts_with(b"\\u")
        {
            self.pos += 2;
            let low = self.hex4()?;
            0x10000 + ((high - 0xD800) << 10) + (low.wrapping_sub(0xDC00) & 0x3FF)
        } else {
            high
        };

        Ok(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER))
    }

    fn number(&mut self) -> Value {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|b| b.is_ascii_digit() || matches!(b, b'-' | b'+' | b'.' | b'e' | b'E'))
        {
            self.pos += 1;
        }
        Value::Number(self.text[start..self.pos].to_string())
    }

    fn literal(&mut self, word: &str, value: Value) -> Result<Value> {
        if self.bytes[self.pos..].starts_with(word.as_bytes()) {
            self.pos += word.len();
            Ok(value)
        } else {
            Err(Error::parse(self.pos, format!("expected '{word}'")))
        }
    }
}

#[derive(Debug)]
enum Frame {
    Object {
        key: Option<String>,
        expecting_key: bool,
    },
    Array {
        index: usize,
    },
}

/// Structural path to `offset`, ending in the key whose key or value holds the cursor.
///
/// Scans `text` up to `offset` keeping an explicit frame stack, so malformed
/// or half-typed documents still produce a usable path.
pub fn location_at_offset(text: &str, offset: usize) -> Vec<Segment> {
    let bytes = text.as_bytes();
    let offset = offset.min(bytes.len());
    let mut stack: Vec<Frame> = Vec::new();
    let mut pos = 0;

    while pos < offset || (pos == offset && bytes.get(pos) == Some(&b'"')) {
        match bytes[pos] {
            b'"' => {
                let end = string_end(bytes, pos + 1);
                let content = &text[pos + 1..end.min(bytes.len())];
                if let Some(Frame::Object { key, expecting_key }) = stack.last_mut() {
                    if *expecting_key {
                        *key = Some(content.to_string());
                        *expecting_key = false;
                    }
                }
                if end >= offset {
                    break;
                }
                pos = end + 1;
                continue;
            }
            b'/' if bytes.get(pos + 1) == Some(&b'/') => {
                while pos < offset && bytes[pos] != b'\n' {
                    pos += 1;
                }
                continue;
            }
            b'/' if bytes.get(pos + 1) == Some(&b'*') => {
                pos += 2;
                while pos < offset && !(bytes[pos] == b'*' && bytes.get(pos + 1) == Some(&b'/')) {
                    pos += 1;
                }
                pos += 2;
                continue;
            }
            b'{' => stack.push(Frame::Object {
                key: None,
                expecting_key: true,
            }),
            b'[' => stack.push(Frame::Array { index: 0 }),
            b'}' | b']' => {
                stack.pop();
            }
            b',' => match stack.last_mut() {
                Some(Frame::Object { key, expecting_key }) => {
                    *key = None;
                    *expecting_key = true;
                }
                Some(Frame::Array { index }) => *index += 1,
                None => {}
            },
            b':' => {
                if let Some(Frame::Object { expecting_key, .. }) = stack.last_mut() {
                    *expecting_key = false;
                }
            }
            _ => {}
        }
        pos += 1;
    }

    stack
        .into_iter()
        .filter_map(|frame| match frame {
            Frame::Object { key, .. } => key.map(Segment::Key),
            Frame::Array { index } => Some(Segment::Index(index)),
        })
        .collect()
}

/// Index of the closing quote of a string whose content starts at `pos`,
/// or the end of input when it is unterminated.
fn string_end(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => pos += 2,
            b'"' | b'\n' => return pos,
            _ => pos += 1,
        }
    }
    bytes.len()
}
