//! Text buffer abstraction over [`ropey::Rope`].
//!
//! Every range handed out by this crate is a [`DocRange`]: a `tower_lsp`
//! range whose line/character pair counts chars, converted from byte offsets
//! through the rope.

use std::ops::{Deref, Range};
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use ropey::Rope;
use tower_lsp::lsp_types::Position;

/// A wrapper around `tower_lsp::lsp_types::Range` with rope-aware constructors.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub struct DocRange(pub tower_lsp::lsp_types::Range);

impl DocRange {
    /// Creates a `DocRange` from a byte offset range using the rope for position calculation.
    pub fn from_range(rope: &Rope, range: Range<usize>) -> DocRange {
        let start = byte_to_position(rope, range.start);
        let end = byte_to_position(rope, range.end);

        tower_lsp::lsp_types::Range { start, end }.into()
    }

    /// A range covering `start..end` chars of a single line.
    pub fn on_line(line: u32, start: u32, end: u32) -> DocRange {
        tower_lsp::lsp_types::Range {
            start: Position {
                line,
                character: start,
            },
            end: Position {
                line,
                character: end,
            },
        }
        .into()
    }

    /// The empty range at the top of a document; used for targets without an anchor.
    pub fn document_start() -> DocRange {
        DocRange::on_line(0, 0, 0)
    }

    /// Same start, end moved back to `position` if the cursor sits inside the range.
    pub fn truncated_at(&self, position: Position) -> DocRange {
        let mut range = self.0;
        if range.end.line == position.line {
            range.end.character = range.end.character.min(position.character);
        }
        range.into()
    }
}

impl Deref for DocRange {
    type Target = tower_lsp::lsp_types::Range;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<tower_lsp::lsp_types::Range> for DocRange {
    fn from(range: tower_lsp::lsp_types::Range) -> Self {
        DocRange(range)
    }
}

/// Trait for types that have a range (position span in the document).
pub trait Rangeable {
    fn range(&self) -> &DocRange;

    fn includes_position(&self, position: Position) -> bool {
        let range = self.range();
        (range.start.line < position.line
            || (range.start.line == position.line && range.start.character <= position.character))
            && (range.end.line > position.line
                || (range.end.line == position.line && range.end.character >= position.character))
    }
}

impl Rangeable for DocRange {
    fn range(&self) -> &DocRange {
        self
    }
}

fn byte_to_position(rope: &Rope, byte: usize) -> Position {
    let char_idx = rope.byte_to_char(byte.min(rope.len_bytes()));
    let line = rope.char_to_line(char_idx);
    let character = char_idx - rope.line_to_char(line);

    Position {
        line: line as u32,
        character: character as u32,
    }
}

/// The word pattern editors use for JSON: a quoted string (quotes included)
/// or a run of anything but whitespace and structural characters.
static JSON_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""(?:[^"\\]|\\.)*"?|[^\s{}\[\],:"]+"#).unwrap());

/// An open (or freshly read) text document.
#[derive(Debug, Clone)]
pub struct TextDocument {
    path: PathBuf,
    rope: Rope,
}

impl TextDocument {
    pub fn new(path: impl Into<PathBuf>, text: &str) -> TextDocument {
        TextDocument {
            path: path.into(),
            rope: Rope::from_str(text),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rope(&self) -> &Rope {
        &self.rope
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|name| name.to_str())
    }

    pub fn has_extension(&self, extension: &str) -> bool {
        self.path.extension().and_then(|e| e.to_str()) == Some(extension)
    }

    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Text of one line without its line terminator.
    pub fn line(&self, line: usize) -> Option<String> {
        let slice = self.rope.get_line(line)?;
        let text = slice.to_string();
        Some(text.trim_end_matches(['\n', '\r']).to_string())
    }

    /// Byte offset of `position`, clamped to the document and to the end of its line.
    pub fn offset_at(&self, position: Position) -> usize {
        let last_line = self.rope.len_lines().saturating_sub(1);
        let line = (position.line as usize).min(last_line);
        let line_start = self.rope.line_to_char(line);
        let line_len = self
            .line(line)
            .map(|text| text.chars().count())
            .unwrap_or_default();
        let char_idx = line_start + (position.character as usize).min(line_len);

        self.rope.char_to_byte(char_idx)
    }

    pub fn position_at(&self, offset: usize) -> Position {
        byte_to_position(&self.rope, offset)
    }

    pub fn range_at(&self, bytes: Range<usize>) -> DocRange {
        DocRange::from_range(&self.rope, bytes)
    }

    pub fn text_in(&self, range: &DocRange) -> String {
        let start = self.offset_at(range.start);
        let end = self.offset_at(range.end).max(start);
        let start_char = self.rope.byte_to_char(start);
        let end_char = self.rope.byte_to_char(end);

        self.rope.slice(start_char..end_char).to_string()
    }

    /// Range of the JSON word under `position`, quotes included.
    pub fn word_range_at(&self, position: Position) -> Option<DocRange> {
        let line = self.line(position.line as usize)?;
        let column = position.character as usize;

        JSON_WORD.find_iter(&line).find_map(|word| {
            let start = line[..word.start()].chars().count();
            let end = start + word.as_str().chars().count();

            (start <= column && column <= end)
                .then(|| DocRange::on_line(position.line, start as u32, end as u32))
        })
    }
}
