//! Line index over an immutable text blob.
//!
//! [`TextBuffer`] splits its contents on `\n` once, at construction, and afterwards answers
//! "what is line L" and "what is column range [c0, c1) of line L" without scanning the buffer.
//!
//! Conventions:
//!
//! - Lines split on `\n` only; the `\n` belongs to no line, a `\r` before it stays in the line.
//! - A trailing `\n` opens a final empty line, so `"a\n"` has the lines `"a"` and `""`, and the
//!   empty string has one empty line. `line_count == count('\n') + 1` for every input.
//! - `line_starts` are byte offsets into the contents. Every column-facing length (line length,
//!   `max_line_length`, column ranges) is in UTF-16 code units, matching sourcemap columns.

use std::ops::Range;

use crate::{CHUNK_WIDTH, IndexError, utf16::LineColumns};

/// An immutable, fully line-indexed text.
#[derive(Debug, Clone)]
pub struct TextBuffer {
    contents: String,
    line_starts: Vec<usize>,
    columns: Vec<LineColumns>,
    max_line_length: usize,
}

impl TextBuffer {
    /// Index `contents`. Never fails.
    #[tracing::instrument(level = "debug", skip_all, fields(len = contents.len()))]
    pub fn new(contents: String) -> Self {
        let mut line_starts = Vec::new();
        let mut columns = Vec::new();
        let mut max_line_length = 0;

        let mut offset = 0;
        loop {
            line_starts.push(offset);
            let newline = contents[offset..].find('\n').map(|rel| offset + rel);
            let line = &contents[offset..newline.unwrap_or(contents.len())];

            let line_columns = LineColumns::new(line);
            max_line_length = max_line_length.max(line_columns.utf16_len(line));
            columns.push(line_columns);

            match newline {
                Some(at) => offset = at + 1,
                None => break,
            }
        }

        tracing::debug!(
            line_count = line_starts.len(),
            max_line_length,
            "text buffer indexed"
        );

        Self {
            contents,
            line_starts,
            columns,
            max_line_length,
        }
    }

    /// The complete text.
    pub fn contents(&self) -> &str {
        &self.contents
    }

    /// Byte offset where each line starts. Strictly increasing, first entry is `0`.
    pub fn line_starts(&self) -> &[usize] {
        &self.line_starts
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Length of the longest line, in UTF-16 code units.
    pub fn max_line_length(&self) -> usize {
        self.max_line_length
    }

    /// Number of [`CHUNK_WIDTH`]-wide column chunks needed to show the longest line.
    pub fn chunk_count(&self) -> usize {
        self.max_line_length.div_ceil(CHUNK_WIDTH as usize)
    }

    /// Text of line `index`, without its `\n`.
    pub fn line(&self, index: usize) -> Result<&str, IndexError> {
        let start = *self
            .line_starts
            .get(index)
            .ok_or(IndexError::LineOutOfRange {
                index,
                line_count: self.line_count(),
            })?;
        let end = match self.line_starts.get(index + 1) {
            Some(&next) => next - 1, // exclude '\n'
            None => self.contents.len(),
        };
        Ok(&self.contents[start..end])
    }

    /// Length of line `index`, in UTF-16 code units.
    pub fn line_len(&self, index: usize) -> Result<usize, IndexError> {
        let line = self.line(index)?;
        Ok(self.columns[index].utf16_len(line))
    }

    /// The part of line `index` covered by the UTF-16 column range `columns`.
    ///
    /// The range is clamped to the line: columns past the end yield the available prefix (or
    /// an empty string), and a column inside a surrogate pair clamps to the start of that code
    /// point.
    pub fn slice(&self, index: usize, columns: Range<usize>) -> Result<&str, IndexError> {
        let line = self.line(index)?;
        let layout = &self.columns[index];
        let start = layout.col_to_byte(line, columns.start);
        let end = layout.col_to_byte(line, columns.end.max(columns.start));
        Ok(&line[start..end])
    }
}

impl From<String> for TextBuffer {
    fn from(contents: String) -> Self {
        Self::new(contents)
    }
}

impl From<&str> for TextBuffer {
    fn from(contents: &str) -> Self {
        Self::new(contents.to_owned())
    }
}
