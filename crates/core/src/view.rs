//! Read-only facade for a grid renderer.
//!
//! A renderer lays generated text out as a grid: one row per line, one column per
//! [`CHUNK_WIDTH`]-wide chunk. For every visible cell it asks for the cell's [`Span`]s, each a
//! column range of the line tagged with what the mapping index knows about it. Nothing is
//! stored here; spans are derived from [`TextBuffer`] and [`SourceMapBuffer`] on each call.

use std::ops::Range;

use crate::{
    CHUNK_WIDTH, IndexError, decode::MappingRecord, source_map::SourceMapBuffer, text::TextBuffer,
};

/// A column range of one line and its classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span<'a> {
    /// UTF-16 column range within the line.
    pub columns: Range<usize>,
    /// The line text in `columns`, clamped to the line's end.
    pub text: &'a str,
    pub kind: SpanKind<'a>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind<'a> {
    /// Columns between the chunk start and its first record.
    ///
    /// A chunk's first record may start past the chunk boundary; the text here belongs to
    /// whatever record precedes it, which may live in an earlier (or absent) chunk.
    Filler,
    /// Covered by a record with an original position.
    Mapped(&'a MappingRecord),
    /// Covered by a record that declares no original source.
    Unmapped(&'a MappingRecord),
    /// The chunk holds no record; nothing is known about these columns.
    Unknown,
    /// Text of a buffer shown without a map.
    Source,
    /// The highlighted part of a buffer shown without a map.
    Focused,
}

impl<'a> SpanKind<'a> {
    /// The record behind this span, if any.
    pub fn mapping(&self) -> Option<&'a MappingRecord> {
        match *self {
            Self::Mapped(record) | Self::Unmapped(record) => Some(record),
            _ => None,
        }
    }
}

/// Columns of chunk `chunk_index`.
fn chunk_columns(chunk_index: usize) -> Range<usize> {
    let width = CHUNK_WIDTH as usize;
    let start = chunk_index.saturating_mul(width);
    start..start.saturating_add(width)
}

/// Generated text with its mapping index.
#[derive(Debug, Clone, Copy)]
pub struct GeneratedView<'a> {
    pub text: &'a TextBuffer,
    pub map: &'a SourceMapBuffer,
}

impl<'a> GeneratedView<'a> {
    pub fn new(text: &'a TextBuffer, map: &'a SourceMapBuffer) -> Self {
        Self { text, map }
    }

    /// Grid rows.
    pub fn line_count(&self) -> usize {
        self.text.line_count()
    }

    /// Grid columns.
    pub fn column_count(&self) -> usize {
        self.map.max_chunk_count()
    }

    /// Spans of the cell at (`line`, `chunk_index`).
    ///
    /// A mapping span runs to the next record of its chunk; the last one runs to the first
    /// record of the adjacent chunk if that chunk exists (possibly past this chunk's end),
    /// else to the chunk end.
    pub fn chunk(&self, line: usize, chunk_index: usize) -> Result<Vec<Span<'a>>, IndexError> {
        let cell = chunk_columns(chunk_index);
        let chunks = self.map.chunked_mappings_for_line(line);

        let Some(chunk) = chunks.get(chunk_index) else {
            return Ok(vec![Span {
                text: self.text.slice(line, cell.clone())?,
                columns: cell,
                kind: SpanKind::Unknown,
            }]);
        };

        let chunk_start = chunk.start_column as usize;
        let next = chunk_index.checked_add(1).and_then(|i| chunks.get(i));
        let chunk_end = next.map_or(chunk_start + CHUNK_WIDTH as usize, |n| {
            n.start_column as usize
        });
        let tail_end = next
            .and_then(|n| n.mappings.first())
            .map_or(chunk_end, |m| m.generated_column as usize);

        let mut spans = Vec::with_capacity(chunk.mappings.len() + 1);

        if let Some(first) = chunk.mappings.first() {
            let first_column = first.generated_column as usize;
            if first_column > chunk_start {
                spans.push(Span {
                    text: self.text.slice(line, chunk_start..first_column)?,
                    columns: chunk_start..first_column,
                    kind: SpanKind::Filler,
                });
            }
        }

        for (i, record) in chunk.mappings.iter().enumerate() {
            let start = record.generated_column as usize;
            let end = chunk
                .mappings
                .get(i + 1)
                .map_or(tail_end, |m| m.generated_column as usize);
            let kind = if record.is_mapped() {
                SpanKind::Mapped(record)
            } else {
                SpanKind::Unmapped(record)
            };
            spans.push(Span {
                text: self.text.slice(line, start..end)?,
                columns: start..end,
                kind,
            });
        }

        Ok(spans)
    }

    /// The record covering generated `column` of `line`, if the index knows one.
    ///
    /// Only the column's own chunk is searched; columns before that chunk's first record, or
    /// in an absent chunk, yield `None`.
    pub fn mapping_at(&self, line: usize, column: usize) -> Option<&'a MappingRecord> {
        let chunk_index = column / CHUNK_WIDTH as usize;
        let chunk = self.map.chunked_mappings_for_line(line).get(chunk_index)?;
        let after = chunk
            .mappings
            .partition_point(|m| m.generated_column as usize <= column);
        after.checked_sub(1).map(|i| &chunk.mappings[i])
    }
}

/// A range of an original source to highlight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Focus {
    /// 0-based line.
    pub line: usize,
    /// UTF-16 column.
    pub column: usize,
    /// Width in UTF-16 code units.
    pub width: usize,
}

impl MappingRecord {
    /// Where this record points in its original source.
    ///
    /// The width is the identifier's length when the record carries a name, else one column.
    pub fn focus(&self) -> Option<Focus> {
        self.source.as_ref()?;
        let line = self.original_line?.checked_sub(1)?;
        let column = self.original_column?;
        let width = self
            .name
            .as_deref()
            .map_or(1, |name| name.encode_utf16().count());
        Some(Focus {
            line: line as usize,
            column: column as usize,
            width,
        })
    }
}

/// A text shown without a map, e.g. an original source, with an optional highlight.
#[derive(Debug, Clone, Copy)]
pub struct OriginalView<'a> {
    pub text: &'a TextBuffer,
    pub focus: Option<Focus>,
}

impl<'a> OriginalView<'a> {
    pub fn new(text: &'a TextBuffer, focus: Option<Focus>) -> Self {
        Self { text, focus }
    }

    /// Grid columns.
    pub fn column_count(&self) -> usize {
        self.text.chunk_count()
    }

    /// Grid cell holding the focus, as `(line, chunk_index)`.
    pub fn focus_cell(&self) -> Option<(usize, usize)> {
        let focus = self.focus?;
        Some((focus.line, focus.column / CHUNK_WIDTH as usize))
    }

    /// Spans of the cell at (`line`, `chunk_index`).
    pub fn chunk(&self, line: usize, chunk_index: usize) -> Result<Vec<Span<'a>>, IndexError> {
        let cell = chunk_columns(chunk_index);

        let focused = self
            .focus
            .filter(|f| f.line == line)
            .map(|f| f.column..f.column + f.width)
            .filter(|f| f.start < cell.end && f.end > cell.start);
        let Some(focused) = focused else {
            return Ok(vec![Span {
                text: self.text.slice(line, cell.clone())?,
                columns: cell,
                kind: SpanKind::Source,
            }]);
        };

        let focused = focused.start.max(cell.start)..focused.end.min(cell.end);
        let mut spans = Vec::with_capacity(3);
        for (columns, kind) in [
            (cell.start..focused.start, SpanKind::Source),
            (focused.clone(), SpanKind::Focused),
            (focused.end..cell.end, SpanKind::Source),
        ] {
            if columns.is_empty() {
                continue;
            }
            spans.push(Span {
                text: self.text.slice(line, columns.clone())?,
                columns,
                kind,
            });
        }
        Ok(spans)
    }
}
