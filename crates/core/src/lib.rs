//! Random-access indices for viewing generated code next to its sourcemap.
//!
//! This crate turns two blobs of text, a generated (bundled/minified) file and its sourcemap,
//! into indices a renderer can poll per visible cell without rescanning either document.
//!
//! Entry points:
//!
//! - [`text`] contains [`TextBuffer`], the line index over generated (or original) text.
//! - [`source_map`] contains [`SourceMapBuffer`], the per-line, per-chunk mapping index, and
//!   its asynchronous builder.
//! - [`view`] is the read-only facade combining both for a grid renderer.
//! - [`sources`] loads original sources, from the map's embedded contents or from disk.
//!
//! Internals:
//!
//! - [`decode`] wraps the `sourcemap` crate as the mapping decoder.
//! - [`utf16`] provides UTF-16 column slicing for non-ASCII lines.

pub mod decode;
pub mod source_map;
pub mod sources;
pub mod text;
pub mod utf16;
pub mod view;

pub use decode::{MappingDecoder, MappingRecord, SourceMapDecoder};
pub use source_map::{LineChunk, LineChunks, PendingSourceMapBuffer, SourceMapBuffer};
pub use text::TextBuffer;

/// Width of a column chunk, in generated columns (UTF-16 code units).
///
/// Both the mapping index and a renderer's column layout use this granularity: grid column `k`
/// shows generated columns `[k * CHUNK_WIDTH, (k + 1) * CHUNK_WIDTH)`.
pub const CHUNK_WIDTH: u32 = 128;

/// Errors that can occur while building or querying the indices.
#[derive(thiserror::Error, Debug)]
pub enum IndexError {
    #[error("line {index} out of range (line count {line_count})")]
    LineOutOfRange { index: usize, line_count: usize },

    #[error("invalid sourcemap: {0}")]
    SourceMap(#[from] sourcemap::Error),

    #[error("unsupported sourcemap: {0}")]
    UnsupportedSourceMap(&'static str),

    #[error("sourcemap index build was abandoned before completing")]
    BuildAbandoned,

    #[error("failed to read original source: {0}")]
    Io(#[from] std::io::Error),
}
