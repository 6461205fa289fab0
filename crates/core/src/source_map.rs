//! Per-line, per-chunk index of sourcemap mappings.
//!
//! [`SourceMapBuffer`] buckets every [`MappingRecord`] first by generated line, then by a
//! [`CHUNK_WIDTH`]-wide column chunk within that line, in one pass over a [`MappingDecoder`].
//!
//! Construction has two phases:
//!
//! 1. decode the document (the `sourcemap` crate, see [`SourceMapDecoder`]),
//! 2. bucket the decoder's records ([`SourceMapBuffer::build`]).
//!
//! [`SourceMapBuffer::load`] runs both on a builder thread and hands back a
//! [`PendingSourceMapBuffer`]; the ready [`SourceMapBuffer`] only exists once the build
//! succeeded, so a half-built index can never be queried. Decode failures come out of the
//! pending handle.
//!
//! Backfill: when a line's first record starts after column 0, an unmapped record at column 0
//! is inserted ahead of it, so every line with any mapping has coverage from column 0 of its
//! first populated chunk. Later chunks get no such record: a chunk may start with a record past
//! its `start_column`, and chunks without records are absent. An absent chunk means "no
//! mapping information", not "unmapped".

use std::sync::Arc;

use tokio::sync::oneshot;

use crate::{
    CHUNK_WIDTH, IndexError,
    decode::{MappingDecoder, MappingRecord, SourceMapDecoder},
};

/// Mappings of one [`CHUNK_WIDTH`]-wide column slice of a generated line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineChunk {
    /// First generated column of the chunk; a multiple of [`CHUNK_WIDTH`].
    pub start_column: u32,
    /// Records ordered by `generated_column`, all within the chunk.
    pub mappings: Vec<MappingRecord>,
}

/// The sparse chunk sequence of one generated line.
///
/// Only populated chunks are stored, ordered by `start_column`, so memory follows the number of
/// records and not the highest column a map mentions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineChunks {
    chunks: Vec<LineChunk>,
}

static NO_CHUNKS: LineChunks = LineChunks { chunks: Vec::new() };

impl LineChunks {
    /// The chunk at `chunk_index`, if it holds any mapping.
    pub fn get(&self, chunk_index: usize) -> Option<&LineChunk> {
        let start_column = u32::try_from(chunk_index)
            .ok()?
            .checked_mul(CHUNK_WIDTH)?;
        let position = self
            .chunks
            .binary_search_by_key(&start_column, |c| c.start_column)
            .ok()?;
        Some(&self.chunks[position])
    }

    /// One past the highest populated chunk index of this line.
    pub fn len(&self) -> usize {
        self.chunks
            .last()
            .map_or(0, |c| (c.start_column / CHUNK_WIDTH) as usize + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Number of chunks that hold at least one record.
    pub fn populated(&self) -> usize {
        self.chunks.len()
    }

    /// The populated chunks, in column order.
    pub fn iter(&self) -> impl Iterator<Item = &LineChunk> {
        self.chunks.iter()
    }

    fn chunk_mut(&mut self, start_column: u32) -> &mut LineChunk {
        // Records arrive in column order, so the target is almost always the last chunk or a
        // new one after it.
        let position = match self.chunks.last().map(|c| c.start_column) {
            Some(last) if last == start_column => self.chunks.len() - 1,
            Some(last) if last > start_column => {
                match self
                    .chunks
                    .binary_search_by_key(&start_column, |c| c.start_column)
                {
                    Ok(found) => found,
                    Err(insert_at) => {
                        self.chunks.insert(insert_at, LineChunk::new(start_column));
                        insert_at
                    }
                }
            }
            _ => {
                self.chunks.push(LineChunk::new(start_column));
                self.chunks.len() - 1
            }
        };
        &mut self.chunks[position]
    }
}

impl LineChunk {
    fn new(start_column: u32) -> Self {
        Self {
            start_column,
            mappings: Vec::new(),
        }
    }
}

/// A fully built mapping index.
///
/// Immutable once built; holds the decoder only to answer [`source_content_for`].
///
/// [`source_content_for`]: SourceMapBuffer::source_content_for
pub struct SourceMapBuffer {
    decoder: Arc<dyn MappingDecoder>,
    lines: Vec<LineChunks>,
    max_chunk_count: usize,
    record_count: usize,
}

impl std::fmt::Debug for SourceMapBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceMapBuffer")
            .field("line_count", &self.lines.len())
            .field("max_chunk_count", &self.max_chunk_count)
            .field("record_count", &self.record_count)
            .finish_non_exhaustive()
    }
}

impl SourceMapBuffer {
    /// Start decoding and indexing `document` on a builder thread.
    ///
    /// Wait on the returned handle to obtain the index. Dropping the handle abandons the build;
    /// its result is discarded.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(document: impl Into<Vec<u8>>) -> PendingSourceMapBuffer {
        let document = document.into();
        let (tx, rx) = oneshot::channel();

        let spawned = std::thread::Builder::new()
            .name("sourcemap-index".into())
            .spawn(move || {
                let result = Self::decode(&document);
                if tx.send(result).is_err() {
                    tracing::debug!("sourcemap index build finished after its handle was dropped");
                }
            });
        if let Err(err) = spawned {
            // The sender went down with the closure; the handle reports `BuildAbandoned`.
            tracing::warn!(%err, "failed to spawn sourcemap index builder");
        }

        PendingSourceMapBuffer { rx }
    }

    /// Decode and index `document` on the current thread.
    pub fn decode(document: &[u8]) -> Result<Self, IndexError> {
        let decoder = SourceMapDecoder::decode(document)?;
        Ok(Self::build(Arc::new(decoder)))
    }

    /// Bucket every record of `decoder` into line chunks, in one pass.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn build(decoder: Arc<dyn MappingDecoder>) -> Self {
        let mut index = ChunkIndexBuilder::default();
        for record in decoder.mappings() {
            index.insert(record);
        }

        tracing::debug!(
            line_count = index.lines.len(),
            max_chunk_count = index.max_chunk_count,
            record_count = index.record_count,
            "sourcemap indexed"
        );

        Self {
            decoder,
            lines: index.lines,
            max_chunk_count: index.max_chunk_count,
            record_count: index.record_count,
        }
    }

    /// The sparse chunk sequence of generated line `index` (0-based).
    ///
    /// Lines past the last mapped line, like lines without any record, yield an empty
    /// sequence: no mapping information is available for them.
    pub fn chunked_mappings_for_line(&self, index: usize) -> &LineChunks {
        self.lines.get(index).unwrap_or(&NO_CHUNKS)
    }

    /// Every record of generated line `index`, in column order, backfill included.
    pub fn mappings_for_line(&self, index: usize) -> impl Iterator<Item = &MappingRecord> {
        self.chunked_mappings_for_line(index)
            .iter()
            .flat_map(|chunk| chunk.mappings.iter())
    }

    /// `1 + the highest chunk index` over the whole document; the grid's column count.
    pub fn max_chunk_count(&self) -> usize {
        self.max_chunk_count
    }

    /// Number of generated lines up to the last one mentioned by the map.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Number of indexed records, synthesized backfill records included.
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// The original text of `source` if the map embeds it.
    ///
    /// `None` is a normal outcome: callers then load the file by name elsewhere.
    pub fn source_content_for(&self, source: &str) -> Option<&str> {
        self.decoder.source_content_for(source)
    }
}

/// The running state of the single bucketing pass.
#[derive(Default)]
struct ChunkIndexBuilder {
    lines: Vec<LineChunks>,
    max_chunk_count: usize,
    record_count: usize,
}

impl ChunkIndexBuilder {
    /// Insert `record`, preceded by an unmapped column-0 record if it is the first record of a
    /// line and starts past column 0.
    fn insert(&mut self, record: MappingRecord) {
        let Some(line_index) = (record.generated_line as usize).checked_sub(1) else {
            tracing::warn!(?record, "dropping mapping with generated line 0");
            return;
        };
        if self.lines.len() <= line_index {
            self.lines.resize_with(line_index + 1, LineChunks::default);
        }

        if record.generated_column > 0 && self.lines[line_index].is_empty() {
            tracing::trace!(
                line = record.generated_line,
                column = record.generated_column,
                "backfilling unmapped start of line"
            );
            self.place(line_index, MappingRecord::unmapped(record.generated_line, 0));
        }
        self.place(line_index, record);
    }

    fn place(&mut self, line_index: usize, record: MappingRecord) {
        let chunk_index = (record.generated_column / CHUNK_WIDTH) as usize;
        self.lines[line_index]
            .chunk_mut(chunk_index as u32 * CHUNK_WIDTH)
            .mappings
            .push(record);
        self.max_chunk_count = self.max_chunk_count.max(chunk_index + 1);
        self.record_count += 1;
    }
}

/// A [`SourceMapBuffer`] whose build is still running.
///
/// This is the readiness signal: the index is only reachable through [`loaded`] or [`wait`],
/// which deliver either the finished index or the reason it could not be built.
///
/// [`loaded`]: PendingSourceMapBuffer::loaded
/// [`wait`]: PendingSourceMapBuffer::wait
#[derive(Debug)]
pub struct PendingSourceMapBuffer {
    rx: oneshot::Receiver<Result<SourceMapBuffer, IndexError>>,
}

impl PendingSourceMapBuffer {
    /// Wait for the build to finish.
    pub async fn loaded(self) -> Result<SourceMapBuffer, IndexError> {
        self.rx.await.map_err(|_| IndexError::BuildAbandoned)?
    }

    /// Block the current thread until the build finishes.
    ///
    /// Must not be called from within an async runtime; use [`loaded`] there.
    ///
    /// [`loaded`]: PendingSourceMapBuffer::loaded
    pub fn wait(self) -> Result<SourceMapBuffer, IndexError> {
        self.rx
            .blocking_recv()
            .map_err(|_| IndexError::BuildAbandoned)?
    }
}
