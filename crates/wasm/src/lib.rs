//! wasm-bindgen exports.
//!
//! This module exposes the text and sourcemap indices to a JavaScript grid renderer via
//! `wasm-bindgen`. The underlying logic lives in the `mapview` crate.
//!
//! Building the sourcemap index is exported as an async function: the returned `Promise` is the
//! readiness signal, and it rejects when the document cannot be decoded.

use wasm_bindgen::prelude::*;

use mapview::{
    MappingRecord, SourceMapBuffer, TextBuffer,
    view::{GeneratedView, Span as SpanInner, SpanKind},
};

/// A mapping record as seen from JavaScript. Lines are 1-based, columns 0-based.
#[derive(Debug, Clone, serde::Serialize, tsify::Tsify)]
#[tsify(into_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct Mapping {
    pub generated_line: u32,
    pub generated_column: u32,
    pub source: Option<String>,
    pub original_line: Option<u32>,
    pub original_column: Option<u32>,
    pub name: Option<String>,
}

impl From<&MappingRecord> for Mapping {
    fn from(record: &MappingRecord) -> Self {
        Mapping {
            generated_line: record.generated_line,
            generated_column: record.generated_column,
            source: record.source.as_deref().map(str::to_owned),
            original_line: record.original_line,
            original_column: record.original_column,
            name: record.name.as_deref().map(str::to_owned),
        }
    }
}

/// One span of a grid cell.
#[derive(Debug, Clone, serde::Serialize, tsify::Tsify)]
#[tsify(into_wasm_abi)]
pub struct Span {
    /// First UTF-16 column.
    pub start: usize,
    /// One past the last UTF-16 column.
    pub end: usize,
    pub text: String,
    /// `"filler"`, `"mapped"`, `"unmapped"`, `"unknown"`, `"source"` or `"focused"`.
    pub kind: String,
    pub mapping: Option<Mapping>,
}

impl From<&SpanInner<'_>> for Span {
    fn from(span: &SpanInner<'_>) -> Self {
        let kind = match span.kind {
            SpanKind::Filler => "filler",
            SpanKind::Mapped(_) => "mapped",
            SpanKind::Unmapped(_) => "unmapped",
            SpanKind::Unknown => "unknown",
            SpanKind::Source => "source",
            SpanKind::Focused => "focused",
        };
        Span {
            start: span.columns.start,
            end: span.columns.end,
            text: span.text.to_owned(),
            kind: kind.to_owned(),
            mapping: span.kind.mapping().map(Mapping::from),
        }
    }
}

/// A line-indexed generated (or original) text.
#[wasm_bindgen]
pub struct TextBufferHandle {
    inner: TextBuffer,
}

#[wasm_bindgen]
impl TextBufferHandle {
    #[wasm_bindgen(constructor)]
    pub fn new(text: String) -> TextBufferHandle {
        console_error_panic_hook::set_once();
        TextBufferHandle {
            inner: TextBuffer::new(text),
        }
    }

    #[wasm_bindgen(getter = lineCount)]
    pub fn line_count(&self) -> usize {
        self.inner.line_count()
    }

    #[wasm_bindgen(getter = maxLineLength)]
    pub fn max_line_length(&self) -> usize {
        self.inner.max_line_length()
    }

    /// Grid columns needed to show this text without a map.
    #[wasm_bindgen(getter = chunkCount)]
    pub fn chunk_count(&self) -> usize {
        self.inner.chunk_count()
    }

    pub fn line(&self, index: usize) -> Result<String, JsValue> {
        self.inner
            .line(index)
            .map(str::to_owned)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

/// A built sourcemap index.
#[wasm_bindgen]
pub struct SourceMapHandle {
    inner: SourceMapBuffer,
}

/// Decode `document` and index its mappings.
#[wasm_bindgen(js_name = loadSourceMap)]
pub async fn load_source_map(document: String) -> Result<SourceMapHandle, JsValue> {
    console_error_panic_hook::set_once();

    let inner = SourceMapBuffer::decode(document.as_bytes())
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(SourceMapHandle { inner })
}

#[wasm_bindgen]
impl SourceMapHandle {
    /// Grid columns for the generated text.
    #[wasm_bindgen(getter = maxChunkCount)]
    pub fn max_chunk_count(&self) -> usize {
        self.inner.max_chunk_count()
    }

    #[wasm_bindgen(getter = lineCount)]
    pub fn line_count(&self) -> usize {
        self.inner.line_count()
    }

    /// Spans of the grid cell at (`line`, `chunk`) of `text`.
    pub fn chunk(
        &self,
        text: &TextBufferHandle,
        line: usize,
        chunk: usize,
    ) -> Result<js_sys::Array, JsValue> {
        let spans = GeneratedView::new(&text.inner, &self.inner)
            .chunk(line, chunk)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        let out = js_sys::Array::new();
        for span in &spans {
            let value = serde_wasm_bindgen::to_value(&Span::from(span))?;
            out.push(&value);
        }
        Ok(out)
    }

    /// Embedded original text of `source`, or `undefined` if the map does not carry it.
    #[wasm_bindgen(js_name = sourceContentFor)]
    pub fn source_content_for(&self, source: &str) -> Option<String> {
        self.inner.source_content_for(source).map(str::to_owned)
    }
}
