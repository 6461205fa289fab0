//! Mapping records and the decoder that produces them.
//!
//! The mapping index does not parse sourcemaps itself. It consumes any [`MappingDecoder`]: a
//! stream of [`MappingRecord`]s in generated-position order plus a lookup for embedded source
//! contents. [`SourceMapDecoder`] is the implementation backed by the `sourcemap` crate.
//!
//! Line conventions differ between the two worlds:
//!
//! - `sourcemap` tokens use 0-based generated and original lines.
//! - [`MappingRecord`] uses 1-based lines (`generated_line`, `original_line`) and 0-based
//!   columns, the convention of JS sourcemap consumers. Columns are UTF-16 code units.

use std::{collections::HashMap, sync::Arc};

use sourcemap::{DecodedMap, RawToken, SourceMap};

use crate::IndexError;

/// One association between a generated position and an original position.
///
/// A record whose `source` is `None` declares the generated span starting here as unmapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingRecord {
    /// 1-based generated line.
    pub generated_line: u32,
    /// 0-based generated column.
    pub generated_column: u32,
    pub source: Option<Arc<str>>,
    /// 1-based original line.
    pub original_line: Option<u32>,
    /// 0-based original column.
    pub original_column: Option<u32>,
    /// Identifier name at the original position.
    pub name: Option<Arc<str>>,
}

impl MappingRecord {
    /// An unmapped record at the given generated position.
    pub fn unmapped(generated_line: u32, generated_column: u32) -> Self {
        Self {
            generated_line,
            generated_column,
            source: None,
            original_line: None,
            original_column: None,
            name: None,
        }
    }

    pub fn is_mapped(&self) -> bool {
        self.source.is_some()
    }
}

/// Source of mapping records for [`SourceMapBuffer::build`].
///
/// Implementations must yield records ordered by `(generated_line, generated_column)`.
///
/// [`SourceMapBuffer::build`]: crate::SourceMapBuffer::build
pub trait MappingDecoder: Send + Sync {
    /// All mapping records, in generated-position order.
    fn mappings(&self) -> Box<dyn Iterator<Item = MappingRecord> + '_>;

    /// The original text of `source`, if the document embeds it.
    fn source_content_for(&self, source: &str) -> Option<&str>;
}

/// A [`MappingDecoder`] over a parsed `sourcemap::SourceMap`.
#[derive(Debug)]
pub struct SourceMapDecoder {
    sources: Vec<Arc<str>>,
    contents: Vec<Option<Arc<str>>>,
    source_root: Option<String>,
    names: Vec<Arc<str>>,
    source_ids: HashMap<Arc<str>, u32>,
    tokens: Vec<RawToken>,
}

impl SourceMapDecoder {
    /// Parse a sourcemap document.
    ///
    /// Regular maps are used as-is; indexed (sectioned) maps are flattened into one regular map.
    #[tracing::instrument(level = "debug", skip_all, fields(len = document.len()))]
    pub fn decode(document: &[u8]) -> Result<Self, IndexError> {
        let map = match sourcemap::decode_slice(document)? {
            DecodedMap::Regular(map) => map,
            DecodedMap::Index(index) => index.flatten()?,
            _ => {
                return Err(IndexError::UnsupportedSourceMap(
                    "only regular and indexed sourcemaps are supported",
                ));
            }
        };
        Ok(Self::new(map))
    }

    /// Take the records and source contents out of an already parsed map.
    pub fn new(map: SourceMap) -> Self {
        let sources: Vec<Arc<str>> = map.sources().map(Arc::from).collect();
        let contents = (0..map.get_source_count())
            .map(|id| map.get_source_contents(id).map(Arc::from))
            .collect();
        let names: Vec<Arc<str>> = map.names().map(Arc::from).collect();
        let source_ids = sources
            .iter()
            .enumerate()
            .map(|(id, source)| (source.clone(), id as u32))
            .collect();

        let mut tokens: Vec<RawToken> = map.tokens().map(|t| t.get_raw_token()).collect();
        if !tokens.is_sorted_by_key(|t| (t.dst_line, t.dst_col)) {
            tracing::debug!("sourcemap tokens out of generated order; sorting");
            tokens.sort_by_key(|t| (t.dst_line, t.dst_col));
        }

        Self {
            sources,
            contents,
            source_root: map.get_source_root().map(str::to_owned),
            names,
            source_ids,
            tokens,
        }
    }

    fn record(&self, token: &RawToken) -> MappingRecord {
        let source = self.sources.get(token.src_id as usize).cloned();
        let mut record = MappingRecord::unmapped(token.dst_line + 1, token.dst_col);
        if source.is_some() {
            record.source = source;
            record.original_line = Some(token.src_line + 1);
            record.original_column = Some(token.src_col);
            record.name = self.names.get(token.name_id as usize).cloned();
        }
        record
    }

    /// Resolve `source` to a source id: the exact name first, then relative to `sourceRoot`.
    ///
    /// Stored names already carry the root, so a relative name is looked up with the root
    /// prepended (joined with `/` when the root does not end in one).
    fn source_id(&self, source: &str) -> Option<u32> {
        if let Some(&id) = self.source_ids.get(source) {
            return Some(id);
        }
        let root = self.source_root.as_deref().filter(|root| !root.is_empty())?;
        if let Some(&id) = self.source_ids.get(format!("{root}{source}").as_str()) {
            return Some(id);
        }
        if root.ends_with('/') {
            return None;
        }
        let joined = format!("{root}/{}", source.trim_start_matches('/'));
        self.source_ids.get(joined.as_str()).copied()
    }
}

impl MappingDecoder for SourceMapDecoder {
    fn mappings(&self) -> Box<dyn Iterator<Item = MappingRecord> + '_> {
        Box::new(self.tokens.iter().map(|t| self.record(t)))
    }

    fn source_content_for(&self, source: &str) -> Option<&str> {
        let id = self.source_id(source)?;
        self.contents.get(id as usize)?.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_json(map: SourceMap) -> Vec<u8> {
        let mut buf: Vec<u8> = Vec::new();
        map.to_writer(&mut buf).unwrap();
        buf
    }

    #[test]
    fn decodes_records_with_one_based_lines() {
        let mut builder = sourcemap::SourceMapBuilder::new(None);
        builder.add_source("src/a.js");
        builder.set_source_contents(0, Some("let answer = 42;\n"));
        builder.add(0, 0, 0, 4, Some("src/a.js"), Some("answer"), false);
        builder.add(0, 7, u32::MAX, u32::MAX, None, None, false);
        builder.add(2, 3, 1, 0, Some("src/a.js"), None, false);
        let json = to_json(builder.into_sourcemap());

        let decoder = SourceMapDecoder::decode(&json).unwrap();
        let records: Vec<MappingRecord> = decoder.mappings().collect();
        assert_eq!(records.len(), 3);

        assert_eq!(records[0].generated_line, 1);
        assert_eq!(records[0].generated_column, 0);
        assert_eq!(records[0].source.as_deref(), Some("src/a.js"));
        assert_eq!(records[0].original_line, Some(1));
        assert_eq!(records[0].original_column, Some(4));
        assert_eq!(records[0].name.as_deref(), Some("answer"));

        assert_eq!(records[1], MappingRecord::unmapped(1, 7));

        assert_eq!(records[2].generated_line, 3);
        assert_eq!(records[2].generated_column, 3);
        assert_eq!(records[2].original_line, Some(2));
        assert_eq!(records[2].name, None);
    }

    #[test]
    fn source_content_for_embedded_and_missing_sources() {
        let mut builder = sourcemap::SourceMapBuilder::new(None);
        builder.add_source("embedded.js");
        builder.set_source_contents(0, Some("embedded();"));
        builder.add_source("external.js");
        builder.add(0, 0, 0, 0, Some("embedded.js"), None, false);
        builder.add(0, 5, 0, 0, Some("external.js"), None, false);
        let json = to_json(builder.into_sourcemap());

        let decoder = SourceMapDecoder::decode(&json).unwrap();
        assert_eq!(decoder.source_content_for("embedded.js"), Some("embedded();"));
        assert_eq!(decoder.source_content_for("external.js"), None);
        assert_eq!(decoder.source_content_for("unknown.js"), None);
    }

    #[test]
    fn malformed_document_is_a_decode_error() {
        let err = SourceMapDecoder::decode(b"{\"version\":3,").unwrap_err();
        assert!(matches!(err, IndexError::SourceMap(_)));
    }

    #[test]
    fn mappings_are_delivered_in_generated_order() {
        let json = br#"{"version":3,"sources":["a.js"],"names":[],"mappings":"AAAA,IAAI;;QAAQ"}"#;
        let decoder = SourceMapDecoder::decode(json).unwrap();
        let positions: Vec<(u32, u32)> = decoder
            .mappings()
            .map(|r| (r.generated_line, r.generated_column))
            .collect();
        assert_eq!(positions, vec![(1, 0), (1, 4), (3, 8)]);
    }

    #[test]
    fn source_content_for_resolves_names_relative_to_source_root() {
        let json = br#"{"version":3,"sourceRoot":"webpack:///","sources":["src/a.js"],"sourcesContent":["A"],"names":[],"mappings":"AAAA"}"#;
        let decoder = SourceMapDecoder::decode(json).unwrap();

        let record = decoder.mappings().next().unwrap();
        assert_eq!(record.source.as_deref(), Some("webpack:///src/a.js"));
        assert_eq!(decoder.source_content_for("webpack:///src/a.js"), Some("A"));
        assert_eq!(decoder.source_content_for("src/a.js"), Some("A"));
        assert_eq!(decoder.source_content_for("src/b.js"), None);
    }

    #[test]
    fn source_root_without_trailing_slash_still_resolves() {
        let json = br#"{"version":3,"sourceRoot":"https://example.com/lib","sources":["a.js"],"sourcesContent":["B"],"names":[],"mappings":"AAAA"}"#;
        let decoder = SourceMapDecoder::decode(json).unwrap();

        let record = decoder.mappings().next().unwrap();
        let full = record.source.as_deref().unwrap();
        assert!(full.starts_with("https://example.com/lib"), "{full}");
        assert_eq!(decoder.source_content_for(full), Some("B"));
        assert_eq!(decoder.source_content_for("a.js"), Some("B"));
    }

    #[test]
    fn indexed_maps_are_flattened() {
        let json = br#"{
            "version": 3,
            "sections": [
                {
                    "offset": {"line": 0, "column": 0},
                    "map": {"version":3,"sources":["first.js"],"sourcesContent":["one"],"names":[],"mappings":"AAAA"}
                },
                {
                    "offset": {"line": 2, "column": 0},
                    "map": {"version":3,"sources":["second.js"],"sourcesContent":["two"],"names":[],"mappings":"AAAA,IAAI"}
                }
            ]
        }"#;
        let decoder = SourceMapDecoder::decode(json).unwrap();

        let positions: Vec<(u32, u32)> = decoder
            .mappings()
            .map(|r| (r.generated_line, r.generated_column))
            .collect();
        assert_eq!(positions, vec![(1, 0), (3, 0), (3, 4)]);

        let sources: Vec<String> = decoder
            .mappings()
            .filter_map(|r| r.source.as_deref().map(str::to_owned))
            .collect();
        assert_eq!(sources, vec!["first.js", "second.js", "second.js"]);
        assert_eq!(decoder.source_content_for("second.js"), Some("two"));
    }

    #[test]
    fn unsorted_tokens_are_put_in_generated_order() {
        let mut builder = sourcemap::SourceMapBuilder::new(None);
        builder.add_source("a.js");
        builder.add(2, 0, 0, 0, Some("a.js"), None, false);
        builder.add(0, 9, 0, 0, Some("a.js"), None, false);
        builder.add(0, 1, 0, 0, Some("a.js"), None, false);
        let decoder = SourceMapDecoder::new(builder.into_sourcemap());

        let positions: Vec<(u32, u32)> = decoder
            .mappings()
            .map(|r| (r.generated_line, r.generated_column))
            .collect();
        assert_eq!(positions, vec![(1, 1), (1, 9), (3, 0)]);
    }
}
