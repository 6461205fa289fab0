use std::sync::Arc;

use mapview::{CHUNK_WIDTH, MappingDecoder, MappingRecord, SourceMapBuffer, TextBuffer};
use proptest::prelude::*;

struct Records(Vec<MappingRecord>);

impl MappingDecoder for Records {
    fn mappings(&self) -> Box<dyn Iterator<Item = MappingRecord> + '_> {
        Box::new(self.0.iter().cloned())
    }

    fn source_content_for(&self, _source: &str) -> Option<&str> {
        None
    }
}

/// Records in generated order over a handful of lines, some mapped, some not.
fn records() -> impl Strategy<Value = Vec<MappingRecord>> {
    prop::collection::vec((1u32..6, 0u32..700, any::<bool>()), 0..60).prop_map(|mut raw| {
        raw.sort_by_key(|&(line, column, _)| (line, column));
        raw.into_iter()
            .map(|(line, column, is_mapped)| {
                let mut record = MappingRecord::unmapped(line, column);
                if is_mapped {
                    record.source = Some(Arc::from("a.js"));
                    record.original_line = Some(1);
                    record.original_column = Some(0);
                }
                record
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn line_count_is_newline_count_plus_one(text in "[a-c\n🙂\r]{0,64}") {
        let buf = TextBuffer::from(text.as_str());
        prop_assert_eq!(buf.line_count(), text.matches('\n').count() + 1);
    }

    #[test]
    fn lines_rejoin_into_the_text(text in "[a-c\n あ]{0,64}") {
        let buf = TextBuffer::from(text.as_str());
        let lines: Vec<&str> = (0..buf.line_count()).map(|i| buf.line(i).unwrap()).collect();
        prop_assert_eq!(lines.join("\n"), text);
    }

    #[test]
    fn line_starts_are_strictly_increasing_from_zero(text in "[ab\n]{0,64}") {
        let buf = TextBuffer::from(text.as_str());
        let starts = buf.line_starts();
        prop_assert_eq!(starts[0], 0);
        prop_assert!(starts.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn max_line_length_is_the_longest_line(text in "[a🙂\n]{0,96}") {
        let buf = TextBuffer::from(text.as_str());
        let longest = (0..buf.line_count())
            .map(|i| buf.line(i).unwrap().encode_utf16().count())
            .max()
            .unwrap_or(0);
        prop_assert_eq!(buf.max_line_length(), longest);
    }

    #[test]
    fn chunks_hold_exactly_their_columns_in_order(records in records()) {
        let map = SourceMapBuffer::build(Arc::new(Records(records.clone())));

        for record in &records {
            let line = map.chunked_mappings_for_line(record.generated_line as usize - 1);
            let chunk_index = (record.generated_column / CHUNK_WIDTH) as usize;
            let chunk = line.get(chunk_index).expect("chunk of a record exists");
            prop_assert_eq!(chunk.start_column, CHUNK_WIDTH * chunk_index as u32);
            prop_assert!(chunk.mappings.contains(record));
        }

        for line in 0..map.line_count() {
            for chunk in map.chunked_mappings_for_line(line).iter() {
                prop_assert!(chunk
                    .mappings
                    .windows(2)
                    .all(|w| w[0].generated_column <= w[1].generated_column));
                let all_in_chunk = chunk.mappings.iter().all(|m| {
                    m.generated_column >= chunk.start_column
                        && m.generated_column < chunk.start_column + CHUNK_WIDTH
                });
                prop_assert!(all_in_chunk);
            }
        }
    }

    #[test]
    fn every_mapped_line_starts_at_column_zero(records in records()) {
        let map = SourceMapBuffer::build(Arc::new(Records(records.clone())));

        for record in &records {
            let line = record.generated_line as usize - 1;
            let first = map.mappings_for_line(line).next().expect("line has records");
            prop_assert_eq!(first.generated_column, 0);

            let real_first = records
                .iter()
                .find(|r| r.generated_line == record.generated_line)
                .expect("record is on its own line");
            if real_first.generated_column > 0 {
                prop_assert_eq!(first, &MappingRecord::unmapped(record.generated_line, 0));
            }
        }
    }

    #[test]
    fn max_chunk_count_covers_every_record(records in records()) {
        let map = SourceMapBuffer::build(Arc::new(Records(records.clone())));
        let expected = records
            .iter()
            .map(|r| (r.generated_column / CHUNK_WIDTH) as usize + 1)
            .max()
            .unwrap_or(0);
        prop_assert_eq!(map.max_chunk_count(), expected);
    }
}
