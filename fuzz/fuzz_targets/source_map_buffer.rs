#![no_main]

use libfuzzer_sys::fuzz_target;
use mapview::{CHUNK_WIDTH, SourceMapBuffer};

fuzz_target!(|data: &[u8]| {
    let data = if data.len() > 256 * 1024 {
        &data[..256 * 1024]
    } else {
        data
    };

    // Arbitrary bytes must decode to Ok or Err, never panic.
    let _ = SourceMapBuffer::decode(data);

    // Treat the input as a `mappings` string too, which reaches the bucketing pass far more
    // often than raw bytes do.
    let mappings = String::from_utf8_lossy(data);
    let document = serde_json::json!({
        "version": 3,
        "sources": ["a.js", "b.js"],
        "names": ["x"],
        "mappings": mappings,
    });
    let Ok(map) = SourceMapBuffer::decode(document.to_string().as_bytes()) else {
        return;
    };

    for line in 0..map.line_count() {
        let chunks = map.chunked_mappings_for_line(line);
        assert!(chunks.len() <= map.max_chunk_count());
        if let Some(first) = map.mappings_for_line(line).next() {
            assert_eq!(first.generated_column, 0);
        }
        for chunk in chunks.iter() {
            assert_eq!(chunk.start_column % CHUNK_WIDTH, 0);
        }
    }
});
