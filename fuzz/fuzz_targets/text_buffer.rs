#![no_main]

use libfuzzer_sys::fuzz_target;
use mapview::TextBuffer;

fuzz_target!(|data: &[u8]| {
    let data = if data.len() > 256 * 1024 {
        &data[..256 * 1024]
    } else {
        data
    };

    let text = String::from_utf8_lossy(data).into_owned();
    let buf = TextBuffer::from(text.as_str());

    assert_eq!(buf.line_count(), text.matches('\n').count() + 1);

    let mut rebuilt = String::with_capacity(text.len());
    for i in 0..buf.line_count() {
        if i > 0 {
            rebuilt.push('\n');
        }
        let line = buf.line(i).expect("line in range");
        rebuilt.push_str(line);

        // Column slicing must stay on char boundaries for any range.
        let len = buf.line_len(i).expect("line in range");
        let _ = buf.slice(i, len / 3..len.saturating_add(7)).expect("line in range");
    }
    assert_eq!(rebuilt, text);
});
