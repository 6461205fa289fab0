//! UTF-16 column support for generated text.
//!
//! Sourcemap columns are counted in **UTF-16 code units**, while Rust strings are UTF-8. This
//! module converts UTF-16 columns of a single line into byte offsets so that [`TextBuffer`]
//! can slice a column range out of a line.
//!
//! Lines that are pure ASCII need no conversion at all (a byte is a code unit), so only
//! non-ASCII lines get a [`Utf16Line`] with sparse checkpoints (every N chars). A conversion
//! starts at the closest checkpoint instead of rescanning from the line start, which matters for
//! minified bundles where one line can be megabytes long.
//!
//! Columns that fall inside a surrogate pair (e.g. in the middle of an emoji) clamp to the start
//! of that code point.
//!
//! [`TextBuffer`]: crate::text::TextBuffer

/// Column layout of one line.
#[derive(Debug, Clone)]
pub(crate) enum LineColumns {
    /// Byte offsets and UTF-16 columns coincide.
    Ascii,
    /// The line contains multi-byte characters.
    Utf16(Utf16Line),
}

impl LineColumns {
    /// Build the column layout for `line` (which must not include its `\n`).
    pub(crate) fn new(line: &str) -> Self {
        if line.is_ascii() {
            Self::Ascii
        } else {
            Self::Utf16(Utf16Line::new(line))
        }
    }

    /// Length of `line` in UTF-16 code units.
    pub(crate) fn utf16_len(&self, line: &str) -> usize {
        match self {
            Self::Ascii => line.len(),
            Self::Utf16(index) => index.utf16_len(),
        }
    }

    /// Convert a UTF-16 column into a byte offset relative to the start of `line`.
    ///
    /// Columns beyond the line's length clamp to the line end.
    pub(crate) fn col_to_byte(&self, line: &str, utf16_col: usize) -> usize {
        match self {
            Self::Ascii => utf16_col.min(line.len()),
            Self::Utf16(index) => index.utf16_col_to_byte(line, utf16_col),
        }
    }
}

/// Per-line UTF-16 column index.
///
/// All byte offsets stored here are relative to the start of the line.
#[derive(Debug, Clone)]
pub(crate) struct Utf16Line {
    /// Sparse checkpoints mapping byte offsets to UTF-16 columns.
    checkpoints: Vec<Utf16Checkpoint>,
}

impl Utf16Line {
    /// Number of Unicode scalar values between checkpoints.
    ///
    /// Higher values reduce memory but increase worst-case scan length for a single conversion.
    const CHECKPOINT_STRIDE_CHARS: usize = 64;

    fn new(line: &str) -> Self {
        let mut checkpoints = vec![Utf16Checkpoint {
            byte: 0,
            utf16_col: 0,
        }];

        let mut utf16_col: usize = 0;
        let mut char_count: usize = 0;

        for (rel, ch) in line.char_indices() {
            utf16_col += ch.len_utf16();
            char_count += 1;

            if char_count.is_multiple_of(Self::CHECKPOINT_STRIDE_CHARS) {
                checkpoints.push(Utf16Checkpoint {
                    byte: rel + ch.len_utf8(),
                    utf16_col,
                });
            }
        }

        // Always include the line end boundary.
        if checkpoints.last().map(|c| c.byte).unwrap_or(0) != line.len() {
            checkpoints.push(Utf16Checkpoint {
                byte: line.len(),
                utf16_col,
            });
        }

        Self { checkpoints }
    }

    fn utf16_len(&self) -> usize {
        self.checkpoints.last().map(|c| c.utf16_col).unwrap_or(0)
    }

    fn utf16_col_to_byte(&self, line: &str, utf16_col: usize) -> usize {
        if utf16_col == 0 {
            return 0;
        }
        if utf16_col >= self.utf16_len() {
            return line.len();
        }

        // Find the last checkpoint with utf16_col <= target.
        let cp_idx = match self
            .checkpoints
            .binary_search_by(|c| c.utf16_col.cmp(&utf16_col))
        {
            Ok(i) => i,
            Err(0) => 0,
            Err(i) => i - 1,
        };
        let cp = self.checkpoints[cp_idx];

        let mut cur_byte = cp.byte;
        let mut cur_utf16 = cp.utf16_col;

        for ch in line[cur_byte..].chars() {
            if cur_utf16 >= utf16_col {
                break;
            }
            let u16_len = ch.len_utf16();
            if cur_utf16 + u16_len > utf16_col {
                // Inside a surrogate pair.
                break;
            }
            cur_utf16 += u16_len;
            cur_byte += ch.len_utf8();
        }

        cur_byte
    }
}

/// A sparse checkpoint inside a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Utf16Checkpoint {
    /// Byte offset relative to the line start.
    byte: usize,
    /// UTF-16 column at `byte`.
    utf16_col: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Naive (scan-from-start) conversion of a UTF-16 column to a line-relative byte offset.
    ///
    /// This mirrors the clamping behavior used by the indexed implementation.
    fn naive_utf16_col_to_byte(line: &str, utf16_col: usize) -> usize {
        let mut cur_u16 = 0usize;
        let mut cur_byte = 0usize;
        for ch in line.chars() {
            let u16 = ch.len_utf16();
            if cur_u16 + u16 > utf16_col {
                break;
            }
            cur_u16 += u16;
            cur_byte += ch.len_utf8();
        }
        cur_byte
    }

    #[test]
    fn ascii_lines_skip_the_checkpoint_table() {
        let cols = LineColumns::new("abc");
        assert!(matches!(cols, LineColumns::Ascii));
        assert_eq!(cols.utf16_len("abc"), 3);
        assert_eq!(cols.col_to_byte("abc", 2), 2);
        assert_eq!(cols.col_to_byte("abc", 99), 3);
    }

    #[test]
    /// Japanese characters are multi-byte in UTF-8 but single-unit in UTF-16.
    fn japanese_utf8_bytes_map_to_single_utf16_units() {
        let s = "あい";
        let cols = LineColumns::new(s);
        assert_eq!(cols.utf16_len(s), 2);
        assert_eq!(cols.col_to_byte(s, 0), 0);
        assert_eq!(cols.col_to_byte(s, 1), 3);
        assert_eq!(cols.col_to_byte(s, 2), 6);
    }

    #[test]
    /// Emoji are represented as surrogate pairs in UTF-16 (2 code units).
    fn emoji_clamps_inside_surrogate_pair() {
        let s = "a🙂b";
        let cols = LineColumns::new(s);
        assert_eq!(cols.utf16_len(s), 4);
        assert_eq!(cols.col_to_byte(s, 1), 1);
        // Inside surrogate pair => clamp to start of code point.
        assert_eq!(cols.col_to_byte(s, 2), 1);
        assert_eq!(cols.col_to_byte(s, 3), 5);
        assert_eq!(cols.col_to_byte(s, 4), 6);
    }

    #[test]
    /// The checkpointed implementation matches a naive scan on a long mixed line.
    fn checkpointed_matches_naive_on_long_mixed_line() {
        let mut line = String::new();
        for _ in 0..200 {
            line.push('a');
            line.push('🙂');
            line.push('あ');
        }
        let cols = LineColumns::new(&line);

        let max_u16 = line.chars().map(|c| c.len_utf16()).sum::<usize>();
        assert_eq!(cols.utf16_len(&line), max_u16);

        for col in [
            0usize,
            1,
            2,
            3,
            4,
            5,
            64,
            65,
            127,
            128,
            256,
            257,
            max_u16 - 1,
            max_u16,
            max_u16 + 10,
        ] {
            let got = cols.col_to_byte(&line, col);
            let want = naive_utf16_col_to_byte(&line, col.min(max_u16));
            assert_eq!(got, want, "utf16->byte mismatch at col {col}");
        }
    }
}
