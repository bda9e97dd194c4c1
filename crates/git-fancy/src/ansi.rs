//! Escape-aware views of colored diff lines.
//!
//! Git colors diff output with CSI sequences (`ESC [ ... m`). Classification
//! works on the stripped text; highlighting compares the visible characters
//! but rebuilds the line from the raw bytes so every escape stays put.

use std::ops::Range;

use bstr::{BString, ByteSlice};

const ESC: u8 = 0x1b;

/// Byte length of the escape sequence starting at `pos`, if one starts there.
///
/// CSI sequences run up to their final byte (`@`..=`~`); any other
/// `ESC x` pair counts as a two-byte escape. A truncated sequence ends at
/// the first byte that cannot belong to it.
fn escape_len(bytes: &[u8], pos: usize) -> Option<usize> {
    if bytes.get(pos) != Some(&ESC) {
        return None;
    }
    match bytes.get(pos + 1) {
        Some(b'[') => {
            let mut end = pos + 2;
            while let Some(&b) = bytes.get(end) {
                match b {
                    0x40..=0x7e => return Some(end + 1 - pos),
                    0x20..=0x3f => end += 1,
                    _ => break,
                }
            }
            Some(end - pos)
        }
        Some(_) => Some(2),
        None => Some(1),
    }
}

/// Raw byte ranges of escape runs. Adjacent escapes merge into one run.
pub fn escape_runs(bytes: &[u8]) -> Vec<Range<usize>> {
    let mut runs: Vec<Range<usize>> = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        match escape_len(bytes, pos) {
            Some(len) => {
                match runs.last_mut() {
                    Some(last) if last.end == pos => last.end = pos + len,
                    _ => runs.push(pos..pos + len),
                }
                pos += len;
            }
            None => {
                pos += bytes[pos..].find_byte(ESC).unwrap_or(bytes.len() - pos);
            }
        }
    }
    runs
}

/// Remove every escape sequence from `bytes`.
pub fn strip_ansi(bytes: &[u8]) -> BString {
    if bytes.find_byte(ESC).is_none() {
        return BString::from(bytes);
    }
    let mut out = Vec::with_capacity(bytes.len());
    let mut pos = 0;
    for run in escape_runs(bytes) {
        out.extend_from_slice(&bytes[pos..run.start]);
        pos = run.end;
    }
    out.extend_from_slice(&bytes[pos..]);
    BString::from(out)
}

/// Split a line into the escapes glued to its start, its body, and the
/// escapes glued to its end.
pub fn split_outer_escapes(bytes: &[u8]) -> (&[u8], &[u8], &[u8]) {
    let runs = escape_runs(bytes);
    let lead_end = match runs.first() {
        Some(run) if run.start == 0 => run.end,
        _ => 0,
    };
    let trail_start = match runs.last() {
        Some(run) if run.end == bytes.len() && run.start >= lead_end => run.start,
        _ => bytes.len(),
    };
    // A line made only of escapes is all "leading".
    let trail_start = trail_start.max(lead_end);
    (
        &bytes[..lead_end],
        &bytes[lead_end..trail_start],
        &bytes[trail_start..],
    )
}

/// One visible character and where its bytes sit in the raw line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalChar {
    pub ch: char,
    pub raw: Range<usize>,
}

/// A raw line paired with its visible-character table.
///
/// The table is the comparison view; `raw` ranges map each entry back
/// into the original bytes, escapes included, for reconstruction.
/// Invalid UTF-8 decodes as U+FFFD but keeps its exact byte range.
#[derive(Debug, Clone)]
pub struct AnsiLine<'a> {
    raw: &'a [u8],
    chars: Vec<LogicalChar>,
}

impl<'a> AnsiLine<'a> {
    pub fn new(raw: &'a [u8]) -> Self {
        let mut chars = Vec::with_capacity(raw.len());
        let mut pos = 0;
        for run in escape_runs(raw).into_iter().chain(std::iter::once(raw.len()..raw.len())) {
            let segment = &raw[pos..run.start];
            chars.extend(segment.char_indices().map(|(start, end, ch)| LogicalChar {
                ch,
                raw: pos + start..pos + end,
            }));
            pos = run.end;
        }
        Self { raw, chars }
    }

    pub fn raw(&self) -> &'a [u8] {
        self.raw
    }

    pub fn chars(&self) -> &[LogicalChar] {
        &self.chars
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// The visible text, for debugging and tests.
    pub fn visible(&self) -> String {
        self.chars.iter().map(|c| c.ch).collect()
    }

    /// Raw byte span covering logical characters `range` (escapes between
    /// them included). `None` for an empty range.
    pub fn raw_span(&self, range: Range<usize>) -> Option<Range<usize>> {
        if range.is_empty() {
            return None;
        }
        let first = self.chars.get(range.start)?;
        let last = self.chars.get(range.end - 1)?;
        Some(first.raw.start..last.raw.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_plain_line_is_identity() {
        assert_eq!(strip_ansi(b"+hello world"), "+hello world");
    }

    #[test]
    fn strip_sgr_sequences() {
        assert_eq!(strip_ansi(b"\x1b[31m-old\x1b[m"), "-old");
        assert_eq!(strip_ansi(b"\x1b[1;32m+\x1b[7mnew\x1b[27m\x1b[0m"), "+new");
    }

    #[test]
    fn strip_truncated_escape() {
        assert_eq!(strip_ansi(b"text\x1b["), "text");
        assert_eq!(strip_ansi(b"a\x1b"), "a");
    }

    #[test]
    fn adjacent_escapes_form_one_run() {
        let runs = escape_runs(b"\x1b[1m\x1b[31mX\x1b[m");
        assert_eq!(runs, vec![0..9, 10..13]);
    }

    #[test]
    fn split_outer_escapes_of_colored_line() {
        let (lead, body, trail) = split_outer_escapes(b"\x1b[32m+added\x1b[m");
        assert_eq!(lead, b"\x1b[32m");
        assert_eq!(body, b"+added");
        assert_eq!(trail, b"\x1b[m");
    }

    #[test]
    fn split_outer_escapes_keeps_inner_escapes_in_body() {
        let (lead, body, trail) = split_outer_escapes(b"+a\x1b[7mb\x1b[27mc");
        assert_eq!(lead, b"");
        assert_eq!(body, b"+a\x1b[7mb\x1b[27mc");
        assert_eq!(trail, b"");
    }

    #[test]
    fn split_outer_escapes_of_escape_only_line() {
        let (lead, body, trail) = split_outer_escapes(b"\x1b[m");
        assert_eq!(lead, b"\x1b[m");
        assert!(body.is_empty());
        assert!(trail.is_empty());
    }

    #[test]
    fn logical_chars_map_back_to_raw_offsets() {
        let line = AnsiLine::new(b"\x1b[31m-h\x1b[1m\xc3\xa9\x1b[m");
        assert_eq!(line.visible(), "-h\u{e9}");
        assert_eq!(line.chars()[0].raw, 5..6);
        assert_eq!(line.chars()[1].raw, 6..7);
        assert_eq!(line.chars()[2].raw, 11..13);
        assert_eq!(line.raw_span(1..3), Some(6..13));
        assert_eq!(line.raw_span(2..2), None);
    }

    #[test]
    fn invalid_utf8_keeps_byte_ranges() {
        let line = AnsiLine::new(b"+a\xffb");
        assert_eq!(line.len(), 4);
        assert_eq!(line.chars()[2].ch, '\u{FFFD}');
        assert_eq!(line.chars()[2].raw, 2..3);
    }
}
