//! Hunk headers and per-column line accounting.
//!
//! A hunk with N columns (2 for a plain diff, more for a combined diff of
//! an N-1 parent merge) keeps one counter per column. Index 0 is the
//! result side, indices 1.. are the parents in header order. The hunk is
//! closed once every counter reaches the length its header announced.

use std::sync::OnceLock;

use bstr::{BString, ByteSlice};
use regex::bytes::Regex;

use crate::{FancyError, Result};

/// `\ No newline at end of file` and its translations all start this way.
const NO_NEWLINE_PREFIX: &[u8] = b"\\ ";

fn header_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?-u)^@@+\s(.*?)\s@@+\s*(.*)$").expect("hunk header regex is valid")
    })
}

/// True for the `\ No newline at end of file` marker.
pub fn is_no_newline_marker(stripped: &[u8]) -> bool {
    stripped.starts_with(NO_NEWLINE_PREFIX)
}

/// Expected extent of one side of a hunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SideRange {
    pub length: u64,
    pub start: u64,
}

impl SideRange {
    /// Parse `start[,length]`. A lone number is a one-line range.
    ///
    /// git leaves out `,length` only when the length is 1, so the number
    /// that remains is the start line. `-1` reads as line 1, one line long.
    fn parse(range: &[u8]) -> Option<Self> {
        let number = |s: &[u8]| s.to_str().ok()?.parse::<u64>().ok();
        match range.split_once_str(",") {
            Some((start, length)) => Some(SideRange {
                length: number(length)?,
                start: number(start)?,
            }),
            None => Some(SideRange {
                length: 1,
                start: number(range)?,
            }),
        }
    }
}

/// A parsed `@@ -a,b +c,d @@ context` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HunkHeader {
    /// Index 0 is the result side; parents follow in header order.
    sides: Vec<SideRange>,
    /// Function context git prints after the closing `@@`.
    pub context: BString,
}

impl HunkHeader {
    /// Parse a color-stripped line. `None` when the line is not a
    /// well-formed hunk header; such a line is plain text.
    pub fn parse(stripped: &[u8]) -> Option<Self> {
        let caps = header_regex().captures(stripped)?;
        let ranges = caps.get(1)?.as_bytes();

        let mut result = None;
        let mut parents = Vec::new();
        for token in ranges.fields() {
            match token.split_first() {
                Some((&b'-', range)) => parents.push(SideRange::parse(range)?),
                Some((&b'+', range)) if result.is_none() => result = Some(SideRange::parse(range)?),
                _ => return None,
            }
        }
        if parents.is_empty() {
            return None;
        }

        let mut sides = Vec::with_capacity(parents.len() + 1);
        sides.push(result?);
        sides.extend(parents);
        Some(HunkHeader {
            sides,
            context: caps.get(2).map(|m| m.as_bytes()).unwrap_or_default().into(),
        })
    }

    /// Number of columns N: parents plus the result side.
    pub fn arity(&self) -> usize {
        self.sides.len()
    }

    /// Range of column `index` (0 = result).
    pub fn side(&self, index: usize) -> Option<SideRange> {
        self.sides.get(index).copied()
    }

    pub fn new_range(&self) -> SideRange {
        self.sides[0]
    }

    /// Ranges of the parents, in header order.
    pub fn parents(&self) -> &[SideRange] {
        &self.sides[1..]
    }

    pub fn is_two_way(&self) -> bool {
        self.arity() == 2
    }
}

/// Classification of a hunk body line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyLine {
    /// Present on the result side and in every parent.
    Context,
    /// At least one parent column says `-`.
    Removed,
    /// On the result side, missing from at least one parent.
    Added,
    /// Marker columns hold something other than ` `, `-`, `+`.
    Foreign,
}

/// Counts body lines against a [`HunkHeader`].
#[derive(Debug, Clone)]
pub struct HunkTracker {
    expected: Vec<u64>,
    seen: Vec<u64>,
}

impl HunkTracker {
    pub fn new(header: &HunkHeader) -> Self {
        let expected: Vec<u64> = header.sides.iter().map(|s| s.length).collect();
        let seen = vec![0; expected.len()];
        Self { expected, seen }
    }

    pub fn arity(&self) -> usize {
        self.expected.len()
    }

    pub fn seen(&self) -> &[u64] {
        &self.seen
    }

    /// Every column has received exactly the lines its range announced.
    pub fn is_closed(&self) -> bool {
        self.seen == self.expected
    }

    fn bump(&mut self, index: usize) -> Result<()> {
        let arity = self.arity();
        let slot = self
            .seen
            .get_mut(index)
            .ok_or(FancyError::ParentOutOfRange { index, arity })?;
        *slot += 1;
        Ok(())
    }

    /// Classify a color-stripped body line and update the counters.
    ///
    /// The no-newline marker must be filtered out by the caller; it
    /// belongs to no column. A `Foreign` line leaves the counters alone.
    pub fn record(&mut self, stripped: &[u8]) -> Result<BodyLine> {
        let columns = self.arity() - 1;
        let markers: Vec<u8> = (0..columns)
            .map(|i| stripped.get(i).copied().unwrap_or(b' '))
            .collect();
        if markers.iter().any(|m| !matches!(m, b' ' | b'-' | b'+')) {
            return Ok(BodyLine::Foreign);
        }

        let on_result_side = !markers.contains(&b'-');
        if on_result_side {
            self.bump(0)?;
        }
        for (i, marker) in markers.iter().enumerate() {
            if *marker == b'-' || (*marker == b' ' && on_result_side) {
                self.bump(i + 1)?;
            }
        }

        Ok(if !on_result_side {
            BodyLine::Removed
        } else if markers.contains(&b'+') {
            BodyLine::Added
        } else {
            BodyLine::Context
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(tracker: &mut HunkTracker, lines: &[&str]) {
        for line in lines {
            tracker.record(line.as_bytes()).unwrap();
        }
    }

    #[test]
    fn parse_two_way_header() {
        let header = HunkHeader::parse(b"@@ -12,5 +12,6 @@ func foo()").unwrap();
        assert_eq!(header.arity(), 2);
        assert_eq!(header.new_range(), SideRange { length: 6, start: 12 });
        assert_eq!(header.parents(), &[SideRange { length: 5, start: 12 }]);
        assert_eq!(header.context, "func foo()");
    }

    #[test]
    fn parse_lone_numbers() {
        let header = HunkHeader::parse(b"@@ -1 +0,0 @@").unwrap();
        assert_eq!(header.side(1), Some(SideRange { length: 1, start: 1 }));
        assert_eq!(header.new_range(), SideRange { length: 0, start: 0 });

        let header = HunkHeader::parse(b"@@ -3 +3 @@").unwrap();
        assert_eq!(header.new_range(), SideRange { length: 1, start: 3 });

        let header = HunkHeader::parse(b"@@ -7 +9,2 @@").unwrap();
        assert_eq!(header.side(1), Some(SideRange { length: 1, start: 7 }));
        assert_eq!(header.new_range(), SideRange { length: 2, start: 9 });
    }

    #[test]
    fn parse_combined_header() {
        let header = HunkHeader::parse(b"@@@ -1,2 -1,3 +1,4 @@@").unwrap();
        assert_eq!(header.arity(), 3);
        assert_eq!(header.side(1), Some(SideRange { length: 2, start: 1 }));
        assert_eq!(header.side(2), Some(SideRange { length: 3, start: 1 }));
        assert_eq!(header.new_range(), SideRange { length: 4, start: 1 });
        assert!(header.context.is_empty());
    }

    #[test]
    fn reject_malformed_headers() {
        assert!(HunkHeader::parse(b"@@ garbage @@").is_none());
        assert!(HunkHeader::parse(b"@@ -1,x +1 @@").is_none());
        assert!(HunkHeader::parse(b"@@ +1,2 @@").is_none());
        assert!(HunkHeader::parse(b"@@ -1,2 @@").is_none());
        assert!(HunkHeader::parse(b"@@@@").is_none());
        assert!(HunkHeader::parse(b" @@ -1 +1 @@").is_none());
    }

    #[test]
    fn closes_after_exact_counts() {
        let header = HunkHeader::parse(b"@@ -12,5 +12,6 @@ func foo()").unwrap();
        let mut tracker = HunkTracker::new(&header);
        feed(&mut tracker, &[" a", " b", "-c", "+C", "+D", " e"]);
        assert_eq!(tracker.seen(), &[5, 4]);
        assert!(!tracker.is_closed());
        feed(&mut tracker, &[" f"]);
        assert!(tracker.is_closed());
    }

    #[test]
    fn pure_deletion_hunk() {
        let header = HunkHeader::parse(b"@@ -1 +0,0 @@").unwrap();
        let mut tracker = HunkTracker::new(&header);
        assert!(!tracker.is_closed());
        assert_eq!(tracker.record(b"-only").unwrap(), BodyLine::Removed);
        assert!(tracker.is_closed());
    }

    #[test]
    fn empty_line_is_context() {
        let header = HunkHeader::parse(b"@@ -1 +1 @@").unwrap();
        let mut tracker = HunkTracker::new(&header);
        assert_eq!(tracker.record(b"").unwrap(), BodyLine::Context);
        assert!(tracker.is_closed());
    }

    #[test]
    fn foreign_marker_is_not_counted() {
        let header = HunkHeader::parse(b"@@ -1 +1 @@").unwrap();
        let mut tracker = HunkTracker::new(&header);
        assert_eq!(tracker.record(b"diff --git a/x b/x").unwrap(), BodyLine::Foreign);
        assert_eq!(tracker.seen(), &[0, 0]);
    }

    #[test]
    fn combined_columns() {
        let header = HunkHeader::parse(b"@@@ -1,2 -1,2 +1,3 @@@").unwrap();
        let mut tracker = HunkTracker::new(&header);
        // Context, added relative to parent 1, removed by parent 1.
        assert_eq!(tracker.record(b"  shared").unwrap(), BodyLine::Context);
        assert_eq!(tracker.record(b"+ theirs").unwrap(), BodyLine::Added);
        assert_eq!(tracker.record(b"- dropped").unwrap(), BodyLine::Removed);
        assert_eq!(tracker.seen(), &[2, 2, 2]);
        assert!(!tracker.is_closed());
        assert_eq!(tracker.record(b"++merged").unwrap(), BodyLine::Added);
        assert!(tracker.is_closed());
    }

    #[test]
    fn no_newline_marker() {
        assert!(is_no_newline_marker(b"\\ No newline at end of file"));
        assert!(!is_no_newline_marker(b" \\ No newline"));
    }
}
