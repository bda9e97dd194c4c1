//! Intraline highlighting of paired removed/added lines.
//!
//! Within a run of `-` lines followed by an equally long run of `+` lines,
//! line i of one side is paired with line i of the other. For each pair the
//! common prefix and suffix of visible characters are left alone and the
//! middle is wrapped in reverse video. Escapes already in the line stay
//! where they were, so git's own coloring survives.

use std::ops::Range;

use bstr::BString;
use git_utils::color::ColorSlot;

use crate::ansi::AnsiLine;

/// Escapes that open and close the changed region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Emphasis {
    pub on: &'static str,
    pub off: &'static str,
}

impl Default for Emphasis {
    fn default() -> Self {
        Self {
            on: ColorSlot::Emphasis.default_ansi(),
            off: ColorSlot::EmphasisOff.default_ansi(),
        }
    }
}

/// Shared prefix and suffix of a pair, in visible characters.
///
/// The prefix includes the pre-matched `-`/`+` marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairDiff {
    pub prefix: usize,
    pub suffix: usize,
}

impl PairDiff {
    pub fn between(old: &AnsiLine<'_>, new: &AnsiLine<'_>) -> Self {
        let (a, b) = (old.chars(), new.chars());
        let mut prefix = usize::from(!a.is_empty() && !b.is_empty());
        while prefix < a.len() && prefix < b.len() && a[prefix].ch == b[prefix].ch {
            prefix += 1;
        }
        let mut suffix = 0;
        while suffix < a.len() - prefix
            && suffix < b.len() - prefix
            && a[a.len() - 1 - suffix].ch == b[b.len() - 1 - suffix].ch
        {
            suffix += 1;
        }
        Self { prefix, suffix }
    }

    /// Changed characters of a line of length `len`.
    pub fn changed(&self, len: usize) -> Range<usize> {
        self.prefix..len - self.suffix
    }
}

fn emphasize(line: &AnsiLine<'_>, changed: Range<usize>, emphasis: &Emphasis) -> BString {
    let raw = line.raw();
    let Some(span) = line.raw_span(changed) else {
        return BString::from(raw);
    };
    let mut out = Vec::with_capacity(raw.len() + emphasis.on.len() + emphasis.off.len());
    out.extend_from_slice(&raw[..span.start]);
    out.extend_from_slice(emphasis.on.as_bytes());
    out.extend_from_slice(&raw[span.clone()]);
    out.extend_from_slice(emphasis.off.as_bytes());
    out.extend_from_slice(&raw[span.end..]);
    BString::from(out)
}

/// Highlight one removed/added pair of raw lines.
pub fn highlight_pair(old: &[u8], new: &[u8], emphasis: &Emphasis) -> (BString, BString) {
    let (old_line, new_line) = (AnsiLine::new(old), AnsiLine::new(new));
    let diff = PairDiff::between(&old_line, &new_line);
    (
        emphasize(&old_line, diff.changed(old_line.len()), emphasis),
        emphasize(&new_line, diff.changed(new_line.len()), emphasis),
    )
}

/// Removed and added lines waiting to be paired.
#[derive(Debug, Default)]
pub struct LineGroup {
    old: Vec<BString>,
    new: Vec<BString>,
}

impl LineGroup {
    pub fn push_removed(&mut self, raw: &[u8]) {
        self.old.push(raw.into());
    }

    pub fn push_added(&mut self, raw: &[u8]) {
        self.new.push(raw.into());
    }

    /// A removed line after added ones starts a new group.
    pub fn has_added(&self) -> bool {
        !self.new.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.old.is_empty() && self.new.is_empty()
    }

    /// Empty the group: old side first, then new side. Only equally long
    /// sides are highlighted.
    pub fn flush(&mut self, emphasis: &Emphasis) -> Vec<BString> {
        let old = std::mem::take(&mut self.old);
        let new = std::mem::take(&mut self.new);
        if old.len() != new.len() {
            return old.into_iter().chain(new).collect();
        }
        let (old, new): (Vec<BString>, Vec<BString>) = old
            .iter()
            .zip(&new)
            .map(|(o, n)| highlight_pair(o, n, emphasis))
            .unzip();
        old.into_iter().chain(new).collect()
    }
}
