//! How parsed blocks turn back into terminal lines.

use std::sync::OnceLock;

use bstr::BString;
use git_utils::color::ColorSlot;
use regex::bytes::{Captures, Regex};

use crate::ansi::{split_outer_escapes, strip_ansi};
use crate::header::FileTarget;

/// Overall shape of the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputStyle {
    /// Banners around blocks, summarized headers, cleaned hunk bodies.
    #[default]
    Fancy,
    /// Every line prefixed by its mode, with transition banners.
    Debug,
    /// Lines echoed as they came in.
    Plain,
}

/// What to do with `\ No newline at end of file` in a symlink diff.
///
/// Symlink targets never end in a newline, so git prints the marker for
/// every symlink change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SymlinkNoNewline {
    #[default]
    Suppress,
    Keep,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub color: bool,
    /// Width of banner rules, in columns.
    pub width: usize,
    pub style: OutputStyle,
    /// Run the builtin intraline highlighter.
    pub highlight: bool,
    pub symlink_no_newline: SymlinkNoNewline,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            color: true,
            width: 80,
            style: OutputStyle::Fancy,
            highlight: true,
            symlink_no_newline: SymlinkNoNewline::Suppress,
        }
    }
}

impl RenderOptions {
    /// Paint a banner line bold when color is on.
    pub fn banner(&self, text: &str) -> BString {
        if self.color {
            format!(
                "{}{}{}",
                ColorSlot::Meta.default_ansi(),
                text,
                ColorSlot::Reset.default_ansi()
            )
            .into()
        } else {
            text.into()
        }
    }
}

/// `fill` repeated `width` times.
pub fn rule(fill: char, width: usize) -> String {
    std::iter::repeat(fill).take(width).collect()
}

/// Center `text` in `width` columns, padding with `fill`. The extra
/// column of an odd padding goes to the right.
pub fn center(text: &str, width: usize, fill: char) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.to_string();
    }
    let left = (width - len) / 2;
    let right = width - len - left;
    format!("{}{}{}", rule(fill, left), text, rule(fill, right))
}

/// `<mode>: <line>`, as printed by the debug style.
pub fn debug_line(mode: &str, raw: &[u8]) -> BString {
    let mut out = BString::from(format!("{}: ", mode));
    out.extend_from_slice(raw);
    out
}

fn rewrite_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?-u)(@@+\s)(.*?)(\s@@+)").expect("hunk rewrite regex is valid"))
}

/// Replace the ranges of a raw hunk header with `<file>:<line>`, keeping
/// escapes and context. `None` when there is no line to point at.
pub fn rewrite_hunk_header(raw: &[u8], target: Option<&FileTarget>, new_start: u64) -> Option<BString> {
    let target = target.filter(|t| !t.name.is_empty())?;
    if new_start == 0 {
        return None;
    }
    let mut jump = BString::from(target.name.as_slice());
    jump.extend_from_slice(format!(":{}", new_start).as_bytes());
    let rewritten = rewrite_regex().replacen(raw, 1, |caps: &Captures<'_>| {
        let mut out = caps[1].to_vec();
        out.extend_from_slice(&jump);
        out.extend_from_slice(&caps[3]);
        out
    });
    Some(rewritten.into_owned().into())
}

/// Clean a two-column hunk body line for display.
///
/// The `+`/`-` marker is dropped (the line color already tells the side)
/// and so is one leading space of a context line. A removed or added line
/// whose content is blank is drawn as an inverted cell so it stays visible.
pub fn paint_body_line(raw: &[u8]) -> BString {
    let (lead, body, trail) = split_outer_escapes(raw);
    let mut out = BString::from(Vec::with_capacity(raw.len() + 8));
    match body.split_first() {
        Some((&(b'+' | b'-'), content)) => {
            if strip_ansi(content).iter().all(u8::is_ascii_whitespace) {
                out.extend_from_slice(ColorSlot::BlankCell.default_ansi().as_bytes());
                out.extend_from_slice(lead);
                out.extend_from_slice(if content.is_empty() { b" ".as_slice() } else { content });
                out.extend_from_slice(trail);
                out.extend_from_slice(ColorSlot::Reset.default_ansi().as_bytes());
                return out;
            }
            out.extend_from_slice(lead);
            out.extend_from_slice(content);
        }
        _ => {
            out.extend_from_slice(lead);
            out.extend_from_slice(match body.split_first() {
                Some((b, rest)) if b.is_ascii_whitespace() => rest,
                _ => body,
            });
        }
    }
    out.extend_from_slice(trail);
    out
}
