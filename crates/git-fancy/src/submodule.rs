//! `Submodule <name> ...` status lines and the commit list that follows.

use std::sync::OnceLock;

use bstr::{BStr, BString, ByteSlice};
use regex::bytes::Regex;

fn range_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?-u)^\S+\.\.\.?\S+.*:$").expect("submodule range regex is valid"))
}

/// Split `Submodule <name> <info>`.
pub fn parse_line(stripped: &[u8]) -> Option<(&BStr, &BStr)> {
    let rest = stripped.strip_prefix(b"Submodule")?;
    let (sep, rest) = rest.split_first()?;
    if !sep.is_ascii_whitespace() {
        return None;
    }
    let name_end = rest.find_byteset(b" \t\r\x0b\x0c")?;
    Some((rest[..name_end].as_bstr(), rest[name_end + 1..].as_bstr()))
}

/// What one status line told us.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Absorbed {
    Flag,
    Info,
    /// A `<from>..<to>:` range; the commit list starts on the next line.
    Range,
}

/// Accumulated status of one submodule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmoduleRecord {
    pub name: Option<BString>,
    pub info: BString,
    pub untracked: bool,
    pub modified: bool,
}

impl SubmoduleRecord {
    /// Fold the info part of a status line into the record.
    pub fn absorb(&mut self, info: &[u8]) -> Absorbed {
        match info {
            b"contains untracked content" => {
                self.untracked = true;
                Absorbed::Flag
            }
            b"contains modified content" => {
                self.modified = true;
                Absorbed::Flag
            }
            _ => {
                self.info.extend_from_slice(info);
                if range_regex().is_match(info) {
                    Absorbed::Range
                } else {
                    Absorbed::Info
                }
            }
        }
    }

    /// Banner text, e.g. `Submodule lib abc..def: [modified+untracked]`.
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Submodule {} {}",
            self.name.as_ref().map(|n| n.to_str_lossy()).unwrap_or_default(),
            self.info.to_str_lossy()
        );
        let flags: Vec<&str> = [(self.modified, "modified"), (self.untracked, "untracked")]
            .into_iter()
            .filter_map(|(set, label)| set.then_some(label))
            .collect();
        if !flags.is_empty() {
            summary.push_str(&format!(" [{}]", flags.join("+")));
        }
        summary
    }
}
