//! The `diff ...` header block: file names, modes, hashes, rename/copy data.

use bstr::{BString, ByteSlice};

/// Mode string git uses for symbolic links.
pub const SYMLINK_MODE: &[u8] = b"120000";

/// What happened to the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChangeKind {
    #[default]
    Modify,
    New,
    Delete,
    Rename,
    Copy,
    /// A rewrite reported with `dissimilarity index`.
    Rewrite,
}

/// How a header line was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderLine {
    /// The `diff --git` / `diff --cc` line opening the block.
    Start,
    /// `--- <old>`
    OldName,
    /// `+++ <new>`; the last line of the header.
    NewName,
    /// `old mode`, `new mode`, or combined `mode a,b..c`.
    Perm,
    Index,
    Deleted,
    NewFile,
    Similarity,
    Dissimilarity,
    /// `rename from/to`, `copy from/to`, or a bare `rename`/`copy` line.
    RenameCopy,
    /// Not a header line: the block is over.
    NotHeader,
}

/// Everything one diff header says about a file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileChange {
    pub old_name: Option<BString>,
    pub new_name: Option<BString>,
    pub kind: ChangeKind,
    pub old_perm: Option<BString>,
    pub new_perm: Option<BString>,
    /// Mode from the `index` line, present when the mode did not change.
    pub perm: Option<BString>,
    /// One hash per parent (several for combined diffs).
    pub old_hashes: Vec<BString>,
    pub new_hash: Option<BString>,
    pub similarity: Option<BString>,
    pub dissimilarity: Option<BString>,
}

/// Remove the `a/`, `b/`, `c/`, `i/`, `o/`, `w/`, `1/`, `2/` prefix git puts
/// in front of paths.
pub fn strip_path_prefix(path: &[u8]) -> &[u8] {
    match path {
        [b'a' | b'b' | b'c' | b'i' | b'o' | b'w' | b'1' | b'2', b'/', rest @ ..] => rest,
        _ => path,
    }
}

/// `diff` followed by whitespace: the first line of a file header.
pub fn is_diff_start(stripped: &[u8]) -> bool {
    stripped.starts_with(b"diff") && stripped.get(4).is_some_and(u8::is_ascii_whitespace)
}

/// `<keyword><whitespace+><rest>` → `rest`.
fn after_keyword<'a>(line: &'a [u8], keyword: &[u8]) -> Option<&'a [u8]> {
    let rest = line.strip_prefix(keyword)?;
    match rest.first() {
        Some(b) if b.is_ascii_whitespace() => Some(rest.trim_start()),
        _ => None,
    }
}

/// Trailing `(NN%)` of a `rename a => b (NN%)` summary line.
fn trailing_percentage(line: &[u8]) -> Option<&[u8]> {
    let inner = line.trim_end().strip_suffix(b")")?;
    let open = inner.rfind_byte(b'(')?;
    let pct = &inner[open + 1..];
    let digits = pct.strip_suffix(b"%")?;
    (!digits.is_empty() && digits.iter().all(u8::is_ascii_digit)).then_some(pct)
}

fn short_perm_tag(perm: &[u8]) -> &'static str {
    match perm {
        b"040000" => "d",
        b"100755" => "x",
        b"120000" => "l",
        b"160000" => "g",
        _ => "",
    }
}

fn perm_tag(prefix: char, perm: Option<&BString>) -> String {
    match perm.map(|p| short_perm_tag(p)) {
        Some(tag) if !tag.is_empty() => format!("{}{}", prefix, tag),
        _ => String::new(),
    }
}

impl FileChange {
    /// Feed one color-stripped header line.
    ///
    /// `at_start` is true for the first line of the block; that line is
    /// always accepted and provides the initial names when it has them.
    pub fn consume(&mut self, line: &[u8], at_start: bool) -> HeaderLine {
        if at_start {
            self.parse_start(line);
            return HeaderLine::Start;
        }

        if let Some(name) = after_keyword(line, b"---") {
            self.old_name = Some(strip_path_prefix(name.trim_end_with(|c| c == '\t')).into());
            return HeaderLine::OldName;
        }
        if let Some(name) = after_keyword(line, b"+++") {
            self.new_name = Some(strip_path_prefix(name.trim_end_with(|c| c == '\t')).into());
            return HeaderLine::NewName;
        }
        if let Some(perm) = after_keyword(line, b"old mode") {
            self.old_perm = Some(perm.into());
            return HeaderLine::Perm;
        }
        if let Some(perm) = after_keyword(line, b"new mode") {
            self.new_perm = Some(perm.into());
            return HeaderLine::Perm;
        }
        if let Some(modes) = after_keyword(line, b"mode") {
            if let Some(sep) = modes.rfind(b"..") {
                self.old_perm = Some(modes[..sep].into());
                self.new_perm = Some(modes[sep + 2..].into());
                return HeaderLine::Perm;
            }
        }
        if let Some(rest) = after_keyword(line, b"index") {
            if let Some(sep) = rest.rfind(b"..") {
                self.old_hashes = rest[..sep].split_str(",").map(BString::from).collect();
                let mut new_side = rest[sep + 2..].fields();
                self.new_hash = new_side.next().map(BString::from);
                if self.perm.is_none() {
                    self.perm = new_side.next().map(BString::from);
                }
                return HeaderLine::Index;
            }
        }
        if let Some(perm) = after_keyword(line, b"deleted file mode") {
            self.old_perm = Some(perm.into());
            self.set_kind(ChangeKind::Delete);
            return HeaderLine::Deleted;
        }
        if let Some(perm) = after_keyword(line, b"new file mode") {
            self.new_perm = Some(perm.into());
            self.set_kind(ChangeKind::New);
            return HeaderLine::NewFile;
        }
        if let Some(value) = after_keyword(line, b"similarity index") {
            self.similarity = Some(value.into());
            return HeaderLine::Similarity;
        }
        if let Some(value) = after_keyword(line, b"dissimilarity index") {
            self.dissimilarity = Some(value.into());
            self.set_kind(ChangeKind::Rewrite);
            return HeaderLine::Dissimilarity;
        }
        self.consume_rename_copy(line)
    }

    fn set_kind(&mut self, kind: ChangeKind) {
        if self.kind != ChangeKind::Modify && self.kind != kind {
            tracing::debug!(target: "fancy::mode", from = ?self.kind, to = ?kind, "change kind overridden");
        }
        self.kind = kind;
    }

    fn parse_start(&mut self, line: &[u8]) {
        if let Some(names) = after_keyword(line, b"diff --git") {
            // Split at the last whitespace, like a greedy `(.*)\s(.*)`.
            if let Some(sep) = names.rfind_byteset(b" \t") {
                self.old_name = Some(strip_path_prefix(&names[..sep]).into());
                self.new_name = Some(strip_path_prefix(&names[sep + 1..]).into());
            }
        } else if let Some(name) = after_keyword(line, b"diff --cc")
            .or_else(|| after_keyword(line, b"diff --combined"))
        {
            self.new_name = Some(strip_path_prefix(name).into());
        }
    }

    // A 100%-similar rename has no hunks and no ---/+++ lines, so the
    // names have to come from here.
    fn consume_rename_copy(&mut self, line: &[u8]) -> HeaderLine {
        let kind = if after_keyword(line, b"rename").is_some() {
            ChangeKind::Rename
        } else if after_keyword(line, b"copy").is_some() {
            ChangeKind::Copy
        } else {
            return HeaderLine::NotHeader;
        };

        for verb in [b"rename".as_slice(), b"copy"] {
            let Some(rest) = line.strip_prefix(verb) else {
                continue;
            };
            if let Some(name) = after_keyword(rest.trim_start(), b"from") {
                self.old_name = Some(name.into());
            } else if let Some(name) = after_keyword(rest.trim_start(), b"to") {
                self.new_name = Some(name.into());
            } else if self.similarity.is_none() {
                self.similarity = trailing_percentage(line).map(BString::from);
            }
        }

        self.set_kind(kind);
        HeaderLine::RenameCopy
    }

    fn display_new(&self) -> String {
        self.new_name
            .as_ref()
            .or(self.old_name.as_ref())
            .map(|n| n.to_str_lossy().into_owned())
            .unwrap_or_default()
    }

    fn display_old(&self) -> String {
        self.old_name
            .as_ref()
            .or(self.new_name.as_ref())
            .map(|n| n.to_str_lossy().into_owned())
            .unwrap_or_default()
    }

    /// One-line description of the change, shown in the file banner.
    pub fn summary(&self) -> String {
        let lossy = |v: &Option<BString>| {
            v.as_ref()
                .map(|s| s.to_str_lossy().into_owned())
                .unwrap_or_default()
        };
        let mut summary = match self.kind {
            ChangeKind::Modify => format!("modified: {}", self.display_new()),
            ChangeKind::Rewrite => format!(
                "rewrote: {} (dissimilarity: {})",
                self.display_new(),
                lossy(&self.dissimilarity)
            ),
            ChangeKind::New => {
                let tag = perm_tag('+', self.new_perm.as_ref());
                if tag.is_empty() {
                    format!("added: {}", self.display_new())
                } else {
                    format!("added [{}]: {}", tag, self.display_new())
                }
            }
            ChangeKind::Delete => {
                let tag = perm_tag('-', self.old_perm.as_ref());
                if tag.is_empty() {
                    format!("deleted: {}", self.display_old())
                } else {
                    format!("deleted [{}]: {}", tag, self.display_old())
                }
            }
            ChangeKind::Rename => format!(
                "renamed: {} to {} (similarity: {})",
                self.display_old(),
                self.display_new(),
                lossy(&self.similarity)
            ),
            ChangeKind::Copy => format!(
                "copied: {} to {} (similarity: {})",
                self.display_old(),
                self.display_new(),
                lossy(&self.similarity)
            ),
        };

        if matches!(self.kind, ChangeKind::New | ChangeKind::Delete) {
            return summary;
        }
        if self.old_perm.is_some() && self.new_perm.is_some() {
            let tags = format!(
                "{}{}",
                perm_tag('-', self.old_perm.as_ref()),
                perm_tag('+', self.new_perm.as_ref())
            );
            if !tags.is_empty() {
                summary.push_str(&format!(" [{}]", tags));
            }
        }
        summary
    }

    /// True when either side of the change is a symbolic link.
    pub fn is_symlink(&self) -> bool {
        [&self.perm, &self.old_perm, &self.new_perm]
            .into_iter()
            .flatten()
            .any(|p| p.as_slice() == SYMLINK_MODE)
    }

    /// What hunks of this file need to know once the header is gone.
    pub fn target(&self) -> FileTarget {
        FileTarget {
            name: self
                .new_name
                .clone()
                .or_else(|| self.old_name.clone())
                .unwrap_or_default(),
            symlink: self.is_symlink(),
        }
    }
}

/// The part of a [`FileChange`] that outlives its header: the name used
/// to annotate hunk headers and whether the file is a symlink.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileTarget {
    pub name: BString,
    pub symlink: bool,
}
