use std::fmt;

/// The kind of block the parser is currently inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Between blocks; the next line decides what comes.
    Unknown,
    /// `commit <id>` followed by `Key: value` lines.
    Commit,
    /// Free-form passthrough text.
    Meta,
    /// `Submodule <name> ...` status lines.
    SubmoduleHeader,
    /// Indented commit summaries following a submodule range line.
    Submodule,
    /// `diff ...` up to and including the `+++` line.
    DiffHeader,
    /// `@@ ... @@` and its body.
    Hunk,
}

impl Mode {
    /// Stable lowercase name, as printed by the debug renderer.
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Unknown => "unknown",
            Mode::Commit => "commit",
            Mode::Meta => "meta",
            Mode::SubmoduleHeader => "submodule_header",
            Mode::Submodule => "submodule",
            Mode::DiffHeader => "diff_header",
            Mode::Hunk => "hunk",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
