//! Fancy rendering of git diff and log streams.
//!
//! Lines flow through a mode state machine ([`DiffParser`]) that sorts them
//! into blocks: commit headers, free-form text, file headers, hunks and
//! submodule sections. Headers are summarized into banners, hunk headers are
//! annotated with `file:line`, and paired removed/added lines get intraline
//! emphasis. Everything is streamed: one line in, zero or more lines out.

pub mod ansi;
pub mod commit;
pub mod header;
pub mod highlight;
pub mod hunk;
pub mod mode;
pub mod parser;
pub mod render;
pub mod stream;
pub mod submodule;

pub use header::{ChangeKind, FileChange, FileTarget};
pub use hunk::{HunkHeader, HunkTracker, SideRange};
pub use mode::Mode;
pub use parser::DiffParser;
pub use render::{OutputStyle, RenderOptions, SymlinkNoNewline};
pub use stream::{render_to_string, write_fancy, ByteLines, FancyLines};

/// Errors raised while rendering a diff stream.
///
/// Malformed input is never an error; it degrades to passthrough text.
/// These variants mean the parser itself misbehaved, or the output failed.
#[derive(Debug, thiserror::Error)]
pub enum FancyError {
    #[error("hunk line references parent {index} but the header declares {arity} columns")]
    ParentOutOfRange { index: usize, arity: usize },

    #[error("line re-dispatched {hops} times, last in {mode} mode")]
    ReparseLoop { hops: usize, mode: Mode },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FancyError>;
