//! The mode state machine.
//!
//! Every line is first offered to the handler of the current block. A
//! handler either consumes the line or asks for a reparse: the machine
//! leaves the current block (running its exit hook), enters the requested
//! one (running its enter hook) and offers the same line again. Reparses
//! run in a bounded loop, never by recursion.
//!
//! Some transitions are deferred to the next line, because the line that
//! triggers them still belongs to the current block: the `+++` line of a
//! file header, a submodule range line ending in `:`, and the blank line
//! after a submodule commit list.

use std::collections::VecDeque;
use std::mem;

use bstr::{BString, ByteSlice};

use crate::ansi::strip_ansi;
use crate::commit::{self, CommitRecord};
use crate::header::{self, FileChange, FileTarget, HeaderLine};
use crate::highlight::{Emphasis, LineGroup};
use crate::hunk::{self, BodyLine, HunkHeader, HunkTracker};
use crate::mode::Mode;
use crate::render::{self, OutputStyle, RenderOptions, SymlinkNoNewline};
use crate::submodule::{self, Absorbed, SubmoduleRecord};
use crate::{FancyError, Result};

/// A line moves at most Hunk/DiffHeader/... → Unknown → new block, so a
/// few hops is plenty. Needing more means the handlers disagree.
const MAX_REPARSE: usize = 4;

#[derive(Debug)]
struct HunkState {
    header: HunkHeader,
    tracker: HunkTracker,
    group: LineGroup,
}

/// The open block, owning its record.
#[derive(Debug, Default)]
enum Block {
    #[default]
    Unknown,
    Meta,
    Commit(CommitRecord),
    DiffHeader(FileChange),
    Hunk(HunkState),
    SubmoduleHeader(SubmoduleRecord),
    Submodule(SubmoduleRecord),
}

impl Block {
    fn mode(&self) -> Mode {
        match self {
            Block::Unknown => Mode::Unknown,
            Block::Meta => Mode::Meta,
            Block::Commit(_) => Mode::Commit,
            Block::DiffHeader(_) => Mode::DiffHeader,
            Block::Hunk(_) => Mode::Hunk,
            Block::SubmoduleHeader(_) => Mode::SubmoduleHeader,
            Block::Submodule(_) => Mode::Submodule,
        }
    }
}

/// Where a transition goes. A hunk carries the header that was already
/// parsed while detecting it.
#[derive(Debug)]
enum Target {
    Unknown,
    Meta,
    Commit,
    DiffHeader,
    Hunk(HunkHeader),
    SubmoduleHeader,
    Submodule,
}

impl Target {
    fn mode(&self) -> Mode {
        match self {
            Target::Unknown => Mode::Unknown,
            Target::Meta => Mode::Meta,
            Target::Commit => Mode::Commit,
            Target::DiffHeader => Mode::DiffHeader,
            Target::Hunk(_) => Mode::Hunk,
            Target::SubmoduleHeader => Mode::SubmoduleHeader,
            Target::Submodule => Mode::Submodule,
        }
    }
}

enum Step {
    Done,
    Reparse(Target),
}

/// Rendered lines waiting to be pulled, plus the knobs deciding their shape.
#[derive(Debug)]
struct Output {
    options: RenderOptions,
    emphasis: Emphasis,
    lines: VecDeque<BString>,
}

impl Output {
    fn push(&mut self, line: impl Into<BString>) {
        self.lines.push_back(line.into());
    }

    fn style(&self) -> OutputStyle {
        self.options.style
    }

    /// A line shown as-is in fancy and plain output.
    fn echo(&mut self, mode: Mode, raw: &[u8]) {
        match self.style() {
            OutputStyle::Debug => self.push(render::debug_line(mode.as_str(), raw)),
            OutputStyle::Fancy | OutputStyle::Plain => self.push(raw),
        }
    }

    /// A header line; fancy output replaces it with the exit summary.
    fn summarized(&mut self, mode: Mode, raw: &[u8]) {
        match self.style() {
            OutputStyle::Fancy => {}
            OutputStyle::Debug => self.push(render::debug_line(mode.as_str(), raw)),
            OutputStyle::Plain => self.push(raw),
        }
    }

    fn banner(&mut self, text: &str) {
        let line = self.options.banner(text);
        self.push(line);
    }

    /// Emphasis escapes only make sense in colored output.
    fn groups_lines(&self, two_way: bool) -> bool {
        self.options.highlight && self.options.color && two_way
    }

    fn body(&mut self, raw: &[u8], two_way: bool) {
        match self.style() {
            OutputStyle::Fancy if self.options.color && two_way => {
                self.push(render::paint_body_line(raw))
            }
            OutputStyle::Fancy | OutputStyle::Plain => self.push(raw),
            OutputStyle::Debug => self.push(render::debug_line(Mode::Hunk.as_str(), raw)),
        }
    }

    fn flush_group(&mut self, group: &mut LineGroup, two_way: bool) {
        if group.is_empty() {
            return;
        }
        let lines = group.flush(&self.emphasis);
        for line in lines {
            self.body(&line, two_way);
        }
    }

    fn hunk_header(&mut self, raw: &[u8], file: Option<&FileTarget>, new_start: u64) {
        if self.style() != OutputStyle::Fancy {
            return self.echo(Mode::Hunk, raw);
        }
        match render::rewrite_hunk_header(raw, file, new_start) {
            Some(rewritten) => self.push(rewritten),
            None => self.push(raw),
        }
    }

    /// Dropped markers leave the open line group untouched.
    fn drops_no_newline(&self, symlink: bool) -> bool {
        self.style() == OutputStyle::Fancy
            && symlink
            && self.options.symlink_no_newline == SymlinkNoNewline::Suppress
    }

    fn entered(&mut self, mode: Mode) {
        match (self.style(), mode) {
            (_, Mode::Unknown) => {}
            (OutputStyle::Debug, _) => {
                let width = self.options.width;
                self.push(render::center(&format!("New {}", mode), width, '─'));
            }
            (OutputStyle::Fancy, Mode::Commit) => self.banner(&render::rule('═', self.options.width)),
            (OutputStyle::Fancy, Mode::DiffHeader | Mode::SubmoduleHeader) => {
                self.banner(&render::rule('─', self.options.width))
            }
            _ => {}
        }
    }

    fn exited(&mut self, mode: Mode) {
        if self.style() == OutputStyle::Debug && mode != Mode::Unknown {
            let width = self.options.width;
            self.push(render::center(&format!("End {}", mode), width, '─'));
        }
    }
}

/// Streaming parser: push raw lines in with [`feed`](Self::feed), pull
/// rendered lines out with [`drain`](Self::drain).
#[derive(Debug)]
pub struct DiffParser {
    block: Block,
    pending: Option<Target>,
    /// The current line is the first one handled since a transition.
    at_start: bool,
    /// Name and symlink flag of the last file header, for hunk headers.
    file: Option<FileTarget>,
    /// Most recent submodule name; cleared by a blank line.
    last_submodule: Option<BString>,
    output: Output,
}

impl Default for DiffParser {
    fn default() -> Self {
        Self::new(RenderOptions::default())
    }
}

impl DiffParser {
    pub fn new(options: RenderOptions) -> Self {
        Self {
            block: Block::Unknown,
            pending: None,
            at_start: false,
            file: None,
            last_submodule: None,
            output: Output {
                options,
                emphasis: Emphasis::default(),
                lines: VecDeque::new(),
            },
        }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.output.options
    }

    pub fn mode(&self) -> Mode {
        self.block.mode()
    }

    pub fn file(&self) -> Option<&FileTarget> {
        self.file.as_ref()
    }

    /// Next rendered line, oldest first.
    pub fn pop(&mut self) -> Option<BString> {
        self.output.lines.pop_front()
    }

    /// Take the lines rendered so far.
    pub fn drain(&mut self) -> impl Iterator<Item = BString> + '_ {
        self.output.lines.drain(..)
    }

    /// Process one raw line (no trailing newline, escapes allowed).
    pub fn feed(&mut self, raw: &[u8]) -> Result<()> {
        let stripped = strip_ansi(raw);
        self.at_start = false;
        if let Some(next) = self.pending.take() {
            self.transition(next);
        }

        let mut hops = 0;
        while let Step::Reparse(target) = self.dispatch(raw, &stripped)? {
            hops += 1;
            if hops > MAX_REPARSE {
                return Err(FancyError::ReparseLoop {
                    hops,
                    mode: target.mode(),
                });
            }
            self.transition(target);
        }

        if stripped.is_empty() {
            self.last_submodule = None;
        }
        Ok(())
    }

    /// End of input: close whatever block is open so its exit hook runs.
    pub fn finish(&mut self) {
        if let Some(skipped) = self.pending.take() {
            tracing::trace!(target: "fancy::mode", to = %skipped.mode(), "dropping deferred transition at end of input");
        }
        self.transition(Target::Unknown);
    }

    fn transition(&mut self, target: Target) {
        let from = self.block.mode();
        let to = target.mode();
        tracing::debug!(target: "fancy::mode", %from, %to, "transition");

        let previous = mem::take(&mut self.block);
        let carried = self.exit(previous);
        self.block = self.enter(target, carried);
        self.at_start = true;
    }

    /// Run the exit hook of `block`. A submodule header hands its record
    /// on to the commit list that may follow.
    fn exit(&mut self, block: Block) -> Option<SubmoduleRecord> {
        let mode = block.mode();
        let fancy = self.output.style() == OutputStyle::Fancy;
        let width = self.output.options.width;
        let mut carried = None;

        match block {
            Block::Unknown | Block::Meta | Block::Submodule(_) => {}
            Block::Commit(record) => {
                tracing::debug!(target: "fancy::mode", id = ?record.id, fields = record.len(), "commit closed");
                if fancy {
                    self.output.banner(&render::rule('═', width));
                }
            }
            Block::DiffHeader(change) => {
                let summary = change.summary();
                tracing::debug!(target: "fancy::mode", %summary, "file header closed");
                self.file = Some(change.target());
                if fancy {
                    self.output.banner(&summary);
                    self.output.banner(&render::rule('─', width));
                }
            }
            Block::Hunk(mut state) => {
                let two_way = state.header.is_two_way();
                self.output.flush_group(&mut state.group, two_way);
            }
            Block::SubmoduleHeader(record) => {
                if fancy {
                    self.output.banner(&record.summary());
                    self.output.banner(&render::rule('─', width));
                }
                carried = Some(record);
            }
        }

        self.output.exited(mode);
        carried
    }

    fn enter(&mut self, target: Target, carried: Option<SubmoduleRecord>) -> Block {
        self.output.entered(target.mode());
        match target {
            Target::Unknown => Block::Unknown,
            Target::Meta => Block::Meta,
            Target::Commit => Block::Commit(CommitRecord::default()),
            Target::DiffHeader => Block::DiffHeader(FileChange::default()),
            Target::Hunk(header) => Block::Hunk(HunkState {
                tracker: HunkTracker::new(&header),
                header,
                group: LineGroup::default(),
            }),
            Target::SubmoduleHeader => Block::SubmoduleHeader(SubmoduleRecord::default()),
            Target::Submodule => Block::Submodule(carried.unwrap_or_default()),
        }
    }

    fn dispatch(&mut self, raw: &[u8], stripped: &[u8]) -> Result<Step> {
        let at_start = self.at_start;
        let out = &mut self.output;

        match &mut self.block {
            Block::Unknown | Block::Meta => {}

            Block::Commit(record) => {
                if let Some((key, value)) = commit::parse_field(stripped) {
                    record.insert(key, value);
                } else if at_start {
                    record.open(stripped);
                } else {
                    return Ok(Step::Reparse(Target::Unknown));
                }
                out.echo(Mode::Commit, raw);
                return Ok(Step::Done);
            }

            Block::DiffHeader(change) => {
                match change.consume(stripped, at_start) {
                    HeaderLine::NotHeader => return Ok(Step::Reparse(Target::Unknown)),
                    HeaderLine::NewName => self.pending = Some(Target::Unknown),
                    _ => {}
                }
                out.summarized(Mode::DiffHeader, raw);
                return Ok(Step::Done);
            }

            Block::Hunk(state) => {
                let two_way = state.header.is_two_way();
                if at_start {
                    out.hunk_header(raw, self.file.as_ref(), state.header.new_range().start);
                    return Ok(Step::Done);
                }
                if hunk::is_no_newline_marker(stripped) {
                    let symlink = self.file.as_ref().is_some_and(|f| f.symlink);
                    if !out.drops_no_newline(symlink) {
                        out.flush_group(&mut state.group, two_way);
                        out.body(raw, two_way);
                    }
                    return Ok(Step::Done);
                }
                if state.tracker.is_closed() {
                    return Ok(Step::Reparse(Target::Unknown));
                }
                match state.tracker.record(stripped)? {
                    BodyLine::Foreign => {
                        tracing::debug!(target: "fancy::mode", seen = ?state.tracker.seen(), "hunk cut short");
                        return Ok(Step::Reparse(Target::Unknown));
                    }
                    BodyLine::Removed if out.groups_lines(two_way) => {
                        if state.group.has_added() {
                            out.flush_group(&mut state.group, two_way);
                        }
                        state.group.push_removed(raw);
                    }
                    BodyLine::Added if out.groups_lines(two_way) => state.group.push_added(raw),
                    _ => {
                        out.flush_group(&mut state.group, two_way);
                        out.body(raw, two_way);
                    }
                }
                return Ok(Step::Done);
            }

            Block::SubmoduleHeader(record) => {
                let Some((name, info)) = submodule::parse_line(stripped) else {
                    return Ok(Step::Reparse(Target::Unknown));
                };
                if record.name.is_none() {
                    record.name = Some(name.into());
                    self.last_submodule = Some(name.into());
                } else if record
                    .name
                    .as_ref()
                    .is_some_and(|current| current.as_slice() != name.as_bytes())
                {
                    return Ok(Step::Reparse(Target::SubmoduleHeader));
                }
                if record.absorb(info) == Absorbed::Range {
                    self.pending = Some(Target::Submodule);
                }
                out.summarized(Mode::SubmoduleHeader, raw);
                return Ok(Step::Done);
            }

            Block::Submodule(_) => {
                match stripped.first() {
                    None => {
                        out.echo(Mode::Submodule, raw);
                        self.pending = Some(Target::Unknown);
                    }
                    Some(b) if b.is_ascii_whitespace() => out.echo(Mode::Submodule, raw),
                    Some(_) => return Ok(Step::Reparse(Target::Unknown)),
                }
                return Ok(Step::Done);
            }
        }

        Ok(self.detect(raw, stripped))
    }

    /// Unknown and Meta: does a new block start here?
    fn detect(&mut self, raw: &[u8], stripped: &[u8]) -> Step {
        if let Some(header) = HunkHeader::parse(stripped) {
            return Step::Reparse(Target::Hunk(header));
        }
        if header::is_diff_start(stripped) {
            return Step::Reparse(Target::DiffHeader);
        }
        if let Some((name, _)) = submodule::parse_line(stripped) {
            let repeated = self
                .last_submodule
                .as_ref()
                .is_some_and(|last| last.as_slice() == name.as_bytes());
            if !repeated {
                return Step::Reparse(Target::SubmoduleHeader);
            }
        }
        if commit::is_commit_start(stripped) {
            return Step::Reparse(Target::Commit);
        }

        if matches!(self.block, Block::Unknown) {
            self.transition(Target::Meta);
        }
        self.output.echo(Mode::Meta, raw);
        Step::Done
    }
}
