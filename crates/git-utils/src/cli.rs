//! Terminal-output options shared by the binaries, built on clap.
//!
//! - Color mode is accepted as `--color=<when>` (auto/always/never)
//! - Paging is toggled with `--pager` / `--no-pager`; the last one wins
//! - `--width` overrides terminal width detection

use crate::color::ColorMode;

/// Options controlling how output reaches the terminal.
#[derive(Debug, Clone, clap::Args)]
pub struct TerminalOptions {
    /// Colorize output.
    #[arg(long, value_name = "when")]
    pub color: Option<ColorWhen>,

    /// Page output through $GIT_PAGER / core.pager / $PAGER / less.
    #[arg(long, overrides_with = "no_pager")]
    pub pager: bool,

    /// Write straight to stdout.
    #[arg(long, overrides_with = "pager")]
    pub no_pager: bool,

    /// Terminal width used for banner rules.
    #[arg(long, value_name = "columns")]
    pub width: Option<usize>,
}

impl TerminalOptions {
    /// The explicit paging choice, if either flag was given.
    pub fn paging(&self) -> Option<bool> {
        match (self.pager, self.no_pager) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

/// Color mode argument matching C git's `--color=<when>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ColorWhen {
    /// Auto-detect based on terminal.
    Auto,
    /// Always use color.
    Always,
    /// Never use color.
    Never,
}

impl From<ColorWhen> for ColorMode {
    fn from(when: ColorWhen) -> Self {
        match when {
            ColorWhen::Auto => ColorMode::Auto,
            ColorWhen::Always => ColorMode::Always,
            ColorWhen::Never => ColorMode::Never,
        }
    }
}
