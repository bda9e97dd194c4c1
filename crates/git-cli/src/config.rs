//! Settings read from git config.
//!
//! Every key is optional; command-line flags override whatever is found
//! here and built-in defaults fill the rest.

use git_utils::color::ColorConfig;
use git_utils::subprocess::GitCommand;

/// Which intraline highlighter runs over the hunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Highlight {
    /// The builtin prefix/suffix highlighter.
    #[default]
    Builtin,
    /// Pipe the input through `$DIFF_HIGHLIGHT` (or `diff-highlight`) first.
    External,
    /// No intraline highlighting.
    Off,
}

impl Highlight {
    fn from_config(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "builtin" => Some(Self::Builtin),
            "external" => Some(Self::External),
            "off" | "none" => Some(Self::Off),
            other => parse_bool(other).map(|on| if on { Self::Builtin } else { Self::Off }),
        }
    }
}

/// Git's boolean spellings. `None` for anything else.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" | "" => Some(false),
        _ => None,
    }
}

pub struct Settings {
    /// `color.ui` and `color.diff`.
    pub color: ColorConfig,
    /// `diff-fancy.highlight`
    pub highlight: Option<Highlight>,
    /// `diff-fancy.pager`
    pub pager: Option<bool>,
    /// `core.pager`
    pub pager_command: Option<String>,
    /// `diff-fancy.symlinkNoNewline`
    pub symlink_no_newline: Option<bool>,
}

impl Settings {
    /// Read settings from the git config visible in the current directory.
    pub fn load() -> Self {
        Self::from_lookup(git_config)
    }

    /// Read settings through a config lookup function.
    pub fn from_lookup<F>(get_string: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let color = ColorConfig::from_config(&get_string);
        let highlight = get_string("diff-fancy.highlight").and_then(|value| {
            let parsed = Highlight::from_config(&value);
            if parsed.is_none() {
                tracing::warn!(target: "fancy::cli", %value, "ignoring diff-fancy.highlight");
            }
            parsed
        });
        Self {
            color,
            highlight,
            pager: get_string("diff-fancy.pager").and_then(|v| parse_bool(&v)),
            pager_command: get_string("core.pager"),
            symlink_no_newline: get_string("diff-fancy.symlinkNoNewline").and_then(|v| parse_bool(&v)),
        }
    }
}

/// `git config --get <key>`. Missing keys, a missing git binary and
/// running outside a repository all read as unset.
fn git_config(key: &str) -> Option<String> {
    match GitCommand::git().args(["config", "--get", key]).run() {
        Ok(result) => result.trimmed_stdout(),
        Err(e) => {
            tracing::debug!(target: "fancy::cli", key, error = %e, "git config unavailable");
            None
        }
    }
}
