//! Human names for detached HEADs and arbitrary revisions.
//!
//! Several `git describe` flavours are available; [`DescribeStrategy::Magic`]
//! runs two of them and keeps the shorter answer. That choice is a heuristic,
//! so it lives here as a selectable strategy rather than a fixed rule.

use std::str::FromStr;

use crate::error::UtilError;
use crate::subprocess::GitCommand;
use crate::Result;

/// How to name a revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DescribeStrategy {
    /// `rev-parse --short`
    Sha,
    /// `describe`
    Describe,
    /// `describe --contains`
    Contains,
    /// `describe --tags`
    Tags,
    /// `describe --tags --exact-match`
    ExactTags,
    /// `describe --all`
    All,
    /// `describe --contains --all`
    ContainsAll,
    /// `describe --all`, falling back to `describe --contains --all`
    AllThenContains,
    /// `describe --contains --all`, falling back to `describe --all`
    ContainsThenAll,
    /// Shorter of `describe --contains --all` and `describe --all`
    #[default]
    Magic,
    /// `rev-parse --abbrev-ref --symbolic-full-name`
    SymbolicName,
}

impl FromStr for DescribeStrategy {
    type Err = UtilError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "sha" => Self::Sha,
            "describe" => Self::Describe,
            "contains" => Self::Contains,
            "tags" => Self::Tags,
            "exact-tags" | "match" => Self::ExactTags,
            "all" => Self::All,
            "contains-all" => Self::ContainsAll,
            "all-contains" => Self::AllThenContains,
            "contains-then-all" => Self::ContainsThenAll,
            "magic" => Self::Magic,
            "name" | "symbolic" => Self::SymbolicName,
            other => return Err(UtilError::UnknownStrategy(other.to_string())),
        })
    }
}

/// The `Magic` choice between two candidate names.
///
/// Keeps the shorter one; an empty candidate always loses to a non-empty one.
pub fn choose_magic(contains_all: Option<String>, all: Option<String>) -> Option<String> {
    match (contains_all, all) {
        (Some(a), Some(b)) => Some(if a.len() < b.len() { a } else { b }),
        (a, b) => a.or(b),
    }
}

fn git_name(args: &[&str], rev: &str) -> Result<Option<String>> {
    Ok(GitCommand::git().args(args).arg(rev).run()?.trimmed_stdout())
}

/// Name `rev` using `strategy`.
///
/// With `always`, an empty answer falls back to the abbreviated object id.
pub fn describe(rev: &str, strategy: DescribeStrategy, always: bool) -> Result<Option<String>> {
    let name = match strategy {
        DescribeStrategy::Sha => git_name(&["rev-parse", "--short"], rev)?,
        DescribeStrategy::Describe => git_name(&["describe"], rev)?,
        DescribeStrategy::Contains => git_name(&["describe", "--contains"], rev)?,
        DescribeStrategy::Tags => git_name(&["describe", "--tags"], rev)?,
        DescribeStrategy::ExactTags => git_name(&["describe", "--tags", "--exact-match"], rev)?,
        DescribeStrategy::All => git_name(&["describe", "--all"], rev)?,
        DescribeStrategy::ContainsAll => git_name(&["describe", "--contains", "--all"], rev)?,
        DescribeStrategy::AllThenContains => match git_name(&["describe", "--all"], rev)? {
            Some(name) => Some(name),
            None => git_name(&["describe", "--contains", "--all"], rev)?,
        },
        DescribeStrategy::ContainsThenAll => {
            match git_name(&["describe", "--contains", "--all"], rev)? {
                Some(name) => Some(name),
                None => git_name(&["describe", "--all"], rev)?,
            }
        }
        DescribeStrategy::Magic => choose_magic(
            git_name(&["describe", "--contains", "--all"], rev)?,
            git_name(&["describe", "--all"], rev)?,
        ),
        DescribeStrategy::SymbolicName => {
            git_name(&["rev-parse", "--abbrev-ref", "--symbolic-full-name"], rev)?
        }
    };

    match name {
        None if always => git_name(&["rev-parse", "--short"], rev),
        name => Ok(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_prefers_shorter() {
        let got = choose_magic(Some("master~2".into()), Some("heads/master".into()));
        assert_eq!(got.as_deref(), Some("master~2"));
    }

    #[test]
    fn magic_tie_keeps_describe_all() {
        let got = choose_magic(Some("aaaa".into()), Some("bbbb".into()));
        assert_eq!(got.as_deref(), Some("bbbb"));
    }

    #[test]
    fn magic_prefers_non_empty() {
        assert_eq!(
            choose_magic(None, Some("tags/v1.0".into())).as_deref(),
            Some("tags/v1.0")
        );
        assert_eq!(
            choose_magic(Some("v1.0~3".into()), None).as_deref(),
            Some("v1.0~3")
        );
        assert_eq!(choose_magic(None, None), None);
    }

    #[test]
    fn parse_strategy_names() {
        assert_eq!("magic".parse::<DescribeStrategy>().unwrap(), DescribeStrategy::Magic);
        assert_eq!("match".parse::<DescribeStrategy>().unwrap(), DescribeStrategy::ExactTags);
        assert_eq!(DescribeStrategy::default(), DescribeStrategy::Magic);
        assert!(matches!(
            "nope".parse::<DescribeStrategy>(),
            Err(UtilError::UnknownStrategy(s)) if s == "nope"
        ));
    }
}
