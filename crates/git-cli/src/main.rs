mod config;
mod input;
mod logging;

use std::io::{self, BufWriter, IsTerminal, Write};
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{error::ErrorKind, Parser};
use git_fancy::{write_fancy, ByteLines, FancyError, OutputStyle, RenderOptions, SymlinkNoNewline};
use git_utils::cli::TerminalOptions;
use git_utils::color::{use_color, ColorMode};
use git_utils::describe::{describe, DescribeStrategy};
use git_utils::pager::{pager_in_use, spawn_pager, term_columns, PagerSources};
use git_utils::subprocess::{highlight_filter_command, FilterProcess};

use config::{Highlight, Settings};

#[derive(Parser)]
#[command(
    name = "diff-fancy",
    about = "Reformat git diff and git log -p output for reading",
    version = env!("CARGO_PKG_VERSION")
)]
pub struct Cli {
    #[command(flatten)]
    terminal: TerminalOptions,

    /// Intraline highlighter to run over paired hunk lines
    #[arg(long, value_enum, value_name = "how")]
    highlight: Option<Highlight>,

    /// Label every line with the parser mode
    #[arg(long)]
    debug: bool,

    /// Only summarize headers: no color, no pager, no highlighting
    #[arg(long)]
    raw: bool,

    /// Keep "\ No newline at end of file" in symlink diffs
    #[arg(long, overrides_with = "no_symlink_no_newline")]
    symlink_no_newline: bool,

    /// Drop "\ No newline at end of file" in symlink diffs
    #[arg(long, overrides_with = "symlink_no_newline")]
    no_symlink_no_newline: bool,

    /// Print a human name for <rev> and exit
    #[arg(long, value_name = "rev")]
    describe: Option<String>,

    /// Naming strategy for --describe
    #[arg(long, value_name = "strategy", default_value = "magic", requires = "describe")]
    strategy: String,

    /// With --describe, fall back to the abbreviated object id
    #[arg(long, requires = "describe")]
    always: bool,

    /// Diff files to read; stdin when none or "-"
    files: Vec<PathBuf>,
}

impl Cli {
    fn symlink_policy(&self, settings: &Settings) -> SymlinkNoNewline {
        let keep = if self.symlink_no_newline {
            true
        } else if self.no_symlink_no_newline {
            false
        } else {
            settings.symlink_no_newline.unwrap_or(false)
        };
        if keep {
            SymlinkNoNewline::Keep
        } else {
            SymlinkNoNewline::Suppress
        }
    }
}

fn main() {
    let cli = match Cli::try_parse_from(std::env::args_os()) {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => process::exit(0),
                _ => process::exit(128),
            }
        }
    };

    logging::init();

    match run(cli) {
        Ok(code) => process::exit(code),
        Err(e) if is_broken_pipe(&e) => process::exit(0),
        Err(e) => {
            eprintln!("fatal: {e:#}");
            process::exit(128);
        }
    }
}

/// The reader went away (`| head`, pager quit early).
fn is_broken_pipe(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        let io_err = match cause.downcast_ref::<FancyError>() {
            Some(FancyError::Io(e)) => Some(e),
            _ => cause.downcast_ref::<io::Error>(),
        };
        io_err.is_some_and(|e| e.kind() == io::ErrorKind::BrokenPipe)
    })
}

fn run(cli: Cli) -> Result<i32> {
    if let Some(rev) = &cli.describe {
        return run_describe(rev, &cli.strategy, cli.always);
    }

    let settings = Settings::load();
    let stdout_tty = io::stdout().is_terminal();

    let color = if cli.raw {
        false
    } else {
        let mode = settings
            .color
            .effective_mode("diff", cli.terminal.color.map(ColorMode::from));
        // Under git's own pager stdout is a pipe, but the user is on a terminal.
        use_color(mode, stdout_tty || pager_in_use())
    };
    let highlight = if cli.raw {
        Highlight::Off
    } else {
        cli.highlight.or(settings.highlight).unwrap_or_default()
    };
    let paging = !cli.raw
        && !pager_in_use()
        && cli.terminal.paging().or(settings.pager).unwrap_or(true);

    // One column less than the terminal, so rules never wrap in the pager.
    let width = cli.terminal.width.unwrap_or_else(term_columns).saturating_sub(1);

    let options = RenderOptions {
        color,
        width,
        style: if cli.debug { OutputStyle::Debug } else { OutputStyle::Fancy },
        highlight: highlight == Highlight::Builtin,
        symlink_no_newline: cli.symlink_policy(&settings),
    };
    tracing::debug!(
        target: "fancy::cli",
        color,
        width,
        ?highlight,
        paging,
        "resolved options"
    );

    let readers = input::open_all(&cli.files)?;

    let mut pager = if paging {
        spawn_pager(&PagerSources::from_env(settings.pager_command.clone()))?
    } else {
        None
    };
    if let Some(pager) = &pager {
        tracing::debug!(target: "fancy::cli", command = pager.pager_cmd(), "paging");
    }

    {
        let sink: Box<dyn Write + '_> = match pager.as_mut().and_then(|p| p.stdin()) {
            Some(stdin) => Box::new(stdin),
            None => Box::new(io::stdout().lock()),
        };
        let mut out = BufWriter::new(sink);

        if highlight == Highlight::External {
            render_through_filter(input::lines(readers), options, &mut out)?;
        } else {
            write_fancy(input::lines(readers), options, &mut out)?;
        }
    }

    if let Some(pager) = pager {
        pager.wait()?;
    }
    Ok(0)
}

/// Feed the raw input to the external highlighter and render what it prints.
fn render_through_filter<I>(lines: I, options: RenderOptions, out: &mut dyn Write) -> Result<()>
where
    I: Iterator<Item = bstr::BString> + Send + 'static,
{
    let command = highlight_filter_command();
    let mut filter = FilterProcess::spawn(&command, lines)?;
    let rendered = filter
        .take_output()
        .map_err(anyhow::Error::from)
        .and_then(|output| Ok(write_fancy(ByteLines::new(output), options, out)?));

    let status = filter.wait()?;
    rendered?;
    if !status.success() {
        tracing::warn!(target: "fancy::cli", %command, %status, "highlight filter failed");
    }
    Ok(())
}

fn run_describe(rev: &str, strategy: &str, always: bool) -> Result<i32> {
    let strategy: DescribeStrategy = strategy
        .parse()
        .with_context(|| format!("invalid --strategy '{strategy}'"))?;
    match describe(rev, strategy, always)? {
        Some(name) => {
            println!("{name}");
            Ok(0)
        }
        None => Ok(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("diff-fancy").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults() {
        let cli = parse(&[]);
        assert!(!cli.debug);
        assert!(!cli.raw);
        assert_eq!(cli.highlight, None);
        assert!(cli.files.is_empty());
        assert_eq!(cli.strategy, "magic");
    }

    #[test]
    fn highlight_values() {
        assert_eq!(parse(&["--highlight", "external"]).highlight, Some(Highlight::External));
        assert_eq!(parse(&["--highlight", "off"]).highlight, Some(Highlight::Off));
        assert!(Cli::try_parse_from(["diff-fancy", "--highlight", "maybe"]).is_err());
    }

    #[test]
    fn symlink_flag_beats_config() {
        let keep = Settings::from_lookup(|k| (k == "diff-fancy.symlinkNoNewline").then(|| "true".into()));
        let none = Settings::from_lookup(|_| None);

        assert_eq!(parse(&[]).symlink_policy(&none), SymlinkNoNewline::Suppress);
        assert_eq!(parse(&[]).symlink_policy(&keep), SymlinkNoNewline::Keep);
        assert_eq!(
            parse(&["--no-symlink-no-newline"]).symlink_policy(&keep),
            SymlinkNoNewline::Suppress
        );
        assert_eq!(
            parse(&["--no-symlink-no-newline", "--symlink-no-newline"]).symlink_policy(&none),
            SymlinkNoNewline::Keep
        );
    }

    #[test]
    fn strategy_needs_describe() {
        assert!(Cli::try_parse_from(["diff-fancy", "--strategy", "tags"]).is_err());
        let cli = parse(&["--describe", "HEAD", "--strategy", "tags", "--always"]);
        assert_eq!(cli.describe.as_deref(), Some("HEAD"));
        assert!(cli.always);
    }

    #[test]
    fn files_are_positional() {
        let cli = parse(&["--raw", "a.diff", "-"]);
        assert!(cli.raw);
        assert_eq!(cli.files, [PathBuf::from("a.diff"), PathBuf::from("-")]);
    }

    #[test]
    fn broken_pipe_is_recognized_through_fancy_errors() {
        let err = anyhow::Error::from(FancyError::Io(io::Error::from(io::ErrorKind::BrokenPipe)));
        assert!(is_broken_pipe(&err));
        let err = anyhow::Error::from(io::Error::from(io::ErrorKind::NotFound));
        assert!(!is_broken_pipe(&err));
    }
}
