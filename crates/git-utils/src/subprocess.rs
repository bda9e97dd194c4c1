use std::ffi::{OsStr, OsString};
use std::io::{BufReader, BufWriter, Write};
use std::process::{Child, ChildStdout, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;

use crate::error::UtilError;
use crate::Result;

/// Result of running a subprocess.
#[derive(Debug)]
pub struct GitCommandResult {
    /// The exit status.
    pub status: ExitStatus,
    /// Captured stdout.
    pub stdout: Vec<u8>,
    /// Captured stderr.
    pub stderr: Vec<u8>,
}

impl GitCommandResult {
    /// Returns true if the process exited successfully.
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Stdout as text with the trailing newline removed, or `None` when the
    /// command failed or printed nothing.
    pub fn trimmed_stdout(&self) -> Option<String> {
        if !self.success() {
            return None;
        }
        let text = String::from_utf8_lossy(&self.stdout);
        let text = text.trim_end_matches(['\n', '\r']);
        (!text.is_empty()).then(|| text.to_string())
    }
}

/// Builder for short-lived helper processes (`git config`, `git describe`).
///
/// Helpers never read input: stdin is `/dev/null` and both output
/// streams are captured.
pub struct GitCommand {
    program: OsString,
    args: Vec<OsString>,
}

impl GitCommand {
    /// Create a new command builder for the given program.
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
        }
    }

    /// A `git` invocation with captured output.
    pub fn git() -> Self {
        Self::new("git")
    }

    /// Add an argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Add multiple arguments.
    pub fn args(mut self, args: impl IntoIterator<Item = impl AsRef<OsStr>>) -> Self {
        for arg in args {
            self.args.push(arg.as_ref().to_os_string());
        }
        self
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }

    /// Get the command string for error messages.
    fn command_string(&self) -> String {
        let mut s = self.program.to_string_lossy().to_string();
        for arg in &self.args {
            s.push(' ');
            s.push_str(&arg.to_string_lossy());
        }
        s
    }

    /// Run the command to completion, capturing output.
    pub fn run(&self) -> Result<GitCommandResult> {
        let output = self
            .build_command()
            .output()
            .map_err(|e| UtilError::Subprocess {
                command: self.command_string(),
                source: e,
            })?;
        Ok(GitCommandResult {
            status: output.status,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

/// A line-rewriting filter process fed from a background thread.
///
/// One thread copies the input lines into the filter's stdin while the
/// caller reads the filter's stdout. Servicing both pipes from a single
/// thread can deadlock once the filter fills its output pipe while we are
/// still blocked writing its input.
pub struct FilterProcess {
    child: Child,
    command: String,
    writer: Option<JoinHandle<()>>,
}

impl FilterProcess {
    /// Start `sh -c <command>` and begin feeding it `lines`, each followed by `\n`.
    ///
    /// Stdin is closed once `lines` is exhausted. A write error (the filter
    /// exited early) stops the feeder; the reader then sees EOF.
    pub fn spawn<I, L>(command: &str, lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = L> + Send + 'static,
        L: AsRef<[u8]>,
    {
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|e| UtilError::Subprocess {
                command: command.to_string(),
                source: e,
            })?;

        let stdin = child.stdin.take().ok_or_else(|| UtilError::MissingPipe {
            command: command.to_string(),
            stream: "stdin",
        })?;

        let name = command.to_string();
        let writer = std::thread::Builder::new()
            .name("filter-feed".to_string())
            .spawn(move || {
                let mut sink = BufWriter::new(stdin);
                for line in lines {
                    let written = sink
                        .write_all(line.as_ref())
                        .and_then(|()| sink.write_all(b"\n"));
                    if let Err(e) = written {
                        tracing::debug!(target: "fancy::filter", command = %name, error = %e, "filter_input_closed");
                        return;
                    }
                }
                if let Err(e) = sink.flush() {
                    tracing::debug!(target: "fancy::filter", command = %name, error = %e, "filter_flush_failed");
                }
            })?;

        Ok(Self {
            child,
            command: command.to_string(),
            writer: Some(writer),
        })
    }

    /// Take the filter's stdout. Can only be taken once.
    pub fn take_output(&mut self) -> Result<BufReader<ChildStdout>> {
        self.child
            .stdout
            .take()
            .map(BufReader::new)
            .ok_or_else(|| UtilError::MissingPipe {
                command: self.command.clone(),
                stream: "stdout",
            })
    }

    /// Join the feeder thread and reap the filter.
    pub fn wait(mut self) -> Result<ExitStatus> {
        if let Some(writer) = self.writer.take() {
            writer
                .join()
                .map_err(|_| UtilError::FilterWriterPanicked {
                    command: self.command.clone(),
                })?;
        }
        self.child.wait().map_err(|e| UtilError::Subprocess {
            command: self.command.clone(),
            source: e,
        })
    }
}

/// The external intraline highlighter: `DIFF_HIGHLIGHT` or `diff-highlight` on PATH.
pub fn highlight_filter_command() -> String {
    std::env::var("DIFF_HIGHLIGHT")
        .ok()
        .filter(|cmd| !cmd.trim().is_empty())
        .unwrap_or_else(|| "diff-highlight".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufRead;

    #[test]
    fn run_echo() {
        let result = GitCommand::new("echo").arg("hello").run().unwrap();

        assert!(result.success());
        assert_eq!(result.trimmed_stdout().as_deref(), Some("hello"));
    }

    #[test]
    fn capture_stderr() {
        let result = GitCommand::new("sh")
            .arg("-c")
            .arg("echo error >&2")
            .run()
            .unwrap();

        assert!(result.success());
        assert_eq!(result.stderr.trim_ascii(), b"error");
    }

    #[test]
    fn failed_command_has_no_trimmed_stdout() {
        let result = GitCommand::new("sh")
            .args(["-c", "echo partial; exit 3"])
            .run()
            .unwrap();

        assert_eq!(result.status.code(), Some(3));
        assert_eq!(result.trimmed_stdout(), None);
    }

    #[test]
    fn helpers_get_null_stdin() {
        // `cat` would block on an inherited terminal or pipe.
        let result = GitCommand::new("cat").run().unwrap();

        assert!(result.success());
        assert!(result.stdout.is_empty());
    }

    #[test]
    fn filter_round_trips_lines() {
        let lines = vec!["-old".to_string(), "+new".to_string()];
        let mut filter = FilterProcess::spawn("cat", lines).unwrap();
        let out: Vec<String> = filter
            .take_output()
            .unwrap()
            .lines()
            .map(|l| l.unwrap())
            .collect();
        assert_eq!(out, vec!["-old", "+new"]);
        assert!(filter.wait().unwrap().success());
    }

    #[test]
    fn filter_larger_than_pipe_buffer_does_not_deadlock() {
        // `sort` reads everything before writing, so input and output
        // buffers are both full at once.
        let lines: Vec<String> = (0..20_000).map(|i| format!("{:08} padding padding", i)).collect();
        let mut filter = FilterProcess::spawn("sort -r", lines).unwrap();
        let count = filter.take_output().unwrap().lines().count();
        assert_eq!(count, 20_000);
        filter.wait().unwrap();
    }

    #[test]
    fn filter_that_exits_early_yields_eof() {
        let lines: Vec<String> = (0..50_000).map(|i| i.to_string()).collect();
        let mut filter = FilterProcess::spawn("head -n 2", lines).unwrap();
        let out: Vec<String> = filter
            .take_output()
            .unwrap()
            .lines()
            .map(|l| l.unwrap())
            .collect();
        assert_eq!(out, vec!["0", "1"]);
        filter.wait().unwrap();
    }

    #[test]
    fn output_can_only_be_taken_once() {
        let mut filter = FilterProcess::spawn("cat", Vec::<String>::new()).unwrap();
        assert!(filter.take_output().is_ok());
        assert!(matches!(
            filter.take_output(),
            Err(UtilError::MissingPipe { stream: "stdout", .. })
        ));
        filter.wait().unwrap();
    }
}
