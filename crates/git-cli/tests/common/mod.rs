//! Shared harness for diff-fancy integration tests.
//!
//! Runs the built binary with a pinned environment so user config, pagers
//! and color settings on the test machine never leak into the output.

#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

// ──────────────────────────── Types ────────────────────────────

/// Captured output from running a command.
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandResult {
    pub fn lines(&self) -> Vec<&str> {
        self.stdout.lines().collect()
    }
}

// ──────────────────────────── Binary Discovery ────────────────────────────

pub fn diff_fancy_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_diff-fancy"))
}

// ──────────────────────────── Process Runners ────────────────────────────

fn pin_env(cmd: &mut Command, dir: &Path) {
    cmd.env("HOME", dir)
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .env("GIT_CONFIG_GLOBAL", dir.join(".gitconfig"))
        .env("GIT_CEILING_DIRECTORIES", dir.parent().unwrap_or(dir))
        .env("LC_ALL", "C")
        .env("LANG", "C")
        .env_remove("NO_COLOR")
        .env_remove("GIT_NO_COLOR")
        .env_remove("GIT_PAGER_IN_USE")
        .env_remove("DIFF_FANCY_LOG")
        .env_remove("DIFF_HIGHLIGHT")
        .env_remove("COLUMNS");
}

/// Run diff-fancy in `dir` with an empty stdin.
pub fn diff_fancy(dir: &Path, args: &[&str]) -> CommandResult {
    diff_fancy_stdin(dir, args, b"")
}

/// Run diff-fancy in `dir`, feeding `stdin_bytes` on stdin.
pub fn diff_fancy_stdin(dir: &Path, args: &[&str], stdin_bytes: &[u8]) -> CommandResult {
    diff_fancy_env(dir, args, stdin_bytes, &[])
}

/// Like [`diff_fancy_stdin`] with extra environment variables.
pub fn diff_fancy_env(
    dir: &Path,
    args: &[&str],
    stdin_bytes: &[u8],
    env: &[(&str, &str)],
) -> CommandResult {
    let mut cmd = Command::new(diff_fancy_bin());
    cmd.args(args)
        .current_dir(dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    pin_env(&mut cmd, dir);
    for (key, val) in env {
        cmd.env(key, val);
    }
    let mut child = cmd.spawn().expect("failed to spawn diff-fancy");
    {
        let mut stdin = child.stdin.take().unwrap();
        stdin.write_all(stdin_bytes).unwrap();
    }
    let output = child.wait_with_output().expect("failed to wait for diff-fancy");
    CommandResult {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        exit_code: output.status.code().unwrap_or(128),
    }
}

/// Run C git in `dir` with the same pinned environment.
pub fn git(dir: &Path, args: &[&str]) -> CommandResult {
    let mut cmd = Command::new("git");
    cmd.args(args).current_dir(dir);
    pin_env(&mut cmd, dir);
    cmd.env("GIT_AUTHOR_NAME", "Test Author")
        .env("GIT_AUTHOR_EMAIL", "test@example.com")
        .env("GIT_AUTHOR_DATE", "1234567890 +0000")
        .env("GIT_COMMITTER_NAME", "Test Committer")
        .env("GIT_COMMITTER_EMAIL", "test@example.com")
        .env("GIT_COMMITTER_DATE", "1234567890 +0000")
        .env("TZ", "UTC");
    let output = cmd.output().expect("failed to run git");
    CommandResult {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        exit_code: output.status.code().unwrap_or(128),
    }
}

// ──────────────────────────── Assertion Helpers ────────────────────────────

pub fn assert_success(result: &CommandResult) {
    if result.exit_code != 0 {
        panic!(
            "diff-fancy exited with {}:\n--- stdout ---\n{}\n--- stderr ---\n{}",
            result.exit_code, result.stdout, result.stderr,
        );
    }
}

// ──────────────────────────── Fixtures ────────────────────────────

/// Write `content` to `dir/name` and return the path.
pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

/// A single-file modification with one hunk.
pub const SIMPLE_DIFF: &str = "\
diff --git a/src/lib.rs b/src/lib.rs
index 1111111..2222222 100644
--- a/src/lib.rs
+++ b/src/lib.rs
@@ -3,2 +3,2 @@ fn main()
 keep();
-let x = 1;
+let x = 2;
";
