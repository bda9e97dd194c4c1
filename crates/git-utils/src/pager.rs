use std::io::{self, IsTerminal};
use std::process::{Child, ChildStdin, Command, Stdio};

use crate::error::UtilError;
use crate::Result;

/// Where the pager command came from, in priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagerSources {
    /// `DIFF_FANCY_PAGER` environment variable.
    pub fancy_env: Option<String>,
    /// `GIT_PAGER` environment variable.
    pub git_env: Option<String>,
    /// `core.pager` git config value.
    pub config: Option<String>,
    /// `PAGER` environment variable.
    pub pager_env: Option<String>,
}

impl PagerSources {
    /// Read the environment half of the sources; `config` comes from the caller.
    pub fn from_env(config: Option<String>) -> Self {
        Self {
            fancy_env: std::env::var("DIFF_FANCY_PAGER").ok(),
            git_env: std::env::var("GIT_PAGER").ok(),
            config,
            pager_env: std::env::var("PAGER").ok(),
        }
    }

    /// Pick the pager command. `None` means "do not page".
    ///
    /// The first source that is set wins even when it is empty, so
    /// `GIT_PAGER=` disables paging the same way `GIT_PAGER=cat` does.
    pub fn resolve(&self) -> Option<String> {
        let chosen = self
            .fancy_env
            .as_deref()
            .or(self.git_env.as_deref())
            .or(self.config.as_deref())
            .or(self.pager_env.as_deref())
            .unwrap_or("less");
        let chosen = chosen.trim();
        if chosen.is_empty() || chosen == "cat" {
            None
        } else {
            Some(chosen.to_string())
        }
    }
}

/// Spawn the pager for stdout, when stdout is a terminal and a pager is configured.
///
/// The caller writes the rendered diff into [`PagerGuard::stdin`].
pub fn spawn_pager(sources: &PagerSources) -> Result<Option<PagerGuard>> {
    if !io::stdout().is_terminal() {
        return Ok(None);
    }
    let Some(pager_cmd) = sources.resolve() else {
        return Ok(None);
    };

    // Colors are already in the stream, so less needs -R.
    let child = Command::new("sh")
        .arg("-c")
        .arg(&pager_cmd)
        .stdin(Stdio::piped())
        .env("GIT_PAGER_IN_USE", "true")
        .env("LESS", std::env::var("LESS").unwrap_or_else(|_| "FRX".to_string()))
        .env("LV", std::env::var("LV").unwrap_or_else(|_| "-c".to_string()))
        .spawn()
        .map_err(|e| UtilError::Subprocess {
            command: format!("pager: {}", pager_cmd),
            source: e,
        })?;

    Ok(Some(PagerGuard { child, pager_cmd }))
}

/// Check if we are already running under a pager (`GIT_PAGER_IN_USE`).
pub fn pager_in_use() -> bool {
    std::env::var_os("GIT_PAGER_IN_USE").is_some()
}

/// Get the terminal column width.
///
/// Checks `COLUMNS` env var first, then queries the terminal.
/// Falls back to 80 if detection fails.
pub fn term_columns() -> usize {
    if let Some(cols) = std::env::var("COLUMNS")
        .ok()
        .and_then(|val| val.parse::<usize>().ok())
        .filter(|&cols| cols > 0)
    {
        return cols;
    }

    #[cfg(unix)]
    {
        use std::mem::MaybeUninit;
        unsafe {
            let mut ws = MaybeUninit::<libc::winsize>::zeroed().assume_init();
            if libc::ioctl(libc::STDERR_FILENO, libc::TIOCGWINSZ, &mut ws) == 0 && ws.ws_col > 0 {
                return ws.ws_col as usize;
            }
        }
    }

    80
}

/// RAII guard for a pager subprocess.
///
/// When dropped, closes the pager's input and waits for it to exit.
pub struct PagerGuard {
    child: Child,
    pager_cmd: String,
}

impl PagerGuard {
    /// The pager's stdin, where output should be written.
    pub fn stdin(&mut self) -> Option<&mut ChildStdin> {
        self.child.stdin.as_mut()
    }

    /// Get the pager command that was used.
    pub fn pager_cmd(&self) -> &str {
        &self.pager_cmd
    }

    /// Close the pager's input and wait for the user to quit it.
    pub fn wait(mut self) -> Result<()> {
        drop(self.child.stdin.take());
        self.child.wait().map_err(|e| UtilError::Subprocess {
            command: format!("pager: {}", self.pager_cmd),
            source: e,
        })?;
        Ok(())
    }
}

impl Drop for PagerGuard {
    fn drop(&mut self) {
        drop(self.child.stdin.take());
        let _ = self.child.wait();
    }
}
