use std::io::{self, IsTerminal};

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `fancy::mode=debug`.
pub const LOG_ENV: &str = "DIFF_FANCY_LOG";

/// Install the stderr subscriber. Only warnings show unless `DIFF_FANCY_LOG`
/// says otherwise.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    // Fails only when a subscriber is already installed.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .try_init();
}
