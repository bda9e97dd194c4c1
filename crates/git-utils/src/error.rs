/// Base error type for git-utils operations.
#[derive(Debug, thiserror::Error)]
pub enum UtilError {
    #[error("subprocess failed: {command}: {source}")]
    Subprocess {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("subprocess '{command}' has no {stream} pipe")]
    MissingPipe {
        command: String,
        stream: &'static str,
    },

    #[error("filter writer thread for '{command}' panicked")]
    FilterWriterPanicked { command: String },

    #[error("unknown describe strategy: {0}")]
    UnknownStrategy(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
