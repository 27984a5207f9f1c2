//! Error types.

use thiserror::Error;

/// Result alias for netwatch operations.
pub type Result<T> = std::result::Result<T, NetwatchError>;

/// Errors returned by netwatch operations.
///
/// Inside the monitor loop every one of these is handled locally — logged
/// and turned into a continuation decision — so none of them abort a run.
#[derive(Debug, Error)]
pub enum NetwatchError {
    /// Filesystem I/O failed (typically while reading the config file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An external command could not be spawned at all.
    ///
    /// A command that spawned but exited non-zero is *not* an error; that is
    /// reported through [`CmdOutput::success`](crate::runner::CmdOutput).
    #[error("failed to run {program}: {detail}")]
    CommandFailed {
        /// The program that could not be started.
        program: String,
        /// The underlying spawn failure.
        detail: String,
    },

    /// Invalid configuration values.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}
