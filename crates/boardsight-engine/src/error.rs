use std::path::PathBuf;
use std::time::Duration;

/// Errors from the engine collaborator. None of them are fatal to a
/// monitoring session once it is running.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("engine binary not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to start engine {}: {source}", path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("engine I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("engine did not answer {waiting_for:?} within {elapsed:?}")]
    Timeout {
        waiting_for: &'static str,
        elapsed: Duration,
    },

    #[error("engine closed its output while waiting for {0:?}")]
    UnexpectedEof(&'static str),

    #[error("malformed engine response: {0}")]
    Protocol(String),

    #[error("engine is not running")]
    NotRunning,
}

impl EngineError {
    /// Whether a restart could plausibly help. Missing binaries do not fix
    /// themselves.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, EngineError::NotFound(_))
    }
}
