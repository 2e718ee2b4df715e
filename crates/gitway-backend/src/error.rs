//! Backend bridge error types.

use std::process::ExitStatus;
use thiserror::Error;

/// Errors from invoking the version-control backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend process could not be started.
    #[error("failed to spawn backend {program:?}: {source}")]
    Spawn {
        /// Program that was invoked.
        program: String,
        /// Underlying spawn error.
        #[source]
        source: std::io::Error,
    },

    /// A stdio pipe to the backend was not available.
    #[error("backend {0} pipe unavailable")]
    Pipe(&'static str),

    /// The backend exited unsuccessfully before any output was committed.
    #[error("backend exited with {status}: {stderr}")]
    Exited {
        /// Process exit status.
        status: ExitStatus,
        /// Captured stderr, trimmed.
        stderr: String,
    },

    /// I/O error on a backend pipe.
    #[error("backend I/O error: {0}")]
    Io(#[from] std::io::Error),
}
