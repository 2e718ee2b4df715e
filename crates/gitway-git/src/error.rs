//! Git protocol error types.

use thiserror::Error;

/// Errors that can occur while encoding or decoding protocol frames.
#[derive(Debug, Error)]
pub enum GitError {
    /// Payload does not fit the 4-hex-digit pkt-line length prefix.
    #[error("pkt-line payload of {0} bytes does not fit a 4-hex-digit length prefix")]
    PayloadTooLarge(usize),

    /// Invalid pkt-line format.
    #[error("invalid pkt-line: {0}")]
    InvalidPktLine(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
