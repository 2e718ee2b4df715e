//! The backend capability trait.

use crate::Result;
use async_trait::async_trait;
use gitway_git::ServiceKind;
use tokio::io::AsyncRead;

/// A boxed byte stream crossing the trait boundary.
pub type BoxedRead = Box<dyn AsyncRead + Send + Unpin>;

/// Capability interface to the version-control implementation.
///
/// `repo` is a repository identifier relative to the backend's root; callers
/// validate it before it reaches this boundary.
#[async_trait]
pub trait VersionControlBackend: Send + Sync + 'static {
    /// Runs the backend in stateless, advertise-only mode and captures its
    /// entire ref advertisement.
    ///
    /// Any invocation failure (spawn, non-zero exit) is an error; no
    /// partial output escapes.
    async fn advertise(&self, service: ServiceKind, repo: &str) -> Result<Vec<u8>>;

    /// Runs one stateless-RPC negotiation exchange.
    ///
    /// `input` is fed to the backend while its output is produced; the two
    /// directions never block each other. The returned stream yields the
    /// backend's output byte-for-byte in the order produced.
    async fn negotiate(&self, service: ServiceKind, repo: &str, input: BoxedRead)
        -> Result<BoxedRead>;

    /// Refreshes the derived metadata the dumb protocol reads
    /// (ref listing and pack listing files).
    async fn refresh_info(&self, repo: &str) -> Result<()>;
}
