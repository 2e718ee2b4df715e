//! Version-control backend bridge for Gitway.
//!
//! The gateway treats the version-control implementation as a black box
//! behind the [`VersionControlBackend`] trait: advertise refs, run one
//! stateless negotiation exchange, refresh dumb-protocol metadata. The
//! production implementation, [`GitCliBackend`], spawns `git(1)`; tests
//! substitute fakes without touching a process.

mod backend;
mod error;
mod process;

pub use backend::{BoxedRead, VersionControlBackend};
pub use error::BackendError;
pub use process::GitCliBackend;

/// Result type for backend operations.
pub type Result<T> = std::result::Result<T, BackendError>;
