//! Git wire-protocol primitives for Gitway.
//!
//! This crate provides the pieces of the git transfer protocols the HTTP
//! gateway has to produce itself: pkt-line framing for the smart ref
//! advertisement and the names of the two transfer services. Everything
//! else on the wire is opaque backend output relayed verbatim.

mod error;
mod pktline;
mod service;

pub use error::GitError;
pub use pktline::{PktLine, PktLineReader, PktLineWriter, MAX_PAYLOAD};
pub use service::ServiceKind;

/// Result type for git protocol operations.
pub type Result<T> = std::result::Result<T, GitError>;
