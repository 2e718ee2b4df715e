//! Repository identifier validation.
//!
//! The identifier captured by the route table is used verbatim as a
//! filesystem path component and as a backend process argument, so it is
//! checked here before either use. The joined path can never escape the
//! repository root.

use crate::GatewayError;
use once_cell::sync::Lazy;
use regex::Regex;

/// Characters a repository identifier may contain.
static REPO_ID_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._/-]+$").expect("invalid regex"));

/// Validates a repository identifier for filesystem and process use.
///
/// Rejects empty identifiers, characters outside the allow-list, absolute
/// paths, and any `.`/`..`/empty path segment.
pub fn validate_repo_id(repo: &str) -> Result<(), GatewayError> {
    let valid = !repo.is_empty()
        && REPO_ID_REGEX.is_match(repo)
        && repo
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..");

    if valid {
        Ok(())
    } else {
        Err(GatewayError::InvalidRepository(repo.to_string()))
    }
}
