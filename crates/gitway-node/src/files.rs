//! Static delivery of dumb-protocol files.
//!
//! Serves a file from a repository tree byte-for-byte with exact
//! `Content-Length`, `Last-Modified`, the caller's content type, and the
//! route's cache policy. Absence is a 404 with an empty body; any other
//! stat error is a 500.

use crate::cache::{imf_fixdate, CachePolicy};
use crate::GatewayError;
use axum::{
    body::Body,
    http::{header, StatusCode},
    response::Response,
};
use std::path::Path;
use tokio_util::io::ReaderStream;

/// Streams `root`/`file_path` as an HTTP response.
pub async fn send_file(
    root: &Path,
    file_path: &str,
    content_type: &str,
    policy: CachePolicy,
) -> Result<Response, GatewayError> {
    let path = root.join(file_path);

    let meta = match tokio::fs::metadata(&path).await {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(GatewayError::NotFound)
        }
        Err(e) => return Err(GatewayError::File(e)),
    };
    if !meta.is_file() {
        return Err(GatewayError::NotFound);
    }

    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(GatewayError::NotFound)
        }
        Err(e) => return Err(GatewayError::File(e)),
    };

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, meta.len());

    if let Ok(modified) = meta.modified() {
        builder = builder.header(header::LAST_MODIFIED, imf_fixdate(modified.into()));
    }
    for (name, value) in policy.headers() {
        builder = builder.header(name, value);
    }

    builder
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| GatewayError::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serves_file_with_exact_headers() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("repo.git")).unwrap();
        std::fs::write(dir.path().join("repo.git/HEAD"), "ref: refs/heads/main\n").unwrap();

        let response = send_file(dir.path(), "repo.git/HEAD", "text/plain", CachePolicy::Never)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE.as_str()], "text/plain");
        assert_eq!(response.headers()[header::CONTENT_LENGTH.as_str()], "21");
        assert!(response.headers().contains_key(header::LAST_MODIFIED.as_str()));
        assert_eq!(response.headers()[header::PRAGMA.as_str()], "no-cache");

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"ref: refs/heads/main\n");
    }

    #[tokio::test]
    async fn absent_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = send_file(dir.path(), "repo.git/HEAD", "text/plain", CachePolicy::Never)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::NotFound));
    }

    #[tokio::test]
    async fn directory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("repo.git")).unwrap();
        let err = send_file(dir.path(), "repo.git", "text/plain", CachePolicy::Never)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::NotFound));
    }

    #[tokio::test]
    async fn immutable_files_carry_forever_headers() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("repo.git/objects/ab")).unwrap();
        let object = "repo.git/objects/ab/01234567890123456789012345678901234567";
        std::fs::write(dir.path().join(object), b"blob-bytes").unwrap();

        let response = send_file(dir.path(), object, "x-git-loose-object", CachePolicy::Forever)
            .await
            .unwrap();

        assert_eq!(
            response.headers()[header::CACHE_CONTROL.as_str()],
            "public, max-age=31536000"
        );
        assert!(response.headers().contains_key(header::DATE.as_str()));
        assert!(!response.headers().contains_key(header::PRAGMA.as_str()));
    }
}
