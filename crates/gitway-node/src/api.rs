//! HTTP surface of the gateway.
//!
//! A single dispatch handler walks the route table and fans out to the
//! dumb-protocol file handlers or the smart-protocol backend bridge. All
//! state is immutable after startup: the route table, the backend handle,
//! the repository root, and the admission semaphore bounding concurrent
//! backend processes.

use crate::cache::CachePolicy;
use crate::config::Config;
use crate::files::send_file;
use crate::routes::{RouteKind, RouteMatch, RouteTable};
use crate::validation::validate_repo_id;
use crate::GatewayError;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use futures::TryStreamExt;
use gitway_backend::{BoxedRead, GitCliBackend, VersionControlBackend};
use gitway_git::{PktLine, PktLineWriter, ServiceKind};
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::io::{ReaderStream, StreamReader};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    routes: Arc<RouteTable>,
    backend: Arc<dyn VersionControlBackend>,
    repo_root: PathBuf,
    backend_permits: Arc<Semaphore>,
}

impl AppState {
    /// Builds state around an arbitrary backend (tests use a fake here).
    pub fn new(
        backend: Arc<dyn VersionControlBackend>,
        repo_root: PathBuf,
        max_backends: usize,
    ) -> Self {
        Self {
            routes: Arc::new(RouteTable::new()),
            backend,
            repo_root,
            backend_permits: Arc::new(Semaphore::new(max_backends)),
        }
    }

    /// Builds state for the git CLI backend described by `config`.
    pub fn from_config(config: &Config) -> Self {
        let backend = GitCliBackend::new(&config.git_path, &config.repo_root);
        Self::new(
            Arc::new(backend),
            config.repo_root.clone(),
            config.max_backends,
        )
    }
}

/// Creates the gateway router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .fallback(dispatch)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Routes one request and runs its handler to completion.
async fn dispatch(State(state): State<AppState>, request: Request) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let (kind, repo, file_path) = match state.routes.dispatch(&method, &path) {
        RouteMatch::NoMatch => return GatewayError::NotFound.into_response(),
        RouteMatch::WrongMethod => return GatewayError::MethodNotAllowed.into_response(),
        RouteMatch::Matched {
            kind,
            repo,
            file_path,
        } => (kind, repo, file_path),
    };

    if let Err(e) = validate_repo_id(&repo) {
        return e.into_response();
    }

    tracing::debug!(method = %method, path = %path, repo = %repo, "dispatching");

    let result = match kind {
        RouteKind::Head | RouteKind::TextFile => {
            send_file(&state.repo_root, &file_path, "text/plain", CachePolicy::Never).await
        }
        RouteKind::InfoPacks => {
            send_file(
                &state.repo_root,
                &file_path,
                "text/plain; charset=utf-8",
                CachePolicy::Never,
            )
            .await
        }
        RouteKind::LooseObject => {
            send_file(
                &state.repo_root,
                &file_path,
                "x-git-loose-object",
                CachePolicy::Forever,
            )
            .await
        }
        RouteKind::PackFile => {
            send_file(
                &state.repo_root,
                &file_path,
                "x-git-packed-objects",
                CachePolicy::Forever,
            )
            .await
        }
        RouteKind::IdxFile => {
            send_file(
                &state.repo_root,
                &file_path,
                "x-git-packed-objects-toc",
                CachePolicy::Forever,
            )
            .await
        }
        RouteKind::InfoRefs => info_refs(&state, &repo, &file_path, request.uri().query()).await,
        RouteKind::UploadPack => rpc(&state, ServiceKind::UploadPack, &repo, request).await,
        RouteKind::ReceivePack => rpc(&state, ServiceKind::ReceivePack, &repo, request).await,
    };

    result.unwrap_or_else(IntoResponse::into_response)
}

/// Extracts a known service kind from the `?service=` query parameter.
fn query_service(query: Option<&str>) -> Option<ServiceKind> {
    query?.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        if key == "service" {
            ServiceKind::from_wire_name(value)
        } else {
            None
        }
    })
}

/// `info/refs`: smart ref advertisement when a known service is requested,
/// dumb listing (refreshed first) otherwise.
async fn info_refs(
    state: &AppState,
    repo: &str,
    file_path: &str,
    query: Option<&str>,
) -> Result<Response, GatewayError> {
    match query_service(query) {
        Some(service) => {
            let _permit = acquire_backend(state).await?;
            let advertisement = state.backend.advertise(service, repo).await?;

            // Service header and flush precede the raw backend output.
            let mut body = Vec::new();
            {
                let mut writer = PktLineWriter::new(&mut body);
                writer.write(&PktLine::from_string(&format!(
                    "# service={}\n",
                    service.wire_name()
                )))?;
                writer.flush_pkt()?;
            }
            body.extend_from_slice(&advertisement);

            let mut builder = Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, service.advertisement_content_type());
            for (name, value) in CachePolicy::Never.headers() {
                builder = builder.header(name, value);
            }
            builder
                .body(Body::from(body))
                .map_err(|e| GatewayError::Internal(e.to_string()))
        }
        None => {
            {
                let _permit = acquire_backend(state).await?;
                state.backend.refresh_info(repo).await?;
            }
            send_file(&state.repo_root, file_path, "text/plain", CachePolicy::Never).await
        }
    }
}

/// Stateless-RPC bridge: the request body is pumped into the backend while
/// its output is relayed to the client, each direction independent.
async fn rpc(
    state: &AppState,
    service: ServiceKind,
    repo: &str,
    request: Request,
) -> Result<Response, GatewayError> {
    let permit = acquire_backend(state).await?;

    let body_reader = StreamReader::new(
        request
            .into_body()
            .into_data_stream()
            .map_err(std::io::Error::other),
    );

    let output = state
        .backend
        .negotiate(service, repo, Box::new(body_reader))
        .await?;

    // The permit lives as long as the backend's output stream.
    let output = PermitBound {
        inner: output,
        _permit: permit,
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, service.result_content_type())
        .body(Body::from_stream(ReaderStream::new(output)))
        .map_err(|e| GatewayError::Internal(e.to_string()))
}

async fn acquire_backend(state: &AppState) -> Result<OwnedSemaphorePermit, GatewayError> {
    state
        .backend_permits
        .clone()
        .acquire_owned()
        .await
        .map_err(|_| GatewayError::Internal("backend admission semaphore closed".to_string()))
}

/// Couples a backend output stream to its admission permit.
struct PermitBound {
    inner: BoxedRead,
    _permit: OwnedSemaphorePermit,
}

impl AsyncRead for PermitBound {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}
