//! `git(1)` subprocess implementation of the backend trait.
//!
//! Invocation contract: `<git> <role> --stateless-rpc [--advertise-refs]
//! <repo>`, working directory at the repository root, stdin/stdout piped,
//! stderr routed into the log. The RPC path runs the request-body pump and
//! the output drain as independent tasks so a full pipe buffer in one
//! direction can never stall the other.

use crate::backend::{BoxedRead, VersionControlBackend};
use crate::{BackendError, Result};
use async_trait::async_trait;
use gitway_git::ServiceKind;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::{ExitStatus, Stdio};
use std::task::{Context, Poll};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader, ReadBuf};
use tokio::process::{ChildStdout, Command};
use tokio::sync::oneshot;

/// Backend that shells out to the git binary.
#[derive(Debug, Clone)]
pub struct GitCliBackend {
    program: PathBuf,
    root: PathBuf,
}

impl GitCliBackend {
    /// Creates a backend running `program` against repositories under `root`.
    pub fn new(program: impl Into<PathBuf>, root: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            root: root.into(),
        }
    }

    fn service_command(&self, service: ServiceKind, repo: &str, advertise_only: bool) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg(service.role()).arg("--stateless-rpc");
        if advertise_only {
            cmd.arg("--advertise-refs");
        }
        cmd.arg(repo).current_dir(&self.root).kill_on_drop(true);
        cmd
    }

    fn spawn_error(&self, source: std::io::Error) -> BackendError {
        BackendError::Spawn {
            program: self.program.display().to_string(),
            source,
        }
    }
}

#[async_trait]
impl VersionControlBackend for GitCliBackend {
    async fn advertise(&self, service: ServiceKind, repo: &str) -> Result<Vec<u8>> {
        let output = self
            .service_command(service, repo, true)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(BackendError::Exited {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }

    async fn negotiate(
        &self,
        service: ServiceKind,
        repo: &str,
        input: BoxedRead,
    ) -> Result<BoxedRead> {
        let mut child = self
            .service_command(service, repo, false)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let mut stdin = child.stdin.take().ok_or(BackendError::Pipe("stdin"))?;
        let stdout = child.stdout.take().ok_or(BackendError::Pipe("stdout"))?;
        let stderr = child.stderr.take().ok_or(BackendError::Pipe("stderr"))?;

        let role = service.role();

        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                tracing::debug!(role, line = %line, "backend stderr");
            }
        });

        // Input pump. Closing stdin on completion is what signals
        // end-of-request to the backend.
        let mut input = input;
        tokio::spawn(async move {
            if let Err(e) = tokio::io::copy(&mut input, &mut stdin).await {
                tracing::warn!(role, error = %e, "relaying request body to backend failed");
            }
            if let Err(e) = stdin.shutdown().await {
                tracing::debug!(role, error = %e, "closing backend stdin failed");
            }
        });

        // Reaper. The guard's sender lives inside the returned stream; if
        // the response is dropped before the backend finishes, the child is
        // killed instead of running against a closed sink.
        let (guard_tx, guard_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            tokio::select! {
                status = child.wait() => match status {
                    Ok(status) => log_exit(role, status),
                    Err(e) => tracing::warn!(role, error = %e, "failed to reap backend"),
                },
                _ = guard_rx => match child.try_wait() {
                    Ok(Some(status)) => log_exit(role, status),
                    _ => {
                        let _ = child.start_kill();
                        let _ = child.wait().await;
                        tracing::debug!(role, "backend terminated after response was dropped");
                    }
                },
            }
        });

        Ok(Box::new(NegotiateOutput {
            stdout,
            _guard: guard_tx,
        }))
    }

    async fn refresh_info(&self, repo: &str) -> Result<()> {
        let output = Command::new(&self.program)
            .arg("update-server-info")
            .current_dir(self.root.join(repo))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(BackendError::Exited {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(())
    }
}

fn log_exit(role: &str, status: ExitStatus) {
    if status.success() {
        tracing::debug!(role, "backend exited");
    } else {
        // Output may already be partially streamed; the response is
        // append-only once headers are sent, so this is log-only.
        tracing::warn!(role, status = %status, "backend exited with failure");
    }
}

/// The backend's output stream plus the cancellation guard keeping the
/// reaper informed about the response's lifetime.
struct NegotiateOutput {
    stdout: ChildStdout,
    _guard: oneshot::Sender<()>,
}

impl AsyncRead for NegotiateOutput {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.stdout).poll_read(cx, buf)
    }
}
