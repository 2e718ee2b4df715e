//! Gitway node - git HTTP gateway entry point.

use clap::Parser;
use gitway_node::observability::{init_logging, LogFormat};
use gitway_node::{create_router, AppState, Config};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;

/// Gitway node - smart and dumb git HTTP gateway
#[derive(Parser, Debug)]
#[command(name = "gitway-node")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// HTTP listen address
    #[arg(long)]
    bind_addr: Option<SocketAddr>,

    /// Directory containing the served repositories
    #[arg(long)]
    repo_root: Option<PathBuf>,

    /// Version-control backend binary
    #[arg(long)]
    git_path: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Log format (pretty, json)
    #[arg(long)]
    log_format: Option<String>,

    /// Maximum concurrent backend processes
    #[arg(long)]
    max_backends: Option<usize>,
}

impl Args {
    fn into_config(self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(bind_addr) = self.bind_addr {
            config.bind_addr = bind_addr;
        }
        if let Some(repo_root) = self.repo_root {
            config.repo_root = repo_root;
        }
        if let Some(git_path) = self.git_path {
            config.git_path = git_path;
        }
        if let Some(log_level) = self.log_level {
            config.log_level = log_level;
        }
        if let Some(log_format) = self.log_format {
            config.log_format = log_format;
        }
        if let Some(max_backends) = self.max_backends {
            config.max_backends = max_backends;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = args.into_config()?;

    init_logging(&config.log_level, LogFormat::parse(&config.log_format));

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting gitway node");

    anyhow::ensure!(
        config.repo_root.is_dir(),
        "repository root {} is not a directory",
        config.repo_root.display()
    );

    let state = AppState::from_config(&config);
    let listener = TcpListener::bind(config.bind_addr).await?;

    tracing::info!(
        address = %listener.local_addr()?,
        repo_root = %config.repo_root.display(),
        git = %config.git_path.display(),
        max_backends = config.max_backends,
        "Listening for connections"
    );

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}
