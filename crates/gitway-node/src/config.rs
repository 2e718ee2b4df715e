//! Gateway configuration types.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Configuration for the gateway node.
///
/// Loadable from a YAML file; every field has a default so partial files
/// are fine. CLI flags override file values.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// HTTP listen address.
    pub bind_addr: SocketAddr,
    /// Directory containing the served repositories.
    pub repo_root: PathBuf,
    /// Version-control backend binary.
    pub git_path: PathBuf,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Log format (pretty, json).
    pub log_format: String,
    /// Maximum concurrent backend processes.
    pub max_backends: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".parse().expect("valid default address"),
            repo_root: PathBuf::from("./repositories"),
            git_path: PathBuf::from("git"),
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            max_backends: 32,
        }
    }
}

impl Config {
    /// Loads configuration from a YAML file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.git_path, PathBuf::from("git"));
        assert_eq!(config.max_backends, 32);
    }

    #[test]
    fn partial_yaml_falls_back_to_defaults() {
        let config: Config =
            serde_yaml::from_str("bind_addr: \"0.0.0.0:9418\"\nmax_backends: 4\n").unwrap();
        assert_eq!(config.bind_addr.port(), 9418);
        assert_eq!(config.max_backends, 4);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "repo_root: /srv/git\n").unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.repo_root, PathBuf::from("/srv/git"));
    }
}
