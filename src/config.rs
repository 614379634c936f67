//! Server configuration
//!
//! Configuration is read once at startup: an optional YAML file named by the
//! `CONFIG` environment variable, then `HOST`, `PORT` and `DOC_ROOT`
//! overrides. Every field has a default, so an empty file is a valid config.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

const DEFAULT_PORT: u16 = 50505;

/// Default cap on the request line, in bytes
pub const DEFAULT_MAX_REQUEST_LINE: usize = 8192;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub static_files: StaticConfig,
}

/// Listening endpoint and per-connection limits
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind (e.g. "0.0.0.0")
    pub host: String,

    /// TCP port to listen on
    pub port: u16,

    /// Upper bound on concurrently running connection handlers (unbounded if
    /// unset). Zero is rejected.
    pub max_connections: Option<usize>,

    /// Deadline for receiving the request line, in seconds (none if unset)
    pub read_timeout_secs: Option<u64>,

    /// Longest request line accepted before the request counts as malformed
    pub max_request_line: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            max_connections: None,
            read_timeout_secs: None,
            max_request_line: DEFAULT_MAX_REQUEST_LINE,
        }
    }
}

/// The document root being served
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StaticConfig {
    pub document_root: PathBuf,

    /// Refuse paths that escape the document root
    pub confine_to_root: bool,
}

impl Default for StaticConfig {
    fn default() -> Self {
        Self {
            document_root: PathBuf::from("."),
            confine_to_root: false,
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn load() -> Result<Self> {
        let mut cfg = match std::env::var("CONFIG") {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };
        cfg.apply_overrides(|key| std::env::var(key).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: &str) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path))?;
        Self::from_yaml_str(&raw).with_context(|| format!("Invalid config file {}", path))
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Config = serde_yaml::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Rejects settings that would leave the server unable to serve.
    pub fn validate(&self) -> Result<()> {
        if self.server.max_connections == Some(0) {
            anyhow::bail!("server.max_connections must be at least 1");
        }
        if self.server.max_request_line == 0 {
            anyhow::bail!("server.max_request_line must be at least 1");
        }
        Ok(())
    }

    /// Apply `HOST`, `PORT` and `DOC_ROOT` overrides from `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("PORT is not a valid port number: {:?}", port))?;
        }
        if let Some(root) = lookup("DOC_ROOT") {
            self.static_files.document_root = PathBuf::from(root);
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
