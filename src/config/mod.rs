//! Application configuration.
//!
//! [`AppConfig`] describes what to scan and where to listen, and is usually read from a
//! JSON file next to the entry point. [`ConfigService`] is a key/value view of the process
//! environment that takes precedence over the file for the listening address.

use crate::error::{KindlingError, Result};
use dashmap::DashMap;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Configuration service
#[derive(Clone, Default)]
pub struct ConfigService {
    config: Arc<DashMap<String, String>>,
}

impl ConfigService {
    /// A service seeded from the process environment.
    pub fn from_env() -> Self {
        let service = Self::default();
        for (key, value) in env::vars() {
            service.set(&key, &value);
        }
        service
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.config.get(key).map(|v| v.clone())
    }

    pub fn set(&self, key: &str, value: &str) {
        self.config.insert(key.to_string(), value.to_string());
    }
}

/// Scan and server settings.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    /// Package names or relative paths to scan. Empty means the entry file's directory.
    pub scan_base_packages: Vec<String>,
    /// Directory names never descended into.
    pub exclude: Vec<String>,
    /// File name suffixes never loaded.
    pub exclude_name: Vec<String>,
    pub port: Option<u16>,
    pub host: Option<String>,
    pub project_root: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| KindlingError::io(path, e))?;
        Self::from_json(&raw)
            .map_err(|e| KindlingError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| KindlingError::Config(e.to_string()))
    }

    /// Listening port: the first argument that parses as a port, then `PORT`, then the
    /// file setting, then [`DEFAULT_PORT`].
    pub fn resolve_port<I, S>(&self, args: I, env: &ConfigService) -> u16
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        args.into_iter()
            .find_map(|arg| arg.as_ref().parse::<u16>().ok())
            .or_else(|| env.get("PORT").and_then(|port| port.parse().ok()))
            .or(self.port)
            .unwrap_or(DEFAULT_PORT)
    }

    pub fn resolve_host(&self, env: &ConfigService) -> String {
        env.get("HOST")
            .or_else(|| self.host.clone())
            .unwrap_or_else(|| DEFAULT_HOST.to_string())
    }
}
