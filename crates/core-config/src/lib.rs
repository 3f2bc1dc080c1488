//! Configuration loading and parsing.
//!
//! Parses `rdcap.toml` (or an override path provided by the binary) for the
//! daemon tunables: idle timeout, bind host, VFS shader-subtree cache
//! capacity, log level. Unknown fields are ignored (TOML deserialization
//! tolerance) so the file can grow without breaking older binaries; a file
//! that fails to parse falls back to defaults.

use anyhow::Result;
use serde::Deserialize;
use std::{fs, path::PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone)]
pub struct DaemonConfig {
    #[serde(default = "DaemonConfig::default_host")]
    pub host: String,
    /// Seconds without a request before the session self-terminates.
    /// 0 disables the idle timer.
    #[serde(default)]
    pub idle_timeout_secs: u64,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            idle_timeout_secs: 0,
        }
    }
}

impl DaemonConfig {
    fn default_host() -> String {
        "127.0.0.1".to_owned()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct VfsConfig {
    /// Bound on cached per-draw shader subtrees (LRU above this).
    #[serde(default = "VfsConfig::default_shader_subtree_capacity")]
    pub shader_subtree_capacity: usize,
}

impl Default for VfsConfig {
    fn default() -> Self {
        Self {
            shader_subtree_capacity: Self::default_shader_subtree_capacity(),
        }
    }
}

impl VfsConfig {
    const fn default_shader_subtree_capacity() -> usize {
        16
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct LogConfig {
    #[serde(default)]
    pub level: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub daemon: DaemonConfig,
    #[serde(default)]
    pub vfs: VfsConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub raw: Option<String>, // original file string (optional)
    pub file: ConfigFile,    // parsed (or default) data
}

/// Best-effort config path following platform conventions (XDG / AppData
/// Roaming). A local `rdcap.toml` wins over the platform config dir.
pub fn discover() -> PathBuf {
    let local = PathBuf::from("rdcap.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("rdcap").join("rdcap.toml");
    }
    PathBuf::from("rdcap.toml")
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    if let Ok(content) = fs::read_to_string(&path) {
        match toml::from_str::<ConfigFile>(&content) {
            Ok(file) => {
                info!(
                    target: "config",
                    path = %path.display(),
                    idle_timeout_secs = file.daemon.idle_timeout_secs,
                    shader_subtree_capacity = file.vfs.shader_subtree_capacity,
                    "config_loaded"
                );
                Ok(Config {
                    raw: Some(content),
                    file,
                })
            }
            Err(_e) => Ok(Config::default()),
        }
    } else {
        Ok(Config::default())
    }
}

impl Config {
    /// Capacity with the lower bound applied (a zero-capacity subtree cache
    /// would make every populated path unreachable immediately).
    pub fn effective_subtree_capacity(&self) -> usize {
        self.file.vfs.shader_subtree_capacity.max(1)
    }
}
