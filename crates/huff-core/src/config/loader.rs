//! Configuration file discovery and loading

use super::huff_config::HuffConfig;
use crate::error::HuffError;
use std::path::{Path, PathBuf};

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, HuffError>;

/// Config file names in discovery priority order
pub const CONFIG_FILE_NAMES: [&str; 5] = [
    ".huffrc.json",
    ".huffrc.toml",
    "huff.yaml",
    "huff.yml",
    "huff.json",
];

/// Configuration loader for discovering and loading config files
pub struct ConfigLoader;

impl ConfigLoader {
    /// Auto-discover config file by traversing upward from start_path
    ///
    /// Searches for [`CONFIG_FILE_NAMES`] in order in each directory, starting
    /// at `start_path` and moving up until a config is found or the
    /// filesystem root is reached.
    pub fn auto_discover(start_path: &Path) -> Result<Option<PathBuf>> {
        let mut current = start_path
            .canonicalize()
            .map_err(|e| HuffError::config_error(format!("Invalid path: {e}")))?;

        loop {
            for filename in &CONFIG_FILE_NAMES {
                let config_path = current.join(filename);
                if config_path.is_file() {
                    tracing::debug!("Found config: {}", config_path.display());
                    return Ok(Some(config_path));
                }
            }

            if let Some(parent) = current.parent() {
                current = parent.to_path_buf();
            } else {
                break;
            }
        }

        Ok(None)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<HuffConfig> {
        HuffConfig::load(path).map_err(|e| {
            HuffError::config_error(format!(
                "Failed to load config from '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Load config from path or auto-discover
    ///
    /// An explicit path must exist. Without one, discovery starts at
    /// `start_dir` (or the current directory) and falls back to defaults
    /// when nothing is found.
    pub fn load(custom_path: Option<&Path>, start_dir: Option<&Path>) -> Result<HuffConfig> {
        if let Some(path) = custom_path {
            if !path.exists() {
                return Err(HuffError::config_error(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            return Self::load_from_file(path);
        }

        let search_dir = start_dir.unwrap_or_else(|| Path::new("."));
        match Self::auto_discover(search_dir)? {
            Some(found) => Self::load_from_file(&found),
            None => {
                tracing::debug!("No config file found, using defaults");
                Ok(HuffConfig::default())
            }
        }
    }
}
