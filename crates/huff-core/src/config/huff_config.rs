//! Runtime configuration for HUFF hosts
//!
//! Preferences (what the user toggles) live in the preference store. This
//! configuration covers how a host runs the pipeline: readiness polling
//! bounds, which converter executable to drive, where stylesheets come from,
//! and where the preference file lives.
//!
//! ## Example Configuration (huff.yaml)
//!
//! ```yaml
//! readiness:
//!   pollIntervalMs: 10
//!   maxAttempts: 3000
//!
//! engine:
//!   command: hff
//!   args: []
//!
//! styles:
//!   resourceDir: ./resources
//!   customStylesheet: styles.css
//!   defaultStylesheetUrl: https://cdn.jsdelivr.net/gh/highlightjs/cdn-release@11.9.0/build/styles/dark.min.css
//!
//! store:
//!   path: ~/.config/huff/preferences.json
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::HuffError;

/// highlight.js theme linked when no custom stylesheet is configured
pub const DEFAULT_STYLESHEET_URL: &str =
    "https://cdn.jsdelivr.net/gh/highlightjs/cdn-release@11.9.0/build/styles/dark.min.css";

/// Top-level configuration with section-based structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HuffConfig {
    /// Readiness gate polling bounds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readiness: Option<ReadinessConfiguration>,

    /// Conversion engine executable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine: Option<EngineConfiguration>,

    /// Stylesheet locations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub styles: Option<StylesConfiguration>,

    /// Preference store location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<StoreConfiguration>,
}

/// Readiness gate configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessConfiguration {
    /// Delay between tab status checks, in milliseconds
    pub poll_interval_ms: Option<u64>,

    /// Give up after this many checks; `null` waits forever
    pub max_attempts: Option<u32>,
}

/// Conversion engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfiguration {
    /// Converter executable reading FHIR JSON on stdin and writing YAML
    pub command: Option<String>,

    /// Extra arguments passed before any mapping arguments
    pub args: Option<Vec<String>>,

    /// File holding the engine's default mapping table
    pub default_mapping: Option<PathBuf>,
}

/// Stylesheet configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StylesConfiguration {
    /// Directory bundled resources are fetched from
    pub resource_dir: Option<PathBuf>,

    /// Bundled stylesheet, relative to `resourceDir`
    pub custom_stylesheet: Option<String>,

    /// Highlighting theme linked when no custom CSS is set
    pub default_stylesheet_url: Option<String>,
}

/// Preference store configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfiguration {
    /// JSON file holding the preference record
    pub path: Option<PathBuf>,
}

impl Default for ReadinessConfiguration {
    fn default() -> Self {
        Self {
            poll_interval_ms: Some(10),
            max_attempts: Some(3000),
        }
    }
}

impl Default for EngineConfiguration {
    fn default() -> Self {
        Self {
            command: Some("hff".to_string()),
            args: Some(Vec::new()),
            default_mapping: None,
        }
    }
}

impl Default for StylesConfiguration {
    fn default() -> Self {
        Self {
            resource_dir: None,
            custom_stylesheet: Some("styles.css".to_string()),
            default_stylesheet_url: Some(DEFAULT_STYLESHEET_URL.to_string()),
        }
    }
}

impl HuffConfig {
    /// Load configuration from file
    ///
    /// Supports YAML (.yaml, .yml), TOML (.toml) and JSON (.json) formats.
    pub fn load(path: &Path) -> Result<Self, HuffError> {
        let content = fs::read_to_string(path).map_err(|e| HuffError::io_error(path, e))?;
        let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        let ext = path.extension().and_then(|e| e.to_str());

        let parsed: Result<Self, String> = match ext {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content).map_err(|e| e.to_string()),
            Some("toml") => toml::from_str(&content).map_err(|e| e.to_string()),
            Some("json") => serde_json::from_str(&content).map_err(|e| e.to_string()),
            _ => Err(format!(
                "Unsupported file extension for '{file_name}' (expected .yaml, .yml, .toml or .json)"
            )),
        };

        parsed.map_err(HuffError::config_error)
    }

    /// Poll interval for the readiness gate
    pub fn poll_interval(&self) -> Duration {
        let ms = self
            .readiness
            .as_ref()
            .and_then(|r| r.poll_interval_ms)
            .unwrap_or(10);
        Duration::from_millis(ms)
    }

    /// Attempt bound for the readiness gate
    ///
    /// An explicit `readiness` section without `maxAttempts` means unbounded.
    pub fn max_attempts(&self) -> Option<u32> {
        match &self.readiness {
            Some(readiness) => readiness.max_attempts,
            None => ReadinessConfiguration::default().max_attempts,
        }
    }

    /// Converter executable and its leading arguments
    pub fn engine_command(&self) -> (String, Vec<String>) {
        let defaults = EngineConfiguration::default();
        let engine = self.engine.as_ref();
        let command = engine
            .and_then(|e| e.command.clone())
            .or(defaults.command)
            .unwrap_or_else(|| "hff".to_string());
        let args = engine.and_then(|e| e.args.clone()).unwrap_or_default();
        (command, args)
    }

    /// Default mapping file for the engine, if configured
    pub fn engine_default_mapping(&self) -> Option<&Path> {
        self.engine
            .as_ref()
            .and_then(|e| e.default_mapping.as_deref())
    }

    /// Directory bundled resources are read from; `None` means the
    /// resources compiled into the crate
    pub fn resource_dir(&self) -> Option<&Path> {
        self.styles
            .as_ref()
            .and_then(|s| s.resource_dir.as_deref())
    }

    /// Bundled stylesheet name relative to the resource directory
    pub fn custom_stylesheet(&self) -> String {
        self.styles
            .as_ref()
            .and_then(|s| s.custom_stylesheet.clone())
            .unwrap_or_else(|| "styles.css".to_string())
    }

    /// Highlighting theme URL
    pub fn default_stylesheet_url(&self) -> String {
        self.styles
            .as_ref()
            .and_then(|s| s.default_stylesheet_url.clone())
            .unwrap_or_else(|| DEFAULT_STYLESHEET_URL.to_string())
    }

    /// Preference file location, if configured
    pub fn store_path(&self) -> Option<&Path> {
        self.store.as_ref().and_then(|s| s.path.as_deref())
    }
}
