//! Configuration system for HUFF hosts
//!
//! Hosts read a single optional config file:
//! - `.huffrc.json` / `.huffrc.toml` - dotfile configs (preferred)
//! - `huff.yaml` / `huff.yml` / `huff.json` - plain configs
//!
//! When no explicit path is provided, the loader searches upward from the
//! start directory. Nothing found means every setting takes its default.

mod huff_config;
mod loader;

pub use huff_config::{
    DEFAULT_STYLESHEET_URL, EngineConfiguration, HuffConfig, ReadinessConfiguration,
    StoreConfiguration, StylesConfiguration,
};
pub use loader::{CONFIG_FILE_NAMES, ConfigLoader, Result};
