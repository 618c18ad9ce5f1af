//! Typed host surfaces
//!
//! The pipeline runs inside whatever host provides network observation, tab
//! state and bundled resources: a browser extension runtime, the `huff` CLI,
//! or a test harness. Each of those surfaces is a small trait here.

use crate::error::HuffError;
use crate::result::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Host tab identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TabId(pub u64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab#{}", self.0)
    }
}

/// Load state reported by the host for a tab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabStatus {
    Loading,
    Complete,
}

/// Snapshot of a tab as returned by a [`TabQuery`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tab {
    pub id: TabId,
    pub status: TabStatus,
    pub url: Option<String>,
}

impl Tab {
    pub fn is_complete(&self) -> bool {
        self.status == TabStatus::Complete
    }
}

/// Query for the tab the user is currently looking at
#[async_trait]
pub trait TabQuery: Send + Sync {
    /// The active tab of the last-focused window, if any
    async fn active_tab(&self) -> Result<Option<Tab>>;
}

/// Kind of request a response belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    /// Top-level document load
    MainFrame,
    SubFrame,
    Stylesheet,
    Script,
    Image,
    Xmlhttprequest,
    Other,
}

/// A single response header as reported by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseHeader {
    pub name: String,
    pub value: String,
}

impl ResponseHeader {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Response metadata delivered by host network observation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseDetails {
    pub url: String,
    pub tab_id: Option<TabId>,
    pub resource_type: ResourceType,
    pub headers: Vec<ResponseHeader>,
}

impl ResponseDetails {
    /// Top-level document response
    pub fn main_frame(url: impl Into<String>, headers: Vec<ResponseHeader>) -> Self {
        Self {
            url: url.into(),
            tab_id: None,
            resource_type: ResourceType::MainFrame,
            headers,
        }
    }

    pub fn with_tab(mut self, tab_id: TabId) -> Self {
        self.tab_id = Some(tab_id);
        self
    }
}

/// Access to resources bundled with the host (stylesheets, mapping tables)
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    async fn fetch_text(&self, resource: &str) -> Result<String>;
}

/// Fetches bundled resources from a directory on disk
#[derive(Debug, Clone)]
pub struct FsFetcher {
    root: PathBuf,
}

impl FsFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ResourceFetcher for FsFetcher {
    async fn fetch_text(&self, resource: &str) -> Result<String> {
        let path = self.root.join(resource.trim_start_matches('/'));
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| HuffError::fetch_error(path.display().to_string(), e.to_string()))
    }
}

/// Page-level rules compiled into the crate
pub const PAGE_STYLESHEET: &str = include_str!("../resources/styles.css");

/// The bundled stylesheet: page rules followed by the highlight theme
pub fn bundled_stylesheet() -> String {
    format!("{}\n{}", PAGE_STYLESHEET, crate::render::highlight::theme_css())
}

/// Serves the resources compiled into the crate
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledResources;

#[async_trait]
impl ResourceFetcher for BundledResources {
    async fn fetch_text(&self, resource: &str) -> Result<String> {
        match resource.trim_start_matches('/') {
            "styles.css" => Ok(bundled_stylesheet()),
            other => Err(HuffError::fetch_error(other, "not a bundled resource")),
        }
    }
}

/// Fetcher with nothing bundled; every fetch fails
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResources;

#[async_trait]
impl ResourceFetcher for NoResources {
    async fn fetch_text(&self, resource: &str) -> Result<String> {
        Err(HuffError::fetch_error(resource, "no bundled resources"))
    }
}
