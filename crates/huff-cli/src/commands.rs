//! CLI command implementations
//!
//! Top-level commands (classify, render, page, fetch) live in this file;
//! preference management is in `commands/prefs.rs`.

pub mod prefs;

use colored::*;
use huff_core::{
    BundledResources, CommandEngine, ConfigLoader, FileStore, FsFetcher, HtmlPage, HuffConfig,
    HuffError, LoadedTab, PageLoadReport, PipelineState, PreferenceStore, Preferences,
    PreferencesCarrier, RenderingModule, ResourceFetcher, ResponseDetails, ResponseHeader, Result,
    Runtime, TabId, classify_headers,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Preference file used when the configuration names none
pub const DEFAULT_STORE_FILE: &str = "huff-preferences.json";

/// Tab id the CLI host presents its single document as
const CLI_TAB: TabId = TabId(1);

/// Collaborators shared by every command
pub struct HostContext {
    pub config: HuffConfig,
    pub store: Arc<FileStore>,
    pub resources: Arc<dyn ResourceFetcher>,
    pub engine: Arc<CommandEngine>,
}

impl HostContext {
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let config = ConfigLoader::load(config_path.as_deref(), None)?;
        debug!("Using configuration: {:?}", config);

        let store_path = config
            .store_path()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_FILE));
        let resources: Arc<dyn ResourceFetcher> = match config.resource_dir() {
            Some(dir) => Arc::new(FsFetcher::new(dir)),
            None => Arc::new(BundledResources),
        };

        Ok(Self {
            store: Arc::new(FileStore::new(store_path)),
            engine: Arc::new(CommandEngine::from_config(&config)),
            resources,
            config,
        })
    }

    /// Effective preferences, with the bundled stylesheet as the CSS default
    pub async fn preferences(&self) -> Result<Preferences> {
        let css = match self
            .resources
            .fetch_text(&self.config.custom_stylesheet())
            .await
        {
            Ok(css) => css,
            Err(e) => {
                warn!("Custom stylesheet unavailable: {}", e);
                String::new()
            }
        };
        self.store.load(Preferences::with_bundled_css(css)).await
    }

    pub fn runtime(&self) -> Runtime {
        Runtime::new(
            self.store.clone(),
            self.resources.clone(),
            self.engine.clone(),
            &self.config,
        )
    }
}

/// Classify command implementation
pub async fn classify_command(content_types: Vec<String>, config_path: Option<PathBuf>) -> Result<()> {
    let host = HostContext::load(config_path)?;
    let prefs = host.preferences().await?;

    let headers: Vec<ResponseHeader> = content_types
        .into_iter()
        .map(|value| ResponseHeader::new("Content-Type", value))
        .collect();
    let matched = classify_headers(&headers, &prefs.handle_content_types);

    let value = matched.header_value.unwrap_or_default();
    if matched.matched {
        println!("{} {}", "FHIR-JSON".green().bold(), value);
    } else {
        println!("{} {}", "not FHIR-JSON".yellow(), value);
    }
    Ok(())
}

/// Postprocessing switches that override stored preferences
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOverrides {
    pub no_highlight: bool,
    pub no_links: bool,
    pub no_references: bool,
}

impl RenderOverrides {
    fn apply(self, prefs: &mut Preferences) {
        if self.no_highlight {
            prefs.highlight_huff = false;
        }
        if self.no_links {
            prefs.make_links_clickable = false;
        }
        if self.no_references {
            prefs.make_references_clickable = false;
        }
    }
}

/// Render command implementation
pub async fn render_command(
    file: PathBuf,
    page_url: Option<String>,
    overrides: RenderOverrides,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let host = HostContext::load(config_path)?;
    let raw = std::fs::read_to_string(&file).map_err(|e| HuffError::io_error(&file, e))?;

    let mut prefs = host.preferences().await?;
    overrides.apply(&mut prefs);

    let mut page = HtmlPage::from_raw_text(&raw);
    if let Some(url) = page_url {
        page = page.with_url(url);
    }
    PreferencesCarrier::new(prefs).write_to(&mut page)?;

    let report = RenderingModule::new(host.engine.as_ref())
        .run(&mut page)
        .await?;
    for (index, reason) in &report.failed {
        warn!("Element {} left unrendered: {}", index, reason);
    }

    let inner = page.element_html(0).unwrap_or_default();
    println!("<pre>{inner}</pre>");
    Ok(())
}

/// Page command implementation
pub async fn page_command(
    file: PathBuf,
    page_url: String,
    content_type: String,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let host = HostContext::load(config_path)?;
    let html = std::fs::read_to_string(&file).map_err(|e| HuffError::io_error(&file, e))?;

    let page = HtmlPage::parse(&html).with_url(page_url.clone());
    let details = ResponseDetails::main_frame(
        page_url.clone(),
        vec![ResponseHeader::new("Content-Type", content_type)],
    )
    .with_tab(CLI_TAB);

    let (page, report) = host
        .runtime()
        .load_page(page, &details, Arc::new(LoadedTab::new(CLI_TAB, Some(page_url))))
        .await?;

    print_report(&report);
    write_output(&page.to_html(), output.as_deref())
}

/// Fetch command implementation
pub async fn fetch_command(
    url: String,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let host = HostContext::load(config_path)?;

    info!("Fetching {}", url);
    let response = reqwest::get(&url)
        .await
        .map_err(|e| HuffError::fetch_error(&url, e.to_string()))?;

    let final_url = response.url().to_string();
    let headers: Vec<ResponseHeader> = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| ResponseHeader::new(name.as_str(), v))
        })
        .collect();
    let status = response.status();
    if !status.is_success() {
        warn!("{} answered {}", final_url, status);
    }

    let body = response
        .text()
        .await
        .map_err(|e| HuffError::fetch_error(&final_url, e.to_string()))?;

    let page = HtmlPage::from_raw_text(&body).with_url(final_url.clone());
    let details = ResponseDetails::main_frame(final_url.clone(), headers).with_tab(CLI_TAB);

    let (page, report) = host
        .runtime()
        .load_page(page, &details, Arc::new(LoadedTab::new(CLI_TAB, Some(final_url))))
        .await?;

    print_report(&report);
    write_output(&page.to_html(), output.as_deref())
}

/// One-line pipeline summary on stderr
fn print_report(report: &PageLoadReport) {
    let state = report.final_state();
    let label = match state {
        PipelineState::Done => state.to_string().green(),
        PipelineState::Skipped => state.to_string().yellow(),
        _ => state.to_string().red(),
    };

    match &report.render {
        Some(render) => eprintln!(
            "{} {} rendered, {} failed",
            label,
            render.rendered.len(),
            render.failed.len()
        ),
        None => eprintln!("{label}"),
    }
}

fn write_output(html: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, html).map_err(|e| HuffError::io_error(path, e))?;
            info!("Wrote {}", path.display());
        }
        None => println!("{html}"),
    }
    Ok(())
}
