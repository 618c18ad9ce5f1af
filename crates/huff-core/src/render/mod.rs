//! Rendering pipeline: raw FHIR-JSON elements to highlighted, linked HUFF
//!
//! For each raw element the conversion engine produces YAML, then three
//! passes run in a fixed order, each behind its own preference flag:
//!
//! 1. [`highlight::highlight_yaml`] turns plain YAML into escaped markup;
//! 2. [`linkify::linkify`] wraps bare URLs;
//! 3. [`reference::resolve_references`] links `Reference(...)` summaries.
//!
//! Passes 2 and 3 go through [`markup::rewrite_text`] so neither touches tag
//! interiors or existing anchors, and the highlighter passes its own output
//! through, so [`postprocess`] is idempotent. With every flag off the
//! engine's YAML is inserted verbatim.

pub mod highlight;
pub mod linkify;
pub mod markup;
pub mod reference;

use crate::engine::{ConversionEngine, ConversionResult, run_conversion};
use crate::page::{Page, PreferencesCarrier};
use crate::preferences::Preferences;
use crate::result::Result;
use tracing::{debug, error, info, warn};

/// Apply the enabled postprocessing passes to converted YAML
pub fn postprocess(yaml: &str, prefs: &Preferences, page_url: Option<&str>) -> String {
    let mut html = if prefs.highlight_huff {
        highlight::highlight_yaml(yaml)
    } else {
        yaml.to_string()
    };

    if prefs.make_links_clickable {
        html = linkify::linkify(&html);
    }

    if prefs.make_references_clickable {
        match page_url.and_then(reference::reference_base) {
            Some(base) => html = reference::resolve_references(&html, &base),
            None => warn!(
                "Cannot derive a FHIR base URL from {:?}; references stay as text",
                page_url
            ),
        }
    }

    html
}

/// Wrap rendered markup in the YAML-tagged code block
pub fn wrap_code_block(html: &str) -> String {
    format!(r#"<code class="language-yaml">{html}</code>"#)
}

/// Postprocess and wrap converted YAML for one element
pub fn render_yaml(yaml: &str, prefs: &Preferences, page_url: Option<&str>) -> String {
    wrap_code_block(&postprocess(yaml, prefs, page_url))
}

/// What happened to the elements of one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderReport {
    /// Indices of replaced elements
    pub rendered: Vec<usize>,
    /// Indices left untouched, with the reason
    pub failed: Vec<(usize, String)>,
    pub viewer_controls_removed: bool,
}

impl RenderReport {
    pub fn total(&self) -> usize {
        self.rendered.len() + self.failed.len()
    }
}

/// The page-scoped rendering module
///
/// Reads its preferences from the carrier the injection step wrote, so it
/// needs nothing from the context that attached it.
pub struct RenderingModule<'a> {
    engine: &'a dyn ConversionEngine,
}

impl<'a> RenderingModule<'a> {
    pub fn new(engine: &'a dyn ConversionEngine) -> Self {
        Self { engine }
    }

    /// Render every raw element of `page`
    ///
    /// Fails only when the engine cannot initialize; individual element
    /// failures are logged, reported and leave that element unmodified.
    pub async fn run(&self, page: &mut dyn Page) -> Result<RenderReport> {
        let prefs = match PreferencesCarrier::read_from(page) {
            Ok(prefs) => prefs,
            Err(e) => {
                warn!("Using default preferences: {}", e);
                Preferences::default()
            }
        };

        self.engine.initialize().await?;

        let mut report = RenderReport {
            viewer_controls_removed: page.remove_viewer_controls(),
            ..Default::default()
        };

        let page_url = page.url().map(str::to_string);
        for element in page.raw_elements() {
            match run_conversion(self.engine, &element.text, &prefs.custom_mappings).await {
                ConversionResult::Success { yaml } => {
                    let html = render_yaml(&yaml, &prefs, page_url.as_deref());
                    match page.replace_content(element.index, &html) {
                        Ok(()) => {
                            debug!("Rendered element {}", element.index);
                            report.rendered.push(element.index);
                        }
                        Err(e) => {
                            error!("Cannot replace element {}: {}", element.index, e);
                            report.failed.push((element.index, e.to_string()));
                        }
                    }
                }
                ConversionResult::Failure { error: reason } => {
                    error!("Conversion failed for element {}: {}", element.index, reason);
                    report.failed.push((element.index, reason));
                }
            }
        }

        info!(
            "Rendered {} of {} element(s)",
            report.rendered.len(),
            report.total()
        );
        Ok(report)
    }
}
