//! Page-context injection, triggered by a [`FhirNotice`]
//!
//! Every step is attempted regardless of the others failing; the returned
//! [`InjectionReport`] says which ones took effect.

use crate::host::ResourceFetcher;
use crate::messaging::FhirNotice;
use crate::page::{Page, PreferencesCarrier, RENDER_MODULE};
use crate::preferences::Preferences;
use crate::result::ResultExt;
use crate::store::PreferenceStore;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Which highlighting stylesheet was attached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StylesheetChoice {
    /// Inline `customCssStyles`
    Custom,
    /// Link to the default highlighting theme
    Default,
    /// Highlighting is off, or attaching failed
    None,
}

/// Outcome of one injection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectionReport {
    pub carrier_written: bool,
    pub module_attached: bool,
    pub stylesheet: StylesheetChoice,
    /// Snapshot handed to the page
    pub preferences: Preferences,
}

/// Prepares a page for rendering
pub struct InjectionOrchestrator {
    store: Arc<dyn PreferenceStore>,
    resources: Arc<dyn ResourceFetcher>,
    custom_stylesheet: String,
    default_stylesheet_url: String,
}

impl InjectionOrchestrator {
    pub fn new(
        store: Arc<dyn PreferenceStore>,
        resources: Arc<dyn ResourceFetcher>,
        custom_stylesheet: impl Into<String>,
        default_stylesheet_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            resources,
            custom_stylesheet: custom_stylesheet.into(),
            default_stylesheet_url: default_stylesheet_url.into(),
        }
    }

    /// Handle a notice; returns `None` when the notice is not for FHIR-JSON
    pub async fn handle(&self, notice: &FhirNotice, page: &mut dyn Page) -> Option<InjectionReport> {
        if !notice.is_json_fhir {
            debug!("Ignoring notice for non-FHIR content");
            return None;
        }
        info!("Injecting renderer for {}", notice.content_type);

        let prefs = self.load_preferences().await;

        let carrier_written = PreferencesCarrier::new(prefs.clone())
            .write_to(page)
            .log_and_continue()
            .is_some();

        let module_attached = page
            .attach_module(RENDER_MODULE)
            .log_and_continue()
            .is_some();

        let stylesheet = if !prefs.highlight_huff {
            StylesheetChoice::None
        } else if !prefs.custom_css_styles.trim().is_empty() {
            match page.attach_style(&prefs.custom_css_styles).log_and_continue() {
                Some(()) => StylesheetChoice::Custom,
                None => StylesheetChoice::None,
            }
        } else {
            match page
                .attach_stylesheet_link(&self.default_stylesheet_url)
                .log_and_continue()
            {
                Some(()) => StylesheetChoice::Default,
                None => StylesheetChoice::None,
            }
        };

        Some(InjectionReport {
            carrier_written,
            module_attached,
            stylesheet,
            preferences: prefs,
        })
    }

    /// Fresh preference snapshot; the bundled stylesheet is the default CSS
    async fn load_preferences(&self) -> Preferences {
        let css = self
            .resources
            .fetch_text(&self.custom_stylesheet)
            .await
            .or_default_logged("custom stylesheet");
        let defaults = Preferences::with_bundled_css(css);

        match self.store.load(defaults.clone()).await {
            Ok(prefs) => prefs,
            Err(e) => {
                warn!("Preference store unavailable, using defaults: {}", e);
                defaults
            }
        }
    }
}
