//! DOM surface of the page context
//!
//! [`Page`] is the narrow slice of a document the pipeline touches: a carrier
//! element for handing preferences to the rendering module, the raw-text
//! elements to replace, and the head/body attachment points for the module
//! and stylesheets. [`HtmlPage`] implements it over an HTML string.

mod html;

pub use html::HtmlPage;

use crate::error::HuffError;
use crate::preferences::Preferences;
use crate::result::Result;
use serde::{Deserialize, Serialize};

/// Element id of the preferences carrier
pub const CARRIER_ID: &str = "extPrefs";

/// Identifier of the rendering module attached to pages
pub const RENDER_MODULE: &str = "huff-render";

/// A raw-text element found in the page, in document order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawElement {
    pub index: usize,
    pub text: String,
}

/// Document operations available in the page context
pub trait Page: Send {
    /// URL the page was loaded from
    fn url(&self) -> Option<&str>;

    /// Write (or overwrite) a hidden carrier element
    fn write_carrier(&mut self, id: &str, payload: &str) -> Result<()>;

    /// Read a carrier element's value
    fn read_carrier(&self, id: &str) -> Option<String>;

    /// Raw JSON source elements, in document order
    fn raw_elements(&self) -> Vec<RawElement>;

    /// Replace the inner markup of the raw element at `index`
    fn replace_content(&mut self, index: usize, html: &str) -> Result<()>;

    /// Attach a page-scoped executable module
    fn attach_module(&mut self, module: &str) -> Result<()>;

    /// Whether `module` has been attached
    fn has_module(&self, module: &str) -> bool;

    /// Append an inline stylesheet to the head
    fn attach_style(&mut self, css: &str) -> Result<()>;

    /// Append a stylesheet link to the head
    fn attach_stylesheet_link(&mut self, href: &str) -> Result<()>;

    /// Remove the host's raw-view controls, if the page has any
    fn remove_viewer_controls(&mut self) -> bool;
}

/// Typed envelope for preferences handed to the rendering module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferencesCarrier {
    pub version: u32,
    pub preferences: Preferences,
}

impl PreferencesCarrier {
    pub const VERSION: u32 = 1;

    pub fn new(preferences: Preferences) -> Self {
        Self {
            version: Self::VERSION,
            preferences,
        }
    }

    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a payload written by [`PreferencesCarrier::encode`]
    pub fn decode(payload: &str) -> Result<Self> {
        let carrier: Self = serde_json::from_str(payload)?;
        if carrier.version != Self::VERSION {
            return Err(HuffError::page_error(format!(
                "Unsupported preferences carrier version {}",
                carrier.version
            )));
        }
        Ok(carrier)
    }

    /// Serialize into the page's carrier element
    pub fn write_to(&self, page: &mut dyn Page) -> Result<()> {
        page.write_carrier(CARRIER_ID, &self.encode()?)
    }

    /// Read the preferences a page context was handed
    pub fn read_from(page: &dyn Page) -> Result<Preferences> {
        let payload = page
            .read_carrier(CARRIER_ID)
            .ok_or_else(|| HuffError::page_error("Preferences carrier element is missing"))?;
        Ok(Self::decode(&payload)?.preferences)
    }
}
