//! User preferences controlling detection and postprocessing
//!
//! [`StoredPreferences`] is the raw key/value record as a [`PreferenceStore`]
//! holds it: every key may be missing. [`Preferences`] is the fully defaulted,
//! immutable snapshot the pipeline works with. A snapshot is loaded fresh for
//! every observation cycle and passed explicitly; nothing caches it.
//!
//! The wire form is camelCase JSON with the six keys used by the original
//! browser extension storage, so existing stores can be read unchanged:
//!
//! ```json
//! {
//!   "highlightHuff": true,
//!   "makeLinksClickable": true,
//!   "makeReferencesClickable": true,
//!   "handleContentTypes": "application/fhir+json\napplication/json+fhir",
//!   "customCssStyles": "",
//!   "customMappings": ""
//! }
//! ```
//!
//! [`PreferenceStore`]: crate::store::PreferenceStore

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Content types handled when the user has not configured any
pub const DEFAULT_CONTENT_TYPES: [&str; 2] = ["application/fhir+json", "application/json+fhir"];

/// Fully defaulted preferences snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    /// Run the YAML syntax highlighter over converted output
    pub highlight_huff: bool,

    /// Wrap bare URLs in anchors
    pub make_links_clickable: bool,

    /// Rewrite `Reference(...)` into links against the hosting server
    pub make_references_clickable: bool,

    /// Content-Type substrings that mark a response as FHIR-JSON
    #[serde(with = "content_type_lines")]
    pub handle_content_types: BTreeSet<String>,

    /// User stylesheet replacing the default highlighting theme
    pub custom_css_styles: String,

    /// Custom field mapping handed to the conversion engine
    pub custom_mappings: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            highlight_huff: true,
            make_links_clickable: true,
            make_references_clickable: true,
            handle_content_types: default_content_types(),
            custom_css_styles: String::new(),
            custom_mappings: String::new(),
        }
    }
}

impl Preferences {
    /// Defaults with the bundled stylesheet as the custom CSS default
    pub fn with_bundled_css(css: impl Into<String>) -> Self {
        Self {
            custom_css_styles: css.into(),
            ..Self::default()
        }
    }

    /// Convert back into the stored key/value form with every key present
    #[cfg(test)]
    pub(crate) fn to_stored(&self) -> StoredPreferences {
        StoredPreferences {
            highlight_huff: Some(self.highlight_huff),
            make_links_clickable: Some(self.make_links_clickable),
            make_references_clickable: Some(self.make_references_clickable),
            handle_content_types: Some(join_content_types(&self.handle_content_types)),
            custom_css_styles: Some(self.custom_css_styles.clone()),
            custom_mappings: Some(self.custom_mappings.clone()),
        }
    }
}

/// Raw preference record as persisted; absent keys take defaults on read
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredPreferences {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight_huff: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub make_links_clickable: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub make_references_clickable: Option<bool>,

    /// Newline-delimited list, as typed into the options form
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle_content_types: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_css_styles: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_mappings: Option<String>,
}

impl StoredPreferences {
    /// Fill every missing key from `defaults`
    ///
    /// A `handleContentTypes` value with no usable lines falls back to the
    /// defaults so the classifier always has something to match against.
    pub fn with_defaults(self, defaults: Preferences) -> Preferences {
        let handle_content_types = self
            .handle_content_types
            .map(|raw| parse_content_types(&raw))
            .filter(|set| !set.is_empty())
            .unwrap_or(defaults.handle_content_types);

        Preferences {
            highlight_huff: self.highlight_huff.unwrap_or(defaults.highlight_huff),
            make_links_clickable: self
                .make_links_clickable
                .unwrap_or(defaults.make_links_clickable),
            make_references_clickable: self
                .make_references_clickable
                .unwrap_or(defaults.make_references_clickable),
            handle_content_types,
            custom_css_styles: self
                .custom_css_styles
                .unwrap_or(defaults.custom_css_styles),
            custom_mappings: self.custom_mappings.unwrap_or(defaults.custom_mappings),
        }
    }

    /// Overlay the keys present in `other` onto `self`
    pub fn merge(&mut self, other: StoredPreferences) {
        if other.highlight_huff.is_some() {
            self.highlight_huff = other.highlight_huff;
        }
        if other.make_links_clickable.is_some() {
            self.make_links_clickable = other.make_links_clickable;
        }
        if other.make_references_clickable.is_some() {
            self.make_references_clickable = other.make_references_clickable;
        }
        if other.handle_content_types.is_some() {
            self.handle_content_types = other.handle_content_types;
        }
        if other.custom_css_styles.is_some() {
            self.custom_css_styles = other.custom_css_styles;
        }
        if other.custom_mappings.is_some() {
            self.custom_mappings = other.custom_mappings;
        }
    }

    /// Set a single key by its wire name
    pub fn set_key(&mut self, key: &str, value: &str) -> crate::Result<()> {
        let parse_bool = |v: &str| {
            v.parse::<bool>().map_err(|_| {
                crate::HuffError::store_error(format!(
                    "Preference '{key}' expects true or false, got '{v}'"
                ))
            })
        };

        match key {
            "highlightHuff" => self.highlight_huff = Some(parse_bool(value)?),
            "makeLinksClickable" => self.make_links_clickable = Some(parse_bool(value)?),
            "makeReferencesClickable" => {
                self.make_references_clickable = Some(parse_bool(value)?)
            }
            // `\n` typed on a command line arrives as two characters
            "handleContentTypes" => {
                self.handle_content_types = Some(value.replace("\\n", "\n"))
            }
            "customCssStyles" => self.custom_css_styles = Some(value.to_string()),
            "customMappings" => self.custom_mappings = Some(value.to_string()),
            other => {
                return Err(crate::HuffError::store_error(format!(
                    "Unknown preference key '{other}'"
                )));
            }
        }
        Ok(())
    }
}

/// Wire names of every preference key
pub const PREFERENCE_KEYS: [&str; 6] = [
    "highlightHuff",
    "makeLinksClickable",
    "makeReferencesClickable",
    "handleContentTypes",
    "customCssStyles",
    "customMappings",
];

fn default_content_types() -> BTreeSet<String> {
    DEFAULT_CONTENT_TYPES.iter().map(|s| s.to_string()).collect()
}

/// Split a newline-delimited content type list, dropping blank lines
pub fn parse_content_types(raw: &str) -> BTreeSet<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn join_content_types(set: &BTreeSet<String>) -> String {
    set.iter().map(String::as_str).collect::<Vec<_>>().join("\n")
}

mod content_type_lines {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::BTreeSet;

    pub fn serialize<S>(set: &BTreeSet<String>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::join_content_types(set))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(super::parse_content_types(&raw))
    }
}
