//! Conversion engine contract
//!
//! The FHIR-JSON to YAML conversion itself is external and versioned. This
//! module pins down the ABI the pipeline relies on: an async initialization
//! step, conversion entry points returning a JSON-encoded
//! [`ConversionResult`], and access to the engine's default mapping table.

mod command;

pub use command::CommandEngine;

use crate::result::Result;
use async_trait::async_trait;
use serde::Deserialize;

/// External FHIR-JSON to YAML converter
#[async_trait]
pub trait ConversionEngine: Send + Sync {
    /// Prepare the engine; must complete before any conversion
    async fn initialize(&self) -> Result<()>;

    /// Convert raw FHIR-JSON text, returning a JSON-encoded result
    async fn convert(&self, raw: &str) -> String;

    /// Convert using a custom mapping table instead of the default one
    async fn convert_with_mapping(&self, raw: &str, mapping: &str) -> String;

    /// The engine's default mapping table, used to seed custom mappings
    async fn default_mapping(&self) -> Result<String>;
}

/// Decoded outcome of one conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionResult {
    Success { yaml: String },
    Failure { error: String },
}

#[derive(Deserialize)]
struct RawConversionResult {
    success: bool,
    #[serde(default)]
    yaml: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ConversionResult {
    /// Decode the engine's JSON answer; malformed answers become failures
    pub fn from_json(encoded: &str) -> Self {
        match serde_json::from_str::<RawConversionResult>(encoded) {
            Ok(RawConversionResult {
                success: true,
                yaml: Some(yaml),
                ..
            }) => Self::Success { yaml },
            Ok(RawConversionResult { success: true, .. }) => Self::Failure {
                error: "engine reported success without yaml".to_string(),
            },
            Ok(RawConversionResult { error, .. }) => Self::Failure {
                error: error.unwrap_or_else(|| "unknown engine error".to_string()),
            },
            Err(e) => Self::Failure {
                error: format!("malformed engine output: {e}"),
            },
        }
    }

    /// Encode in the engine wire format
    pub fn to_json(&self) -> String {
        match self {
            Self::Success { yaml } => serde_json::json!({ "success": true, "yaml": yaml }),
            Self::Failure { error } => serde_json::json!({ "success": false, "error": error }),
        }
        .to_string()
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Run one conversion, picking the custom-mapping entry point when a
/// mapping is configured
pub async fn run_conversion(
    engine: &dyn ConversionEngine,
    raw: &str,
    custom_mapping: &str,
) -> ConversionResult {
    let encoded = if custom_mapping.trim().is_empty() {
        engine.convert(raw).await
    } else {
        engine.convert_with_mapping(raw, custom_mapping).await
    };
    ConversionResult::from_json(&encoded)
}
