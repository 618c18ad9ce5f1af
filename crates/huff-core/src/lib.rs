//! HUFF Core
//!
//! Detects FHIR-JSON documents from their response headers and renders them
//! as syntax-highlighted, cross-linked HUFF. The pipeline spans two contexts:
//! an observer that sees network metadata and tab state, and a page context
//! that owns the document. Host surfaces (tabs, messaging, preference
//! storage, the conversion engine, the DOM) are traits so the same pipeline
//! runs in a browser host, the `huff` CLI or tests.

pub mod classifier;
pub mod config;
pub mod engine;
pub mod error;
pub mod host;
pub mod injection;
pub mod messaging;
pub mod observer;
pub mod page;
pub mod preferences;
pub mod readiness;
pub mod render;
pub mod result;
pub mod runtime;
pub mod store;

// Re-export commonly used types
pub use classifier::{ContentTypeMatch, classify, classify_headers};
pub use config::{ConfigLoader, HuffConfig};
pub use engine::{CommandEngine, ConversionEngine, ConversionResult, run_conversion};
pub use error::{ErrorKind, HuffError};
pub use host::{
    BundledResources, FsFetcher, NoResources, PAGE_STYLESHEET, ResourceFetcher, ResourceType,
    ResponseDetails, ResponseHeader, Tab, TabId, TabQuery, TabStatus, bundled_stylesheet,
};
pub use injection::{InjectionOrchestrator, InjectionReport, StylesheetChoice};
pub use messaging::{ChannelMessenger, DeliveryReport, FhirNotice, NoticeSender, notify};
pub use observer::{ObservationOutcome, Observer};
pub use page::{CARRIER_ID, HtmlPage, Page, PreferencesCarrier, RENDER_MODULE, RawElement};
pub use preferences::{DEFAULT_CONTENT_TYPES, PREFERENCE_KEYS, Preferences, StoredPreferences};
pub use readiness::{ReadinessGate, ReadinessOutcome};
pub use render::{RenderReport, RenderingModule, postprocess, render_yaml};
pub use result::{Result, ResultExt};
pub use runtime::{LoadedTab, PageLoadReport, PipelineState, Runtime};
pub use store::{FileStore, MemoryStore, PreferenceStore};

/// Initialize the tracing subscriber for logging
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("huff=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true)
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
