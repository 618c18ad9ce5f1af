//! Observer-context listener
//!
//! Sees response headers and tab state but never the document. For each
//! response it reads a fresh preference snapshot, classifies, waits for the
//! active tab to finish loading and notifies it.

use crate::classifier::{ContentTypeMatch, classify};
use crate::host::{ResponseDetails, TabQuery};
use crate::messaging::{DeliveryReport, NoticeSender, notify};
use crate::preferences::Preferences;
use crate::readiness::{ReadinessGate, ReadinessOutcome};
use crate::store::PreferenceStore;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What the observer did with one response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservationOutcome {
    /// Not FHIR-JSON (or not a document load)
    Skipped(ContentTypeMatch),
    /// Matched, but the active tab never finished loading
    NeverReady { attempts: u32 },
    /// Matched and a notice was sent
    Notified {
        content_type: String,
        report: DeliveryReport,
    },
}

pub struct Observer {
    store: Arc<dyn PreferenceStore>,
    tabs: Arc<dyn TabQuery>,
    sender: Arc<dyn NoticeSender>,
    gate: ReadinessGate,
}

impl Observer {
    pub fn new(
        store: Arc<dyn PreferenceStore>,
        tabs: Arc<dyn TabQuery>,
        sender: Arc<dyn NoticeSender>,
        gate: ReadinessGate,
    ) -> Self {
        Self {
            store,
            tabs,
            sender,
            gate,
        }
    }

    /// Handle the headers of one response
    pub async fn on_headers_received(&self, details: &ResponseDetails) -> ObservationOutcome {
        let prefs = match self.store.load(Preferences::default()).await {
            Ok(prefs) => prefs,
            Err(e) => {
                warn!("Preference store unavailable, using defaults: {}", e);
                Preferences::default()
            }
        };

        let matched = classify(details, &prefs);
        if !matched.matched {
            debug!("Skipping {}: {:?}", details.url, matched.header_value);
            return ObservationOutcome::Skipped(matched);
        }

        let content_type = matched.header_value.unwrap_or_default();
        info!("FHIR-JSON response from {} ({})", details.url, content_type);

        match self.gate.wait(self.tabs.as_ref()).await {
            ReadinessOutcome::Ready(tab) => {
                let report = notify(self.sender.as_ref(), tab.id, &content_type).await;
                ObservationOutcome::Notified {
                    content_type,
                    report,
                }
            }
            ReadinessOutcome::NeverReady { attempts } => {
                ObservationOutcome::NeverReady { attempts }
            }
        }
    }
}
