//! Cross-context notification from the observer to a page context
//!
//! Delivery is fire-and-forget. Senders never fail: they return a
//! [`DeliveryReport`] that the caller logs. A page that navigated away simply
//! has no listener any more.

use crate::host::TabId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Message telling a page context that its document is FHIR-JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FhirNotice {
    #[serde(rename = "isJsonFHIR")]
    pub is_json_fhir: bool,
    /// Matched Content-Type header value; informational only
    pub content_type: String,
}

impl FhirNotice {
    pub fn fhir(content_type: impl Into<String>) -> Self {
        Self {
            is_json_fhir: true,
            content_type: content_type.into(),
        }
    }
}

/// Result of a best-effort send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: bool,
    pub reason: Option<String>,
}

impl DeliveryReport {
    pub fn delivered() -> Self {
        Self {
            delivered: true,
            reason: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            delivered: false,
            reason: Some(reason.into()),
        }
    }

    /// Log the report against the target tab
    pub fn log(&self, tab: TabId) {
        if self.delivered {
            debug!("Notice delivered to {}", tab);
        } else {
            warn!(
                "Notice to {} not delivered: {}",
                tab,
                self.reason.as_deref().unwrap_or("unknown reason")
            );
        }
    }
}

/// Host messaging from the observer context to one page context
#[async_trait]
pub trait NoticeSender: Send + Sync {
    async fn send(&self, tab: TabId, notice: FhirNotice) -> DeliveryReport;
}

/// Send a FHIR notice for `content_type` to `tab` and log the outcome
pub async fn notify(sender: &dyn NoticeSender, tab: TabId, content_type: &str) -> DeliveryReport {
    let report = sender.send(tab, FhirNotice::fhir(content_type)).await;
    report.log(tab);
    report
}

/// In-process messenger delivering notices over per-tab channels
///
/// Page contexts call [`ChannelMessenger::register`] when they load and
/// receive notices on the returned receiver. Dropping the receiver is the
/// equivalent of the page navigating away.
#[derive(Debug, Default)]
pub struct ChannelMessenger {
    listeners: Mutex<HashMap<TabId, mpsc::UnboundedSender<FhirNotice>>>,
}

impl ChannelMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a page context listener for `tab`, replacing any previous one
    pub fn register(&self, tab: TabId) -> mpsc::UnboundedReceiver<FhirNotice> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().insert(tab, tx);
        rx
    }

    /// Remove the listener for `tab`
    pub fn unregister(&self, tab: TabId) {
        self.lock().remove(&tab);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<TabId, mpsc::UnboundedSender<FhirNotice>>> {
        // A poisoned map still holds valid senders
        self.listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl NoticeSender for ChannelMessenger {
    async fn send(&self, tab: TabId, notice: FhirNotice) -> DeliveryReport {
        let sender = self.lock().get(&tab).cloned();

        match sender {
            None => DeliveryReport::failed("no listener registered for the tab"),
            Some(tx) => match tx.send(notice) {
                Ok(()) => DeliveryReport::delivered(),
                Err(_) => {
                    self.unregister(tab);
                    DeliveryReport::failed("receiving page context has been torn down")
                }
            },
        }
    }
}
