//! Drives one page load through both contexts
//!
//! The observer context runs on the caller's task; the page context runs on
//! its own task and only learns about the document through the notice it
//! receives over a [`ChannelMessenger`].
//!
//! ```text
//! idle -> awaiting-match -> awaiting-ready -> notified -> injecting -> rendering -> done
//!                     \-> skipped         \-> never-ready
//! ```

use crate::config::HuffConfig;
use crate::engine::ConversionEngine;
use crate::error::HuffError;
use crate::host::{ResourceFetcher, ResponseDetails, Tab, TabId, TabQuery, TabStatus};
use crate::injection::{InjectionOrchestrator, InjectionReport};
use crate::messaging::ChannelMessenger;
use crate::observer::{ObservationOutcome, Observer};
use crate::page::{Page, RENDER_MODULE};
use crate::readiness::ReadinessGate;
use crate::render::{RenderReport, RenderingModule};
use crate::result::Result;
use crate::store::PreferenceStore;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error};

/// Per-page-load pipeline state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    AwaitingMatch,
    AwaitingReady,
    Notified,
    Injecting,
    Rendering,
    Done,
    Skipped,
    NeverReady,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::AwaitingMatch => "awaiting-match",
            Self::AwaitingReady => "awaiting-ready",
            Self::Notified => "notified",
            Self::Injecting => "injecting",
            Self::Rendering => "rendering",
            Self::Done => "done",
            Self::Skipped => "skipped",
            Self::NeverReady => "never-ready",
        };
        f.write_str(name)
    }
}

/// Everything that happened during one page load
#[derive(Debug, Clone)]
pub struct PageLoadReport {
    /// States visited, in order
    pub states: Vec<PipelineState>,
    pub observation: ObservationOutcome,
    pub injection: Option<InjectionReport>,
    pub render: Option<RenderReport>,
}

impl PageLoadReport {
    pub fn final_state(&self) -> PipelineState {
        self.states.last().copied().unwrap_or(PipelineState::Idle)
    }
}

/// Tab query for hosts showing a single, already loaded document
#[derive(Debug, Clone)]
pub struct LoadedTab {
    tab: Tab,
}

impl LoadedTab {
    pub fn new(id: TabId, url: Option<String>) -> Self {
        Self {
            tab: Tab {
                id,
                status: TabStatus::Complete,
                url,
            },
        }
    }
}

#[async_trait]
impl TabQuery for LoadedTab {
    async fn active_tab(&self) -> Result<Option<Tab>> {
        Ok(Some(self.tab.clone()))
    }
}

/// Observer and page context wiring for a host
pub struct Runtime {
    store: Arc<dyn PreferenceStore>,
    engine: Arc<dyn ConversionEngine>,
    injection: Arc<InjectionOrchestrator>,
    gate: ReadinessGate,
}

impl Runtime {
    pub fn new(
        store: Arc<dyn PreferenceStore>,
        resources: Arc<dyn ResourceFetcher>,
        engine: Arc<dyn ConversionEngine>,
        config: &HuffConfig,
    ) -> Self {
        let injection = InjectionOrchestrator::new(
            store.clone(),
            resources,
            config.custom_stylesheet(),
            config.default_stylesheet_url(),
        );
        Self {
            store,
            engine,
            injection: Arc::new(injection),
            gate: ReadinessGate::from_config(config),
        }
    }

    pub fn with_gate(mut self, gate: ReadinessGate) -> Self {
        self.gate = gate;
        self
    }

    /// Run a page load with the given tab state
    ///
    /// Returns the page as the page context left it.
    pub async fn load_page<P>(
        &self,
        page: P,
        details: &ResponseDetails,
        tabs: Arc<dyn TabQuery>,
    ) -> Result<(P, PageLoadReport)>
    where
        P: Page + 'static,
    {
        let tab = details.tab_id.unwrap_or(TabId(0));
        let messenger = Arc::new(ChannelMessenger::new());
        let mut notices = messenger.register(tab);

        let injection = self.injection.clone();
        let engine = self.engine.clone();
        let page_context = tokio::spawn(async move {
            let mut page = page;
            let Some(notice) = notices.recv().await else {
                debug!("Page context closed without a notice");
                return (page, None, None);
            };

            let injected = injection.handle(&notice, &mut page).await;
            if injected.is_none() || !page.has_module(RENDER_MODULE) {
                return (page, injected, None);
            }

            let rendered = match RenderingModule::new(engine.as_ref()).run(&mut page).await {
                Ok(report) => Some(report),
                Err(e) => {
                    error!("Conversion engine failed to initialize: {}", e);
                    None
                }
            };
            (page, injected, rendered)
        });

        let observer = Observer::new(self.store.clone(), tabs, messenger.clone(), self.gate.clone());
        let observation = observer.on_headers_received(details).await;

        // Closing the channel lets a page context that got nothing finish
        messenger.unregister(tab);

        let (page, injection, render) = page_context
            .await
            .map_err(|e| HuffError::internal_error(format!("Page context task failed: {e}")))?;

        let states = trace_states(&observation, injection.is_some(), render.is_some());
        debug!(
            "Page load finished in state {}",
            states.last().copied().unwrap_or(PipelineState::Idle)
        );

        Ok((
            page,
            PageLoadReport {
                states,
                observation,
                injection,
                render,
            },
        ))
    }
}

fn trace_states(observation: &ObservationOutcome, injected: bool, rendered: bool) -> Vec<PipelineState> {
    use PipelineState::*;

    let mut states = vec![Idle, AwaitingMatch];
    match observation {
        ObservationOutcome::Skipped(_) => states.push(Skipped),
        ObservationOutcome::NeverReady { .. } => states.extend([AwaitingReady, NeverReady]),
        ObservationOutcome::Notified { .. } => {
            states.extend([AwaitingReady, Notified]);
            if injected {
                states.push(Injecting);
                if rendered {
                    states.push(Rendering);
                }
            }
            states.push(Done);
        }
    }
    states
}
