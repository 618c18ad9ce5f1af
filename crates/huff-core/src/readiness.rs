//! Readiness gate: wait for the active tab to finish loading
//!
//! The observer context cannot subscribe to page-internal load events, so the
//! gate polls the host for the active, last-focused tab until it reports
//! `complete`. The tab is re-queried each time rather than tracked by id; if
//! the user switches tabs mid-wait the gate resolves on whichever tab is
//! active when loading completes. Callers must tolerate that.

use crate::config::HuffConfig;
use crate::host::{Tab, TabQuery};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Outcome of waiting on the gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadinessOutcome {
    /// The active tab reported `complete`
    Ready(Tab),
    /// The attempt bound was reached first
    NeverReady { attempts: u32 },
}

/// Polling readiness gate
#[derive(Debug, Clone)]
pub struct ReadinessGate {
    interval: Duration,
    max_attempts: Option<u32>,
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(10),
            max_attempts: Some(3000),
        }
    }
}

impl ReadinessGate {
    pub fn new(interval: Duration, max_attempts: Option<u32>) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Gate that polls until the page completes, however long that takes
    pub fn unbounded(interval: Duration) -> Self {
        Self::new(interval, None)
    }

    pub fn from_config(config: &HuffConfig) -> Self {
        Self::new(config.poll_interval(), config.max_attempts())
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }

    /// Poll `tabs` until the active tab is complete or the bound is hit
    ///
    /// A failed query or a missing active tab counts as a not-ready sample.
    pub async fn wait(&self, tabs: &dyn TabQuery) -> ReadinessOutcome {
        let mut attempts: u32 = 0;

        loop {
            attempts = attempts.saturating_add(1);

            match tabs.active_tab().await {
                Ok(Some(tab)) if tab.is_complete() => {
                    debug!("{} ready after {} check(s)", tab.id, attempts);
                    return ReadinessOutcome::Ready(tab);
                }
                Ok(Some(tab)) => trace!("{} still {:?}", tab.id, tab.status),
                Ok(None) => trace!("No active tab"),
                Err(e) => debug!("Tab query failed: {}", e),
            }

            if self.max_attempts.is_some_and(|max| attempts >= max) {
                warn!("Page never became ready after {} check(s)", attempts);
                return ReadinessOutcome::NeverReady { attempts };
            }

            tokio::time::sleep(self.interval).await;
        }
    }
}
