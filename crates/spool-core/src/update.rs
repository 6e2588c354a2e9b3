//! Update loop
//!
//! Drives the engine either once or continuously. In continuous mode the
//! subscription transport pushes [`ChangeNotification`]s into an mpsc queue
//! from its own task; this loop is the single consumer and the only thing
//! that ever calls `sync()`, so engine state needs no locking. Bursts of
//! notifications are coalesced through a debounce window into one sync.

use std::time::Duration;

use spool_inventory::{ChangeNotification, InventoryApi};
use tokio::sync::{mpsc, watch};

use crate::engine::ReconciliationEngine;
use crate::summary::SyncSummary;
use crate::{Error, Result};

const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);
const INITIAL_SYNC_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Where the loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Syncing,
    Waiting,
    Stopped,
}

/// Drives [`ReconciliationEngine::sync`] one-shot or on change events.
pub struct UpdateLoop<C> {
    engine: ReconciliationEngine<C>,
    debounce: Duration,
    state: LoopState,
}

impl<C: InventoryApi> UpdateLoop<C> {
    pub fn new(engine: ReconciliationEngine<C>) -> Self {
        Self {
            engine,
            debounce: DEFAULT_DEBOUNCE,
            state: LoopState::Idle,
        }
    }

    /// Override the notification coalescing window.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// One-shot mode: a single sync, then stop.
    pub async fn run_once(&mut self) -> Result<SyncSummary> {
        self.state = LoopState::Syncing;
        let result = self.engine.sync().await;
        self.state = LoopState::Stopped;
        result
    }

    /// Continuous mode: an initial sync (retried until the service answers),
    /// then one sync per debounced burst of change notifications.
    ///
    /// Runs until the stop signal flips or the notification channel closes
    /// for good. An in-flight sync always finishes; the stop signal is only
    /// honoured between cycles.
    pub async fn run_continuous(
        &mut self,
        mut notifications: mpsc::Receiver<ChangeNotification>,
        mut stop: watch::Receiver<bool>,
    ) -> Result<()> {
        loop {
            self.state = LoopState::Syncing;
            match self.engine.sync().await {
                Ok(summary) => {
                    tracing::info!(
                        created = summary.created,
                        errors = summary.errors.len(),
                        "initial sync complete"
                    );
                    break;
                }
                Err(error) => {
                    tracing::error!(
                        %error,
                        retry_secs = INITIAL_SYNC_RETRY_DELAY.as_secs(),
                        "initial sync failed, will retry"
                    );
                    self.state = LoopState::Waiting;
                    tokio::select! {
                        _ = stop.changed() => {
                            self.state = LoopState::Stopped;
                            return Ok(());
                        }
                        _ = tokio::time::sleep(INITIAL_SYNC_RETRY_DELAY) => {}
                    }
                }
            }
        }

        loop {
            self.state = LoopState::Waiting;
            let event = tokio::select! {
                _ = stop.changed() => {
                    self.state = LoopState::Stopped;
                    return Ok(());
                }
                event = notifications.recv() => event,
            };
            let Some(event) = event else {
                self.state = LoopState::Stopped;
                return Err(Error::SubscriptionClosed);
            };
            tracing::debug!(?event, "change event, debouncing");

            // Let the burst finish, then drain whatever queued up.
            let stopped = tokio::select! {
                _ = stop.changed() => true,
                _ = tokio::time::sleep(self.debounce) => false,
            };
            if stopped {
                self.state = LoopState::Stopped;
                return Ok(());
            }
            let mut coalesced = 0usize;
            while notifications.try_recv().is_ok() {
                coalesced += 1;
            }
            if coalesced > 0 {
                tracing::debug!(coalesced, "coalesced burst into one sync");
            }

            self.state = LoopState::Syncing;
            match self.engine.sync().await {
                Ok(summary) => {
                    tracing::info!(
                        created = summary.created,
                        updated = summary.updated,
                        deleted = summary.deleted,
                        unchanged = summary.unchanged,
                        errors = summary.errors.len(),
                        "resync complete"
                    );
                }
                Err(error) => {
                    // Fetch failed; the next notification triggers a retry.
                    tracing::error!(%error, "resync failed, waiting for next change");
                }
            }
        }
    }
}
