//! PollingController - Repeating Fetch with Silent Fallback
//!
//! ## Responsibilities
//!
//! - Fetch a resource on a fixed interval (first fetch immediately)
//! - Degrade to a locally computed value when a fetch fails or times out
//! - Publish the latest value to any number of observers
//!
//! Failures never reach the caller. Stopping the controller does not abort an
//! in-flight fetch, but its result is discarded.

mod sources;

pub use sources::{EventLogSource, TelemetrySource, TelemetryWalk, WalkBounds};

use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{timeout, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// A pollable resource with a local fallback
#[async_trait]
pub trait PollSource<T>: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Fetch a fresh value
    async fn fetch(&self) -> Result<T>;

    /// Value to adopt when a fetch fails
    fn fallback(&self, previous: &T) -> T;
}

/// Polling cadence
#[derive(Debug, Clone, Copy)]
pub struct PollingConfig {
    pub interval: Duration,
    /// Upper bound for a single fetch
    pub timeout: Duration,
}

/// PollingController instance
pub struct PollingController<T> {
    state: Arc<watch::Sender<T>>,
    cancel: CancellationToken,
    name: String,
}

impl<T> PollingController<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Start polling `source`, beginning from `initial`
    pub fn start(
        initial: T,
        source: Arc<dyn PollSource<T>>,
        config: PollingConfig,
        cancel: CancellationToken,
    ) -> Self {
        let (tx, _) = watch::channel(initial);
        let state = Arc::new(tx);
        let name = source.name().to_string();

        tokio::spawn(Self::run(state.clone(), source, config, cancel.clone()));

        tracing::info!(
            source = %name,
            interval_ms = config.interval.as_millis() as u64,
            "Polling started"
        );

        Self { state, cancel, name }
    }

    async fn run(
        state: Arc<watch::Sender<T>>,
        source: Arc<dyn PollSource<T>>,
        config: PollingConfig,
        cancel: CancellationToken,
    ) {
        let mut ticker = tokio::time::interval(config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let outcome = timeout(config.timeout, source.fetch()).await;

            if cancel.is_cancelled() {
                tracing::debug!(source = %source.name(), "Poll finished after stop, discarding");
                break;
            }

            match outcome {
                Ok(Ok(fresh)) => {
                    state.send_replace(fresh);
                }
                Ok(Err(e)) => {
                    tracing::debug!(source = %source.name(), error = %e, "Poll failed, using fallback");
                    Self::fall_back(&state, source.as_ref());
                }
                Err(_) => {
                    tracing::debug!(source = %source.name(), timeout = ?config.timeout, "Poll timed out, using fallback");
                    Self::fall_back(&state, source.as_ref());
                }
            }
        }

        tracing::debug!(source = %source.name(), "Polling loop exited");
    }

    /// Adopt the fallback; observers are only woken when it differs
    fn fall_back(state: &watch::Sender<T>, source: &dyn PollSource<T>) {
        state.send_if_modified(|current| {
            let next = source.fallback(current);
            if next == *current {
                false
            } else {
                *current = next;
                true
            }
        });
    }

    /// Latest value
    pub fn current(&self) -> T {
        self.state.borrow().clone()
    }

    /// Observe value changes
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.state.subscribe()
    }

    /// Stop polling
    pub fn stop(&self) {
        if !self.cancel.is_cancelled() {
            self.cancel.cancel();
            tracing::info!(source = %self.name, "Polling stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled()
    }
}

impl<T> Drop for PollingController<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
