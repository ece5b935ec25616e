//! Stats poller
//!
//! Fetches `/api/stats` immediately and then on a fixed interval until
//! stopped. The latest snapshot is published on a [`tokio::sync::watch`]
//! channel. A failed fetch keeps the previous snapshot, sets the error flag,
//! and the loop carries on; the next good fetch clears the flag.
//!
//! [`StatsPoller::refresh`] fetches right away and restarts the interval
//! from that point.
//!
//! Dropping the poller stops it, so a view that owns one cannot leak the
//! timer.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::runtime::Handle;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::api::Backend;
use crate::types::StatsSnapshot;

/// What the analytics view renders
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsView {
    /// Most recent successful snapshot
    pub snapshot: Option<StatsSnapshot>,
    /// Message from the last fetch, if it failed
    pub error: Option<String>,
    /// When the last successful snapshot arrived
    pub updated_at: Option<DateTime<Utc>>,
    /// Fetches attempted so far
    pub fetches: u64,
}

impl StatsView {
    /// True before the first fetch has finished
    pub fn is_loading(&self) -> bool {
        self.fetches == 0
    }

    /// True when the snapshot on screen may be out of date
    pub fn is_stale(&self) -> bool {
        self.error.is_some()
    }
}

/// Periodic `/api/stats` fetcher
pub struct StatsPoller {
    rx: watch::Receiver<StatsView>,
    wake: Arc<Notify>,
    task: Option<JoinHandle<()>>,
}

impl StatsPoller {
    /// Start polling on `runtime`: one fetch now, then one every `interval`.
    pub fn start(backend: Arc<dyn Backend>, runtime: &Handle, interval: Duration) -> Self {
        let (tx, rx) = watch::channel(StatsView::default());
        let wake = Arc::new(Notify::new());
        let woken = Arc::clone(&wake);

        let task = runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                // First tick completes immediately
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = woken.notified() => {
                        tracing::debug!("Stats refresh requested");
                        ticker.reset();
                    }
                }

                let outcome = backend.stats().await;
                tx.send_modify(|view| {
                    view.fetches += 1;
                    match outcome {
                        Ok(snapshot) => {
                            tracing::debug!(total_queries = snapshot.total_queries, "Stats refreshed");
                            view.snapshot = Some(snapshot);
                            view.error = None;
                            view.updated_at = Some(Utc::now());
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "Stats fetch failed");
                            view.error = Some(format!(
                                "Failed to load analytics. {}",
                                e.user_message()
                            ));
                        }
                    }
                });
            }
        });

        tracing::info!(interval_secs = interval.as_secs(), "Stats poller started");

        Self {
            rx,
            wake,
            task: Some(task),
        }
    }

    /// Copy of the latest view
    pub fn view(&self) -> StatsView {
        self.rx.borrow().clone()
    }

    /// Receiver for consumers that want change notifications
    pub fn subscribe(&self) -> watch::Receiver<StatsView> {
        self.rx.clone()
    }

    /// Fetch now instead of waiting for the next tick.
    ///
    /// Requests made while a fetch is running coalesce into one more fetch.
    pub fn refresh(&self) {
        if self.task.is_some() {
            self.wake.notify_one();
        }
    }

    /// Cancel the polling task. Further calls are no-ops.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::info!("Stats poller stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }
}

impl Drop for StatsPoller {
    fn drop(&mut self) {
        self.stop();
    }
}
