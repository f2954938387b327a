//! Periodic event-metadata refresh.
//!
//! Read-only and independent of the admission state machine: it shares the
//! transport primitive but runs on its own schedule and touches no admission
//! state. Consumers watch the published [`EventInfo`] snapshots for display.

use crate::client::QueueClient;
use crate::error::QueueError;
use crate::types::{EventId, EventInfo};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Fixed-interval refresher for one event's display metadata.
#[derive(Debug)]
pub struct InfoRefresher {
    client: QueueClient,
    event_id: Option<EventId>,
    interval: Duration,
}

impl InfoRefresher {
    /// Create a refresher for the given event (or the sole event in
    /// single-event deployments).
    #[must_use]
    pub const fn new(client: QueueClient, event_id: Option<EventId>, interval: Duration) -> Self {
        Self {
            client,
            event_id,
            interval,
        }
    }

    /// Spawn the refresher as a background task.
    ///
    /// Returns a receiver of metadata snapshots (`None` until the first
    /// successful fetch) and a handle for shutting the task down. A failed
    /// fetch is logged and the previous snapshot retained; the next tick
    /// retries.
    #[must_use]
    pub fn spawn(self) -> (watch::Receiver<Option<EventInfo>>, RefresherHandle) {
        let (tx, rx) = watch::channel(None);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(self.run(tx, shutdown_rx));

        (
            rx,
            RefresherHandle {
                shutdown: shutdown_tx,
                task,
            },
        )
    }

    async fn run(
        self,
        tx: watch::Sender<Option<EventInfo>>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        info!(interval = ?self.interval, "Info refresher started");

        loop {
            match self.client.fetch_event(self.event_id.as_ref()).await {
                Ok(event_info) => {
                    let _ = tx.send(Some(event_info));
                }
                Err(e) => {
                    warn!(error = %e, "Failed to refresh event info");
                }
            }

            tokio::select! {
                _ = shutdown.changed() => break,
                () = tokio::time::sleep(self.interval) => {}
            }
        }

        info!("Info refresher stopped");
    }
}

/// Handle for stopping a spawned [`InfoRefresher`].
#[derive(Debug)]
pub struct RefresherHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl RefresherHandle {
    /// Signal shutdown and wait for the task to stop.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::RequestFailed`] if the task panicked.
    pub async fn shutdown(self) -> Result<(), QueueError> {
        let _ = self.shutdown.send(true);
        self.task
            .await
            .map_err(|e| QueueError::RequestFailed(e.to_string()))
    }
}
