//! Session context owning the ticket ledger and the queue client.
//!
//! The session replaces ambient global state: everything mutable lives here,
//! is injected where needed, and multiple independent sessions can coexist in
//! one process (and in tests).

use crate::client::QueueClient;
use crate::config::Config;
use crate::error::QueueError;
use crate::ledger::Ledger;
use crate::types::{AdmissionRequest, EventId, Ticket, TicketId};
use crate::watch::Admission;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::info;

/// One user's ticket-purchasing session.
///
/// Owns the [`QueueClient`] and the [`Ledger`]; admissions created through the
/// session append issued tickets to that ledger, and refunds prune it.
/// Client state is ephemeral: nothing survives the session.
#[derive(Debug, Clone)]
pub struct Session {
    client: QueueClient,
    ledger: Arc<RwLock<Ledger>>,
    poll_interval: Duration,
}

impl Session {
    /// Create a session from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::RequestFailed`] if the HTTP client cannot be
    /// constructed.
    pub fn new(config: &Config) -> Result<Self, QueueError> {
        Ok(Self::with_client(QueueClient::new(config)?, config))
    }

    /// Create a session around an existing client.
    #[must_use]
    pub fn with_client(client: QueueClient, config: &Config) -> Self {
        Self {
            client,
            ledger: Arc::new(RwLock::new(Ledger::new())),
            poll_interval: config.poll_interval(),
        }
    }

    /// The underlying queue client, for read-only calls such as metadata
    /// fetches.
    #[must_use]
    pub const fn client(&self) -> &QueueClient {
        &self.client
    }

    /// Request admission: create a queue entry and return the active
    /// admission to watch.
    ///
    /// The caller must immediately drive [`Admission::watch`]; it is the
    /// caller's responsibility to avoid issuing a second request for the same
    /// intent while one is outstanding.
    ///
    /// # Errors
    ///
    /// Everything [`QueueClient::create_entry`] surfaces: insufficient
    /// inventory, invalid event, invalid ticket count, transport failures.
    pub async fn request_admission(
        &self,
        request: AdmissionRequest,
    ) -> Result<Admission, QueueError> {
        let handle = self.client.create_entry(&request).await?;
        info!(
            request_id = %handle.request_id,
            tickets = request.ticket_count,
            "Admission requested"
        );

        Ok(Admission::new(
            self.client.clone(),
            Arc::clone(&self.ledger),
            handle,
            request.event_id,
            self.poll_interval,
        ))
    }

    /// Refund tickets and, on server confirmation, remove them from the
    /// ledger.
    ///
    /// The ledger is left untouched on any error; removal of an id the ledger
    /// does not hold is a no-op at the ledger layer.
    ///
    /// # Errors
    ///
    /// Everything [`QueueClient::refund`] surfaces: refund declined, event not
    /// found, transport failures.
    pub async fn refund(
        &self,
        event_id: Option<&EventId>,
        ticket_ids: &[TicketId],
    ) -> Result<(), QueueError> {
        self.client.refund(event_id, ticket_ids).await?;

        let mut ledger = self.ledger.write().await;
        for ticket_id in ticket_ids {
            ledger.remove(ticket_id);
        }
        info!(refunded = ticket_ids.len(), "Tickets refunded");
        Ok(())
    }

    /// Snapshot of the tickets currently held by this session.
    pub async fn tickets(&self) -> Vec<Ticket> {
        self.ledger.read().await.tickets().to_vec()
    }
}
