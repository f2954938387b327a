//! The poll loop that resolves a queue handle to a terminal outcome.
//!
//! An [`Admission`] owns one active [`QueueHandle`] and drives the repeated
//! status-check cycle: cancellation check, poll, interpret, throttle. Progress
//! is published as [`QueueUpdate`] values on a watch channel so a presentation
//! layer can subscribe without the core depending on any rendering surface.
//!
//! Cancellation is cooperative. A [`Canceller`] talks to the server and, on a
//! confirmed deletion, sets a per-admission flag; the loop alone consumes the
//! flag and performs the transition to `Cancelled`. The flag check happens
//! before every poll send, so a successful cancel is overtaken by at most one
//! poll round-trip already in flight.

use crate::client::QueueClient;
use crate::error::QueueError;
use crate::ledger::Ledger;
use crate::types::{
    AdmissionOutcome, EventId, QueueHandle, QueueUpdate, RequestId, Ticket,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{RwLock, watch};
use tracing::{debug, info, warn};

/// Per-admission cancellation flag.
///
/// Single-producer/single-consumer: set only by a successful [`Canceller`]
/// call, consumed (and thereby reset) exactly once by the poll loop.
#[derive(Clone, Debug, Default)]
struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Atomically read and clear the flag.
    fn consume(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }
}

/// One active admission: a queue handle plus everything needed to watch it.
///
/// Created by [`crate::Session::request_admission`]. Exactly one terminal
/// state is ever reached; afterwards the handle is expired and both further
/// watching (by construction, `watch` consumes `self`) and cancellation fail.
pub struct Admission {
    client: QueueClient,
    ledger: Arc<RwLock<Ledger>>,
    handle: QueueHandle,
    event_id: Option<EventId>,
    poll_interval: Duration,
    cancel: CancelFlag,
    terminal: Arc<AtomicBool>,
    updates: watch::Sender<QueueUpdate>,
}

impl Admission {
    pub(crate) fn new(
        client: QueueClient,
        ledger: Arc<RwLock<Ledger>>,
        handle: QueueHandle,
        event_id: Option<EventId>,
        poll_interval: Duration,
    ) -> Self {
        let (updates, _) = watch::channel(QueueUpdate::Idle);
        Self {
            client,
            ledger,
            handle,
            event_id,
            poll_interval,
            cancel: CancelFlag::default(),
            terminal: Arc::new(AtomicBool::new(false)),
            updates,
        }
    }

    /// The queue handle being watched.
    #[must_use]
    pub const fn handle(&self) -> &QueueHandle {
        &self.handle
    }

    /// Subscribe to progress updates from the poll loop.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<QueueUpdate> {
        self.updates.subscribe()
    }

    /// Obtain a handle that can cancel this admission from another task.
    #[must_use]
    pub fn canceller(&self) -> Canceller {
        Canceller {
            client: self.client.clone(),
            request_id: self.handle.request_id.clone(),
            cancel: self.cancel.clone(),
            terminal: Arc::clone(&self.terminal),
        }
    }

    /// Drive the poll loop until it reaches a terminal state.
    ///
    /// Loop shape, per iteration:
    /// 1. consume the cancellation flag; if set, terminate as `Cancelled`
    ///    without sending the poll already scheduled for this iteration;
    /// 2. poll the handle's location; a transport failure terminates the loop
    ///    immediately with that error, with no automatic retry (the bounded
    ///    per-request timeout already prevents unbounded hangs);
    /// 3. interpret the reported position: `0` is fulfillment (tickets are
    ///    appended to the session ledger), `-1` means still joining, any other
    ///    value is the queue depth, taken literally;
    /// 4. sleep for the configured poll interval before the next iteration,
    ///    purely to bound request rate.
    ///
    /// # Errors
    ///
    /// Any [`QueueError`] from polling. The admission is terminal afterwards
    /// either way.
    pub async fn watch(self) -> Result<AdmissionOutcome, QueueError> {
        let result = self.run().await;
        self.terminal.store(true, Ordering::SeqCst);
        if let Err(e) = &result {
            let _ = self.updates.send(QueueUpdate::Errored(e.to_string()));
        }
        result
    }

    async fn run(&self) -> Result<AdmissionOutcome, QueueError> {
        loop {
            // Cancellation beats any poll scheduled but not yet sent; a stale
            // position report must not overwrite a user-visible cancellation.
            if self.cancel.consume() {
                info!(request_id = %self.handle.request_id, "Admission cancelled");
                let _ = self.updates.send(QueueUpdate::Cancelled);
                return Ok(AdmissionOutcome::Cancelled);
            }

            let status = self.client.poll(&self.handle).await?;

            if status.is_fulfilled() {
                let tickets = self.record_fulfillment(&status.ticket_ids, status.event_id).await;
                info!(
                    request_id = %self.handle.request_id,
                    tickets = tickets.len(),
                    "Tickets issued"
                );
                let _ = self.updates.send(QueueUpdate::Fulfilled);
                return Ok(AdmissionOutcome::Fulfilled(tickets));
            }

            if status.is_joining() {
                debug!(request_id = %self.handle.request_id, "Joining queue");
                let _ = self.updates.send(QueueUpdate::Joining);
            } else {
                debug!(
                    request_id = %self.handle.request_id,
                    position = status.position,
                    "Queue position"
                );
                // A malformed negative report must not masquerade as depth 0,
                // which would read as imminent fulfillment.
                let position = u32::try_from(status.position).unwrap_or(u32::MAX);
                let _ = self.updates.send(QueueUpdate::Position(position));
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Append the issued tickets to the session ledger, tagging each with the
    /// handle's request id and the event id from the status (falling back to
    /// the one the admission was created with).
    async fn record_fulfillment(
        &self,
        ticket_ids: &[crate::types::TicketId],
        status_event_id: Option<EventId>,
    ) -> Vec<Ticket> {
        let event_id = status_event_id.or_else(|| self.event_id.clone());
        let tickets: Vec<Ticket> = ticket_ids
            .iter()
            .map(|ticket_id| Ticket {
                request_id: self.handle.request_id.clone(),
                event_id: event_id.clone(),
                ticket_id: ticket_id.clone(),
            })
            .collect();

        let mut ledger = self.ledger.write().await;
        for ticket in &tickets {
            if !ledger.append(ticket.clone()) {
                warn!(ticket_id = %ticket.ticket_id, "Duplicate ticket id ignored");
            }
        }

        tickets
    }
}

impl std::fmt::Debug for Admission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Admission")
            .field("handle", &self.handle)
            .field("terminal", &self.terminal.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Clone-able cancellation handle for one admission.
#[derive(Clone)]
pub struct Canceller {
    client: QueueClient,
    request_id: RequestId,
    cancel: CancelFlag,
    terminal: Arc<AtomicBool>,
}

impl Canceller {
    /// Request id of the admission this cancels.
    #[must_use]
    pub const fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    /// Ask the server to cancel the admission.
    ///
    /// On a confirmed deletion the cancellation flag is set and nothing else
    /// happens here: the poll loop alone observes the flag and transitions to
    /// `Cancelled`, so the same handle is never terminated from two call
    /// sites. The loop may still have one poll in flight; cancellation only
    /// guarantees to stop future iterations.
    ///
    /// # Errors
    ///
    /// - [`QueueError::HandleExpired`] if the poll loop already terminated
    /// - [`QueueError::AlreadyFulfilled`] on 409; the flag is NOT set, since
    ///   the loop is about to observe (or already observed) fulfillment and
    ///   erasing issued tickets would be wrong
    /// - [`QueueError::RequestNotFound`] on 404
    /// - transport failures and [`QueueError::Unexpected`] otherwise
    pub async fn cancel(&self) -> Result<(), QueueError> {
        if self.terminal.load(Ordering::SeqCst) {
            return Err(QueueError::HandleExpired);
        }

        self.client.cancel(&self.request_id).await?;
        info!(request_id = %self.request_id, "Cancellation confirmed by server");
        self.cancel.set();
        Ok(())
    }
}

impl std::fmt::Debug for Canceller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canceller")
            .field("request_id", &self.request_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)] // Test code

    use super::*;
    use crate::config::Config;

    #[test]
    fn cancel_flag_is_consumed_exactly_once() {
        let flag = CancelFlag::default();
        assert!(!flag.consume());

        flag.set();
        assert!(flag.consume());
        // Consuming resets the flag.
        assert!(!flag.consume());
    }

    #[test]
    fn cancel_flag_is_shared_between_clones() {
        let producer = CancelFlag::default();
        let consumer = producer.clone();

        producer.set();
        assert!(consumer.consume());
        assert!(!producer.consume());
    }

    #[tokio::test]
    async fn cancel_after_terminal_state_fails_without_network() {
        let client = QueueClient::new(&Config::default()).unwrap();
        let admission = Admission::new(
            client,
            Arc::new(RwLock::new(Ledger::new())),
            QueueHandle {
                request_id: RequestId::new("r1"),
                poll_location: "/queue/r1".to_string(),
            },
            None,
            Duration::from_millis(1),
        );

        let canceller = admission.canceller();
        admission.terminal.store(true, Ordering::SeqCst);

        // Expired handles must fail, not silently no-op. No server is
        // listening here, so reaching the network would error differently.
        let result = canceller.cancel().await;
        assert!(matches!(result, Err(QueueError::HandleExpired)));
    }

    #[test]
    fn subscribers_start_idle() {
        let client = QueueClient::new(&Config::default()).unwrap();
        let admission = Admission::new(
            client,
            Arc::new(RwLock::new(Ledger::new())),
            QueueHandle {
                request_id: RequestId::new("r1"),
                poll_location: "/queue/r1".to_string(),
            },
            None,
            Duration::from_millis(1),
        );

        let rx = admission.subscribe();
        assert_eq!(*rx.borrow(), QueueUpdate::Idle);
    }
}
