//! In-memory record of tickets held by the session.

use crate::types::{Ticket, TicketId};

/// Ordered collection of tickets owned by the current session.
///
/// Insertion order is meaningful for display. Invariant: no two tickets share
/// a [`TicketId`] at any time. The ledger is mutated only by the fulfillment
/// step of a terminating poll loop (append) and by refunds (remove).
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    tickets: Vec<Ticket>,
}

impl Ledger {
    /// Create an empty ledger.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tickets: Vec::new(),
        }
    }

    /// Append a ticket, preserving the uniqueness invariant.
    ///
    /// Returns `false` (and leaves the ledger unchanged) if a ticket with the
    /// same id is already held.
    pub fn append(&mut self, ticket: Ticket) -> bool {
        if self.contains(&ticket.ticket_id) {
            return false;
        }
        self.tickets.push(ticket);
        true
    }

    /// Remove the ticket with the given id.
    ///
    /// Removing an absent id is a no-op returning `None`, not an error; the
    /// server's verdict on the refund call is surfaced separately.
    pub fn remove(&mut self, ticket_id: &TicketId) -> Option<Ticket> {
        let index = self
            .tickets
            .iter()
            .position(|t| &t.ticket_id == ticket_id)?;
        Some(self.tickets.remove(index))
    }

    /// Whether a ticket with the given id is held.
    #[must_use]
    pub fn contains(&self, ticket_id: &TicketId) -> bool {
        self.tickets.iter().any(|t| &t.ticket_id == ticket_id)
    }

    /// All held tickets in insertion order.
    #[must_use]
    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    /// Number of held tickets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    /// Whether the ledger holds no tickets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)] // Test code

    use super::*;
    use crate::types::RequestId;
    use proptest::prelude::*;

    fn ticket(request_id: &str, ticket_id: &str) -> Ticket {
        Ticket {
            request_id: RequestId::new(request_id),
            event_id: None,
            ticket_id: TicketId::new(ticket_id),
        }
    }

    #[test]
    fn append_preserves_insertion_order() {
        let mut ledger = Ledger::new();
        assert!(ledger.append(ticket("r1", "t1")));
        assert!(ledger.append(ticket("r1", "t2")));

        let ids: Vec<&str> = ledger
            .tickets()
            .iter()
            .map(|t| t.ticket_id.as_str())
            .collect();
        assert_eq!(ids, vec!["t1", "t2"]);
    }

    #[test]
    fn duplicate_append_is_rejected() {
        let mut ledger = Ledger::new();
        assert!(ledger.append(ticket("r1", "t1")));
        assert!(!ledger.append(ticket("r2", "t1")));
        assert_eq!(ledger.len(), 1);
        // The original holder keeps the ticket.
        assert_eq!(ledger.tickets()[0].request_id.as_str(), "r1");
    }

    #[test]
    fn remove_absent_id_is_noop() {
        let mut ledger = Ledger::new();
        ledger.append(ticket("r1", "t1"));

        assert!(ledger.remove(&TicketId::new("t9")).is_none());
        assert_eq!(ledger.len(), 1);

        assert!(ledger.remove(&TicketId::new("t1")).is_some());
        // Double-remove is equally harmless.
        assert!(ledger.remove(&TicketId::new("t1")).is_none());
        assert!(ledger.is_empty());
    }

    proptest! {
        /// After any interleaving of appends and removes, no two tickets share
        /// an id.
        #[test]
        fn uniqueness_holds_under_any_mutation_sequence(
            ops in prop::collection::vec((prop::bool::ANY, 0usize..8), 0..64)
        ) {
            let mut ledger = Ledger::new();
            for (is_append, id) in ops {
                let ticket_id = format!("t{id}");
                if is_append {
                    ledger.append(ticket("r", &ticket_id));
                } else {
                    ledger.remove(&TicketId::new(ticket_id));
                }

                let mut seen = std::collections::HashSet::new();
                for t in ledger.tickets() {
                    prop_assert!(seen.insert(t.ticket_id.clone()), "duplicate ticket id");
                }
            }
        }

        /// Removing an id that is not held never changes the ledger.
        #[test]
        fn idempotent_removal(ids in prop::collection::vec(0usize..8, 0..16)) {
            let mut ledger = Ledger::new();
            for id in &ids {
                ledger.append(ticket("r", &format!("t{id}")));
            }
            let before: Vec<Ticket> = ledger.tickets().to_vec();

            ledger.remove(&TicketId::new("absent"));
            prop_assert_eq!(ledger.tickets(), before.as_slice());
        }
    }
}
