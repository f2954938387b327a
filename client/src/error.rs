//! Error types for the queue-admission client.

use thiserror::Error;

/// Errors that can occur while driving the queue-admission workflow.
///
/// Variants fall into three categories: business rejections the server
/// explicitly signalled (never retried, never a defect), not-found outcomes
/// for stale references, and transport or unexpected failures carrying the raw
/// status for diagnosis.
#[derive(Debug, Error)]
pub enum QueueError {
    /// An admission request must ask for at least one ticket.
    #[error("ticket count must be at least 1")]
    InvalidTicketCount,

    /// The server declined the request: not enough tickets available.
    #[error("not enough tickets available")]
    InsufficientInventory,

    /// The server declined the request: the selected event is invalid.
    #[error("invalid event selected")]
    InvalidEvent,

    /// Cancellation declined: the tickets were already issued.
    #[error("cannot cancel, tickets already issued")]
    AlreadyFulfilled,

    /// The queue entry no longer exists on the server.
    #[error("ticket purchase request not found")]
    RequestNotFound,

    /// No event matches the given id.
    #[error("event not found for ticket")]
    EventNotFound,

    /// The server's refund policy declined the refund.
    #[error("ticket could not be refunded")]
    RefundDeclined,

    /// The queue handle already reached a terminal state and must not be
    /// reused.
    #[error("queue handle expired: poll loop already reached a terminal state")]
    HandleExpired,

    /// HTTP request failed (connection error, timeout, ...).
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// Response body could not be parsed, or a required header was missing.
    #[error("response parsing failed: {0}")]
    ResponseParse(String),

    /// Any status outside the anticipated set for the operation.
    #[error("unexpected server response (HTTP {status})")]
    Unexpected {
        /// Raw HTTP status code, surfaced for diagnosis.
        status: u16,
    },
}

impl QueueError {
    /// Whether the server explicitly declined the operation for domain
    /// reasons.
    ///
    /// Business rejections are surfaced to the user and never retried
    /// automatically.
    #[must_use]
    pub const fn is_business_rejection(&self) -> bool {
        matches!(
            self,
            Self::InsufficientInventory
                | Self::InvalidEvent
                | Self::AlreadyFulfilled
                | Self::RefundDeclined
        )
    }

    /// Whether a referenced handle, ticket, or event is no longer valid.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::RequestNotFound | Self::EventNotFound | Self::HandleExpired
        )
    }
}

impl From<reqwest::Error> for QueueError {
    fn from(err: reqwest::Error) -> Self {
        Self::RequestFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_is_disjoint() {
        let rejections = [
            QueueError::InsufficientInventory,
            QueueError::InvalidEvent,
            QueueError::AlreadyFulfilled,
            QueueError::RefundDeclined,
        ];
        for err in &rejections {
            assert!(err.is_business_rejection());
            assert!(!err.is_not_found());
        }

        let not_found = [
            QueueError::RequestNotFound,
            QueueError::EventNotFound,
            QueueError::HandleExpired,
        ];
        for err in &not_found {
            assert!(err.is_not_found());
            assert!(!err.is_business_rejection());
        }

        let transport = QueueError::Unexpected { status: 500 };
        assert!(!transport.is_business_rejection());
        assert!(!transport.is_not_found());
    }
}
