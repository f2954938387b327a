//! Domain and wire types for the queue-admission workflow.
//!
//! Identifiers are opaque tokens issued by the server; the client never
//! inspects or mints them, so they are thin `String` newtypes.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

// ============================================================================
// Identifiers
// ============================================================================

/// Identifier of one outstanding admission request, issued on entry creation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// Wrap a server-issued request id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the raw id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a single issued ticket.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(String);

impl TicketId {
    /// Wrap a server-issued ticket id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the raw id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an event in multi-event deployments.
///
/// Single-event deployments omit it everywhere it appears as `Option`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Wrap a server-issued event id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the raw id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Admission
// ============================================================================

/// Caller's request for tickets: which event (if any) and how many.
///
/// Transient: exists only for the duration of one `request_admission` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdmissionRequest {
    /// Target event; `None` in single-event deployments.
    pub event_id: Option<EventId>,
    /// Number of tickets requested; must be at least 1.
    pub ticket_count: u32,
}

impl AdmissionRequest {
    /// Create an admission request.
    #[must_use]
    pub const fn new(event_id: Option<EventId>, ticket_count: u32) -> Self {
        Self {
            event_id,
            ticket_count,
        }
    }
}

/// Client-side reference to one outstanding queue entry.
///
/// Valid from creation until the poll loop reaches a terminal state; the
/// watcher refuses to reuse it afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueueHandle {
    /// Server-assigned request id.
    pub request_id: RequestId,
    /// Poll location from the creation response's `Location` header.
    pub poll_location: String,
}

/// Queue position sentinel: accepted but not yet assigned a position.
pub const POSITION_JOINING: i64 = -1;

/// Queue position sentinel: tickets issued.
pub const POSITION_FULFILLED: i64 = 0;

/// One poll response: current position plus issued ticket ids on fulfillment.
///
/// The client treats every reported position literally; it does not assert the
/// server's monotonic non-increasing discipline.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStatus {
    /// Request id echoed by the server.
    pub id: RequestId,
    /// Event the request targets, when the deployment is multi-event.
    #[serde(default)]
    pub event_id: Option<EventId>,
    /// `-1` joining, `0` fulfilled, `> 0` queue depth ahead of this request.
    pub position: i64,
    /// Issued ticket ids; meaningful only when `position == 0`.
    #[serde(default)]
    pub ticket_ids: SmallVec<[TicketId; 4]>,
}

impl QueueStatus {
    /// Whether this status signals fulfillment.
    #[must_use]
    pub const fn is_fulfilled(&self) -> bool {
        self.position == POSITION_FULFILLED
    }

    /// Whether the request has not been assigned a queue position yet.
    #[must_use]
    pub const fn is_joining(&self) -> bool {
        self.position == POSITION_JOINING
    }
}

// ============================================================================
// Tickets
// ============================================================================

/// A ticket held by the session, created on fulfillment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Admission request the ticket was issued for.
    pub request_id: RequestId,
    /// Event the ticket belongs to, when known.
    pub event_id: Option<EventId>,
    /// The ticket's own id.
    pub ticket_id: TicketId,
}

/// Display metadata for an event, refreshed out-of-band from the admission
/// state machine.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct EventInfo {
    /// Performing artist.
    pub artist: String,
    /// Venue name.
    pub venue: String,
    /// Event date and time, sent as an ISO-8601 string.
    #[serde(deserialize_with = "deserialize_event_datetime")]
    pub datetime: DateTime<Utc>,
    /// Remaining ticket count.
    pub count: u32,
}

/// Parses the `datetime` field of an event body.
///
/// Servers send either a full RFC 3339 instant (`2025-03-01T19:30:00Z`) or a
/// zone-less local timestamp (`2025-03-01T19:30:00`); the latter is read as
/// UTC.
fn deserialize_event_datetime<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|datetime| datetime.with_timezone(&Utc))
        .or_else(|_| raw.parse::<NaiveDateTime>().map(|naive| naive.and_utc()))
        .map_err(serde::de::Error::custom)
}

// ============================================================================
// Watch outcomes
// ============================================================================

/// Discrete progress events emitted by the poll loop for subscribers.
///
/// The core has no rendering surface; a presentation layer subscribes to these
/// instead.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueueUpdate {
    /// No poll has been interpreted yet.
    Idle,
    /// Accepted by the server, not yet assigned a queue position.
    Joining,
    /// Numeric queue depth ahead of this request.
    Position(u32),
    /// Tickets issued; the ledger has been updated.
    Fulfilled,
    /// Cancellation observed; the handle is dead.
    Cancelled,
    /// The loop aborted with an error.
    Errored(String),
}

/// Terminal result of watching a queue handle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AdmissionOutcome {
    /// Tickets were issued and appended to the session ledger.
    Fulfilled(Vec<Ticket>),
    /// The request was cancelled before fulfillment; ledger untouched.
    Cancelled,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)] // Test code

    use super::*;

    #[test]
    fn queue_status_parses_fulfilled_body() {
        let status: QueueStatus = serde_json::from_str(
            r#"{"id": "r1", "eventId": "4", "tickets": 2, "position": 0, "ticketIds": ["t1", "t2"]}"#,
        )
        .unwrap();

        assert!(status.is_fulfilled());
        assert_eq!(status.id, RequestId::new("r1"));
        assert_eq!(status.event_id, Some(EventId::new("4")));
        assert_eq!(
            status.ticket_ids.to_vec(),
            vec![TicketId::new("t1"), TicketId::new("t2")]
        );
    }

    #[test]
    fn queue_status_defaults_optional_fields() {
        // Single-event deployments omit eventId; ticketIds is absent until
        // fulfillment in some server versions.
        let status: QueueStatus =
            serde_json::from_str(r#"{"id": "r1", "position": -1}"#).unwrap();

        assert!(status.is_joining());
        assert!(!status.is_fulfilled());
        assert_eq!(status.event_id, None);
        assert!(status.ticket_ids.is_empty());
    }

    #[test]
    fn queue_status_treats_positive_position_literally() {
        let status: QueueStatus =
            serde_json::from_str(r#"{"id": "r1", "position": 17, "ticketIds": []}"#).unwrap();

        assert!(!status.is_fulfilled());
        assert!(!status.is_joining());
        assert_eq!(status.position, 17);
    }

    #[test]
    fn event_info_parses_rfc3339_datetime() {
        let info: EventInfo = serde_json::from_str(
            r#"{"artist": "Taylor Swift", "venue": "Wembley", "datetime": "2025-03-01T19:30:00Z", "count": 120}"#,
        )
        .unwrap();

        assert_eq!(info.artist, "Taylor Swift");
        assert_eq!(info.datetime.to_rfc3339(), "2025-03-01T19:30:00+00:00");
    }

    #[test]
    fn event_info_parses_zoneless_datetime_as_utc() {
        let info: EventInfo = serde_json::from_str(
            r#"{"artist": "Taylor Swift", "venue": "Wembley", "datetime": "2025-03-01T19:30:00", "count": 120}"#,
        )
        .unwrap();

        assert_eq!(info.datetime.to_rfc3339(), "2025-03-01T19:30:00+00:00");
    }

    #[test]
    fn event_info_rejects_unparseable_datetime() {
        let result = serde_json::from_str::<EventInfo>(
            r#"{"artist": "A", "venue": "V", "datetime": "next friday", "count": 5}"#,
        );

        assert!(result.is_err());
    }
}
