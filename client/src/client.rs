//! HTTP primitives of the queue-admission workflow.
//!
//! [`QueueClient`] speaks the ticket server's contract: entry creation, status
//! polling, cancellation, refunds and event metadata. Each operation maps the
//! anticipated status categories to exactly one [`QueueError`] variant or a
//! typed success value; anything outside the anticipated set surfaces as
//! [`QueueError::Unexpected`] with the raw status.

use crate::config::Config;
use crate::error::QueueError;
use crate::nonce::{NonceSource, RandomNonce};
use crate::types::{AdmissionRequest, EventId, EventInfo, QueueHandle, QueueStatus, TicketId};
use reqwest::{Client, StatusCode, Url, header};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateEntryBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    event_id: Option<&'a EventId>,
    tickets: u32,
}

#[derive(Deserialize)]
struct CreateEntryResponse {
    id: crate::types::RequestId,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefundBody<'a> {
    ticket_ids: &'a [TicketId],
}

/// Client for the ticket server's queue-admission contract.
#[derive(Clone)]
pub struct QueueClient {
    client: Client,
    base_url: String,
    nonce: Arc<dyn NonceSource>,
}

impl QueueClient {
    /// Create a new client from configuration, using the production nonce
    /// source.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::RequestFailed`] if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(config: &Config) -> Result<Self, QueueError> {
        Self::with_nonce_source(config, Arc::new(RandomNonce::new()))
    }

    /// Create a new client with an explicit nonce source.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::RequestFailed`] if the underlying HTTP client
    /// cannot be constructed.
    pub fn with_nonce_source(
        config: &Config,
        nonce: Arc<dyn NonceSource>,
    ) -> Result<Self, QueueError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| QueueError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            nonce,
        })
    }

    /// Create a queue entry for the given admission request.
    ///
    /// On acceptance (201) the returned [`QueueHandle`] carries the request id
    /// from the body and the poll location from the `Location` header; the
    /// caller must immediately proceed to the poll loop.
    ///
    /// # Errors
    ///
    /// - [`QueueError::InvalidTicketCount`] if fewer than 1 ticket is asked
    /// - [`QueueError::InsufficientInventory`] on 200 (OK but no queue)
    /// - [`QueueError::InvalidEvent`] on 422
    /// - [`QueueError::Unexpected`] for any other status
    /// - transport and parse failures
    pub async fn create_entry(
        &self,
        request: &AdmissionRequest,
    ) -> Result<QueueHandle, QueueError> {
        if request.ticket_count < 1 {
            return Err(QueueError::InvalidTicketCount);
        }

        let response = self
            .client
            .post(format!("{}/queue", self.base_url))
            .header(header::ACCEPT, "application/json")
            .header("X-Nonce", self.nonce.nonce())
            .json(&CreateEntryBody {
                event_id: request.event_id.as_ref(),
                tickets: request.ticket_count,
            })
            .send()
            .await?;

        match response.status() {
            StatusCode::CREATED => {
                let poll_location = response
                    .headers()
                    .get(header::LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .ok_or_else(|| {
                        QueueError::ResponseParse("missing Location header".to_string())
                    })?
                    .to_string();

                let body: CreateEntryResponse = response
                    .json()
                    .await
                    .map_err(|e| QueueError::ResponseParse(e.to_string()))?;

                debug!(request_id = %body.id, poll_location = %poll_location, "Queue entry created");

                Ok(QueueHandle {
                    request_id: body.id,
                    poll_location,
                })
            }
            // OK without a queue entry: the server had too few tickets left.
            StatusCode::OK => Err(QueueError::InsufficientInventory),
            StatusCode::UNPROCESSABLE_ENTITY => Err(QueueError::InvalidEvent),
            status => Err(QueueError::Unexpected {
                status: status.as_u16(),
            }),
        }
    }

    /// Poll the queue entry behind the given handle once.
    ///
    /// # Errors
    ///
    /// Transport failures, parse failures, or [`QueueError::Unexpected`] for
    /// any non-200 status.
    pub async fn poll(&self, handle: &QueueHandle) -> Result<QueueStatus, QueueError> {
        let url = self.resolve(&handle.poll_location)?;

        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => response
                .json::<QueueStatus>()
                .await
                .map_err(|e| QueueError::ResponseParse(e.to_string())),
            status => Err(QueueError::Unexpected {
                status: status.as_u16(),
            }),
        }
    }

    /// Ask the server to cancel the queue entry with the given request id.
    ///
    /// A successful deletion only means future polls would fail; the in-flight
    /// poll loop owns the client-side transition to `Cancelled`.
    ///
    /// # Errors
    ///
    /// - [`QueueError::AlreadyFulfilled`] on 409 (too late to cancel)
    /// - [`QueueError::RequestNotFound`] on 404
    /// - [`QueueError::Unexpected`] for any other status
    /// - transport failures
    pub async fn cancel(&self, request_id: &crate::types::RequestId) -> Result<(), QueueError> {
        let response = self
            .client
            .delete(format!("{}/queue/{}", self.base_url, request_id))
            .header("X-Nonce", self.nonce.nonce())
            .send()
            .await?;

        match response.status() {
            StatusCode::NO_CONTENT => Ok(()),
            StatusCode::CONFLICT => Err(QueueError::AlreadyFulfilled),
            StatusCode::NOT_FOUND => Err(QueueError::RequestNotFound),
            status => Err(QueueError::Unexpected {
                status: status.as_u16(),
            }),
        }
    }

    /// Refund the given tickets, scoped to `event_id` in multi-event
    /// deployments.
    ///
    /// # Errors
    ///
    /// - [`QueueError::RefundDeclined`] on 422 (server refund policy)
    /// - [`QueueError::EventNotFound`] on 404
    /// - [`QueueError::Unexpected`] for any other status
    /// - transport failures
    pub async fn refund(
        &self,
        event_id: Option<&EventId>,
        ticket_ids: &[TicketId],
    ) -> Result<(), QueueError> {
        let url = match event_id {
            Some(id) => format!("{}/tickets/{id}/refund", self.base_url),
            None => format!("{}/tickets/refund", self.base_url),
        };

        let response = self
            .client
            .post(url)
            .header("X-Nonce", self.nonce.nonce())
            .json(&RefundBody { ticket_ids })
            .send()
            .await?;

        match response.status() {
            StatusCode::NO_CONTENT => Ok(()),
            StatusCode::UNPROCESSABLE_ENTITY => Err(QueueError::RefundDeclined),
            StatusCode::NOT_FOUND => Err(QueueError::EventNotFound),
            status => Err(QueueError::Unexpected {
                status: status.as_u16(),
            }),
        }
    }

    /// Fetch metadata for all events (multi-event deployments).
    ///
    /// # Errors
    ///
    /// Transport failures, parse failures, or [`QueueError::Unexpected`] for
    /// any non-200 status.
    pub async fn fetch_events(&self) -> Result<Vec<EventInfo>, QueueError> {
        let response = self
            .client
            .get(format!("{}/tickets", self.base_url))
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => response
                .json::<Vec<EventInfo>>()
                .await
                .map_err(|e| QueueError::ResponseParse(e.to_string())),
            status => Err(QueueError::Unexpected {
                status: status.as_u16(),
            }),
        }
    }

    /// Fetch metadata for one event, or for the sole event in single-event
    /// deployments when `event_id` is `None`.
    ///
    /// # Errors
    ///
    /// [`QueueError::EventNotFound`] on 404, transport failures, parse
    /// failures, or [`QueueError::Unexpected`] for any other status.
    pub async fn fetch_event(&self, event_id: Option<&EventId>) -> Result<EventInfo, QueueError> {
        let url = match event_id {
            Some(id) => format!("{}/tickets/{id}", self.base_url),
            None => format!("{}/tickets", self.base_url),
        };

        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => response
                .json::<EventInfo>()
                .await
                .map_err(|e| QueueError::ResponseParse(e.to_string())),
            StatusCode::NOT_FOUND => Err(QueueError::EventNotFound),
            status => Err(QueueError::Unexpected {
                status: status.as_u16(),
            }),
        }
    }

    /// Resolve a poll location against the server origin.
    ///
    /// The `Location` header carries a server-absolute path, so it is joined
    /// against the origin rather than appended to the base path.
    fn resolve(&self, location: &str) -> Result<Url, QueueError> {
        Url::parse(&self.base_url)
            .and_then(|base| base.join(location))
            .map_err(|e| QueueError::RequestFailed(format!("invalid poll location: {e}")))
    }
}

impl std::fmt::Debug for QueueClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)] // Test code

    use super::*;

    fn test_client() -> QueueClient {
        let config = Config {
            base_url: "http://localhost:8000/ticketchief/".to_string(),
            ..Config::default()
        };
        QueueClient::new(&config).unwrap()
    }

    #[test]
    fn base_url_is_normalized() {
        let client = test_client();
        assert_eq!(client.base_url, "http://localhost:8000/ticketchief");
    }

    #[test]
    fn poll_location_resolves_against_origin() {
        let client = test_client();
        let url = client.resolve("/ticketchief/queue/17").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/ticketchief/queue/17");
    }

    #[test]
    fn absolute_poll_location_is_used_verbatim() {
        let client = test_client();
        let url = client.resolve("http://other:9000/q/1").unwrap();
        assert_eq!(url.as_str(), "http://other:9000/q/1");
    }

    #[tokio::test]
    async fn create_entry_rejects_zero_tickets() {
        let client = test_client();
        let result = client
            .create_entry(&AdmissionRequest::new(None, 0))
            .await;
        assert!(matches!(result, Err(QueueError::InvalidTicketCount)));
    }
}
