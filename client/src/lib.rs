//! # TicketChief Queue-Admission Client
//!
//! Client-side controller for a ticket-queue admission workflow: request N
//! tickets for an event, get placed into a server-managed queue, poll for
//! position until tickets are issued or the request is cancelled, and
//! relinquish issued tickets later.
//!
//! The crate is the admission state machine only. It emits discrete progress
//! events for a presentation layer to subscribe to and has no dependency on
//! any rendering surface; it consumes the server's HTTP contract and nothing
//! else. Client state is ephemeral and lives in memory for the session.
//!
//! ## Example
//!
//! ```no_run
//! use ticketchief_client::{AdmissionRequest, Config, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env();
//!     let session = Session::new(&config)?;
//!
//!     // Create a queue entry and watch it until tickets are issued,
//!     // the request is cancelled, or the loop errors.
//!     let admission = session
//!         .request_admission(AdmissionRequest::new(None, 2))
//!         .await?;
//!
//!     let mut updates = admission.subscribe();
//!     tokio::spawn(async move {
//!         while updates.changed().await.is_ok() {
//!             println!("queue: {:?}", *updates.borrow());
//!         }
//!     });
//!
//!     let outcome = admission.watch().await?;
//!     println!("outcome: {outcome:?}");
//!     println!("tickets held: {:?}", session.tickets().await);
//!     Ok(())
//! }
//! ```
//!
//! ## Concurrency
//!
//! One admission's poll iterations are strictly sequential; cancellation is
//! cooperative and checked before every poll send. Each admission carries its
//! own cancellation flag, so multiple concurrent admissions are safe within
//! and across sessions. All ledger mutation is serialized behind the session's
//! lock.

pub mod client;
pub mod config;
pub mod error;
pub mod ledger;
pub mod nonce;
pub mod refresh;
pub mod session;
pub mod types;
pub mod watch;

// Re-export main types for convenience
pub use client::QueueClient;
pub use config::Config;
pub use error::QueueError;
pub use ledger::Ledger;
pub use nonce::{NonceSource, RandomNonce};
pub use refresh::{InfoRefresher, RefresherHandle};
pub use session::Session;
pub use types::{
    AdmissionOutcome, AdmissionRequest, EventId, EventInfo, QueueHandle, QueueStatus, QueueUpdate,
    RequestId, Ticket, TicketId,
};
pub use watch::{Admission, Canceller};
