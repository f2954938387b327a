//! Queue-admission walkthrough against a live ticket server.
//!
//! Requests tickets, watches the queue until they are issued, and refunds the
//! first one. Ctrl-C while waiting cancels the queue entry.
//!
//! # Usage
//!
//! ```bash
//! TICKETCHIEF_BASE_URL=http://localhost:8000/ticketchief \
//! TICKETS=2 EVENT_ID=0 cargo run -p queue-watch
//! ```

use std::time::Duration;
use ticketchief_client::{
    AdmissionOutcome, AdmissionRequest, Config, EventId, InfoRefresher, QueueUpdate, Session,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,ticketchief_client=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let event_id = std::env::var("EVENT_ID").ok().map(EventId::new);
    let ticket_count = std::env::var("TICKETS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(2);

    info!(base_url = %config.base_url, tickets = ticket_count, "Starting queue watch");

    let session = Session::new(&config)?;

    // Show event metadata while we queue, refreshed out-of-band.
    let refresher = InfoRefresher::new(
        session.client().clone(),
        event_id.clone(),
        config.refresh_interval(),
    );
    let (mut metadata, refresher_handle) = refresher.spawn();
    tokio::spawn(async move {
        while metadata.changed().await.is_ok() {
            if let Some(event_info) = metadata.borrow().clone() {
                info!(
                    artist = %event_info.artist,
                    venue = %event_info.venue,
                    remaining = event_info.count,
                    "Event info"
                );
            }
        }
    });

    let admission = session
        .request_admission(AdmissionRequest::new(event_id.clone(), ticket_count))
        .await?;
    info!(request_id = %admission.handle().request_id, "Joined queue");

    // Print queue progress as it happens.
    let mut updates = admission.subscribe();
    tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            match updates.borrow().clone() {
                QueueUpdate::Joining => println!("Joining queue..."),
                QueueUpdate::Position(n) => println!("Position in queue: {n}"),
                QueueUpdate::Fulfilled => println!("Tickets issued!"),
                QueueUpdate::Cancelled => println!("Cancelled"),
                QueueUpdate::Errored(msg) => println!("Error: {msg}"),
                QueueUpdate::Idle => {}
            }
        }
    });

    // Ctrl-C cancels the outstanding request; the poll loop observes the
    // cancellation on its next flag check.
    let canceller = admission.canceller();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            match canceller.cancel().await {
                Ok(()) => info!("Cancellation requested"),
                Err(e) => warn!(error = %e, "Could not cancel"),
            }
        }
    });

    match admission.watch().await {
        Ok(AdmissionOutcome::Fulfilled(tickets)) => {
            for ticket in &tickets {
                println!(
                    "Ticket {} (request {})",
                    ticket.ticket_id, ticket.request_id
                );
            }

            // Demonstrate relinquishing a ticket.
            if let Some(first) = tickets.first() {
                tokio::time::sleep(Duration::from_secs(1)).await;
                session
                    .refund(first.event_id.as_ref(), &[first.ticket_id.clone()])
                    .await?;
                println!("Refunded ticket {}", first.ticket_id);
            }
        }
        Ok(AdmissionOutcome::Cancelled) => println!("Left the queue."),
        Err(e) => warn!(error = %e, "Queue watch failed"),
    }

    println!("Tickets held: {}", session.tickets().await.len());

    refresher_handle.shutdown().await?;
    Ok(())
}
