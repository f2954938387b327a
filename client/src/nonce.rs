//! Anti-replay nonce generation for state-mutating calls.
//!
//! Some deployments require an `X-Nonce` header on entry creation, cancel and
//! refund requests. The value must be unique per request and is never reused
//! across retries, so the source is invoked once per outgoing request.

use rand::RngCore;

/// Pluggable source of per-request anti-replay nonces.
///
/// Injected into [`crate::QueueClient`] at construction; tests substitute a
/// deterministic implementation.
pub trait NonceSource: Send + Sync {
    /// Produce a fresh nonce. Each call must return a distinct value.
    fn nonce(&self) -> String;
}

/// Production nonce source: 16 cryptographically random bytes, hex-encoded.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomNonce;

impl RandomNonce {
    /// Create a new random nonce source.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl NonceSource for RandomNonce {
    fn nonce(&self) -> String {
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }
}
