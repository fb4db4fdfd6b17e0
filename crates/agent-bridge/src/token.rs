//! # Token
//!
//! An opaque credential descriptor minted by the credential provider and
//! consumed by the bridge and the authentication engine it forwards
//! `strategy` to. The bridge never inspects `credentials` beyond handing
//! them to the transport's dial step.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// An opaque descriptor telling an authentication engine how to apply a
/// token's credentials to a request. The bridge forwards this unchanged.
pub type Strategy = String;

/// A credential descriptor with an application strategy, an opaque
/// credentials map, and an absolute expiry instant.
///
/// Invariant: a token is either unexpired or the engine must not open a
/// new connection with it; expiry of an in-use token does not by itself
/// invalidate the already-established connection.
#[derive(Debug, Clone)]
pub struct Token {
    pub strategy: Strategy,
    pub credentials: HashMap<String, String>,
    pub expires_at: Instant,
}

impl Token {
    #[must_use]
    pub fn new(
        strategy: impl Into<Strategy>,
        credentials: HashMap<String, String>,
        expires_at: Instant,
    ) -> Self {
        Self {
            strategy: strategy.into(),
            credentials,
            expires_at,
        }
    }

    /// Remaining lifetime at the moment of evaluation. Saturates to zero
    /// rather than panicking once `expires_at` is in the past.
    #[must_use]
    pub fn remaining(&self, now: Instant) -> Duration {
        self.expires_at.saturating_duration_since(now)
    }

    /// A token is due for refresh once its remaining lifetime drops to or
    /// below `refresh_buffer`.
    #[must_use]
    pub fn due_for_refresh(&self, now: Instant, refresh_buffer: Duration) -> bool {
        self.remaining(now) <= refresh_buffer
    }

    /// `true` once the token's absolute expiry has passed.
    #[must_use]
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}
