//! # Backoff Calculator
//!
//! Computes the next reconnect delay from a [`RetryPolicy`]. Purely
//! functional beyond the jitter draw; no shared state.
//!
//! ## Predefined calculators
//!
//! [`DefaultBackoff`] implements an additive formula
//! `d = min(min_backoff + U[0, jitter), max_backoff)`: a deterministic
//! floor, uniform jitter to avoid thundering-herd, and a hard cap.
//! [`ExponentialBackoff`] is an alternative that still satisfies the
//! `min_backoff <= d <= max_backoff` contract by doubling the floor with
//! each consecutive failure before jitter.

use std::time::Duration;

use rand::Rng;

use crate::error::BridgeError;

/// Three non-negative durations governing reconnect backoff.
///
/// Invariant: `min_backoff <= max_backoff` and `jitter > 0`. Validated at
/// construction — a caller configuration error here must never cause a
/// runtime division or modulo fault.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub min_backoff: Duration,
    pub max_backoff: Duration,
    pub jitter: Duration,
}

impl RetryPolicy {
    /// Validate and construct a policy.
    ///
    /// # Errors
    /// Returns [`BridgeError::InvalidConfig`] if `min_backoff > max_backoff`
    /// or `jitter` is zero.
    pub fn new(
        min_backoff: Duration,
        max_backoff: Duration,
        jitter: Duration,
    ) -> Result<Self, BridgeError> {
        if min_backoff > max_backoff {
            return Err(BridgeError::InvalidConfig(format!(
                "min_backoff ({min_backoff:?}) must be <= max_backoff ({max_backoff:?})"
            )));
        }
        if jitter.is_zero() {
            return Err(BridgeError::InvalidConfig(
                "jitter must be greater than zero".into(),
            ));
        }
        Ok(Self {
            min_backoff,
            max_backoff,
            jitter,
        })
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            Duration::from_secs(2),
            Duration::from_secs(30),
            Duration::from_secs(1),
        )
        .expect("default retry policy parameters are valid")
    }
}

/// A reconnect delay calculator. Implementations must satisfy
/// `policy.min_backoff <= next(policy) <= policy.max_backoff` for every
/// call.
pub trait BackoffCalculator: Send + Sync {
    fn next_delay(&self, policy: &RetryPolicy) -> Duration;
}

/// The default calculator: additive floor plus uniform jitter, capped.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultBackoff;

impl BackoffCalculator for DefaultBackoff {
    fn next_delay(&self, policy: &RetryPolicy) -> Duration {
        let jitter_draw = if policy.jitter.is_zero() {
            Duration::ZERO
        } else {
            rand::thread_rng().gen_range(Duration::ZERO..policy.jitter)
        };
        std::cmp::min(policy.min_backoff + jitter_draw, policy.max_backoff)
    }
}

/// Exponential alternative: doubles the floor with each consecutive
/// failure, then applies the same jitter-and-cap contract. Implementers
/// who prefer faster backoff growth over the additive default may
/// substitute this.
#[derive(Debug)]
pub struct ExponentialBackoff {
    attempt: std::sync::atomic::AtomicU32,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new()
    }
}

impl ExponentialBackoff {
    #[must_use]
    pub fn new() -> Self {
        Self {
            attempt: std::sync::atomic::AtomicU32::new(0),
        }
    }

    /// Reset the attempt counter — call after a successful connection.
    pub fn reset(&self) {
        self.attempt.store(0, std::sync::atomic::Ordering::SeqCst);
    }
}

impl BackoffCalculator for ExponentialBackoff {
    fn next_delay(&self, policy: &RetryPolicy) -> Duration {
        let attempt = self
            .attempt
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let multiplier = 1u32.checked_shl(attempt.min(16)).unwrap_or(u32::MAX);
        let floor = policy
            .min_backoff
            .checked_mul(multiplier)
            .unwrap_or(policy.max_backoff)
            .min(policy.max_backoff);
        let jitter_draw = if policy.jitter.is_zero() {
            Duration::ZERO
        } else {
            rand::thread_rng().gen_range(Duration::ZERO..policy.jitter)
        };
        std::cmp::min(floor + jitter_draw, policy.max_backoff)
    }
}
