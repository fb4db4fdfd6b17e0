//! # Credential Provider
//!
//! The external control-plane authority that mints and refreshes tokens.
//! Out of scope for this crate beyond its interface — the bridge only
//! consumes what it returns.

use async_trait::async_trait;

use crate::error::BridgeResult;
use crate::token::Token;

/// Two operations, both expected to respect the ambient cancellation
/// context passed in by the caller's async runtime — cancelling the
/// future this trait's methods return is how the bridge honors that.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Initial acquisition for `connection_id`.
    async fn get_token(&self, connection_id: &str) -> BridgeResult<Token>;

    /// In-place rotation for `connection_id`. Errors here are non-terminal
    /// — the supervisor keeps the prior token and retries the pre-check
    /// at the top of its next event-loop iteration.
    async fn refresh(&self, connection_id: &str) -> BridgeResult<Token>;
}
