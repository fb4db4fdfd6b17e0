//! # Error Types
//!
//! Every error the bridge produces carries a [`ErrorKind`] tag — this is
//! how the supervisor decides whether to retry, give up, or treat a
//! connection loss as an external cancellation. Classification never
//! happens by string-matching a message; it's carried on the value.

use thiserror::Error;

/// Convenient Result alias for bridge operations.
pub type BridgeResult<T> = std::result::Result<T, BridgeError>;

/// Classification of a bridge failure, per the outer loop's transition
/// table. Every [`BridgeError`] exposes one via [`BridgeError::kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Cannot be restored by retrying with the same provider state; the
    /// supervisor exits the outer loop and surfaces the error.
    Permanent,
    /// Transient; the supervisor backs off and tries again.
    Recoverable,
    /// External cancellation via the ambient cancellation context.
    Cancelled,
}

/// All errors the bridge can surface, from credential acquisition through
/// transport failures to handler-facing send rejections.
#[derive(Error, Debug, Clone)]
pub enum BridgeError {
    // ─── Credential provider ────────────────────────────────────────

    /// Initial token acquisition failed. Always [`ErrorKind::Permanent`]:
    /// if the provider cannot mint a token at all, retrying against the
    /// same provider state won't help — the credentials are bad, or the
    /// provider is misconfigured.
    #[error("credential provider could not mint a token: {reason}")]
    TokenAcquisitionFailed { reason: String },

    /// An in-place refresh RPC failed. Non-terminal; logged and the old
    /// token is kept until its own expiry forces a reconnect.
    #[error("token refresh failed: {reason}")]
    RefreshFailed { reason: String },

    // ─── Dial / transport ───────────────────────────────────────────

    /// Dialing the endpoint failed. [`ErrorKind::Recoverable`].
    #[error("failed to dial {endpoint}: {reason}")]
    DialFailed { endpoint: String, reason: String },

    /// The underlying transport reported an error (read or write side).
    #[error("transport error: {0}")]
    Transport(String),

    /// The remote peer closed the connection with the given close code.
    #[error("connection closed by peer (code {code}): {reason}")]
    PeerClosed { code: u16, reason: String },

    /// A frame exceeded the configured maximum inbound size.
    #[error("inbound frame exceeded the configured size limit")]
    FrameTooLarge,

    // ─── Write path ─────────────────────────────────────────────────

    /// `send` was called after the shutdown signal had already been raised.
    #[error("connection closed; message not enqueued")]
    ConnectionClosed,

    /// A single write exceeded its configured timeout. Logged by the
    /// write serializer; never propagated to the read pump or supervisor.
    #[error("write timed out after {0:?}")]
    WriteTimeout(std::time::Duration),

    // ─── Refresh required / expiry ──────────────────────────────────

    /// The token's remaining lifetime is already at or below the refresh
    /// buffer and no in-place refresh completed in time.
    #[error("token is due for refresh; reconnect required")]
    RefreshRequired,

    // ─── Cancellation ───────────────────────────────────────────────

    /// The ambient cancellation context fired.
    #[error("operation cancelled")]
    Cancelled,

    // ─── Configuration ──────────────────────────────────────────────

    /// A [`crate::retry::RetryPolicy`] (or other config value) failed
    /// validation at construction time.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl BridgeError {
    /// Classify this error into permanent, recoverable, or cancelled.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            BridgeError::TokenAcquisitionFailed { .. } => ErrorKind::Permanent,
            BridgeError::PeerClosed { .. } => ErrorKind::Recoverable,
            BridgeError::DialFailed { .. }
            | BridgeError::Transport(_)
            | BridgeError::FrameTooLarge
            | BridgeError::RefreshRequired
            | BridgeError::RefreshFailed { .. }
            | BridgeError::ConnectionClosed
            | BridgeError::WriteTimeout(_)
            | BridgeError::InvalidConfig(_) => ErrorKind::Recoverable,
            BridgeError::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Returns `true` for [`ErrorKind::Permanent`] classifications.
    #[must_use]
    pub fn is_permanent(&self) -> bool {
        self.kind() == ErrorKind::Permanent
    }

    /// Returns `true` for [`ErrorKind::Cancelled`] classifications.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.kind() == ErrorKind::Cancelled
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for BridgeError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        match err {
            tokio_tungstenite::tungstenite::Error::Capacity(_) => BridgeError::FrameTooLarge,
            other => BridgeError::Transport(other.to_string()),
        }
    }
}
