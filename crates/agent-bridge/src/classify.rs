//! # Failure Classifier
//!
//! Maps a raw transport error from the read pump to one of
//! [`ErrorKind::Permanent`], [`ErrorKind::Recoverable`], or
//! [`ErrorKind::Cancelled`]. Pure function of the error and a fixed
//! close-code blocklist — no shared state, no I/O.

use std::collections::HashSet;

use crate::error::{BridgeError, ErrorKind};

/// WebSocket close code for an explicit server-initiated policy rejection.
/// The one entry the default blocklist always carries.
pub const CLOSE_CODE_POLICY_VIOLATION: u16 = 1008;

/// A fixed set of close codes the classifier treats as non-retryable.
/// Built once at [`crate::config::BridgeConfig`] construction and never
/// mutated afterward.
#[derive(Debug, Clone)]
pub struct CloseCodeBlocklist(HashSet<u16>);

impl CloseCodeBlocklist {
    /// The default blocklist: policy violation only.
    #[must_use]
    pub fn default_blocklist() -> Self {
        let mut set = HashSet::new();
        set.insert(CLOSE_CODE_POLICY_VIOLATION);
        Self(set)
    }

    /// Build a blocklist from an explicit set of close codes. The caller
    /// is responsible for including policy-violation if they still want it
    /// treated as fatal; this constructor does not add it implicitly.
    #[must_use]
    pub fn from_codes(codes: impl IntoIterator<Item = u16>) -> Self {
        Self(codes.into_iter().collect())
    }

    #[must_use]
    pub fn contains(&self, code: u16) -> bool {
        self.0.contains(&code)
    }
}

impl Default for CloseCodeBlocklist {
    fn default() -> Self {
        Self::default_blocklist()
    }
}

/// Classify a read-pump error against a fixed blocklist.
///
/// `err.kind()` already carries [`ErrorKind::Cancelled`] for the
/// cancellation sentinel, so that case is forwarded unchanged. A
/// [`BridgeError::PeerClosed`] is promoted to [`ErrorKind::Permanent`] only
/// when its close code is in `blocklist`; every other transport failure —
/// I/O errors, timeouts, unexpected/abnormal closure codes — is
/// [`ErrorKind::Recoverable`].
#[must_use]
pub fn classify(err: &BridgeError, blocklist: &CloseCodeBlocklist) -> ErrorKind {
    match err {
        BridgeError::Cancelled => ErrorKind::Cancelled,
        BridgeError::PeerClosed { code, .. } if blocklist.contains(*code) => ErrorKind::Permanent,
        _ => ErrorKind::Recoverable,
    }
}
