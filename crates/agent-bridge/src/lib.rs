//! # agent-bridge
//!
//! A connection lifecycle engine for agent processes that need to hold a
//! persistent, authenticated connection to an external service: credential
//! acquisition, dial, concurrent read/write pumps, pre-emptive in-place
//! token refresh, classified failure handling, and bounded reconnect with
//! jitter — all behind one [`Bridge::maintain`] call.
//!
//! ## Quick start
//!
//! ```ignore
//! use std::sync::Arc;
//! use agent_bridge::{Bridge, CancellationToken};
//!
//! #[tokio::main]
//! async fn main() -> agent_bridge::BridgeResult<()> {
//!     let bridge = Bridge::new(provider, "wss://example.test/stream", handler);
//!     bridge.maintain(CancellationToken::new()).await
//! }
//! ```
//!
//! ## What this crate is not
//!
//! It does not mint or store credentials (see [`CredentialProvider`]), does
//! not persist state across process restarts, and does not multiplex more
//! than one connection per [`Bridge`] instance.

pub mod classify;
pub mod config;
pub mod error;
pub mod handler;
pub mod logger;
pub mod metrics;
pub mod provider;
pub mod pump;
pub mod retry;
pub mod supervisor;
pub mod token;
pub mod transport;

pub use classify::{CloseCodeBlocklist, CLOSE_CODE_POLICY_VIOLATION};
pub use config::BridgeConfig;
pub use error::{BridgeError, BridgeResult, ErrorKind};
pub use handler::{Handler, SendHandle};
pub use logger::{Logger, NoopLogger, TracingLogger};
pub use metrics::{AtomicMetrics, Metrics, NoopMetrics};
pub use provider::CredentialProvider;
pub use retry::{BackoffCalculator, DefaultBackoff, ExponentialBackoff, RetryPolicy};
pub use supervisor::Bridge;
pub use token::{Strategy, Token};
pub use transport::{Dialer, FrameReader, FrameWriter, WebSocketDialer};

/// Re-exported so callers don't need a direct `tokio-util` dependency just
/// to construct the cancellation context [`Bridge::maintain`] expects.
pub use tokio_util::sync::CancellationToken;
