//! # Configuration
//!
//! [`BridgeConfig`] holds everything [`crate::Bridge::maintain`] needs
//! beyond the two required, positional arguments (credential provider and
//! endpoint identifier): every other option is named and defaulted. This
//! crate embeds in a host process rather than running standalone, so
//! there is no env or file loading here, only an explicit builder.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::classify::CloseCodeBlocklist;
use crate::error::{BridgeError, BridgeResult};
use crate::logger::{Logger, NoopLogger};
use crate::metrics::{Metrics, NoopMetrics};
use crate::retry::{DefaultBackoff, RetryPolicy};
use crate::transport::{Dialer, WebSocketDialer};

/// Default lead-time before token expiry at which the supervisor attempts
/// an in-place refresh.
pub const DEFAULT_REFRESH_BUFFER: Duration = Duration::from_secs(5 * 60);

/// Default per-write timeout enforced by the write serializer.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default keepalive interval, when the transport supports ping frames.
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(30);

/// Connection configuration: the tuple of options recognized at
/// construction. Built with [`BridgeConfig::new`] plus builder-style
/// `with_*` methods; every field has a documented default so
/// `BridgeConfig::new(endpoint)` alone is a valid configuration.
pub struct BridgeConfig {
    pub(crate) endpoint: String,
    pub(crate) logger: Arc<dyn Logger>,
    pub(crate) metrics: Arc<dyn Metrics>,
    pub(crate) retry_policy: RetryPolicy,
    pub(crate) backoff: Arc<dyn crate::retry::BackoffCalculator>,
    pub(crate) refresh_buffer: Duration,
    pub(crate) dialer: Arc<dyn Dialer>,
    pub(crate) write_timeout: Duration,
    pub(crate) ping_interval: Duration,
    pub(crate) message_size_limit: Option<usize>,
    pub(crate) permanent_close_codes: CloseCodeBlocklist,
}

impl BridgeConfig {
    /// The two required, positional arguments are the endpoint identifier
    /// and everything else this struct carries — the credential provider
    /// itself is supplied separately to [`crate::Bridge::new`], since it
    /// is not configuration so much as a collaborator.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            logger: Arc::new(NoopLogger),
            metrics: Arc::new(NoopMetrics),
            retry_policy: RetryPolicy::default(),
            backoff: Arc::new(DefaultBackoff),
            refresh_buffer: DEFAULT_REFRESH_BUFFER,
            dialer: Arc::new(WebSocketDialer),
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            ping_interval: DEFAULT_PING_INTERVAL,
            message_size_limit: None,
            permanent_close_codes: CloseCodeBlocklist::default_blocklist(),
        }
    }

    #[must_use]
    pub fn with_logger(mut self, logger: impl Logger + 'static) -> Self {
        self.logger = Arc::new(logger);
        self
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: impl Metrics + 'static) -> Self {
        self.metrics = Arc::new(metrics);
        self
    }

    /// Like [`Self::with_metrics`], but for callers (tests, mostly) that
    /// already hold an `Arc` and want to keep observing it after handing
    /// it to the bridge.
    #[must_use]
    pub fn with_metrics_arc(mut self, metrics: Arc<dyn Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    #[must_use]
    pub fn with_backoff(mut self, backoff: impl crate::retry::BackoffCalculator + 'static) -> Self {
        self.backoff = Arc::new(backoff);
        self
    }

    #[must_use]
    pub fn with_refresh_buffer(mut self, refresh_buffer: Duration) -> Self {
        self.refresh_buffer = refresh_buffer;
        self
    }

    #[must_use]
    pub fn with_dialer(mut self, dialer: impl Dialer + 'static) -> Self {
        self.dialer = Arc::new(dialer);
        self
    }

    #[must_use]
    pub fn with_write_timeout(mut self, write_timeout: Duration) -> Self {
        self.write_timeout = write_timeout;
        self
    }

    #[must_use]
    pub fn with_ping_interval(mut self, ping_interval: Duration) -> Self {
        self.ping_interval = ping_interval;
        self
    }

    #[must_use]
    pub fn with_message_size_limit(mut self, limit: usize) -> Self {
        self.message_size_limit = Some(limit);
        self
    }

    #[must_use]
    pub fn with_permanent_close_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.permanent_close_codes = CloseCodeBlocklist::from_codes(codes);
        self
    }

    /// Validate cross-field invariants that the individual setters cannot
    /// catch alone (a zero write timeout, for instance, isn't rejected by
    /// `with_write_timeout` itself since it only assigns a field).
    pub(crate) fn validate(&self) -> BridgeResult<()> {
        if self.write_timeout.is_zero() {
            return Err(BridgeError::InvalidConfig(
                "write_timeout must be positive".into(),
            ));
        }
        if self.endpoint.is_empty() {
            return Err(BridgeError::InvalidConfig("endpoint must not be empty".into()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for BridgeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeConfig")
            .field("endpoint", &self.endpoint)
            .field("retry_policy", &self.retry_policy)
            .field("refresh_buffer", &self.refresh_buffer)
            .field("write_timeout", &self.write_timeout)
            .field("ping_interval", &self.ping_interval)
            .field("message_size_limit", &self.message_size_limit)
            .finish_non_exhaustive()
    }
}

/// Retained so `HashSet<u16>` stays a visible part of this module's
/// public surface for callers constructing their own blocklist inline.
pub type CloseCodeSet = HashSet<u16>;
