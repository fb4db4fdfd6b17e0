//! # Metrics
//!
//! A metrics-collector capability: three counters and one
//! gauge. [`NoopMetrics`] is the default so the bridge needs no
//! observability configured to run; [`AtomicMetrics`] is an in-memory
//! recorder for tests, mirroring the no-op/in-memory pairing
//! `flyingrobots-ninelives` uses for its telemetry sinks (`NullSink` /
//! `MemorySink`).

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Metrics collector capability.
pub trait Metrics: Send + Sync {
    fn inc_connections_established(&self);
    fn inc_disconnects(&self);
    fn inc_token_refreshes(&self);
    /// `status` is 0 or 1.
    fn set_connection_status(&self, status: i64);
}

/// Discards every observation.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl Metrics for NoopMetrics {
    fn inc_connections_established(&self) {}
    fn inc_disconnects(&self) {}
    fn inc_token_refreshes(&self) {}
    fn set_connection_status(&self, _status: i64) {}
}

/// Records every observation in atomics, for assertions in tests.
#[derive(Debug, Default)]
pub struct AtomicMetrics {
    pub connections_established: AtomicU64,
    pub disconnects: AtomicU64,
    pub token_refreshes: AtomicU64,
    pub connection_status: AtomicI64,
}

impl Metrics for AtomicMetrics {
    fn inc_connections_established(&self) {
        self.connections_established.fetch_add(1, Ordering::SeqCst);
    }

    fn inc_disconnects(&self) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
    }

    fn inc_token_refreshes(&self) {
        self.token_refreshes.fetch_add(1, Ordering::SeqCst);
    }

    fn set_connection_status(&self, status: i64) {
        self.connection_status.store(status, Ordering::SeqCst);
    }
}

impl AtomicMetrics {
    #[must_use]
    pub fn connections_established(&self) -> u64 {
        self.connections_established.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn disconnects(&self) -> u64 {
        self.disconnects.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn token_refreshes(&self) -> u64 {
        self.token_refreshes.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn connection_status(&self) -> i64 {
        self.connection_status.load(Ordering::SeqCst)
    }
}
