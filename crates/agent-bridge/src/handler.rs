//! # Handler
//!
//! The application-supplied capability driven by the supervisor: three
//! callbacks plus the thread-safe send function handed to `on_connect`.

use async_trait::async_trait;

use crate::error::{BridgeError, BridgeResult};

/// A handle the application uses to enqueue outbound frames. Cloning is
/// cheap — every clone shares the same underlying bounded queue, so
/// handlers may hand it to as many producer tasks as they like.
#[derive(Clone)]
pub struct SendHandle {
    tx: tokio::sync::mpsc::Sender<Vec<u8>>,
    shutdown: tokio::sync::watch::Receiver<bool>,
}

impl SendHandle {
    pub(crate) fn new(
        tx: tokio::sync::mpsc::Sender<Vec<u8>>,
        shutdown: tokio::sync::watch::Receiver<bool>,
    ) -> Self {
        Self { tx, shutdown }
    }

    /// Enqueue a message for the write serializer. Non-blocking beyond the
    /// enqueue itself: fails immediately with
    /// [`BridgeError::ConnectionClosed`] if shutdown has already been
    /// raised, otherwise suspends only until queue capacity frees up.
    /// Does not report transmission success — fire-and-forget at this
    /// layer.
    pub async fn send(&self, message: Vec<u8>) -> BridgeResult<()> {
        if *self.shutdown.borrow() {
            return Err(BridgeError::ConnectionClosed);
        }
        self.tx
            .send(message)
            .await
            .map_err(|_| BridgeError::ConnectionClosed)
    }
}

/// The three operations an application supplies to the supervisor.
///
/// Lifetime guarantee: `on_disconnect` is invoked at most once per
/// `on_connect`, and only after `on_connect` returned. The supervisor
/// serializes calls to a single handler instance — `on_message` is never
/// invoked concurrently with another `on_message` from the same
/// connection, but implementations should still tolerate `on_connect`
/// overlapping the narrow teardown window around a dropped connection.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Called once per successful connection, before any `on_message`.
    async fn on_connect(&self, send: SendHandle);

    /// Called in arrival order for every frame read within one connection.
    async fn on_message(&self, payload: Vec<u8>);

    /// Called at most once per `on_connect`. `None` means a clean,
    /// context-cancelled shutdown; `Some` carries the terminal cause.
    async fn on_disconnect(&self, error: Option<BridgeError>);
}
