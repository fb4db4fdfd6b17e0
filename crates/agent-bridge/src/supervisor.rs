//! # Connection Supervisor
//!
//! The top-level state machine: acquires a token, dials, spawns the
//! pumps, runs the refresh-timer event loop, and on any terminal signal
//! tears down and decides whether to loop. The task-spawning shape
//! (detached tasks communicating over channels, joined at teardown — see
//! `pump.rs`) carries through into a `tokio::select!` event loop that
//! waits on the first-ready of several independent sources, with one arm
//! conditionally armed depending on whether a refresh is already in
//! flight.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::config::BridgeConfig;
use crate::error::{BridgeError, BridgeResult, ErrorKind};
use crate::handler::{Handler, SendHandle};
use crate::provider::CredentialProvider;
use crate::pump::{spawn_read_pump, spawn_write_serializer};
use crate::token::Token;

const OUTBOUND_QUEUE_CAPACITY: usize = 256;
const ERROR_CHANNEL_CAPACITY: usize = 1;
const REFRESH_RESULT_CHANNEL_CAPACITY: usize = 1;

/// Outcome of one pass through the inner connection loop, driving the
/// outer reconnect loop's next transition.
enum RunOutcome {
    Recoverable(BridgeError),
    Permanent(BridgeError),
    Cancelled,
}

/// Owns one connection's lifetime: a credential provider, an endpoint and
/// its options, and the handler the caller wants driven. `maintain` runs
/// forever until the outer loop reaches `TERMINATED`.
pub struct Bridge {
    connection_id: String,
    provider: Arc<dyn CredentialProvider>,
    handler: Arc<dyn Handler>,
    config: BridgeConfig,
}

impl Bridge {
    /// The two required collaborators (credential provider and endpoint)
    /// plus the handler every connection must be driven through —
    /// everything else has a default and is customized with
    /// [`Bridge::with_config`].
    pub fn new(
        provider: Arc<dyn CredentialProvider>,
        endpoint: impl Into<String>,
        handler: Arc<dyn Handler>,
    ) -> Self {
        let endpoint = endpoint.into();
        Self {
            connection_id: endpoint.clone(),
            provider,
            handler,
            config: BridgeConfig::new(endpoint),
        }
    }

    /// Override the default configuration.
    #[must_use]
    pub fn with_config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    /// Use an identifier distinct from the endpoint when talking to the
    /// credential provider.
    #[must_use]
    pub fn with_connection_id(mut self, connection_id: impl Into<String>) -> Self {
        self.connection_id = connection_id.into();
        self
    }

    /// Run the outer reconnect loop until a permanent error or
    /// cancellation terminates it. Never returns `Ok` — the loop is
    /// infinite by design; the only way out is an error result.
    ///
    /// # Errors
    /// Returns the permanent cause, or [`BridgeError::Cancelled`] once
    /// `cancellation` fires.
    pub async fn maintain(&self, cancellation: CancellationToken) -> BridgeResult<()> {
        self.config.validate()?;

        loop {
            // ACQUIRING
            let token = tokio::select! {
                biased;
                () = cancellation.cancelled() => return Err(BridgeError::Cancelled),
                result = self.provider.get_token(&self.connection_id) => result,
            };
            let token = match token {
                Ok(token) => token,
                Err(err) => {
                    self.config.logger.error(&err, "initial token acquisition failed", &[]);
                    return Err(BridgeError::TokenAcquisitionFailed {
                        reason: err.to_string(),
                    });
                }
            };

            // CONNECTING
            let dialed = tokio::select! {
                biased;
                () = cancellation.cancelled() => return Err(BridgeError::Cancelled),
                result = self.config.dialer.dial(
                    &self.config.endpoint,
                    &token,
                    self.config.message_size_limit,
                ) => result,
            };
            let (reader, writer) = match dialed {
                Ok(halves) => halves,
                Err(err) => {
                    self.config.logger.error(&err, "dial failed", &[("endpoint", &self.config.endpoint)]);
                    if !self.wait_before_retry(&cancellation).await {
                        return Err(BridgeError::Cancelled);
                    }
                    continue;
                }
            };

            // RUNNING
            self.config.metrics.inc_connections_established();
            self.config.metrics.set_connection_status(1);
            let outcome = self.run_connection(token, reader, writer, &cancellation).await;
            self.config.metrics.set_connection_status(0);

            match outcome {
                RunOutcome::Permanent(err) => return Err(err),
                RunOutcome::Cancelled => return Err(BridgeError::Cancelled),
                RunOutcome::Recoverable(_err) => {
                    if !self.wait_before_retry(&cancellation).await {
                        return Err(BridgeError::Cancelled);
                    }
                }
            }
        }
    }

    /// `WAITING`: sleep for `backoff()`, interruptible by cancellation.
    /// Returns `false` if cancellation fired first.
    async fn wait_before_retry(&self, cancellation: &CancellationToken) -> bool {
        let delay = self.config.backoff.next_delay(&self.config.retry_policy);
        tokio::select! {
            biased;
            () = cancellation.cancelled() => false,
            () = tokio::time::sleep(delay) => true,
        }
    }

    /// The inner machine: one connection attempt, start to teardown.
    async fn run_connection(
        &self,
        mut token: Token,
        reader: Box<dyn crate::transport::FrameReader>,
        writer: Box<dyn crate::transport::FrameWriter>,
        cancellation: &CancellationToken,
    ) -> RunOutcome {
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (read_error_tx, mut read_error_rx) = mpsc::channel(ERROR_CHANNEL_CAPACITY);
        let (refresh_ok_tx, mut refresh_ok_rx) = mpsc::channel(REFRESH_RESULT_CHANNEL_CAPACITY);
        let (refresh_err_tx, mut refresh_err_rx) = mpsc::channel(REFRESH_RESULT_CHANNEL_CAPACITY);

        // The write serializer owns `writer` for the connection's life and
        // closes it on exit: the supervisor raises `shutdown_tx` and then
        // awaits the serializer's own close-on-exit rather than closing
        // the transport directly, so it's closed only after shutdown.
        let write_handle = spawn_write_serializer(
            writer,
            outbound_rx,
            self.config.write_timeout,
            shutdown_rx.clone(),
            self.config.logger.clone(),
        );

        let send = SendHandle::new(outbound_tx, shutdown_rx.clone());
        self.handler.on_connect(send).await;

        let read_handle = spawn_read_pump(
            reader,
            self.handler.clone(),
            Arc::new(self.config.permanent_close_codes.clone()),
            read_error_tx,
        );

        let mut refresh_in_flight = false;

        let outcome = loop {
            let refresh_sleep = if refresh_in_flight {
                None
            } else {
                let remaining = token.remaining(Instant::now());
                if remaining <= self.config.refresh_buffer {
                    break RunOutcome::Recoverable(BridgeError::RefreshRequired);
                }
                Some(remaining - self.config.refresh_buffer)
            };

            tokio::select! {
                biased;

                () = cancellation.cancelled() => {
                    break RunOutcome::Cancelled;
                }

                Some((kind, err)) = read_error_rx.recv() => {
                    break match kind {
                        ErrorKind::Permanent => RunOutcome::Permanent(err),
                        ErrorKind::Cancelled => RunOutcome::Cancelled,
                        ErrorKind::Recoverable => RunOutcome::Recoverable(err),
                    };
                }

                () = sleep_if_armed(refresh_sleep), if !refresh_in_flight => {
                    refresh_in_flight = true;
                    self.spawn_refresh_task(refresh_ok_tx.clone(), refresh_err_tx.clone(), cancellation.clone());
                }

                Some(new_token) = refresh_ok_rx.recv() => {
                    self.config.metrics.inc_token_refreshes();
                    token = new_token;
                    refresh_in_flight = false;
                }

                Some(err) = refresh_err_rx.recv() => {
                    self.config.logger.error(&err, "token refresh failed", &[]);
                    refresh_in_flight = false;
                }
            }
        };

        // Teardown: raise shutdown, let the write serializer drain and
        // close the transport, then abort the read pump (it is blocked
        // inside a transport read that just closed out from under it, or
        // has already reported its own error).
        let _ = shutdown_tx.send(true);
        let _ = write_handle.await;
        read_handle.abort();

        // A clean context-cancellation is not a transport disconnect: only
        // count the cases where the connection itself went away.
        if !matches!(outcome, RunOutcome::Cancelled) {
            self.config.metrics.inc_disconnects();
        }
        let disconnect_error = match &outcome {
            RunOutcome::Recoverable(err) | RunOutcome::Permanent(err) => Some(err.clone()),
            RunOutcome::Cancelled => Some(BridgeError::Cancelled),
        };
        // Exactly-once holds structurally: the event loop above has a
        // single exit (`break`), and this is the only call site reachable
        // after it — no flag needed to guard against a second call.
        self.handler.on_disconnect(disconnect_error).await;

        outcome
    }

    fn spawn_refresh_task(
        &self,
        ok_tx: mpsc::Sender<Token>,
        err_tx: mpsc::Sender<BridgeError>,
        cancellation: CancellationToken,
    ) {
        let provider = self.provider.clone();
        let connection_id = self.connection_id.clone();
        tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                () = cancellation.cancelled() => return,
                result = provider.refresh(&connection_id) => result,
            };
            match result {
                Ok(token) => {
                    let _ = ok_tx.send(token).await;
                }
                Err(err) => {
                    let _ = err_tx.send(err).await;
                }
            }
        });
    }
}

/// `tokio::select!` requires a future in every arm even when the branch is
/// disabled by its `if` guard; this supplies one that never resolves when
/// no refresh timer is armed (`refresh_in_flight == true`), so that arm
/// is effectively disabled without the `select!` ever needing a nil or
/// closed channel to express "not currently a candidate."
async fn sleep_if_armed(delay: Option<Duration>) {
    match delay {
        Some(delay) => tokio::time::sleep(delay).await,
        None => std::future::pending().await,
    }
}
