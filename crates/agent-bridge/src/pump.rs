//! # Read Pump & Write Serializer
//!
//! The two tasks that actually move bytes once a connection is live: a
//! spawned task reading frames until the first terminal condition, and a
//! dedicated consumer task draining a bounded outbound queue one message
//! at a time so the transport is never written to from more than one
//! place at once.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::classify::{classify, CloseCodeBlocklist};
use crate::error::{BridgeError, ErrorKind};
use crate::handler::Handler;
use crate::logger::Logger;
use crate::transport::{FrameReader, FrameWriter};

/// Spawn the read pump. Runs until the first read error, invoking
/// `handler.on_message` synchronously (in arrival order) for every frame
/// in between. Publishes exactly one `(ErrorKind, BridgeError)` pair on
/// `error_tx` before exiting; never calls `on_disconnect` itself.
pub fn spawn_read_pump(
    mut reader: Box<dyn FrameReader>,
    handler: Arc<dyn Handler>,
    blocklist: Arc<CloseCodeBlocklist>,
    error_tx: mpsc::Sender<(ErrorKind, BridgeError)>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match reader.read_message().await {
                Ok(frame) => handler.on_message(frame).await,
                Err(err) => {
                    let kind = classify(&err, &blocklist);
                    let _ = error_tx.send((kind, err)).await;
                    return;
                }
            }
        }
    })
}

/// Spawn the write serializer. Drains `rx` in enqueue order, writing each
/// message with `write_timeout`. A write failure is logged but does not
/// terminate the pump — the read pump detects the broken connection and
/// drives teardown. Exits when `shutdown` is raised.
pub fn spawn_write_serializer(
    mut writer: Box<dyn FrameWriter>,
    mut rx: mpsc::Receiver<Vec<u8>>,
    write_timeout: Duration,
    mut shutdown: watch::Receiver<bool>,
    logger: Arc<dyn Logger>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                maybe_message = rx.recv() => {
                    let Some(message) = maybe_message else { break };
                    match tokio::time::timeout(write_timeout, writer.write_message(message)).await {
                        Ok(Ok(())) => {}
                        Ok(Err(err)) => {
                            logger.error(&err, "write failed", &[]);
                        }
                        Err(_) => {
                            logger.error(
                                &BridgeError::WriteTimeout(write_timeout),
                                "write timed out",
                                &[],
                            );
                        }
                    }
                }
            }
        }
        let _ = writer.close().await;
    })
}
