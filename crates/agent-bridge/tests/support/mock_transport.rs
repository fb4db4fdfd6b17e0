#![allow(dead_code)]

//! A scriptable WebSocket server for exercising the bridge end to end: a
//! real `TcpListener` plus `tokio_tungstenite::accept_async`, with each
//! accepted connection exposed as a [`MockConnection`] a test drives
//! directly (push frames, force-close with a code, inspect what the
//! bridge sent).

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;

pub const STEP_TIMEOUT: Duration = Duration::from_secs(3);

enum ConnectionCommand {
    SendBinary(Vec<u8>),
    CloseWithCode(u16),
}

/// One accepted connection, scriptable from the test.
pub struct MockConnection {
    index: usize,
    request_rx: mpsc::Receiver<Vec<u8>>,
    command_tx: mpsc::Sender<ConnectionCommand>,
}

impl MockConnection {
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    pub async fn recv_frame(&mut self) -> Vec<u8> {
        timeout(STEP_TIMEOUT, self.request_rx.recv())
            .await
            .expect("timed out waiting for a frame from the bridge")
            .expect("mock connection request channel closed")
    }

    pub async fn try_recv_frame(&mut self, wait: Duration) -> Option<Vec<u8>> {
        match timeout(wait, self.request_rx.recv()).await {
            Ok(Some(frame)) => Some(frame),
            _ => None,
        }
    }

    pub async fn send(&self, payload: impl Into<Vec<u8>>) {
        self.command_tx
            .send(ConnectionCommand::SendBinary(payload.into()))
            .await
            .expect("failed to send command to mock connection");
    }

    pub async fn close_with_code(&self, code: u16) {
        let _ = self.command_tx.send(ConnectionCommand::CloseWithCode(code)).await;
    }
}

/// A mock server bound to an ephemeral localhost port, accepting as many
/// connections as the test drives (needed for reconnect scenarios, where
/// one bridge makes several dial attempts against the same server).
pub struct MockServer {
    addr: SocketAddr,
    connection_rx: mpsc::Receiver<MockConnection>,
    server_task: JoinHandle<()>,
}

impl MockServer {
    pub async fn start() -> std::io::Result<Self> {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await?;
        let addr = listener.local_addr()?;
        let (connection_tx, connection_rx) = mpsc::channel(16);
        let next_index = Arc::new(AtomicUsize::new(0));

        let server_task = tokio::spawn(async move {
            loop {
                let (stream, _) = match listener.accept().await {
                    Ok(pair) => pair,
                    Err(_) => break,
                };

                let connection_tx = connection_tx.clone();
                let index = next_index.fetch_add(1, Ordering::SeqCst);

                tokio::spawn(async move {
                    // No message-size limit on the server side — the
                    // oversized-frame scenario (S5) exercises the
                    // *bridge's* configured limit on the client side, via
                    // `Dialer::dial`'s `max_frame_size` argument.
                    let ws_stream = match accept_async(stream).await {
                        Ok(ws) => ws,
                        Err(_) => return,
                    };

                    let (mut sink, mut source) = ws_stream.split();
                    let (request_tx, request_rx) = mpsc::channel(64);
                    let (command_tx, mut command_rx) = mpsc::channel(64);

                    let connection = MockConnection {
                        index,
                        request_rx,
                        command_tx,
                    };
                    if connection_tx.send(connection).await.is_err() {
                        return;
                    }

                    loop {
                        tokio::select! {
                            maybe_command = command_rx.recv() => {
                                match maybe_command {
                                    Some(ConnectionCommand::SendBinary(payload)) => {
                                        if sink.send(Message::Binary(payload.into())).await.is_err() {
                                            break;
                                        }
                                    }
                                    Some(ConnectionCommand::CloseWithCode(code)) => {
                                        let frame = CloseFrame {
                                            code: CloseCode::from(code),
                                            reason: "mock close".into(),
                                        };
                                        let _ = sink.send(Message::Close(Some(frame))).await;
                                        break;
                                    }
                                    None => break,
                                }
                            }
                            maybe_message = source.next() => {
                                match maybe_message {
                                    Some(Ok(Message::Binary(bytes))) => {
                                        let _ = request_tx.send(bytes.to_vec()).await;
                                    }
                                    Some(Ok(Message::Text(text))) => {
                                        let _ = request_tx.send(text.as_str().as_bytes().to_vec()).await;
                                    }
                                    Some(Ok(Message::Close(_))) => break,
                                    Some(Ok(_)) => {}
                                    Some(Err(_)) => break,
                                    None => break,
                                }
                            }
                        }
                    }
                });
            }
        });

        Ok(Self {
            addr,
            connection_rx,
            server_task,
        })
    }

    #[must_use]
    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    pub async fn accept_connection(&mut self) -> MockConnection {
        timeout(STEP_TIMEOUT, self.connection_rx.recv())
            .await
            .expect("timed out waiting for the bridge to connect")
            .expect("mock server connection channel closed")
    }

    pub async fn try_accept_connection(&mut self, wait: Duration) -> Option<MockConnection> {
        match timeout(wait, self.connection_rx.recv()).await {
            Ok(Some(connection)) => Some(connection),
            _ => None,
        }
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.server_task.abort();
    }
}
