//! # Transport
//!
//! The contract the supervisor and pumps need from a connection:
//! dial-with-authentication, read-one-message, write-one-message,
//! close-cleanly, and a distinguishable close code when the peer
//! initiates closure. [`WebSocketDialer`] is the default, concrete
//! implementation over `tokio-tungstenite`, split into independent reader
//! and writer halves via `StreamExt::split()`.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;

use crate::error::{BridgeError, BridgeResult};
use crate::token::Token;

/// Dials an endpoint, applying a token's strategy to the handshake, and
/// returns the connection split into independent read/write halves — the
/// same "one writer, one reader" shape the write serializer and read pump
/// rely on.
#[async_trait]
pub trait Dialer: Send + Sync {
    async fn dial(
        &self,
        endpoint: &str,
        token: &Token,
        max_frame_size: Option<usize>,
    ) -> BridgeResult<(Box<dyn FrameReader>, Box<dyn FrameWriter>)>;
}

/// The read half of a dialed connection.
#[async_trait]
pub trait FrameReader: Send {
    /// Read the next frame. Returns [`BridgeError::PeerClosed`] when the
    /// remote initiated closure (carrying its close code), or another
    /// [`BridgeError`] variant for I/O failures — tearing down on a
    /// frame-size violation is the transport's job, not the pump's.
    async fn read_message(&mut self) -> BridgeResult<Vec<u8>>;
}

/// The write half of a dialed connection.
#[async_trait]
pub trait FrameWriter: Send {
    async fn write_message(&mut self, payload: Vec<u8>) -> BridgeResult<()>;
    async fn close(&mut self) -> BridgeResult<()>;
}

/// Default [`Dialer`] over a `wss://`/`ws://` endpoint via
/// `tokio-tungstenite`.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebSocketDialer;

#[async_trait]
impl Dialer for WebSocketDialer {
    async fn dial(
        &self,
        endpoint: &str,
        token: &Token,
        max_frame_size: Option<usize>,
    ) -> BridgeResult<(Box<dyn FrameReader>, Box<dyn FrameWriter>)> {
        let mut request = endpoint
            .into_client_request()
            .map_err(|e| BridgeError::DialFailed {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?;

        apply_strategy(&mut request, token);

        let config = tokio_tungstenite::tungstenite::protocol::WebSocketConfig::default()
            .max_message_size(max_frame_size);

        let connect_fut = tokio_tungstenite::connect_async_with_config(request, Some(config), false);
        let (ws, _response) = tokio::time::timeout(CONNECT_TIMEOUT, connect_fut)
            .await
            .map_err(|_| BridgeError::DialFailed {
                endpoint: endpoint.to_string(),
                reason: "handshake timed out".into(),
            })?
            .map_err(|e| BridgeError::DialFailed {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?;

        let (sink, stream) = ws.split();
        Ok((
            Box::new(WebSocketReader { stream }),
            Box::new(WebSocketWriter { sink }),
        ))
    }
}

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Apply the token's strategy to the handshake request. This is the
/// dynamic-strategy authentication engine's seam — out of scope beyond
/// this call site; the bridge forwards `strategy` unchanged.
fn apply_strategy(
    request: &mut tokio_tungstenite::tungstenite::http::Request<()>,
    token: &Token,
) {
    if let Some(credential) = token.credentials.get("bearer") {
        if let Ok(value) =
            tokio_tungstenite::tungstenite::http::HeaderValue::from_str(&format!(
                "Bearer {credential}"
            ))
        {
            request.headers_mut().insert("authorization", value);
        }
    }
}

use tokio_tungstenite::tungstenite::client::IntoClientRequest;

type WsStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

struct WebSocketReader {
    stream: futures_util::stream::SplitStream<WsStream>,
}

#[async_trait]
impl FrameReader for WebSocketReader {
    async fn read_message(&mut self) -> BridgeResult<Vec<u8>> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Binary(bytes))) => return Ok(bytes.to_vec()),
                Some(Ok(Message::Text(text))) => return Ok(text.as_str().as_bytes().to_vec()),
                Some(Ok(Message::Close(frame))) => {
                    let (code, reason) = frame.map_or((1000, String::new()), |f| {
                        (u16::from(f.code), f.reason.to_string())
                    });
                    return Err(BridgeError::PeerClosed { code, reason });
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => continue,
                Some(Err(e)) => return Err(BridgeError::from(e)),
                None => {
                    return Err(BridgeError::PeerClosed {
                        code: 1006,
                        reason: "stream ended without a close frame".into(),
                    });
                }
            }
        }
    }
}

struct WebSocketWriter {
    sink: futures_util::stream::SplitSink<WsStream, Message>,
}

#[async_trait]
impl FrameWriter for WebSocketWriter {
    async fn write_message(&mut self, payload: Vec<u8>) -> BridgeResult<()> {
        self.sink
            .send(Message::Binary(payload.into()))
            .await
            .map_err(BridgeError::from)
    }

    async fn close(&mut self) -> BridgeResult<()> {
        self.sink.close().await.map_err(BridgeError::from)
    }
}
