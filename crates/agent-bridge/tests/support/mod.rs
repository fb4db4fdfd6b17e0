pub mod mock_transport;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use agent_bridge::{BridgeError, BridgeResult, CredentialProvider, Handler, SendHandle, Token};
use async_trait::async_trait;

/// Yields a fixed token from `get_token`, and whatever `refresh` was told
/// to produce from a channel the test controls.
pub struct ScriptedProvider {
    pub token_ttl: Mutex<Duration>,
    pub get_token_calls: AtomicU64,
    pub refresh_calls: AtomicU64,
    pub refresh_result: Mutex<Option<BridgeResult<Token>>>,
}

impl ScriptedProvider {
    #[must_use]
    pub fn new(token_ttl: Duration) -> Self {
        Self {
            token_ttl: Mutex::new(token_ttl),
            get_token_calls: AtomicU64::new(0),
            refresh_calls: AtomicU64::new(0),
            refresh_result: Mutex::new(None),
        }
    }

    pub fn set_refresh_result(&self, result: BridgeResult<Token>) {
        *self.refresh_result.lock().unwrap() = Some(result);
    }

    #[must_use]
    pub fn get_token_call_count(&self) -> u64 {
        self.get_token_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialProvider for ScriptedProvider {
    async fn get_token(&self, _connection_id: &str) -> BridgeResult<Token> {
        self.get_token_calls.fetch_add(1, Ordering::SeqCst);
        let ttl = *self.token_ttl.lock().unwrap();
        Ok(Token::new(
            "bearer",
            HashMap::new(),
            Instant::now() + ttl,
        ))
    }

    async fn refresh(&self, _connection_id: &str) -> BridgeResult<Token> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        match self.refresh_result.lock().unwrap().take() {
            Some(result) => result,
            None => Err(BridgeError::RefreshFailed {
                reason: "no scripted refresh result".into(),
            }),
        }
    }
}

/// Records every callback invocation for later assertion.
#[derive(Default)]
pub struct RecordingHandler {
    pub messages: Mutex<Vec<Vec<u8>>>,
    pub disconnects: Mutex<Vec<Option<String>>>,
    pub send_handle: Mutex<Option<SendHandle>>,
}

#[async_trait]
impl Handler for RecordingHandler {
    async fn on_connect(&self, send: SendHandle) {
        *self.send_handle.lock().unwrap() = Some(send);
    }

    async fn on_message(&self, payload: Vec<u8>) {
        self.messages.lock().unwrap().push(payload);
    }

    async fn on_disconnect(&self, error: Option<BridgeError>) {
        self.disconnects
            .lock()
            .unwrap()
            .push(error.map(|e| e.to_string()));
    }
}

impl RecordingHandler {
    #[must_use]
    pub fn disconnect_count(&self) -> usize {
        self.disconnects.lock().unwrap().len()
    }

    pub async fn send_handle(&self) -> SendHandle {
        self.send_handle
            .lock()
            .unwrap()
            .clone()
            .expect("on_connect has not fired yet")
    }
}

pub fn arc_provider(ttl: Duration) -> Arc<ScriptedProvider> {
    Arc::new(ScriptedProvider::new(ttl))
}

/// Spawns `producers` tasks from `on_connect`, each enqueueing `per_producer`
/// messages tagged with `(producer_index, sequence)` as little-endian u32
/// pairs, so a test can verify per-producer ordering on the wire (S6).
pub struct ProducingHandler {
    producers: u32,
    per_producer: u32,
}

impl ProducingHandler {
    #[must_use]
    pub fn new(producers: u32, per_producer: u32) -> Self {
        Self { producers, per_producer }
    }
}

#[async_trait]
impl Handler for ProducingHandler {
    async fn on_connect(&self, send: SendHandle) {
        for producer in 0..self.producers {
            let send = send.clone();
            let per_producer = self.per_producer;
            tokio::spawn(async move {
                for sequence in 0..per_producer {
                    let mut frame = Vec::with_capacity(8);
                    frame.extend_from_slice(&producer.to_le_bytes());
                    frame.extend_from_slice(&sequence.to_le_bytes());
                    let _ = send.send(frame).await;
                }
            });
        }
    }

    async fn on_message(&self, _payload: Vec<u8>) {}

    async fn on_disconnect(&self, _error: Option<BridgeError>) {}
}
