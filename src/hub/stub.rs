//! In-memory transport for unit tests.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::Result;
use crate::hub::transport::{HubTransport, Query};

type Responder = Box<dyn Fn(&str, &Query) -> Result<Value> + Send + Sync>;

pub(crate) struct StubTransport {
    responder: Responder,
    delay: Duration,
    pub reads: Mutex<Vec<(String, Query)>>,
    pub writes: Mutex<Vec<(String, Vec<u8>)>>,
}

impl StubTransport {
    pub fn new(responder: impl Fn(&str, &Query) -> Result<Value> + Send + Sync + 'static) -> Self {
        Self {
            responder: Box::new(responder),
            delay: Duration::ZERO,
            reads: Mutex::new(Vec::new()),
            writes: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn read_count(&self) -> usize {
        self.reads.lock().unwrap().len()
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }

    pub fn reads_of(&self, path: &str) -> usize {
        self.reads.lock().unwrap().iter().filter(|(p, _)| p == path).count()
    }
}

#[async_trait]
impl HubTransport for StubTransport {
    async fn read(&self, path: &str, query: &Query) -> Result<Value> {
        self.reads.lock().unwrap().push((path.to_string(), query.clone()));
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        (self.responder)(path, query)
    }

    async fn write(&self, path: &str, body: Vec<u8>) -> Result<Value> {
        self.writes.lock().unwrap().push((path.to_string(), body));
        Ok(json!({}))
    }
}

/// JSON for a cast-add message as the hub would return it.
pub(crate) fn cast_json(fid: u64, hash: &str, timestamp: u64, text: &str) -> Value {
    json!({
        "data": {
            "type": "MESSAGE_TYPE_CAST_ADD",
            "fid": fid,
            "timestamp": timestamp,
            "network": "FARCASTER_NETWORK_MAINNET",
            "castAddBody": { "text": text, "mentions": [], "mentionsPositions": [], "embeds": [] }
        },
        "hash": hash,
        "hashScheme": "HASH_SCHEME_BLAKE3",
        "signature": "",
        "signatureScheme": "SIGNATURE_SCHEME_ED25519",
        "signer": ""
    })
}

pub(crate) fn link_json(fid: u64, target_fid: u64) -> Value {
    json!({
        "data": {
            "type": "MESSAGE_TYPE_LINK_ADD",
            "fid": fid,
            "timestamp": 1,
            "linkBody": { "type": "follow", "targetFid": target_fid }
        },
        "hash": format!("0x{fid:x}{target_fid:x}")
    })
}

pub(crate) fn user_data_json(fid: u64, kind: &str, value: &str) -> Value {
    json!({
        "data": {
            "type": "MESSAGE_TYPE_USER_DATA_ADD",
            "fid": fid,
            "timestamp": 1,
            "userDataBody": { "type": kind, "value": value }
        },
        "hash": format!("0x{fid:x}{}", kind.len())
    })
}
