//! In-memory transports shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use meddrug_client::{AnalysisTransport, Endpoint, Notification, Notifier, RawResponse};
use meddrug_common::TransportError;
use serde_json::Value;
use tokio::sync::oneshot;

pub type Reply = Result<RawResponse, TransportError>;

pub fn fixture(name: &str) -> Value {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name);
    let text = std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("read {}: {e}", path.display()));
    serde_json::from_str(&text).unwrap_or_else(|e| panic!("parse {}: {e}", path.display()))
}

/// Answers calls in order from a fixed script and records every call.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<(Endpoint, Value)>>,
}

impl ScriptedTransport {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Arc<Self> {
        Arc::new(Self { replies: Mutex::new(replies.into_iter().collect()), calls: Mutex::default() })
    }

    pub fn calls(&self) -> Vec<(Endpoint, Value)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnalysisTransport for ScriptedTransport {
    async fn send(&self, endpoint: Endpoint, payload: &Value) -> Result<RawResponse, TransportError> {
        self.calls.lock().unwrap().push((endpoint, payload.clone()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected call to {endpoint:?}"))
    }
}

/// Holds every call open until the test releases it, so responses can be
/// delivered in any order.
#[derive(Default)]
pub struct GatedTransport {
    gates: Mutex<Vec<Option<oneshot::Sender<Reply>>>>,
    calls: Mutex<Vec<(Endpoint, Value)>>,
}

impl GatedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<(Endpoint, Value)> {
        self.calls.lock().unwrap().clone()
    }

    /// Deliver `reply` to the `index`-th call.
    pub fn release(&self, index: usize, reply: Reply) {
        let gate = self.gates.lock().unwrap()[index].take().expect("call already released");
        let _ = gate.send(reply);
    }

    pub async fn wait_for_calls(&self, n: usize) {
        while self.call_count() < n {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl AnalysisTransport for GatedTransport {
    async fn send(&self, endpoint: Endpoint, payload: &Value) -> Result<RawResponse, TransportError> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().push(Some(tx));
        self.calls.lock().unwrap().push((endpoint, payload.clone()));
        rx.await.unwrap_or_else(|_| Err(TransportError::network()))
    }
}

/// Keeps every notification for later inspection.
#[derive(Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn messages(&self) -> Vec<String> {
        self.seen.lock().unwrap().iter().map(|n| n.message.clone()).collect()
    }

    pub fn all(&self) -> Vec<Notification> {
        self.seen.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen.lock().unwrap().push(notification);
    }
}
