//! In-memory engine transports for tests.
//!
//! The sandboxed engine only ever sees posted scripts and answers with
//! origin-tagged messages, so a faithful double is a recorded post log plus
//! a broadcast channel of canned replies.

use std::sync::Mutex;

use tokio::sync::broadcast;

use crate::error::Result;
use crate::transport::{EngineTransport, InboundMessage};

/// Records every posted script; replies are injected manually by the test.
pub struct RecordingTransport {
    replies: broadcast::Sender<InboundMessage>,
    posted: Mutex<Vec<(String, String)>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        let (replies, _) = broadcast::channel(16);
        Self {
            replies,
            posted: Mutex::new(Vec::new()),
        }
    }

    /// Emit a reply to every live subscriber.
    pub fn reply(&self, message: InboundMessage) {
        self.replies
            .send(message)
            .expect("Should have a subscriber");
    }

    /// Every `(script, target_origin)` pair posted so far.
    pub fn posted(&self) -> Vec<(String, String)> {
        self.posted.lock().expect("Should lock").clone()
    }

    fn record(&self, script: &str, target_origin: &str) {
        self.posted
            .lock()
            .expect("Should lock")
            .push((script.to_owned(), target_origin.to_owned()));
    }
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineTransport for RecordingTransport {
    fn post(&self, script: &str, target_origin: &str) -> Result<()> {
        self.record(script, target_origin);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<InboundMessage> {
        self.replies.subscribe()
    }
}

/// On each post, immediately emits the next canned batch of replies.
/// Subscription happens before posting in the bridge, so the batch lands in
/// the exchange that triggered it.
pub struct ScriptedTransport {
    replies: broadcast::Sender<InboundMessage>,
    batches: Mutex<Vec<Vec<InboundMessage>>>,
    posted: Mutex<Vec<(String, String)>>,
}

impl ScriptedTransport {
    pub fn new(batches: Vec<Vec<InboundMessage>>) -> Self {
        let (replies, _) = broadcast::channel(16);
        Self {
            replies,
            batches: Mutex::new(batches),
            posted: Mutex::new(Vec::new()),
        }
    }

    /// Every script posted so far.
    pub fn scripts(&self) -> Vec<String> {
        self.posted
            .lock()
            .expect("Should lock")
            .iter()
            .map(|(script, _)| script.clone())
            .collect()
    }
}

impl EngineTransport for ScriptedTransport {
    fn post(&self, script: &str, target_origin: &str) -> Result<()> {
        self.posted
            .lock()
            .expect("Should lock")
            .push((script.to_owned(), target_origin.to_owned()));
        let mut batches = self.batches.lock().expect("Should lock");
        if !batches.is_empty() {
            for message in batches.remove(0) {
                let _ = self.replies.send(message);
            }
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<InboundMessage> {
        self.replies.subscribe()
    }
}
