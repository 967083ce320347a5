//! Transport seam between the bridge and the sandboxed engine.
//!
//! The engine lives in an isolated execution context: commands go out as
//! posted script strings addressed to a single trusted origin, and replies
//! come back out-of-band as origin-tagged messages. Implementations own the
//! actual message plumbing; the bridge only sees this trait.

use tokio::sync::{broadcast, watch};

use crate::error::{BridgeError, Result};

/// Sentinel value the engine emits once it has finished responding to the
/// current command.
pub const DONE_SIGNAL: &str = "done";

/// Body of a message received from the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    /// Raw image bytes from an export call
    Binary(Vec<u8>),
    /// A textual sentinel, e.g. [`DONE_SIGNAL`]
    Signal(String),
}

/// One message received from the engine's execution context, tagged with
/// the origin it was sent from. Origin filtering happens in the bridge, not
/// in transports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub origin: String,
    pub body: MessageBody,
}

impl InboundMessage {
    pub fn binary(origin: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            origin: origin.into(),
            body: MessageBody::Binary(bytes),
        }
    }

    pub fn signal(origin: impl Into<String>, signal: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            body: MessageBody::Signal(signal.into()),
        }
    }

    pub fn done(origin: impl Into<String>) -> Self {
        Self::signal(origin, DONE_SIGNAL)
    }
}

/// A backend capable of carrying messages to and from the sandboxed engine.
pub trait EngineTransport: Send + Sync {
    /// Post a script to the engine, addressed to `target_origin`. No other
    /// outbound message shape exists.
    fn post(&self, script: &str, target_origin: &str) -> Result<()>;

    /// Subscribe to messages coming back from the engine. A subscriber only
    /// observes messages sent after the call, which is why the bridge
    /// subscribes before posting.
    fn subscribe(&self) -> broadcast::Receiver<InboundMessage>;
}

impl<T: EngineTransport + ?Sized> EngineTransport for std::sync::Arc<T> {
    fn post(&self, script: &str, target_origin: &str) -> Result<()> {
        (**self).post(script, target_origin)
    }

    fn subscribe(&self) -> broadcast::Receiver<InboundMessage> {
        (**self).subscribe()
    }
}

impl<T: EngineTransport + ?Sized> EngineTransport for &T {
    fn post(&self, script: &str, target_origin: &str) -> Result<()> {
        (**self).post(script, target_origin)
    }

    fn subscribe(&self) -> broadcast::Receiver<InboundMessage> {
        (**self).subscribe()
    }
}

/// Engine document lifecycle. Transitions once per document load and never
/// reverts within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineReadiness {
    #[default]
    NotReady,
    Ready,
}

/// Sender half of the readiness lifecycle, held by whatever hosts the
/// engine (a visual shell, or a test).
#[derive(Debug)]
pub struct ReadinessSignal(watch::Sender<EngineReadiness>);

impl ReadinessSignal {
    /// Mark the engine ready. The transition is one-way.
    pub fn mark_ready(&self) {
        self.0.send_replace(EngineReadiness::Ready);
    }
}

/// Create a readiness lifecycle pair: the signal for the engine host, the
/// receiver for a [`crate::BridgeChannel`].
pub fn readiness_channel() -> (ReadinessSignal, watch::Receiver<EngineReadiness>) {
    let (tx, rx) = watch::channel(EngineReadiness::NotReady);
    (ReadinessSignal(tx), rx)
}

/// Convenience: a receiver already in the ready state, for contexts where
/// the engine is known to be loaded.
pub fn already_ready() -> watch::Receiver<EngineReadiness> {
    let (signal, rx) = readiness_channel();
    signal.mark_ready();
    rx
}

impl From<broadcast::error::SendError<InboundMessage>> for BridgeError {
    fn from(_: broadcast::error::SendError<InboundMessage>) -> Self {
        BridgeError::TransportClosed
    }
}
