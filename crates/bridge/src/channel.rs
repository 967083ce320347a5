//! Request/response correlation with the sandboxed engine.
//!
//! The engine cannot return values from a posted script; it replies
//! asynchronously with zero or more binary messages followed by a terminal
//! signal. Every exchange is therefore a listen-then-send-then-await
//! triple, bounded only by a timeout. One exchange may be in flight per
//! channel; a second caller gets [`BridgeError::ChannelBusy`] instead of
//! silently stealing the listener slot.

use std::time::Duration;

use inpaint_common::ImagePayload;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::command::EngineCommand;
use crate::error::{BridgeError, Result};
use crate::transport::{DONE_SIGNAL, EngineReadiness, EngineTransport, MessageBody};

/// Default bound on how long an export may take before the exchange is
/// abandoned.
pub const DEFAULT_EXPORT_TIMEOUT: Duration = Duration::from_secs(20);

/// Accumulated state of the one in-flight exchange. Only the most recent
/// binary message before the terminal signal is kept.
#[derive(Debug, Default)]
struct PendingExchange {
    payload: Option<Vec<u8>>,
}

/// Owns the correlation protocol for one command/response cycle at a time.
pub struct BridgeChannel<T: EngineTransport> {
    transport: T,
    trusted_origin: String,
    readiness: watch::Receiver<EngineReadiness>,
    in_flight: Mutex<()>,
}

impl<T: EngineTransport> BridgeChannel<T> {
    pub fn new(
        transport: T,
        trusted_origin: impl Into<String>,
        readiness: watch::Receiver<EngineReadiness>,
    ) -> Self {
        Self {
            transport,
            trusted_origin: trusted_origin.into(),
            readiness,
            in_flight: Mutex::new(()),
        }
    }

    /// Whether the engine has finished loading its document.
    pub fn is_ready(&self) -> bool {
        *self.readiness.borrow() == EngineReadiness::Ready
    }

    /// A fresh subscription to the engine readiness lifecycle, for callers
    /// that want to react to the engine coming up.
    pub fn readiness(&self) -> watch::Receiver<EngineReadiness> {
        self.readiness.clone()
    }

    /// The single origin this channel trusts; messages from anywhere else
    /// are discarded.
    pub fn trusted_origin(&self) -> &str {
        &self.trusted_origin
    }

    /// Post a command to the engine without awaiting a reply. Used for
    /// commands that have no binary response, e.g. layer insertion.
    pub fn send(&self, command: &EngineCommand) -> Result<()> {
        if !self.is_ready() {
            return Err(BridgeError::EngineNotReady);
        }
        trace!(command = %command, "posting script to engine");
        self.transport.post(&command.to_script(), &self.trusted_origin)
    }

    /// Post a command and await its binary reply as an [`ImagePayload`].
    ///
    /// The reply subscription is registered before the script is posted so
    /// no message can slip past. Binary messages overwrite one another; the
    /// terminal signal resolves the exchange with whatever was last
    /// accumulated. The subscription is dropped on every exit path, so a
    /// timed-out exchange cannot misattribute a later reply.
    pub async fn execute(
        &self,
        command: &EngineCommand,
        timeout: Duration,
    ) -> Result<ImagePayload> {
        if !self.is_ready() {
            return Err(BridgeError::EngineNotReady);
        }
        let _guard = self
            .in_flight
            .try_lock()
            .map_err(|_| BridgeError::ChannelBusy)?;

        let mut replies = self.transport.subscribe();
        trace!(command = %command, timeout_ms = timeout.as_millis() as u64, "executing command");
        self.transport.post(&command.to_script(), &self.trusted_origin)?;

        let deadline = Instant::now() + timeout;
        let mut exchange = PendingExchange::default();
        loop {
            let message = match tokio::time::timeout_at(deadline, replies.recv()).await {
                Err(_) => return Err(BridgeError::ExportTimeout(timeout)),
                Ok(Err(broadcast::error::RecvError::Closed)) => {
                    return Err(BridgeError::TransportClosed);
                }
                Ok(Err(broadcast::error::RecvError::Lagged(skipped))) => {
                    warn!(skipped, "engine message stream lagged");
                    continue;
                }
                Ok(Ok(message)) => message,
            };

            if message.origin != self.trusted_origin {
                trace!(origin = %message.origin, "dropping message from untrusted origin");
                continue;
            }

            match message.body {
                MessageBody::Binary(bytes) => {
                    trace!(len = bytes.len(), "accumulated binary payload");
                    exchange.payload = Some(bytes);
                }
                MessageBody::Signal(signal) if signal == DONE_SIGNAL => {
                    let bytes = exchange.payload.take().ok_or(BridgeError::NoDataReturned)?;
                    debug!(len = bytes.len(), "export complete");
                    return Ok(ImagePayload::from_png_bytes(&bytes));
                }
                MessageBody::Signal(signal) => {
                    trace!(%signal, "ignoring non-terminal signal");
                }
            }
        }
    }
}
