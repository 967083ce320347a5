//! # Engine Bridge - Remote Scripting for a Sandboxed Image Editor
//!
//! Drives an externally hosted, script-programmable image editor that is
//! reachable only through message passing. Commands are built as script
//! source strings, posted to a single trusted origin, and answered
//! asynchronously with binary payloads followed by a terminal signal.
//!
//! ## Core Pieces
//!
//! - **[`EngineCommand`]**: the fixed set of parameterized operations,
//!   serialized to script by one function with one escaping routine
//! - **[`EngineTransport`]**: the seam to the actual message plumbing
//! - **[`BridgeChannel`]**: the one-in-flight correlation protocol with
//!   origin filtering, payload accumulation, and a bounded timeout
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use bridge::{BridgeChannel, EngineCommand, EngineTransport, transport};
//!
//! # async fn run(transport: impl EngineTransport) -> Result<(), bridge::BridgeError> {
//! let channel = BridgeChannel::new(
//!     transport,
//!     "https://engine.example",
//!     transport::already_ready(),
//! );
//! let payload = channel
//!     .execute(&EngineCommand::ExportFull, Duration::from_secs(20))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod command;
pub mod error;
pub mod testing;
pub mod transport;

// Re-exports for convenience
pub use channel::{BridgeChannel, DEFAULT_EXPORT_TIMEOUT};
pub use command::{EngineCommand, escape_script_literal};
pub use error::{BridgeError, Result};
pub use transport::{
    DONE_SIGNAL, EngineReadiness, EngineTransport, InboundMessage, MessageBody, ReadinessSignal,
    readiness_channel,
};
