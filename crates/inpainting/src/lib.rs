//! # Inpainting - Orchestration of AI Edits on a Sandboxed Editor
//!
//! Ties the pieces of the workspace together: the engine bridge exports the
//! document and the active layer, the masking crate turns the layer's alpha
//! channel into a grayscale mask, the backend client sends both to the
//! remote inpainting service, and the bridge inserts the returned image as
//! a new layer.
//!
//! ## Core Pieces
//!
//! - **[`Orchestrator`]**: the five-state pipeline
//!   (`Idle → Exporting → ExtractingMask → Sending → Success|Error`) with
//!   user-visible status on a `watch` channel
//! - **[`InpaintBackend`] / [`HttpBackend`]**: the remote service seam and
//!   its HTTP implementation
//! - **[`SettingsStore`]**: the persisted backend URL
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bridge::{BridgeChannel, EngineTransport, transport};
//! use inpainting::{HttpBackend, MemorySettings, Orchestrator, settings};
//!
//! # async fn run(transport: impl EngineTransport) -> inpainting::Result<()> {
//! let store = MemorySettings::new();
//! let channel = BridgeChannel::new(
//!     transport,
//!     "https://engine.example",
//!     transport::already_ready(),
//! );
//! let orchestrator = Orchestrator::new(channel, HttpBackend::new(settings::api_url(&store)));
//!
//! let _status = orchestrator.status();
//! orchestrator.run("a red door", "blurry, low quality").await?;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod error;
pub mod orchestrator;
pub mod settings;

// Re-exports for convenience
pub use backend::{HttpBackend, IMAGE_MASK_ENDPOINT, InpaintBackend};
pub use error::{InpaintError, Result};
pub use orchestrator::{AI_RESULT_LAYER, OrchestrationStatus, Orchestrator, StatusKind};
pub use settings::{
    API_URL_KEY, DEFAULT_API_URL, FileSettings, MemorySettings, SettingsError, SettingsStore,
};
