//! The five-state inpainting pipeline.
//!
//! One run drives the engine bridge (full export, active-layer export), the
//! mask transform, the backend client, and finally re-enters the engine to
//! insert the result as a new layer. Status is published on a `watch`
//! channel for whatever UI is observing; every failure is converted into an
//! `Error` status and never retried automatically.

use std::time::Duration;

use bridge::{
    BridgeChannel, BridgeError, DEFAULT_EXPORT_TIMEOUT, EngineCommand, EngineReadiness,
    EngineTransport,
};
use inpaint_common::{ImagePayload, InpaintRequest};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr, VariantNames};
use tokio::sync::{Mutex, watch};
use tracing::{debug, error, info};

use crate::backend::InpaintBackend;
use crate::error::{InpaintError, Result};

/// Name given to the inserted result layer.
pub const AI_RESULT_LAYER: &str = "AI Result";

#[derive(
    Debug, Clone, Copy,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, VariantNames, IntoStaticStr,
    PartialEq, Eq
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StatusKind {
    Idle,
    Processing,
    Success,
    Error,
}

impl StatusKind {
    /// Short display label for the status indicator.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Processing => "Processing",
            Self::Success => "Success",
            Self::Error => "Error",
        }
    }
}

/// User-visible orchestration state. Mutated only by the orchestrator, read
/// by the UI layer, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct OrchestrationStatus {
    pub kind: StatusKind,
    pub label: String,
    pub message: String,
}

impl OrchestrationStatus {
    pub fn new(kind: StatusKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            label: kind.label().to_owned(),
            message: message.into(),
        }
    }

    /// The status before any run has started.
    pub fn ready() -> Self {
        Self::new(StatusKind::Idle, "Ready")
    }
}

/// Sequences export, mask extraction, remote inference, and result
/// insertion. Reusable across runs; overlapping runs are rejected rather
/// than queued.
pub struct Orchestrator<T: EngineTransport, B: InpaintBackend> {
    bridge: BridgeChannel<T>,
    backend: B,
    status: watch::Sender<OrchestrationStatus>,
    running: Mutex<()>,
    export_timeout: Duration,
}

impl<T: EngineTransport, B: InpaintBackend> Orchestrator<T, B> {
    pub fn new(bridge: BridgeChannel<T>, backend: B) -> Self {
        let (status, _) = watch::channel(OrchestrationStatus::ready());
        Self {
            bridge,
            backend,
            status,
            running: Mutex::new(()),
            export_timeout: DEFAULT_EXPORT_TIMEOUT,
        }
    }

    /// Override the engine export timeout (default 20 s).
    pub fn with_export_timeout(mut self, timeout: Duration) -> Self {
        self.export_timeout = timeout;
        self
    }

    /// Subscribe to status updates.
    pub fn status(&self) -> watch::Receiver<OrchestrationStatus> {
        self.status.subscribe()
    }

    /// The current status snapshot.
    pub fn current_status(&self) -> OrchestrationStatus {
        self.status.borrow().clone()
    }

    /// Wait for the engine to finish loading its document, then publish
    /// the post-load idle status embedding the configured backend URL.
    ///
    /// Returns immediately if the engine is already ready. Fails only if
    /// the readiness lifecycle is torn down before the transition happens.
    pub async fn announce_when_ready(&self) -> Result<()> {
        let mut readiness = self.bridge.readiness();
        readiness
            .wait_for(|state| *state == EngineReadiness::Ready)
            .await
            .map_err(|_| InpaintError::Bridge(BridgeError::TransportClosed))?;
        self.set_status(
            StatusKind::Idle,
            format!("Engine ready • API {}", self.backend.api_url()),
        );
        Ok(())
    }

    fn set_status(&self, kind: StatusKind, message: impl Into<String>) {
        let status = OrchestrationStatus::new(kind, message);
        debug!(kind = %status.kind, message = %status.message, "status");
        self.status.send_replace(status);
    }

    /// Run one inpainting sequence with the given prompts.
    ///
    /// On failure the error's display form becomes the `Error` status
    /// message; engine-side mutations made by completed steps are not
    /// rolled back.
    pub async fn run(&self, positive_prompt: &str, negative_prompt: &str) -> Result<()> {
        let _guard = self
            .running
            .try_lock()
            .map_err(|_| InpaintError::RunInProgress)?;

        match self.run_stages(positive_prompt, negative_prompt).await {
            Ok(()) => {
                info!("inpainting run complete");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "inpainting run failed");
                self.set_status(StatusKind::Error, e.to_string());
                Err(e)
            }
        }
    }

    async fn run_stages(&self, positive_prompt: &str, negative_prompt: &str) -> Result<()> {
        self.set_status(StatusKind::Processing, "Exporting image…");
        let image = self
            .bridge
            .execute(&EngineCommand::ExportFull, self.export_timeout)
            .await?;

        self.set_status(StatusKind::Processing, "Extracting mask…");
        let layer = self
            .bridge
            .execute(&EngineCommand::ExportActiveLayer, self.export_timeout)
            .await?;
        let mask = masking::alpha_to_mask(&layer)?;

        self.set_status(StatusKind::Processing, "Sending to AI…");
        let request = InpaintRequest {
            image,
            mask,
            positive_prompt: prompt_field(positive_prompt),
            negative_prompt: prompt_field(negative_prompt),
        };
        let response = self.backend.inpaint(&request).await?;

        let image_field = response
            .image
            .filter(|s| !s.is_empty())
            .ok_or(InpaintError::BackendError)?;
        let result = ImagePayload::normalize(&image_field);

        // No binary reply to await here; insertion is fire-and-forget.
        self.bridge.send(&EngineCommand::InsertLayer {
            payload: result,
            name: AI_RESULT_LAYER.to_owned(),
        })?;

        self.set_status(StatusKind::Success, "Result received");
        Ok(())
    }
}

fn prompt_field(prompt: &str) -> Option<String> {
    let trimmed = prompt.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}
