use thiserror::Error;

/// Failures surfaced by an orchestration run. Every variant's display form
/// is the human-readable message shown to the user through the status
/// channel.
#[derive(Error, Debug)]
pub enum InpaintError {
    #[error(transparent)]
    Bridge(#[from] bridge::BridgeError),

    #[error(transparent)]
    Mask(#[from] masking::MaskError),

    /// The backend answered with a server-supplied reason; the message is
    /// surfaced verbatim.
    #[error("{0}")]
    BackendRejected(String),

    /// The backend answered unusably (non-2xx without a detail, or a
    /// success body with no image).
    #[error("Backend error")]
    BackendError,

    #[error("Backend unreachable: {0}")]
    BackendUnreachable(String),

    #[error("An inpainting run is already in progress")]
    RunInProgress,
}

pub type Result<T> = std::result::Result<T, InpaintError>;
