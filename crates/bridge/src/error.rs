use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Engine not ready")]
    EngineNotReady,

    #[error("A command exchange is already in flight")]
    ChannelBusy,

    #[error("Engine export timeout ({0:?})")]
    ExportTimeout(Duration),

    #[error("No data returned from engine")]
    NoDataReturned,

    #[error("Engine message stream closed")]
    TransportClosed,

    #[error("Failed to post script to engine: {0}")]
    Post(String),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
