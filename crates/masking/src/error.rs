use thiserror::Error;

#[derive(Error, Debug)]
pub enum MaskError {
    #[error("Failed to decode image: {0}")]
    ImageDecodeFailed(#[from] image::ImageError),

    #[error("Failed to encode image: {0}")]
    ImageEncodeFailed(image::ImageError),

    #[error("Invalid image payload: {0}")]
    Payload(#[from] inpaint_common::CommonError),
}

pub type Result<T> = std::result::Result<T, MaskError>;
