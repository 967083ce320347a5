//! # Inpaint Kit Common - Shared Types and Utilities
//!
//! Foundational types shared by every crate in the inpaint-kit workspace:
//! the self-describing [`ImagePayload`] image encoding, chunked base64
//! conversion for large binary buffers, and the wire structs exchanged with
//! the inpainting backend.
//!
//! ## Example
//!
//! ```rust
//! use inpaint_common::ImagePayload;
//!
//! // Wrap raw PNG bytes into a data URI payload
//! let payload = ImagePayload::from_png_bytes(&[0x89, b'P', b'N', b'G']);
//! assert!(payload.as_str().starts_with("data:image/png;base64,"));
//!
//! // Normalize a bare base64 string coming back from the backend
//! let normalized = ImagePayload::normalize("iVBORw0KGgo=");
//! assert_eq!(normalized.as_str(), "data:image/png;base64,iVBORw0KGgo=");
//! ```

use base64::{Engine as _, engine::general_purpose::STANDARD};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for shared payload operations
pub type Result<T> = std::result::Result<T, CommonError>;

/// Standard error type for shared payload operations
#[derive(Error, Debug)]
pub enum CommonError {
    #[error("Not a base64 data URI: {0}")]
    InvalidDataUri(String),

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Data URI prefix for PNG payloads.
pub const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// Block size for chunked base64 conversion. Large exported images must not
/// be converted to text in a single call; the empirical safe block is
/// 32 KiB, rounded down to a multiple of 3 so the concatenation of per-block
/// encodings equals the whole-buffer encoding.
pub const BASE64_BLOCK_SIZE: usize = 0x8000 - 2;

/// Encode a byte buffer as base64, processing it in fixed-size blocks.
pub fn encode_base64_chunked(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len().div_ceil(3) * 4);
    for block in bytes.chunks(BASE64_BLOCK_SIZE) {
        STANDARD.encode_string(block, &mut out);
    }
    out
}

/// An image encoded as a self-describing `data:<mime>;base64,...` URI.
///
/// Every image crossing a crate boundary in this workspace is carried in
/// this form; producers normalize into it before handing a value out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ImagePayload(String);

impl ImagePayload {
    /// Wrap already-encoded image bytes of the given MIME type.
    pub fn from_bytes(bytes: &[u8], mime: &str) -> Self {
        Self(format!("data:{mime};base64,{}", encode_base64_chunked(bytes)))
    }

    /// Wrap raw PNG bytes.
    pub fn from_png_bytes(bytes: &[u8]) -> Self {
        Self::from_bytes(bytes, "image/png")
    }

    /// Normalize a string that is either already a data URI or a bare
    /// base64 PNG into an [`ImagePayload`].
    pub fn normalize(value: &str) -> Self {
        if value.starts_with("data:") {
            Self(value.to_owned())
        } else {
            Self(format!("{PNG_DATA_URI_PREFIX}{value}"))
        }
    }

    /// The full data URI string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the payload, returning the data URI string.
    pub fn into_inner(self) -> String {
        self.0
    }

    /// The MIME type declared by the URI, if well formed.
    pub fn mime(&self) -> Option<&str> {
        self.0.strip_prefix("data:")?.split(';').next()
    }

    /// Decode the payload back into raw image bytes.
    pub fn decode_bytes(&self) -> Result<Vec<u8>> {
        let encoded = self
            .0
            .split_once("base64,")
            .map(|(_, rest)| rest)
            .ok_or_else(|| {
                let head: String = self.0.chars().take(32).collect();
                CommonError::InvalidDataUri(head)
            })?;
        Ok(STANDARD.decode(encoded)?)
    }
}

impl std::fmt::Display for ImagePayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Request body for `POST {api_url}/api/image-mask`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct InpaintRequest {
    /// Full-canvas export of the open document
    pub image: ImagePayload,
    /// Grayscale mask derived from the active layer's alpha channel
    pub mask: ImagePayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub positive_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
}

/// Response body from the inpainting backend. On success `image` carries a
/// data URI or bare base64 PNG; on failure `detail` carries the server's
/// human-readable reason.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct InpaintResponse {
    pub image: Option<String>,
    pub detail: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunked_encoding_matches_whole_buffer() {
        // Cross two block boundaries to exercise the concatenation.
        let bytes: Vec<u8> = (0..BASE64_BLOCK_SIZE * 2 + 17)
            .map(|i| (i % 251) as u8)
            .collect();
        let chunked = encode_base64_chunked(&bytes);
        assert_eq!(chunked, STANDARD.encode(&bytes));
    }

    #[test]
    fn test_block_size_is_multiple_of_three() {
        assert_eq!(BASE64_BLOCK_SIZE % 3, 0);
        assert!(BASE64_BLOCK_SIZE <= 32 * 1024);
    }

    #[test]
    fn test_payload_round_trip() {
        let bytes = vec![1u8, 2, 3, 4, 5];
        let payload = ImagePayload::from_png_bytes(&bytes);
        assert!(payload.as_str().starts_with(PNG_DATA_URI_PREFIX));
        assert_eq!(payload.mime(), Some("image/png"));
        assert_eq!(payload.decode_bytes().expect("Should decode"), bytes);
    }

    #[test]
    fn test_normalize_bare_base64() {
        let normalized = ImagePayload::normalize("iVBORw0KGgo=");
        assert_eq!(normalized.as_str(), "data:image/png;base64,iVBORw0KGgo=");
    }

    #[test]
    fn test_normalize_preserves_data_uri() {
        let uri = "data:image/jpeg;base64,AAAA";
        assert_eq!(ImagePayload::normalize(uri).as_str(), uri);
    }

    #[test]
    fn test_decode_rejects_non_data_uri() {
        let payload = ImagePayload::normalize("data:image/png,not-base64");
        assert!(matches!(
            payload.decode_bytes(),
            Err(CommonError::InvalidDataUri(_))
        ));
    }

    #[test]
    fn test_request_omits_absent_prompts() {
        let request = InpaintRequest {
            image: ImagePayload::from_png_bytes(&[1]),
            mask: ImagePayload::from_png_bytes(&[2]),
            positive_prompt: None,
            negative_prompt: None,
        };
        let json = serde_json::to_value(&request).expect("Should serialize");
        assert!(json.get("positive_prompt").is_none());
        assert!(json.get("negative_prompt").is_none());
    }
}
