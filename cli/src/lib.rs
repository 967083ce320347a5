//! File-boundary helpers for the headless inpaint CLI: loading images on
//! disk into [`ImagePayload`] data URIs and writing payloads back out.

use std::path::Path;

use inpaint_common::ImagePayload;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image payload error: {0}")]
    Payload(#[from] inpaint_common::CommonError),
}

/// Read an encoded image file into a data URI payload, inferring the MIME
/// type from the extension. Anything not recognizably JPEG is treated as
/// PNG, the pipeline's native format.
pub fn read_image_payload(path: &Path) -> Result<ImagePayload, CliError> {
    let bytes = std::fs::read(path)?;
    Ok(ImagePayload::from_bytes(&bytes, mime_for(path)))
}

/// Decode a payload and write its raw image bytes to disk.
pub fn write_image_payload(payload: &ImagePayload, path: &Path) -> Result<(), CliError> {
    std::fs::write(path, payload.decode_bytes()?)?;
    Ok(())
}

fn mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "image/png",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let input = dir.path().join("in.png");
        let output = dir.path().join("out.png");
        std::fs::write(&input, [1u8, 2, 3, 4]).expect("Should write");

        let payload = read_image_payload(&input).expect("Should read");
        assert_eq!(payload.mime(), Some("image/png"));

        write_image_payload(&payload, &output).expect("Should write");
        assert_eq!(std::fs::read(&output).expect("Should read"), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_jpeg_extension_sets_mime() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let input = dir.path().join("photo.JPG");
        std::fs::write(&input, [0xFFu8, 0xD8]).expect("Should write");

        let payload = read_image_payload(&input).expect("Should read");
        assert_eq!(payload.mime(), Some("image/jpeg"));
    }
}
